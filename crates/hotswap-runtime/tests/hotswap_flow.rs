//! End-to-end scan/reload scenarios across a small session fleet.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use hotswap_runtime::{
    ArtifactFailure, ChangedArtifacts, ChangesBySession, Clock, HotSwapManager, OutputLocator,
    ProgressTracker, ReloadOperation, ReloadOutcome, SessionDescriptor, SessionId,
    SessionProvider, SwapError, SwapProgress, SwapResult,
};

struct ManualClock(AtomicU64);

impl ManualClock {
    fn at(millis: u64) -> Self {
        Self(AtomicU64::new(millis))
    }

    fn advance_to(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed per-session output roots.
struct StaticLocator(HashMap<SessionId, Vec<PathBuf>>);

impl OutputLocator for StaticLocator {
    fn output_roots(&self, session: &SessionDescriptor) -> Vec<PathBuf> {
        self.0.get(&session.id).cloned().unwrap_or_default()
    }
}

#[derive(Clone)]
enum Behavior {
    Applied(Vec<ArtifactFailure>),
    Cancelled,
    Fatal(&'static str),
}

/// Scripted reload operation recording every invocation.
struct ScriptedReload {
    behaviors: HashMap<SessionId, Behavior>,
    invocations: Mutex<Vec<(SessionId, Vec<String>)>>,
}

impl ScriptedReload {
    fn new(behaviors: impl IntoIterator<Item = (SessionId, Behavior)>) -> Self {
        Self {
            behaviors: behaviors.into_iter().collect(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    fn invocations(&self) -> Vec<(SessionId, Vec<String>)> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl ReloadOperation for ScriptedReload {
    async fn reload(
        &self,
        session: &SessionDescriptor,
        artifacts: &ChangedArtifacts,
        _progress: &dyn SwapProgress,
    ) -> SwapResult<ReloadOutcome> {
        let mut names: Vec<String> = artifacts.keys().cloned().collect();
        names.sort();
        self.invocations.lock().push((session.id.clone(), names));

        match self.behaviors.get(&session.id) {
            Some(Behavior::Applied(failures)) => Ok(ReloadOutcome::Applied {
                failures: failures.clone(),
            }),
            Some(Behavior::Cancelled) => Ok(ReloadOutcome::Cancelled),
            Some(Behavior::Fatal(reason)) => Err(SwapError::session_fatal(&session.id, *reason)),
            None => Ok(ReloadOutcome::success()),
        }
    }
}

struct StaticProvider(Vec<SessionDescriptor>);

impl SessionProvider for StaticProvider {
    fn sessions(&self) -> Vec<SessionDescriptor> {
        self.0.clone()
    }
}

fn write_artifact(root: &Path, relative: &str, mtime_millis: u64) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"cafebabe").unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_millis(mtime_millis))
        .unwrap();
}

struct Fleet {
    manager: HotSwapManager,
    clock: Arc<ManualClock>,
    op: Arc<ScriptedReload>,
    s1: SessionDescriptor,
    s2: SessionDescriptor,
    _roots: (TempDir, TempDir),
}

/// Two sessions on distinct workers, both attached at T0 = 10_000.
/// `pkg/Foo.class` under S1's root was modified at T1 = 20_000; nothing
/// under S2's root changed after T0.
fn fleet(behaviors: Vec<(SessionId, Behavior)>) -> Fleet {
    let s1 = SessionDescriptor::new("s1", "w1");
    let s2 = SessionDescriptor::new("s2", "w2");

    let root1 = TempDir::new().unwrap();
    let root2 = TempDir::new().unwrap();
    write_artifact(root1.path(), "pkg/Foo.class", 20_000);
    write_artifact(root2.path(), "pkg/Quiet.class", 5_000);

    let locator = StaticLocator(HashMap::from([
        (s1.id.clone(), vec![root1.path().to_path_buf()]),
        (s2.id.clone(), vec![root2.path().to_path_buf()]),
    ]));
    let op = Arc::new(ScriptedReload::new(behaviors));
    let clock = Arc::new(ManualClock::at(10_000));
    let manager =
        HotSwapManager::new(Arc::new(locator), op.clone()).with_clock(clock.clone());

    manager.on_session_created(&s1);
    manager.on_session_created(&s2);

    Fleet {
        manager,
        clock,
        op,
        s1,
        s2,
        _roots: (root1, root2),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scan_finds_only_the_modified_session() {
    let fleet = fleet(Vec::new());
    let progress = Arc::new(ProgressTracker::new());

    let changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress)
        .await;

    assert_eq!(changes.len(), 1);
    let s1_changes = changes.get(&fleet.s1).unwrap();
    assert_eq!(s1_changes.len(), 1);
    assert!(s1_changes.contains_key("pkg.Foo"));
    assert!(!changes.contains_key(&fleet.s2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reload_advances_only_the_reloaded_session() {
    let fleet = fleet(Vec::new());
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());

    let changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress.clone())
        .await;

    fleet.clock.advance_to(30_000);
    let report = fleet.manager.reload_all(changes, progress).await;

    assert!(report.all_completed());
    assert!(fleet.manager.registry().timestamp(&fleet.s1.id) >= 20_000);
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s2.id), 10_000);

    // only S1 was told to reload, with exactly the scanned artifact
    assert_eq!(
        fleet.op.invocations(),
        vec![(fleet.s1.id.clone(), vec!["pkg.Foo".to_string()])]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn swap_point_capture_precedes_the_external_call() {
    let fleet = fleet(Vec::new());
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());

    let changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress.clone())
        .await;

    fleet.clock.advance_to(25_000);
    fleet.manager.reload_all(changes, progress.clone()).await;

    // S1's swap point is the capture instant, so the artifact modified at
    // 20_000 is not rediscovered by the next scan
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s1.id), 25_000);
    let rescan = fleet
        .manager
        .scan_all(
            &[fleet.s1.clone(), fleet.s2.clone()],
            Arc::new(ProgressTracker::new()),
        )
        .await;
    assert!(rescan.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn partial_failure_advances_the_swap_point_and_spares_siblings() {
    let failures = vec![ArtifactFailure::new("pkg.Foo", "incompatible change")];
    let fleet = fleet(vec![(SessionId::new("s1"), Behavior::Applied(failures))]);
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());
    let tracker = Arc::new(ProgressTracker::new());

    // reload both sessions, S2 with an empty set, to show siblings proceed
    let mut changes = ChangesBySession::new();
    changes.insert(
        fleet.s1.clone(),
        fleet
            .manager
            .scan_all(&[fleet.s1.clone()], progress)
            .await
            .remove(&fleet.s1)
            .unwrap(),
    );
    changes.insert(fleet.s2.clone(), ChangedArtifacts::new());

    fleet.clock.advance_to(30_000);
    let report = fleet
        .manager
        .reload_all(changes, tracker.clone() as Arc<dyn SwapProgress>)
        .await;

    // advance-on-attempt: the per-artifact failure is reported, not fatal
    assert!(report.failures.is_empty());
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s1.id), 30_000);
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s2.id), 30_000);
    assert_eq!(fleet.op.invocations().len(), 2);
    assert!(
        tracker
            .statuses()
            .iter()
            .any(|status| status.contains("pkg.Foo") && status.contains("incompatible change"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fatal_failure_leaves_the_swap_point_and_spares_siblings() {
    let fleet = fleet(vec![(SessionId::new("s1"), Behavior::Fatal("worker gone"))]);
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());

    let mut changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress.clone())
        .await;
    changes.insert(fleet.s2.clone(), ChangedArtifacts::new());

    fleet.clock.advance_to(30_000);
    let report = fleet.manager.reload_all(changes, progress).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, "s1");
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s1.id), 10_000);
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s2.id), 30_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_reload_reconsiders_the_same_artifacts_next_pass() {
    let fleet = fleet(vec![(SessionId::new("s1"), Behavior::Cancelled)]);
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());

    let changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress.clone())
        .await;

    fleet.clock.advance_to(30_000);
    fleet.manager.reload_all(changes, progress).await;

    // swap point untouched, so the artifact shows up again
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s1.id), 10_000);
    let rescan = fleet
        .manager
        .scan_all(&[fleet.s1.clone()], Arc::new(ProgressTracker::new()))
        .await;
    assert!(rescan.get(&fleet.s1).unwrap().contains_key("pkg.Foo"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_scan_pass_returns_an_empty_fleet_result() {
    let fleet = fleet(Vec::new());
    let progress = Arc::new(ProgressTracker::new());
    progress.request_cancel();

    let changes = fleet
        .manager
        .scan_all(&[fleet.s1.clone(), fleet.s2.clone()], progress)
        .await;

    assert!(changes.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scan_attached_pulls_sessions_from_the_provider() {
    let fleet = fleet(Vec::new());
    let provider = StaticProvider(vec![
        fleet.s1.clone(),
        fleet.s2.clone(),
        SessionDescriptor::new("gone", "w3").detached(),
    ]);

    let changes = fleet
        .manager
        .scan_attached(&provider, Arc::new(ProgressTracker::new()))
        .await;

    assert_eq!(changes.len(), 1);
    assert!(changes.contains_key(&fleet.s1));
}

/// Locator that stalls in blocking I/O fashion before answering.
struct SlowLocator(Duration);

impl OutputLocator for SlowLocator {
    fn output_roots(&self, _session: &SessionDescriptor) -> Vec<PathBuf> {
        std::thread::sleep(self.0);
        Vec::new()
    }
}

// Single-threaded runtime on purpose: if the scan's blocking filesystem
// work ran on the executor thread, the timer task below could not fire
// until the scan finished.
#[tokio::test]
async fn blocking_scan_does_not_starve_the_executor() {
    let op = Arc::new(ScriptedReload::new(Vec::new()));
    let manager = HotSwapManager::new(
        Arc::new(SlowLocator(Duration::from_millis(200))),
        op,
    )
    .with_clock(Arc::new(ManualClock::at(10_000)));
    let session = SessionDescriptor::new("s1", "w1");
    manager.on_session_created(&session);

    let fired = Arc::new(AtomicBool::new(false));
    let timer_fired = fired.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        timer_fired.store(true, Ordering::SeqCst);
    });

    let changes = manager
        .scan_all(&[session], Arc::new(ProgressTracker::new()))
        .await;

    assert!(changes.is_empty());
    assert!(
        fired.load(Ordering::SeqCst),
        "sibling task was starved while the scan blocked"
    );
    timer.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn swap_all_runs_both_passes() {
    let fleet = fleet(Vec::new());
    let progress: Arc<dyn SwapProgress> = Arc::new(ProgressTracker::new());

    fleet.clock.advance_to(30_000);
    let report = fleet
        .manager
        .swap_all(&[fleet.s1.clone(), fleet.s2.clone()], progress)
        .await;

    assert!(report.all_completed());
    assert_eq!(fleet.manager.registry().timestamp(&fleet.s1.id), 30_000);
    assert_eq!(fleet.op.invocations().len(), 1);
}
