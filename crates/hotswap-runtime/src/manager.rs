//! Hot-swap orchestration.
//!
//! Owns the timestamp registry and the scanner, and composes them with the
//! host's collaborators into the two-pass fleet operation: scan every
//! attached session for modified artifacts, then tell every session with a
//! non-empty changed set to reload. The passes are separate batches so the
//! whole fleet's changed set is computed before any session begins
//! reloading — a slow scan on one session never races its own reload.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use hotswap_kernel::{
    ChangedArtifacts, ChangesBySession, Clock, OutputLocator, ReloadOperation, ReloadOutcome,
    SessionDescriptor, SessionProvider, SwapError, SwapProgress, SwapResult, SystemClock,
};

use crate::coordinator::{BatchReport, Coordinator, WorkBatch};
use crate::registry::TimestampRegistry;
use crate::scanner::{ArtifactScanner, ScanConfig};

/// Coordinates incremental hot swap across attached sessions.
///
/// Cheaply cloneable; clones share the same registry and collaborators.
#[derive(Clone)]
pub struct HotSwapManager {
    registry: Arc<TimestampRegistry>,
    scanner: Arc<ArtifactScanner>,
    locator: Arc<dyn OutputLocator>,
    reload_op: Arc<dyn ReloadOperation>,
    clock: Arc<dyn Clock>,
}

impl HotSwapManager {
    /// Create a manager wired to the host's build-output locator and reload
    /// operation.
    pub fn new(locator: Arc<dyn OutputLocator>, reload_op: Arc<dyn ReloadOperation>) -> Self {
        Self {
            registry: Arc::new(TimestampRegistry::new()),
            scanner: Arc::new(ArtifactScanner::default()),
            locator,
            reload_op,
            clock: Arc::new(SystemClock),
        }
    }

    /// Inject a clock (tests use a manual one).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the scanner configuration.
    pub fn with_scan_config(mut self, config: ScanConfig) -> Self {
        self.scanner = Arc::new(ArtifactScanner::new(config));
        self
    }

    /// The shared swap-point registry.
    pub fn registry(&self) -> &TimestampRegistry {
        &self.registry
    }

    /// Session lifecycle hook: wire to the host's session-created
    /// notification. A duplicate create overwrites the existing swap point.
    pub fn on_session_created(&self, session: &SessionDescriptor) {
        self.registry
            .on_session_created(&session.id, self.clock.now_millis());
    }

    /// Session lifecycle hook: wire to the host's session-removed
    /// notification.
    pub fn on_session_removed(&self, session: &SessionDescriptor) {
        self.registry.on_session_removed(&session.id);
    }

    /// Scan pass: one work item per attached session, keyed by its bound
    /// worker, each collecting the artifacts modified since that session's
    /// swap point. Sessions with nothing changed are absent from the result.
    ///
    /// Returns an empty map overall when the pass ends cancelled, even if
    /// some sessions finished scanning first.
    pub async fn scan_all(
        &self,
        sessions: &[SessionDescriptor],
        progress: Arc<dyn SwapProgress>,
    ) -> ChangesBySession {
        progress.set_status("scanning for modified artifacts");
        let results: Arc<Mutex<ChangesBySession>> = Arc::new(Mutex::new(ChangesBySession::new()));

        let mut batch = WorkBatch::new();
        for session in sessions.iter().filter(|session| session.attached) {
            let manager = self.clone();
            let session = session.clone();
            let progress = progress.clone();
            let results = results.clone();
            batch.push(
                session.worker.clone(),
                session.id.to_string(),
                async move {
                    // The walk is blocking filesystem I/O; keep it off the
                    // async worker threads so sibling sessions make progress
                    // during a large scan.
                    let changed = {
                        let manager = manager.clone();
                        let session = session.clone();
                        let progress = progress.clone();
                        tokio::task::spawn_blocking(move || {
                            manager.modified_artifacts(&session, progress.as_ref())
                        })
                        .await
                        .map_err(|err| {
                            SwapError::Internal(format!("scan task panicked: {err}"))
                        })?
                    };
                    debug!(session = %session.id, count = changed.len(), "scan finished");
                    if !changed.is_empty() {
                        results.lock().insert(session, changed);
                    }
                    Ok(())
                }
                .boxed(),
            );
        }

        Coordinator::run(batch, progress.cancel_token().clone()).await;

        if progress.is_cancelled() {
            ChangesBySession::new()
        } else {
            std::mem::take(&mut *results.lock())
        }
    }

    /// [`scan_all`](Self::scan_all) over the provider's current sessions.
    pub async fn scan_attached(
        &self,
        provider: &dyn SessionProvider,
        progress: Arc<dyn SwapProgress>,
    ) -> ChangesBySession {
        self.scan_all(&provider.sessions(), progress).await
    }

    /// Reload pass: one work item per session in `changes`, keyed by its
    /// bound worker. Per-artifact failures are reported through the sink
    /// and the returned report; a session-fatal failure skips that
    /// session's remaining items only.
    pub async fn reload_all(
        &self,
        changes: ChangesBySession,
        progress: Arc<dyn SwapProgress>,
    ) -> BatchReport {
        progress.set_status("reloading modified artifacts");

        let mut batch = WorkBatch::new();
        for (session, changed) in changes {
            let manager = self.clone();
            let progress = progress.clone();
            batch.push(
                session.worker.clone(),
                session.id.to_string(),
                async move {
                    manager
                        .reload_session(&session, changed, progress.as_ref())
                        .await
                }
                .boxed(),
            );
        }

        Coordinator::run(batch, progress.cancel_token().clone()).await
    }

    /// The full two-pass operation: scan every attached session, then
    /// reload every session with a non-empty changed set. All scans
    /// complete (or are cancelled) before any reload begins; that is the
    /// only cross-worker ordering guarantee.
    pub async fn swap_all(
        &self,
        sessions: &[SessionDescriptor],
        progress: Arc<dyn SwapProgress>,
    ) -> BatchReport {
        let changes = self.scan_all(sessions, progress.clone()).await;
        self.reload_all(changes, progress).await
    }

    /// Roots are recomputed from the locator on every call; the project
    /// model may have changed since the last pass.
    fn modified_artifacts(
        &self,
        session: &SessionDescriptor,
        progress: &dyn SwapProgress,
    ) -> ChangedArtifacts {
        let roots = self.locator.output_roots(session);
        let since = self.registry.timestamp(&session.id);
        self.scanner.scan(&roots, since, progress)
    }

    /// Reload one session and, unless the operation was cancelled or fatal,
    /// advance its swap point.
    ///
    /// The instant is captured before the external call begins, so
    /// artifacts modified while the reload runs are not missed on the next
    /// pass — at the minor cost of possibly re-scanning an artifact that
    /// finished compiling a moment before capture.
    async fn reload_session(
        &self,
        session: &SessionDescriptor,
        changed: ChangedArtifacts,
        progress: &dyn SwapProgress,
    ) -> SwapResult<()> {
        let swap_instant = self.clock.now_millis();
        info!(session = %session.id, artifacts = changed.len(), "reloading session");

        match self.reload_op.reload(session, &changed, progress).await? {
            ReloadOutcome::Applied { failures } => {
                for failure in &failures {
                    warn!(
                        session = %session.id,
                        artifact = %failure.qualified_name,
                        cause = %failure.cause,
                        "artifact failed to reload"
                    );
                    progress.set_status(&format!(
                        "failed to reload {}: {}",
                        failure.qualified_name, failure.cause
                    ));
                }
                // Advance on attempt: per-artifact failures do not hold the
                // swap point back, only cancellation or a fatal error does.
                self.registry.set_timestamp(&session.id, swap_instant);
                Ok(())
            }
            ReloadOutcome::Cancelled => {
                debug!(session = %session.id, "reload cancelled, swap point unchanged");
                Ok(())
            }
        }
    }
}
