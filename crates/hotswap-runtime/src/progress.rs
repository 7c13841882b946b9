//! Default progress/cancellation sink.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hotswap_kernel::SwapProgress;

/// A [`SwapProgress`] backed by a [`CancellationToken`] and an append-only
/// status stream.
///
/// Safe to share across every concurrently running task of a pass: the
/// cancellation flag is an atomic read, status appends take a short lock.
/// Hosts with a real progress UI implement [`SwapProgress`] themselves;
/// this tracker is the plain embedded/test-friendly default.
#[derive(Default)]
pub struct ProgressTracker {
    cancel: CancellationToken,
    statuses: Mutex<Vec<String>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tracker cancelled together with an externally owned token
    /// (e.g. one covering both the scan and the reload pass).
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            statuses: Mutex::new(Vec::new()),
        }
    }

    /// Every status line reported so far, oldest first.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    /// The most recent status line, if any.
    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().last().cloned()
    }
}

impl SwapProgress for ProgressTracker {
    fn set_status(&self, text: &str) {
        debug!(status = text);
        self.statuses.lock().push(text.to_string());
    }

    fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
