//! Progress/cancellation sink shared by every task of a fan-out pass.

use tokio_util::sync::CancellationToken;

/// Textual status updates plus a cooperative cancellation flag.
///
/// One sink instance is shared by reference across all concurrently running
/// tasks of a pass: status appends and cancellation reads may happen from
/// any worker task at any time, so implementations must be internally
/// synchronized. Long-running steps (the directory walk, the external
/// reload call) poll [`is_cancelled`](SwapProgress::is_cancelled) at least
/// once per directory entry / per artifact.
pub trait SwapProgress: Send + Sync {
    /// Append one status line (e.g. the path currently being scanned).
    fn set_status(&self, text: &str);

    /// The token backing this sink's cancellation flag. The coordinator
    /// clones it to guard unstarted queue items.
    fn cancel_token(&self) -> &CancellationToken;

    /// Whether cancellation has been requested.
    fn is_cancelled(&self) -> bool {
        self.cancel_token().is_cancelled()
    }

    /// Request cancellation of the whole pass. Settable from outside the
    /// call while it is in flight (e.g. a user-initiated abort).
    fn request_cancel(&self) {
        self.cancel_token().cancel()
    }
}
