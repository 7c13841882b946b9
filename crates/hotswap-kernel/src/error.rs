//! Crate-level error types for hot-swap coordination.

use thiserror::Error;

use crate::session::{SessionId, WorkerId};

/// Session-fatal failures surfaced by coordination tasks.
///
/// Anything below session-fatal severity (per-artifact reload failures,
/// unreadable directories during a scan) is recovered locally and reported
/// as data, never as a `SwapError`. An error of this type aborts only the
/// owning session's remaining work in the current pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SwapError {
    /// The worker/process a session is bound to stopped responding.
    #[error("worker {0} is no longer reachable")]
    WorkerUnreachable(WorkerId),

    /// The external reload operation failed wholesale for a session.
    #[error("reload failed for session {session}: {reason}")]
    SessionFatal { session: SessionId, reason: String },

    /// A low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error described by a message string.
    #[error("{0}")]
    Internal(String),
}

impl SwapError {
    /// Convenience constructor for a session-fatal failure.
    pub fn session_fatal(session: &SessionId, reason: impl Into<String>) -> Self {
        Self::SessionFatal {
            session: session.clone(),
            reason: reason.into(),
        }
    }
}

pub type SwapResult<T> = Result<T, SwapError>;
