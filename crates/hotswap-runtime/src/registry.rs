//! Per-session swap-point registry.
//!
//! A passive store mapping session identity to the instant of the last
//! successful swap. Lifecycle hooks are driven by explicit create/remove
//! notifications from the host; the registry itself schedules nothing.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use hotswap_kernel::SessionId;

/// "Beginning of time" value returned for sessions with no entry, so an
/// unregistered session scans as "everything is modified" instead of
/// erroring. An unregistered session should never legitimately reach the
/// scanner in the first place.
pub const EPOCH: u64 = 0;

/// Session → last-swap-instant (Unix-epoch millis).
///
/// Invariants:
/// - exactly one entry per live session, created at attach time and removed
///   at session removal;
/// - monotonic per session: callers replace a value only with one at least
///   as large, and only after a reload pass;
/// - never touched concurrently for the same session (the coordinator runs
///   at most one task per session at a time).
#[derive(Default)]
pub struct TimestampRegistry {
    stamps: RwLock<HashMap<SessionId, u64>>,
}

impl TimestampRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry for a newly created session. A duplicate create for a
    /// still-present session is treated as an overwrite.
    pub fn on_session_created(&self, session: &SessionId, now_millis: u64) {
        debug!(session = %session, stamp = now_millis, "session registered");
        self.stamps.write().insert(session.clone(), now_millis);
    }

    /// Drop the entry for a removed session.
    pub fn on_session_removed(&self, session: &SessionId) {
        debug!(session = %session, "session unregistered");
        self.stamps.write().remove(session);
    }

    /// Stored swap point, or [`EPOCH`] for an unknown session.
    pub fn timestamp(&self, session: &SessionId) -> u64 {
        self.stamps.read().get(session).copied().unwrap_or(EPOCH)
    }

    /// Unconditional overwrite; callers are responsible for monotonicity.
    pub fn set_timestamp(&self, session: &SessionId, now_millis: u64) {
        self.stamps.write().insert(session.clone(), now_millis);
    }

    /// Whether the session currently has an entry.
    pub fn contains(&self, session: &SessionId) -> bool {
        self.stamps.read().contains_key(session)
    }
}
