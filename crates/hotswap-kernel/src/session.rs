//! Session identity and the session-provider boundary.
//!
//! Sessions are externally owned: the core never constructs or destroys a
//! live target, it only reacts to create/remove notifications and reads a
//! snapshot of each session's identity, bound worker, and attach state.

use serde::{Deserialize, Serialize};

/// Identity of one attached execution session. Used as a mapping key
/// throughout the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identity of the worker/process a session's commands are serialized
/// through. Commands bound to the same worker never run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Snapshot of one externally owned session.
///
/// `Eq + Hash` so per-session result maps can key on the descriptor itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Session identity.
    pub id: SessionId,
    /// The worker/process this session's commands are bound to.
    pub worker: WorkerId,
    /// Whether the session is currently attached to its live target.
    pub attached: bool,
}

impl SessionDescriptor {
    /// Create a descriptor for an attached session.
    pub fn new(id: impl Into<SessionId>, worker: impl Into<WorkerId>) -> Self {
        Self {
            id: id.into(),
            worker: worker.into(),
            attached: true,
        }
    }

    /// Mark the session as detached.
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }
}

/// Host-side enumeration of the sessions currently known to the debugging
/// facility. Implemented by the host; consumed by the runtime's convenience
/// entry points.
pub trait SessionProvider: Send + Sync {
    /// Snapshot of every session currently known, attached or not.
    fn sessions(&self) -> Vec<SessionDescriptor>;
}
