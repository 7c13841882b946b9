//! The external reload operation boundary.
//!
//! Artifact redefinition against a live process is an opaque host concern.
//! The runtime only decides *what changed* and *when* each session is told
//! to reload; the operation itself returns a typed result the sequencer
//! inspects to decide whether to advance the session's swap point.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::ChangedArtifacts;
use crate::error::SwapResult;
use crate::progress::SwapProgress;
use crate::session::SessionDescriptor;

/// One artifact the external operation could not redefine.
///
/// Per-artifact failures are data, not errors: they are aggregated and
/// surfaced at the end of the session's reload task without blocking the
/// remaining artifacts, sibling sessions, or the swap-point advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFailure {
    /// Qualified name of the failing artifact.
    pub qualified_name: String,
    /// Host-provided description of why redefinition failed.
    pub cause: String,
}

impl ArtifactFailure {
    pub fn new(qualified_name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            cause: cause.into(),
        }
    }
}

/// Outcome of one session's reload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The operation ran to completion. `failures` lists the artifacts that
    /// could not be redefined; an empty list is full success.
    Applied { failures: Vec<ArtifactFailure> },
    /// The operation observed the cancellation flag and stopped early. The
    /// session's swap point must not advance, so the same artifacts are
    /// reconsidered modified on the next pass.
    Cancelled,
}

impl ReloadOutcome {
    /// Completion with no per-artifact failures.
    pub fn success() -> Self {
        Self::Applied { failures: Vec::new() }
    }
}

/// Attempts redefinition of the given artifacts in one session's live
/// target. A returned error is session-fatal (e.g. the bound worker is no
/// longer reachable) and aborts that session's remaining work in the
/// current pass only.
#[async_trait]
pub trait ReloadOperation: Send + Sync {
    async fn reload(
        &self,
        session: &SessionDescriptor,
        artifacts: &ChangedArtifacts,
        progress: &dyn SwapProgress,
    ) -> SwapResult<ReloadOutcome>;
}
