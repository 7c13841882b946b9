//! HotSwap runtime — concrete hot-swap coordination machinery.
//!
//! Implements the contracts defined in `hotswap-kernel`:
//! - Per-session swap-point bookkeeping ([`TimestampRegistry`])
//! - Modified-artifact discovery under build-output roots ([`ArtifactScanner`])
//! - Worker-parallel, per-worker-sequential fan-out ([`Coordinator`])
//! - Two-pass scan/reload orchestration ([`HotSwapManager`])
//!
//! The host wires in its collaborators (an `OutputLocator`, a
//! `ReloadOperation`, optionally a `SessionProvider`) and drives the manager
//! from its own trigger (a build finishing, a user action). A single shared
//! [`ProgressTracker`] carries status lines and the cancellation flag for a
//! whole pass.

mod coordinator;
mod manager;
mod progress;
mod registry;
mod scanner;

pub use coordinator::{BatchReport, Coordinator, TaskFailure, WorkBatch};
pub use manager::HotSwapManager;
pub use progress::ProgressTracker;
pub use registry::TimestampRegistry;
pub use scanner::{ArtifactScanner, ScanConfig};

// Re-export the kernel contracts so hosts can depend on this crate alone.
pub use hotswap_kernel::{
    ArtifactFailure, ChangedArtifacts, ChangesBySession, Clock, HotSwapArtifact, OutputLocator,
    ReloadOperation, ReloadOutcome, SessionDescriptor, SessionId, SessionProvider, SwapError,
    SwapProgress, SwapResult, SystemClock, WorkerId,
};
