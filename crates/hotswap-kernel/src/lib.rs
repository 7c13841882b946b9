//! HotSwap kernel — boundary contracts for the hot-swap coordination library.
//!
//! # Architecture
//!
//! This crate defines the complete contract surface between the coordination
//! runtime and its host:
//!
//! - **Trait definitions** live here in `hotswap-kernel`.
//! - **Concrete implementations** (registry, scanner, coordinator, manager)
//!   live in `hotswap-runtime`.
//! - The kernel never depends on the runtime.
//!
//! The host supplies the collaborators (session provider, build-output
//! locator, the reload operation against a live process, a progress sink);
//! the runtime supplies the orchestration. Everything in this crate compiles
//! and unit-tests without a running tokio runtime.

pub mod artifact;
pub mod clock;
pub mod error;
pub mod locator;
pub mod progress;
pub mod reload;
pub mod session;

pub use artifact::{ChangedArtifacts, ChangesBySession, HotSwapArtifact};
pub use clock::{Clock, SystemClock};
pub use error::{SwapError, SwapResult};
pub use locator::OutputLocator;
pub use progress::SwapProgress;
pub use reload::{ArtifactFailure, ReloadOperation, ReloadOutcome};
pub use session::{SessionDescriptor, SessionId, SessionProvider, WorkerId};
