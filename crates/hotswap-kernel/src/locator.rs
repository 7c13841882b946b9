//! Build-output discovery boundary.

use std::path::PathBuf;

use crate::session::SessionDescriptor;

/// Returns the ordered set of build-output root directories to scan for a
/// session.
///
/// Called on every scan and never cached by the runtime: the host's project
/// model may change between passes. A root that does not exist contributes
/// nothing to the scan rather than failing it.
pub trait OutputLocator: Send + Sync {
    fn output_roots(&self, session: &SessionDescriptor) -> Vec<PathBuf>;
}
