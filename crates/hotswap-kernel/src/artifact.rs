//! Changed-artifact data model.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::session::SessionDescriptor;

/// Location of one compiled artifact on disk, as found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotSwapArtifact {
    /// Absolute path of the artifact file.
    pub path: PathBuf,
}

impl HotSwapArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Qualified name → artifact location, produced fresh by every scan call and
/// never persisted.
pub type ChangedArtifacts = HashMap<String, HotSwapArtifact>;

/// Per-session scan results for one whole fleet pass.
pub type ChangesBySession = HashMap<SessionDescriptor, ChangedArtifacts>;
