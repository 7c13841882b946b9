//! Modified-artifact discovery under build-output roots.
//!
//! Walks every root depth-first, keeps artifacts modified strictly after
//! the given swap point, and maps each one to a fully-qualified logical
//! name derived from its path relative to the root. The walk polls the
//! shared cancellation flag once per directory entry, so a cancel request
//! aborts promptly with whatever was collected so far.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, trace};
use walkdir::WalkDir;

use hotswap_kernel::{ChangedArtifacts, HotSwapArtifact, SwapProgress};

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Artifact file extension, without the leading dot.
    pub extension: String,
    /// Whether the extension filter ignores case. Defaults to the
    /// platform's usual filesystem behavior.
    pub case_insensitive: bool,
    /// Separator used between path components in qualified names.
    pub namespace_separator: char,
    /// Whether to follow symbolic links during the walk. When enabled,
    /// walkdir's ancestor-loop detection bounds cyclic link chains.
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "class".to_string(),
            case_insensitive: cfg!(any(target_os = "windows", target_os = "macos")),
            namespace_separator: '.',
            follow_links: false,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the artifact extension (without the leading dot).
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// Override case sensitivity of the extension filter.
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Set the namespace separator for qualified names.
    pub fn with_namespace_separator(mut self, sep: char) -> Self {
        self.namespace_separator = sep;
        self
    }

    /// Enable/disable following symbolic links.
    pub fn with_follow_links(mut self, enabled: bool) -> Self {
        self.follow_links = enabled;
        self
    }

    fn matches_extension(&self, file_name: &str) -> bool {
        let suffix = format!(".{}", self.extension);
        // no empty stems: ".class" alone is not an artifact
        if file_name.len() <= suffix.len() {
            return false;
        }
        if self.case_insensitive {
            file_name
                .to_ascii_lowercase()
                .ends_with(&suffix.to_ascii_lowercase())
        } else {
            file_name.ends_with(&suffix)
        }
    }
}

/// Recursive artifact scanner.
#[derive(Debug, Clone, Default)]
pub struct ArtifactScanner {
    config: ScanConfig,
}

impl ArtifactScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Collect every artifact under `roots` modified strictly after
    /// `since_millis`, keyed by qualified name.
    ///
    /// Cancellation mid-walk returns the partial result collected so far;
    /// that is not an error. Unreadable nodes, vanished files, and roots
    /// that do not exist contribute nothing — transient filesystem races
    /// during a build are expected and never abort the scan. If two roots
    /// yield the same qualified name the later root wins; roots are assumed
    /// not to logically overlap.
    pub fn scan(
        &self,
        roots: &[PathBuf],
        since_millis: u64,
        progress: &dyn SwapProgress,
    ) -> ChangedArtifacts {
        let mut changed = ChangedArtifacts::new();

        for root in roots {
            debug!(root = %root.display(), since = since_millis, "scanning output root");
            let walk = WalkDir::new(root).follow_links(self.config.follow_links);
            for entry in walk.into_iter() {
                if progress.is_cancelled() {
                    debug!("scan cancelled, returning partial result");
                    return changed;
                }
                // A listing failure on any node is "nothing found here".
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        trace!(error = %err, "skipping unreadable node");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(file_name) = entry.file_name().to_str() else {
                    continue;
                };
                if !self.config.matches_extension(file_name) {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|meta| meta.modified().ok())
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .map(|since_epoch| since_epoch.as_millis() as u64);
                let Some(modified) = modified else { continue };
                if modified <= since_millis {
                    continue;
                }
                let Some(qualified) = self.qualified_name(root, entry.path()) else {
                    continue;
                };
                progress.set_status(&format!("scanning {}", entry.path().display()));
                changed.insert(qualified, HotSwapArtifact::new(entry.path()));
            }
        }

        changed
    }

    /// Derive the qualified name of an artifact: its path relative to the
    /// root, extension stripped, path separators replaced by the namespace
    /// separator.
    fn qualified_name(&self, root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            parts.push(component.as_os_str().to_str()?);
        }
        let last = parts.pop()?;
        // matches_extension already verified the dotted suffix is present
        let stem = &last[..last.len() - self.config.extension.len() - 1];
        parts.push(stem);
        Some(parts.join(&self.config.namespace_separator.to_string()))
    }
}
