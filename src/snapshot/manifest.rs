use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Desired state of one git-sourced custom node.
#[derive(Debug, Clone, Deserialize)]
pub struct GitNode {
    /// Commit hash the checkout should be at.
    pub hash: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Desired state of one single-file custom node.
///
/// The filename is recorded without the `.disabled` suffix, regardless of
/// the on-disk state when the snapshot was taken.
#[derive(Debug, Clone, Deserialize)]
pub struct FileNode {
    pub filename: String,
    #[serde(default)]
    pub disabled: bool,
}

/// A snapshot manifest: the declarative record of desired node states
/// used to restore a known configuration.
///
/// Example JSON:
/// ```json
/// {
///   "app": "d0165d819afe76bd4e6bfd1eb8d6172e3071cde5",
///   "git_custom_nodes": {
///     "https://github.com/owner/some-node": {
///       "hash": "5e0efb4890c43a24c66b70c53ff1dbce152ad4bd",
///       "disabled": false
///     }
///   },
///   "file_custom_nodes": [
///     { "filename": "tiny_node.py", "disabled": true }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    /// Commit hash the application checkout should be at.
    pub app: String,
    /// Desired git node states, keyed by repository URL.
    #[serde(default)]
    pub git_custom_nodes: BTreeMap<String, GitNode>,
    #[serde(default)]
    pub file_custom_nodes: Vec<FileNode>,
}

/// Load and parse a snapshot manifest from `path`.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snap: Snapshot = serde_json::from_str(&txt)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    Ok(snap)
}
