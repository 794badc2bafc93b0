use anyhow::{Context, Result};
use indicatif::MultiProgress;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::clone::repo_name_from_url;
use crate::git::GitBackend;

use super::manifest::{FileNode, GitNode};
use super::progress::{finish_err, finish_ok, step_spinner};

/// Name suffix that marks a node (directory or file) as disabled.
pub const DISABLED_SUFFIX: &str = ".disabled";

/// Move the application checkout to the recorded commit hash.
///
/// A checkout failure is reported on stderr but does not abort the
/// snapshot apply; the node reconciliation still runs.
///
/// # Errors
/// Returns an error if HEAD cannot be resolved at all (e.g. `app_dir` is
/// not a repository).
pub fn restore_app(be: &dyn GitBackend, app_dir: &Path, target: &str) -> Result<()> {
    let head = be
        .head_hash(app_dir)
        .with_context(|| format!("failed to open application repo {}", app_dir.display()))?;
    if head == target {
        return Ok(());
    }
    match be.checkout_hash(app_dir, target) {
        Ok(()) => eprintln!("checked out application at {}", target),
        Err(e) => eprintln!("failed to check out application at {}: {:#}", target, e),
    }
    Ok(())
}

/// Reconcile the git custom nodes on disk against the manifest.
///
/// The loop walks the nodes directory once and fixes each installed node
/// independently:
/// - a node the manifest wants disabled gets the `.disabled` suffix,
/// - a node the manifest wants enabled loses the suffix and is checked
///   out at the recorded hash (skipped when HEAD already matches),
/// - directories with no manifest record are left untouched.
///
/// A failure on one node is shown on its progress line and reconciliation
/// continues with the rest. Afterwards, every enabled record with no
/// directory on disk is cloned at its recorded hash.
///
/// # Errors
/// Returns an error only if the nodes directory itself cannot be read.
pub fn restore_git_nodes(
    be: &dyn GitBackend,
    mp: &MultiProgress,
    nodes_dir: &Path,
    wanted: &BTreeMap<String, GitNode>,
) -> Result<()> {
    let by_name: BTreeMap<String, (&str, &GitNode)> = wanted
        .iter()
        .map(|(url, node)| (repo_name_from_url(url), (url.as_str(), node)))
        .collect();

    let mut processed: HashSet<&str> = HashSet::new();

    let rd = fs::read_dir(nodes_dir)
        .with_context(|| format!("failed to read nodes directory {}", nodes_dir.display()))?;

    for ent in rd.flatten() {
        let path = ent.path();
        if !path.is_dir() {
            continue;
        }
        let name = ent.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        let is_disabled = name.ends_with(DISABLED_SUFFIX);
        let base = name.strip_suffix(DISABLED_SUFFIX).unwrap_or(&name);
        let Some(&(url, node)) = by_name.get(base) else {
            continue;
        };

        let pb = step_spinner(mp, format!("restoring {}", base));

        let res: Result<()> = (|| {
            let mut checkout_dir = None;
            match (node.disabled, is_disabled) {
                (true, true) => {}
                (true, false) => {
                    fs::rename(&path, nodes_dir.join(format!("{}{}", name, DISABLED_SUFFIX)))?;
                }
                (false, true) => {
                    let enabled = nodes_dir.join(base);
                    fs::rename(&path, &enabled)?;
                    processed.insert(url);
                    checkout_dir = Some(enabled);
                }
                (false, false) => {
                    processed.insert(url);
                    checkout_dir = Some(path.clone());
                }
            }
            if let Some(dir) = checkout_dir {
                let head = be.head_hash(&dir)?;
                if head != node.hash {
                    be.checkout_hash(&dir, &node.hash)?;
                }
            }
            Ok(())
        })();

        match res {
            Ok(()) => finish_ok(&pb, format!("restored {}", base)),
            Err(e) => finish_err(
                &pb,
                format!("failed to restore custom node '{}': {:#}", base, e),
            ),
        }
    }

    // clone missing
    for (url, node) in wanted {
        if node.disabled || processed.contains(url.as_str()) {
            continue;
        }
        let name = repo_name_from_url(url);
        let dest = nodes_dir.join(&name);

        let pb = step_spinner(mp, format!("cloning {}", url));

        match be.clone_repo(url, &dest, Some(&node.hash)) {
            Ok(()) => finish_ok(&pb, format!("cloned {}", name)),
            Err(e) => finish_err(&pb, format!("clone {} (error: {:#})", url, e)),
        }
    }

    Ok(())
}

/// Reconcile single-file custom nodes against the manifest.
///
/// Only the enabled/disabled state is under this helper's control: a
/// `.disabled` suffix is added or stripped to match each record. Files
/// with no manifest record are left untouched. An enabled record whose
/// file is absent cannot be materialized from a snapshot (there is no
/// repository to clone), so a warning is printed instead.
///
/// # Errors
/// Returns an error if the nodes directory cannot be read or a rename
/// fails.
pub fn restore_file_nodes(nodes_dir: &Path, wanted: &[FileNode]) -> Result<()> {
    let by_name: BTreeMap<&str, &FileNode> = wanted
        .iter()
        .map(|node| (node.filename.as_str(), node))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();

    let rd = fs::read_dir(nodes_dir)
        .with_context(|| format!("failed to read nodes directory {}", nodes_dir.display()))?;

    for ent in rd.flatten() {
        let path = ent.path();
        if !path.is_file() {
            continue;
        }
        let name = ent.file_name().to_string_lossy().to_string();

        if let Some(base) = name.strip_suffix(DISABLED_SUFFIX) {
            if let Some(&node) = by_name.get(base) {
                seen.insert(node.filename.as_str());
                if !node.disabled {
                    fs::rename(&path, nodes_dir.join(base))?;
                }
            }
        } else if let Some(&node) = by_name.get(name.as_str()) {
            seen.insert(node.filename.as_str());
            if node.disabled {
                fs::rename(&path, nodes_dir.join(format!("{}{}", name, DISABLED_SUFFIX)))?;
            }
        }
    }

    for node in wanted {
        if !node.disabled && !seen.contains(node.filename.as_str()) {
            eprintln!(
                "custom node file '{}' is missing and cannot be restored from a snapshot",
                node.filename
            );
        }
    }

    Ok(())
}
