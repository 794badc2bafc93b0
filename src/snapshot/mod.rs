mod manifest;
mod progress;
mod restore;

pub use manifest::{FileNode, GitNode, Snapshot};

use anyhow::{Result, anyhow};
use indicatif::MultiProgress;
use std::path::{Path, PathBuf};

use crate::config::load_config;
use crate::git::backend;
use crate::paths::paths;

use manifest::load_snapshot;
use restore::{restore_app, restore_file_nodes, restore_git_nodes};

/// Resolve a snapshot target to a manifest path.
///
/// If `target` names an existing file it is used directly; otherwise the
/// target is looked up as `<cngit home>/snapshots/<target>.json`.
fn resolve_target(target: &str) -> Result<PathBuf> {
    let direct = Path::new(target);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    Ok(paths()?.snapshots.join(format!("{}.json", target)))
}

/// CLI command: restore application and node states from a snapshot.
///
/// High-level flow:
/// 1. Resolve and load the snapshot manifest.
/// 2. Check out the application repository at the recorded hash.
/// 3. Reconcile git custom nodes (enable/disable renames, checkouts,
///    clones of missing nodes) — see [`restore`].
/// 4. Reconcile single-file custom nodes (enable/disable renames).
///
/// The result is a sentinel line on stdout, parsed by the calling
/// application: `APPLY SNAPSHOT: True` on success, `APPLY SNAPSHOT:
/// False` on any failure (including a missing snapshot file). Failures
/// are part of the output contract, so this returns `Ok` either way.
pub fn cmd_apply_snapshot(
    target: &str,
    nodes_dir: Option<&Path>,
    app_dir: Option<&Path>,
) -> Result<()> {
    let path = resolve_target(target)?;
    if !path.is_file() {
        eprintln!("snapshot file not found: `{}`", path.display());
        println!("APPLY SNAPSHOT: False");
        return Ok(());
    }

    match apply(&path, nodes_dir, app_dir) {
        Ok(()) => println!("APPLY SNAPSHOT: True"),
        Err(e) => {
            eprintln!("{:#}", e);
            println!("APPLY SNAPSHOT: False");
        }
    }
    Ok(())
}

fn apply(path: &Path, nodes_dir: Option<&Path>, app_dir: Option<&Path>) -> Result<()> {
    let cfg = load_config()?;
    let be = backend(&cfg);

    let nodes_dir = nodes_dir
        .map(Path::to_path_buf)
        .or_else(|| cfg.nodes_dir.clone())
        .ok_or_else(|| anyhow!("nodes directory not set (pass --nodes-dir or set nodes_dir in config.toml)"))?;
    let app_dir = app_dir
        .map(Path::to_path_buf)
        .or_else(|| cfg.app_dir.clone())
        .ok_or_else(|| anyhow!("application directory not set (pass --app-dir or set app_dir in config.toml)"))?;

    let snap = load_snapshot(path)?;

    restore_app(be.as_ref(), &app_dir, &snap.app)?;

    let mp = MultiProgress::new();
    restore_git_nodes(be.as_ref(), &mp, &nodes_dir, &snap.git_custom_nodes)?;
    restore_file_nodes(&nodes_dir, &snap.file_custom_nodes)?;

    Ok(())
}
