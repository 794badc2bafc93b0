use anyhow::{Result, bail};
use std::path::Path;

use crate::config::load_config;
use crate::git::{PullOutcome, backend};

/// CLI command: update the node repository at `path` from origin.
///
/// Local modifications are stashed first if the worktree is dirty, and
/// submodules are updated after the branch moves.
///
/// The result is a sentinel line on stdout, parsed by the calling
/// application:
/// - `CUSTOM NODE PULL: True` — HEAD moved to a new commit
/// - `CUSTOM NODE PULL: None` — already up to date
/// - `CUSTOM NODE PULL: False` — the update failed (details on stderr)
///
/// # Errors
/// Returns an error only when `path` is not a git repository; any failure
/// during the update itself is reported through the sentinel instead.
pub fn cmd_pull(path: &Path) -> Result<()> {
    if !path.join(".git").exists() {
        bail!("not a git repository: {}", path.display());
    }

    let cfg = load_config()?;
    let be = backend(&cfg);
    match be.pull(path) {
        Ok(PullOutcome::Updated) => println!("CUSTOM NODE PULL: True"),
        Ok(PullOutcome::Unchanged) => println!("CUSTOM NODE PULL: None"),
        Err(e) => {
            eprintln!("{:#}", e);
            println!("CUSTOM NODE PULL: False");
        }
    }
    Ok(())
}
