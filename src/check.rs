use anyhow::Result;
use std::path::Path;

use crate::config::load_config;
use crate::git::{CommitState, GitBackend, backend};

/// Relation of a local checkout to its remote tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Local HEAD differs from the remote tip and is older.
    Behind,
    /// Local HEAD equals the remote tip.
    UpToDate,
    /// Hashes differ but the local commit is no older than the remote tip
    /// (local work, or a rewritten remote).
    Ahead,
}

fn classify(local: &CommitState, remote: &CommitState) -> CheckOutcome {
    if local.hash == remote.hash {
        CheckOutcome::UpToDate
    } else if local.time < remote.time {
        CheckOutcome::Behind
    } else {
        CheckOutcome::Ahead
    }
}

fn check_repo(be: &dyn GitBackend, path: &Path, do_fetch: bool) -> Result<CheckOutcome> {
    if do_fetch {
        be.fetch_origin(path)?;
    }
    let local = be.head_state(path)?;
    let remote = be.remote_state(path)?;
    Ok(classify(&local, &remote))
}

/// CLI command: report whether the repository at `path` is behind its
/// remote tracking branch.
///
/// The result is a sentinel line on stdout, parsed by the calling
/// application:
/// - `CUSTOM NODE CHECK: True` — behind the remote, an update is available
/// - `CUSTOM NODE CHECK: False` — up to date
/// - `CUSTOM NODE CHECK: Error` — the check failed (details on stderr)
///
/// When the hashes differ but the local commit is not older than the
/// remote tip, no sentinel is printed.
///
/// With `do_fetch`, remote refs are fetched from origin first; otherwise
/// the comparison uses whatever the last fetch brought in.
///
/// A failed check is part of the output contract, not a process failure,
/// so this always returns `Ok`.
pub fn cmd_check(path: &Path, do_fetch: bool) -> Result<()> {
    let cfg = load_config()?;
    let be = backend(&cfg);
    match check_repo(be.as_ref(), path, do_fetch) {
        Ok(CheckOutcome::Behind) => println!("CUSTOM NODE CHECK: True"),
        Ok(CheckOutcome::UpToDate) => println!("CUSTOM NODE CHECK: False"),
        Ok(CheckOutcome::Ahead) => {}
        Err(e) => {
            eprintln!("{:#}", e);
            println!("CUSTOM NODE CHECK: Error");
        }
    }
    Ok(())
}
