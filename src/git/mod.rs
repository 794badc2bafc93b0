//! Git integration layer.
//!
//! This module defines the [`GitBackend`] trait covering every git
//! operation cngit performs, and hides the concrete implementations
//! behind [`backend`]. The default backend is built on the `git2` crate;
//! setting `git_exe` in `config.toml` switches to a backend that shells
//! out to that executable instead, so users whose system git carries
//! extra configuration (credential helpers, proxies) can keep it.

mod cli_backend;
mod git2_backend;

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

pub(crate) use git2_backend::Git2Backend;

/// Hash and commit timestamp of a resolved commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitState {
    pub hash: String,
    /// Commit time in seconds since the epoch.
    pub time: i64,
}

/// Whether a pull moved HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Updated,
    Unchanged,
}

/// The git operations cngit needs, independent of how they are executed.
pub trait GitBackend {
    /// Clone `url` into `dest` (with submodules). If `hash` is given,
    /// check out that commit afterwards (detached).
    fn clone_repo(&self, url: &str, dest: &Path, hash: Option<&str>) -> Result<()>;

    /// Fetch branches and tags from `origin`.
    fn fetch_origin(&self, path: &Path) -> Result<()>;

    /// Hash and commit time of HEAD.
    fn head_state(&self, path: &Path) -> Result<CommitState>;

    /// Hash and commit time of `origin/<current branch>`.
    /// Fails on a detached HEAD.
    fn remote_state(&self, path: &Path) -> Result<CommitState>;

    /// Hash of HEAD.
    fn head_hash(&self, path: &Path) -> Result<String>;

    /// Check out the given commit hash (detached).
    fn checkout_hash(&self, path: &Path, hash: &str) -> Result<()>;

    /// Update the current branch from `origin`: stash local modifications
    /// if the worktree is dirty, bring the branch up to the remote tip,
    /// and update submodules.
    fn pull(&self, path: &Path) -> Result<PullOutcome>;
}

/// Select the backend implied by the configuration.
pub fn backend(cfg: &Config) -> Box<dyn GitBackend> {
    match cfg.git_exe.as_deref() {
        Some(exe) if !exe.is_empty() => Box::new(cli_backend::GitCli::new(exe)),
        _ => Box::new(Git2Backend),
    }
}
