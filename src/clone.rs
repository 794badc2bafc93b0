use anyhow::{Result, bail};
use std::path::Path;

use crate::config::load_config;
use crate::git::{GitBackend, backend};

/// Derive the checkout directory name for a repository URL.
///
/// The name is the last path segment of the URL with any `.git` extension
/// stripped, e.g. `https://github.com/owner/some-node.git` → `some-node`.
/// Both `/` and `:` act as segment separators so scp-style remotes
/// (`git@host:owner/repo.git`) resolve the same way.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let base = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    base.strip_suffix(".git").unwrap_or(base).to_string()
}

fn clone_node(
    be: &dyn GitBackend,
    nodes_dir: &Path,
    url: &str,
    hash: Option<&str>,
) -> Result<()> {
    let name = repo_name_from_url(url);
    if name.is_empty() {
        bail!("cannot derive a repository name from url: {}", url);
    }
    let dest = nodes_dir.join(&name);
    be.clone_repo(url, &dest, hash)
}

/// CLI command: clone a custom node repository into `nodes_dir`.
///
/// The checkout lands in `<nodes_dir>/<name>` where the name is derived
/// from the URL. When `hash` is given, that commit is checked out after
/// the clone (detached).
///
/// # Errors
/// Returns an error if the clone or the checkout fails.
pub fn cmd_clone(nodes_dir: &Path, url: &str, hash: Option<&str>) -> Result<()> {
    let cfg = load_config()?;
    let be = backend(&cfg);
    clone_node(be.as_ref(), nodes_dir, url, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_strips_git_extension() {
        assert_eq!(
            repo_name_from_url("https://github.com/owner/some-node.git"),
            "some-node"
        );
    }

    #[test]
    fn repo_name_without_extension() {
        assert_eq!(
            repo_name_from_url("https://github.com/owner/some-node"),
            "some-node"
        );
    }

    #[test]
    fn repo_name_ignores_trailing_slash() {
        assert_eq!(
            repo_name_from_url("https://github.com/owner/some-node/"),
            "some-node"
        );
    }

    #[test]
    fn repo_name_handles_scp_style_remote() {
        assert_eq!(
            repo_name_from_url("git@github.com:owner/some-node.git"),
            "some-node"
        );
        assert_eq!(repo_name_from_url("host:some-node.git"), "some-node");
    }

    #[test]
    fn repo_name_handles_local_path() {
        assert_eq!(repo_name_from_url("/srv/mirrors/some-node"), "some-node");
    }
}
