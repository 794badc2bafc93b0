use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use super::{CommitState, GitBackend, PullOutcome};

/// Backend that shells out to an external git executable.
///
/// Selected when `git_exe` is set in `config.toml`. Unlike the in-process
/// backend, a real `git pull --rebase` is available here, so local commits
/// on top of the remote branch are replayed instead of rejected.
pub struct GitCli {
    exe: String,
}

impl GitCli {
    pub fn new(exe: &str) -> Self {
        Self {
            exe: exe.to_string(),
        }
    }

    /// Run git with the given arguments, optionally inside `dir` (via
    /// `git -C`). Returns trimmed stdout; a non-zero exit status becomes
    /// an error carrying stderr.
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.exe);
        if let Some(d) = dir {
            cmd.arg("-C").arg(d);
        }
        cmd.args(args);
        let out = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.exe))?;
        if !out.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    fn commit_state(&self, dir: &Path, rev: &str) -> Result<CommitState> {
        let line = self.run(Some(dir), &["log", "-1", "--format=%H %ct", rev])?;
        parse_state(&line)
    }
}

fn parse_state(line: &str) -> Result<CommitState> {
    let mut it = line.split_whitespace();
    let hash = it.next().context("empty git log output")?.to_string();
    let time = it
        .next()
        .context("missing commit time in git log output")?
        .parse::<i64>()
        .context("bad commit time in git log output")?;
    Ok(CommitState { hash, time })
}

impl GitBackend for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path, hash: Option<&str>) -> Result<()> {
        let out = Command::new(&self.exe)
            .arg("clone")
            .arg("--recursive")
            .arg(url)
            .arg(dest)
            .output()
            .with_context(|| format!("failed to run {}", self.exe))?;
        if !out.status.success() {
            bail!(
                "git clone {} failed: {}",
                url,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        if let Some(h) = hash {
            self.run(Some(dest), &["checkout", h])?;
        }
        Ok(())
    }

    fn fetch_origin(&self, path: &Path) -> Result<()> {
        self.run(Some(path), &["fetch", "origin"])?;
        Ok(())
    }

    fn head_state(&self, path: &Path) -> Result<CommitState> {
        self.commit_state(path, "HEAD")
    }

    fn remote_state(&self, path: &Path) -> Result<CommitState> {
        let branch = self.run(Some(path), &["symbolic-ref", "--short", "HEAD"])?;
        self.commit_state(path, &format!("origin/{}", branch))
    }

    fn head_hash(&self, path: &Path) -> Result<String> {
        self.run(Some(path), &["rev-parse", "HEAD"])
    }

    fn checkout_hash(&self, path: &Path, hash: &str) -> Result<()> {
        self.run(Some(path), &["checkout", hash])?;
        Ok(())
    }

    fn pull(&self, path: &Path) -> Result<PullOutcome> {
        let status = self.run(Some(path), &["status", "--porcelain", "--untracked-files=no"])?;
        if !status.is_empty() {
            self.run(Some(path), &["stash"])?;
        }

        let before = self.head_hash(path)?;
        self.run(Some(path), &["pull", "--rebase"])?;
        self.run(Some(path), &["submodule", "update", "--init", "--recursive"])?;
        let after = self.head_hash(path)?;

        Ok(if before != after {
            PullOutcome::Updated
        } else {
            PullOutcome::Unchanged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_state_splits_hash_and_time() {
        let st = parse_state("0123abcd 1700000000").unwrap();
        assert_eq!(st.hash, "0123abcd");
        assert_eq!(st.time, 1_700_000_000);
    }

    #[test]
    fn parse_state_rejects_garbage() {
        assert!(parse_state("").is_err());
        assert!(parse_state("0123abcd").is_err());
        assert!(parse_state("0123abcd not-a-time").is_err());
    }
}
