use anyhow::{Context, Result, anyhow, bail};
use git2::{
    Commit, FetchOptions, ObjectType, RemoteCallbacks, Repository, ResetType, StashFlags,
    StatusOptions, SubmoduleUpdateOptions,
    build::{CheckoutBuilder, RepoBuilder},
};
use std::path::Path;

use super::{CommitState, GitBackend, PullOutcome};

/// Backend built on the `git2` crate. This is the default; no external
/// git executable is required.
pub struct Git2Backend;

/// Build a `FetchOptions` with SSH-agent credentials enabled.
///
/// This allows Git operations to authenticate using the user's SSH agent.
/// If no SSH key is found, it falls back to default credentials.
fn fetch_opts_with_creds() -> FetchOptions<'static> {
    let mut cb = RemoteCallbacks::new();
    cb.credentials(|_url, username_from_url, _allowed| {
        git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
            .or_else(|_| git2::Cred::default())
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(cb);
    fo
}

/// Initialize and update all submodules for the given repository.
///
/// Custom nodes routinely vendor models or shared code as submodules, so
/// every clone and pull runs this.
///
/// # Errors
/// Returns an error if any submodule fails to initialize or update.
fn update_submodules(repo: &Repository) -> Result<()> {
    let mut subs = repo.submodules().unwrap_or_default();
    for sm in subs.iter_mut() {
        sm.init(true)?;
        let mut opt = SubmoduleUpdateOptions::new();
        sm.update(true, Some(&mut opt))?;
    }
    Ok(())
}

/// Perform `git fetch origin` to update remote refs.
///
/// This fetches both branches and tags from `origin` into the local
/// repository.
fn fetch_origin(repo: &Repository) -> Result<()> {
    let mut fo = fetch_opts_with_creds();

    let mut remote = repo.find_remote("origin")?;
    remote
        .fetch(
            &[
                "refs/heads/*:refs/remotes/origin/*",
                "refs/tags/*:refs/tags/*",
            ],
            Some(&mut fo),
            None,
        )
        .context("git fetch origin")?;
    Ok(())
}

/// Resolve `rev` to a commit and check it out with a detached HEAD.
///
/// Snapshot hashes are always checked out detached; moving back to a
/// branch is the pull command's job.
fn checkout_detached(repo: &Repository, rev: &str) -> Result<()> {
    let obj = repo
        .revparse_single(rev)
        .with_context(|| format!("rev not found: {}", rev))?;
    let commit = obj
        .peel(ObjectType::Commit)?
        .into_commit()
        .map_err(|_| anyhow!("rev didn't peel to a commit"))?;
    repo.checkout_tree(commit.as_object(), None)?;
    repo.set_head_detached(commit.id())?;
    Ok(())
}

/// Name of the branch HEAD is attached to. Fails on a detached HEAD.
fn current_branch(repo: &Repository) -> Result<String> {
    if repo.head_detached()? {
        bail!("HEAD is detached");
    }
    let head = repo.head()?;
    let name = head
        .shorthand()
        .ok_or_else(|| anyhow!("invalid branch name"))?;
    Ok(name.to_string())
}

fn state_of(commit: &Commit) -> CommitState {
    CommitState {
        hash: commit.id().to_string(),
        time: commit.time().seconds(),
    }
}

/// Stash local modifications if the worktree is dirty.
///
/// Untracked and ignored files are not considered; only changes to
/// tracked content trigger a stash.
fn stash_if_dirty(repo: &mut Repository) -> Result<()> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);
    if repo.statuses(Some(&mut opts))?.is_empty() {
        return Ok(());
    }
    let sig = repo
        .signature()
        .or_else(|_| git2::Signature::now("cngit", "cngit@localhost"))?;
    repo.stash_save(&sig, "cngit: auto-stash before pull", Some(StashFlags::DEFAULT))?;
    Ok(())
}

impl GitBackend for Git2Backend {
    fn clone_repo(&self, url: &str, dest: &Path, hash: Option<&str>) -> Result<()> {
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_opts_with_creds());

        let repo = builder
            .clone(url, dest)
            .with_context(|| format!("git clone {}", url))?;

        if let Some(h) = hash {
            checkout_detached(&repo, h)?;
        }
        update_submodules(&repo)?;
        Ok(())
    }

    fn fetch_origin(&self, path: &Path) -> Result<()> {
        let repo = Repository::open(path)?;
        fetch_origin(&repo)
    }

    fn head_state(&self, path: &Path) -> Result<CommitState> {
        let repo = Repository::open(path)?;
        let commit = repo.head()?.peel_to_commit()?;
        Ok(state_of(&commit))
    }

    fn remote_state(&self, path: &Path) -> Result<CommitState> {
        let repo = Repository::open(path)?;
        let branch = current_branch(&repo)?;
        let reference = repo
            .find_reference(&format!("refs/remotes/origin/{}", branch))
            .with_context(|| format!("no remote tracking branch origin/{}", branch))?;
        let commit = reference.peel_to_commit()?;
        Ok(state_of(&commit))
    }

    fn head_hash(&self, path: &Path) -> Result<String> {
        let repo = Repository::open(path)?;
        Ok(repo.head()?.peel_to_commit()?.id().to_string())
    }

    fn checkout_hash(&self, path: &Path, hash: &str) -> Result<()> {
        let repo = Repository::open(path)?;
        checkout_detached(&repo, hash)
    }

    fn pull(&self, path: &Path) -> Result<PullOutcome> {
        let mut repo = Repository::open(path)?;
        stash_if_dirty(&mut repo)?;

        let before = repo.head()?.peel_to_commit()?.id();
        fetch_origin(&repo)?;

        let branch = current_branch(&repo)?;
        let remote_tip = repo
            .find_reference(&format!("refs/remotes/origin/{}", branch))
            .with_context(|| format!("no remote tracking branch origin/{}", branch))?
            .peel_to_commit()?;

        if remote_tip.id() == before {
            update_submodules(&repo)?;
            return Ok(PullOutcome::Unchanged);
        }
        if !repo.graph_descendant_of(remote_tip.id(), before)? {
            bail!("local branch has diverged from origin/{}", branch);
        }

        repo.reset(remote_tip.as_object(), ResetType::Hard, None)?;
        repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        update_submodules(&repo)?;
        Ok(PullOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use std::fs;
    use tempfile::tempdir;

    fn commit_file(repo: &Repository, name: &str, content: &str, when: i64) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::new("test", "test@example.com", &Time::new(when, 0)).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, name, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn head_state_reports_hash_and_time() {
        let td = tempdir().unwrap();
        let repo = Repository::init(td.path()).unwrap();
        let oid = commit_file(&repo, "a.txt", "a", 1_000_000);

        let be = Git2Backend;
        let st = be.head_state(td.path()).unwrap();
        assert_eq!(st.hash, oid.to_string());
        assert_eq!(st.time, 1_000_000);
    }

    #[test]
    fn checkout_hash_detaches_at_commit() {
        let td = tempdir().unwrap();
        let repo = Repository::init(td.path()).unwrap();
        let first = commit_file(&repo, "a.txt", "a", 1_000_000);
        commit_file(&repo, "b.txt", "b", 1_000_100);

        let be = Git2Backend;
        be.checkout_hash(td.path(), &first.to_string()).unwrap();

        let reopened = Repository::open(td.path()).unwrap();
        assert!(reopened.head_detached().unwrap());
        assert_eq!(be.head_hash(td.path()).unwrap(), first.to_string());
    }

    #[test]
    fn clone_checks_out_requested_hash() {
        let src = tempdir().unwrap();
        let upstream = Repository::init(src.path()).unwrap();
        let first = commit_file(&upstream, "a.txt", "a", 1_000_000);
        commit_file(&upstream, "b.txt", "b", 1_000_100);

        let dst = tempdir().unwrap();
        let dest = dst.path().join("node");
        let be = Git2Backend;
        be.clone_repo(
            src.path().to_str().unwrap(),
            &dest,
            Some(&first.to_string()),
        )
        .unwrap();

        assert_eq!(be.head_hash(&dest).unwrap(), first.to_string());
        assert!(dest.join("a.txt").exists());
        assert!(!dest.join("b.txt").exists());
    }

    #[test]
    fn pull_fast_forwards_and_reports_outcome() {
        let src = tempdir().unwrap();
        let upstream = Repository::init(src.path()).unwrap();
        commit_file(&upstream, "a.txt", "a", 1_000_000);

        let dst = tempdir().unwrap();
        let dest = dst.path().join("node");
        let be = Git2Backend;
        be.clone_repo(src.path().to_str().unwrap(), &dest, None)
            .unwrap();

        assert_eq!(be.pull(&dest).unwrap(), PullOutcome::Unchanged);

        let new = commit_file(&upstream, "b.txt", "b", 1_000_100);
        assert_eq!(be.pull(&dest).unwrap(), PullOutcome::Updated);
        assert_eq!(be.head_hash(&dest).unwrap(), new.to_string());
    }

    #[test]
    fn pull_stashes_dirty_worktree() {
        let src = tempdir().unwrap();
        let upstream = Repository::init(src.path()).unwrap();
        commit_file(&upstream, "a.txt", "a", 1_000_000);

        let dst = tempdir().unwrap();
        let dest = dst.path().join("node");
        let be = Git2Backend;
        be.clone_repo(src.path().to_str().unwrap(), &dest, None)
            .unwrap();

        fs::write(dest.join("a.txt"), "local edit").unwrap();
        let new = commit_file(&upstream, "a.txt", "upstream edit", 1_000_100);

        assert_eq!(be.pull(&dest).unwrap(), PullOutcome::Updated);
        assert_eq!(be.head_hash(&dest).unwrap(), new.to_string());
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "upstream edit");
    }

    #[test]
    fn pull_ignores_untracked_files() {
        let src = tempdir().unwrap();
        let upstream = Repository::init(src.path()).unwrap();
        commit_file(&upstream, "a.txt", "a", 1_000_000);

        let dst = tempdir().unwrap();
        let dest = dst.path().join("node");
        let be = Git2Backend;
        be.clone_repo(src.path().to_str().unwrap(), &dest, None)
            .unwrap();

        // untracked scratch file only, no tracked changes to stash
        fs::write(dest.join("notes.txt"), "scratch").unwrap();
        let new = commit_file(&upstream, "b.txt", "b", 1_000_100);

        assert_eq!(be.pull(&dest).unwrap(), PullOutcome::Updated);
        assert_eq!(be.head_hash(&dest).unwrap(), new.to_string());
        assert_eq!(
            fs::read_to_string(dest.join("notes.txt")).unwrap(),
            "scratch"
        );
    }

    #[test]
    fn remote_state_fails_on_detached_head() {
        let src = tempdir().unwrap();
        let upstream = Repository::init(src.path()).unwrap();
        let first = commit_file(&upstream, "a.txt", "a", 1_000_000);

        let dst = tempdir().unwrap();
        let dest = dst.path().join("node");
        let be = Git2Backend;
        be.clone_repo(
            src.path().to_str().unwrap(),
            &dest,
            Some(&first.to_string()),
        )
        .unwrap();

        assert!(be.remote_state(&dest).is_err());
    }
}
