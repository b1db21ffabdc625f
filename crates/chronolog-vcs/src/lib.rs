#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **chronolog-vcs** – Versioned working copy for the chronolog store.
//!
//! A narrow facade over a git remote: [`transaction`] mirrors the remote into
//! a local working tree, runs a body against a [`Session`], and pushes the
//! result back; [`synchronize`] refreshes the mirror for read-only callers.
//! The backend is the system `git` binary driven through `tokio::process`,
//! each invocation awaited and its stderr captured into the error.
//!
//! Concurrency contract: one transaction at a time per working directory.
//! Concurrent attempts surface as git failures (index locks, non-fast-forward
//! pushes); this layer never queues.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Committer identity used for store commits, so the engine works in
/// environments without a global git configuration.
const COMMITTER_NAME: &str = "chronolog";
const COMMITTER_EMAIL: &str = "chronolog@localhost";

/// Errors surfaced by the working-copy layer.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The remote repository could not be cloned or reached.
    #[error("repository '{}' is unavailable: {reason}", remote.display())]
    RepositoryUnavailable {
        /// The remote that was addressed.
        remote: PathBuf,
        /// What git reported.
        reason: String,
    },

    /// Staging or committing the working tree failed.
    #[error("commit failed: {reason}")]
    CommitFailed {
        /// What git reported.
        reason: String,
    },

    /// Pushing to the remote failed; local state is retained.
    #[error("push failed: {reason}")]
    PushFailed {
        /// What git reported.
        reason: String,
    },

    /// Any other git invocation failed.
    #[error("git {op} failed: {reason}")]
    GitFailed {
        /// The git subcommand that failed.
        op: &'static str,
        /// What git reported.
        reason: String,
    },
}

/// A working-copy session scoped to one [`transaction`].
///
/// The session exposes the working tree root and an idempotent commit
/// operation; push and rollback are owned by the surrounding transaction.
#[derive(Debug, Clone)]
pub struct Session {
    work_tree: PathBuf,
    committed: Arc<AtomicBool>,
}

impl Session {
    /// Root path of the working tree.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Stage everything in the working tree and commit it with `message`.
    ///
    /// When nothing is staged, no commit is produced and no error is raised.
    pub async fn commit(&self, message: &str) -> Result<(), VcsError> {
        git(&self.work_tree, "add", &["add", "-A"])
            .await
            .map_err(commit_failed)?;

        let status = git(&self.work_tree, "status", &["status", "--porcelain"])
            .await
            .map_err(commit_failed)?;
        if status.trim().is_empty() {
            debug!(work_tree = %self.work_tree.display(), "work tree clean, nothing to commit");
            return Ok(());
        }

        let user_name = format!("user.name={COMMITTER_NAME}");
        let user_email = format!("user.email={COMMITTER_EMAIL}");
        git(
            &self.work_tree,
            "commit",
            &["-c", &user_name, "-c", &user_email, "commit", "-m", message],
        )
        .await
        .map_err(commit_failed)?;

        self.committed.store(true, Ordering::SeqCst);
        debug!(message, "created commit");
        Ok(())
    }
}

/// Run `body` against a working copy of `remote` mirrored at `working`.
///
/// On entry the working directory is cloned if absent and fast-forwarded to
/// the latest remote state otherwise. On normal exit any commits the body
/// produced are pushed. On exceptional exit uncommitted changes are discarded
/// (best effort), nothing is pushed, and the body's error is re-raised
/// unchanged.
pub async fn transaction<F, Fut, T>(remote: &Path, working: &Path, body: F) -> anyhow::Result<T>
where
    F: FnOnce(Session) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<T>> + Send,
    T: Send,
{
    ensure_working_copy(remote, working).await?;

    let committed = Arc::new(AtomicBool::new(false));
    let session = Session {
        work_tree: working.to_path_buf(),
        committed: committed.clone(),
    };

    match body(session).await {
        Ok(value) => {
            if committed.load(Ordering::SeqCst) {
                // --set-upstream so a mirror born from an empty remote can
                // fast-forward on the next transaction.
                git(working, "push", &["push", "--set-upstream", "origin", "HEAD"])
                    .await
                    .map_err(|e| VcsError::PushFailed {
                        reason: reason_of(e),
                    })?;
                debug!(working = %working.display(), "pushed to remote");
            }
            Ok(value)
        }
        Err(err) => {
            discard_uncommitted(working).await;
            Err(err)
        }
    }
}

/// Fast-forward the working copy at `working` from `remote`, cloning first if
/// the mirror does not exist yet. For callers that read without mutating.
pub async fn synchronize(remote: &Path, working: &Path) -> Result<(), VcsError> {
    ensure_working_copy(remote, working).await
}

async fn ensure_working_copy(remote: &Path, working: &Path) -> Result<(), VcsError> {
    if !working.join(".git").is_dir() {
        if let Some(parent) = working.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VcsError::RepositoryUnavailable {
                    remote: remote.to_path_buf(),
                    reason: format!("cannot create '{}': {e}", parent.display()),
                })?;
        }

        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(remote).arg(working);
        run(cmd, "clone")
            .await
            .map_err(|e| VcsError::RepositoryUnavailable {
                remote: remote.to_path_buf(),
                reason: reason_of(e),
            })?;
        info!(remote = %remote.display(), working = %working.display(), "cloned repository");
        return Ok(());
    }

    // A freshly initialized remote has no heads yet; there is nothing to
    // fast-forward and `git pull` would fail, so check first.
    let heads = git(working, "ls-remote", &["ls-remote", "--heads", "origin"])
        .await
        .map_err(|e| VcsError::RepositoryUnavailable {
            remote: remote.to_path_buf(),
            reason: reason_of(e),
        })?;
    if !heads.trim().is_empty() {
        // Name the remote head explicitly: a mirror cloned while the remote
        // was still empty has an unborn branch with no upstream to pull.
        git(working, "pull", &["pull", "--ff-only", "origin", "HEAD"]).await?;
        debug!(working = %working.display(), "fast-forwarded from remote");
    }
    Ok(())
}

/// Best-effort rollback of uncommitted working-tree state. Failures are
/// logged and swallowed so they never mask the error that got us here.
async fn discard_uncommitted(working: &Path) {
    if git(working, "rev-parse", &["rev-parse", "--verify", "HEAD"])
        .await
        .is_ok()
    {
        if let Err(e) = git(working, "reset", &["reset", "--hard", "HEAD"]).await {
            warn!(error = %e, "failed to reset working tree during rollback");
        }
    }
    if let Err(e) = git(working, "clean", &["clean", "-fd"]).await {
        warn!(error = %e, "failed to clean working tree during rollback");
    }
}

async fn git(work_tree: &Path, op: &'static str, args: &[&str]) -> Result<String, VcsError> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(work_tree);
    run(cmd, op).await
}

async fn run(mut cmd: Command, op: &'static str) -> Result<String, VcsError> {
    let output = cmd.output().await.map_err(|e| VcsError::GitFailed {
        op,
        reason: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(VcsError::GitFailed {
            op,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn commit_failed(err: VcsError) -> VcsError {
    VcsError::CommitFailed {
        reason: reason_of(err),
    }
}

fn reason_of(err: VcsError) -> String {
    match err {
        VcsError::GitFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}
