//! Disposable repository checkouts for full-context analysis.
//!
//! Each review run acquires its own workspace: a unique directory under the
//! configured work root holding a clone of the pull request's head branch.
//! Concurrent runs never collide because every acquisition gets a fresh
//! directory with a random suffix. Releasing a workspace removes the
//! directory; dropping an unreleased workspace removes it as well, so no
//! exit path leaks a checkout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::errors::WorkspaceError;

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;

/// Default time budget for a clone.
const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum length of a git error message kept on a [`WorkspaceError`].
const MAX_GIT_ERROR_LENGTH: usize = 500;

/// Creates and removes review workspaces under a shared work root.
///
/// The work root is shared across concurrent jobs but subdivided by unique
/// sub-paths, so no locking is needed between jobs.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    work_root: PathBuf,
    shallow: bool,
    clone_timeout: Duration,
}

impl WorkspaceManager {
    /// Creates a manager rooted at `work_root`, creating the directory if
    /// needed.
    pub fn new(work_root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let work_root = work_root.into();
        std::fs::create_dir_all(&work_root)?;

        Ok(Self {
            work_root,
            shallow: true,
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
        })
    }

    /// Overrides the clone time budget.
    pub fn with_clone_timeout(mut self, clone_timeout: Duration) -> Self {
        self.clone_timeout = clone_timeout;
        self
    }

    /// Switches from shallow to full-history clones.
    pub fn with_full_clone(mut self) -> Self {
        self.shallow = false;
        self
    }

    /// Clones `branch` of the repository into a fresh workspace.
    ///
    /// # Arguments
    ///
    /// * `clone_url` - Clone URL, possibly with embedded credentials. The
    ///   credentials are scrubbed from any error this call produces.
    /// * `branch` - The branch to check out; empty means the default branch
    /// * `repo_owner` - The owner of the repository, used in the directory
    ///   name
    /// * `repo_name` - The name of the repository, used in the directory
    ///   name
    /// * `pr_number` - The pull request number, used in the directory name
    ///
    /// # Errors
    ///
    /// [`WorkspaceError::CloneFailed`] when git exits non-zero,
    /// [`WorkspaceError::DiskSpace`] when the work root is out of capacity,
    /// [`WorkspaceError::Timeout`] when the clone exceeds the time budget.
    #[instrument(skip(self, clone_url))]
    pub async fn acquire(
        &self,
        clone_url: &str,
        branch: &str,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Workspace, WorkspaceError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_{}_pr{}_", repo_owner, repo_name, pr_number))
            .tempdir_in(&self.work_root)?;
        let checkout = dir.path().join("checkout");

        let mut command = Command::new("git");
        command.arg("clone");
        if self.shallow {
            command.arg("--depth=1").arg("--single-branch");
        }
        if !branch.is_empty() {
            command.arg("--branch").arg(branch);
        }
        command
            .arg(clone_url)
            .arg(&checkout)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            branch,
            shallow = self.shallow,
            "Cloning repository into workspace"
        );

        let child = command
            .spawn()
            .map_err(|e| WorkspaceError::GitUnavailable(e.to_string()))?;

        // Dropping `dir` on any early return below removes the directory.
        let output = timeout(self.clone_timeout, child.wait_with_output())
            .await
            .map_err(|_| WorkspaceError::Timeout(self.clone_timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = scrub_clone_url(&stderr, clone_url);

            if stderr.contains("No space left on device") {
                return Err(WorkspaceError::DiskSpace(message));
            }
            return Err(WorkspaceError::CloneFailed(message));
        }

        info!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            path = %checkout.display(),
            "Workspace ready"
        );

        Ok(Workspace {
            dir,
            checkout,
            repository: format!("{}/{}", repo_owner, repo_name),
            branch: branch.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// An isolated on-disk checkout of a repository.
///
/// Owned exclusively by one review run. The backing directory is removed
/// on [`Workspace::close`] and, as a backstop, when the value is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    checkout: PathBuf,

    /// Repository in `owner/name` form
    pub repository: String,

    /// The branch that was checked out
    pub branch: String,

    /// When the workspace was created
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    /// Path of the checked-out repository.
    pub fn path(&self) -> &Path {
        &self.checkout
    }

    /// Root directory of the workspace, containing the checkout.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the workspace directory.
    pub fn close(self) -> Result<(), WorkspaceError> {
        debug!(repository = self.repository.as_str(), "Releasing workspace");
        self.dir.close().map_err(WorkspaceError::from)
    }
}

/// Removes embedded clone credentials from a git error message.
///
/// Git echoes the clone URL, including its userinfo part, into error
/// output. The userinfo is replaced wherever it appears and the message is
/// bounded in length.
fn scrub_clone_url(message: &str, clone_url: &str) -> String {
    let mut scrubbed = message.trim().to_string();

    if let Some(userinfo) = extract_userinfo(clone_url) {
        scrubbed = scrubbed.replace(userinfo, "[REDACTED]");
    }

    if scrubbed.len() > MAX_GIT_ERROR_LENGTH {
        let mut end = MAX_GIT_ERROR_LENGTH;
        while end > 0 && !scrubbed.is_char_boundary(end) {
            end -= 1;
        }
        scrubbed.truncate(end);
        scrubbed.push_str("...");
    }

    scrubbed
}

/// The userinfo portion of a URL, e.g. `token` in
/// `https://token@host/path`.
fn extract_userinfo(url: &str) -> Option<&str> {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest)?;
    let authority = after_scheme.split(['/', '?']).next()?;
    authority.rsplit_once('@').map(|(userinfo, _)| userinfo)
}
