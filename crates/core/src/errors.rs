use thiserror::Error;

/// Errors raised while acquiring or releasing a review workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// `git clone` exited with a non-zero status.
    ///
    /// The message is scrubbed of embedded credentials before it is stored.
    #[error("Failed to clone the repository: {0}")]
    CloneFailed(String),

    /// The work root has no capacity left for another checkout.
    #[error("The work root is out of disk space: {0}")]
    DiskSpace(String),

    /// The `git` executable could not be started.
    #[error("Git is not available: {0}")]
    GitUnavailable(String),

    /// The clone did not finish within the configured time budget.
    #[error("Clone timed out after {0} seconds")]
    Timeout(u64),

    /// Filesystem failure while creating or removing a workspace.
    #[error("Workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`crate::session::SessionStore`] backend.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The backing store rejected the operation.
    #[error("Session store failure: {0}")]
    Backend(String),
}
