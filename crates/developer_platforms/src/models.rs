//! # Models
//!
//! Data models shared between the hosting client and the review pipeline.
//!
//! These models represent the entities the review pipeline works with, such
//! as pull requests, commit statuses, and webhooks. They are designed to be
//! serializable and deserializable to facilitate integration with Git
//! hosting REST APIs.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a branch endpoint of a pull request (head or base).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchRef {
    /// The branch name
    #[serde(rename = "ref", default)]
    pub ref_name: String,

    /// The commit SHA the branch points at
    #[serde(default)]
    pub sha: String,
}

/// The state reported to the hosting platform for a commit.
///
/// Maps onto the status values the Gitea commit status API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatusState {
    /// The review is still running
    Pending,

    /// The review completed without significant findings
    Success,

    /// The review completed and found significant issues
    Failure,

    /// The review itself could not complete
    Error,
}

impl CommitStatusState {
    /// The wire representation used by the hosting API.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStatusState::Pending => "pending",
            CommitStatusState::Success => "success",
            CommitStatusState::Failure => "failure",
            CommitStatusState::Error => "error",
        }
    }
}

/// Represents a pull request from a Git hosting platform.
///
/// Contains the information the review pipeline needs for analysis and
/// feedback publication.
///
/// # Examples
///
/// ```
/// use review_warden_developer_platforms::models::{BranchRef, PullRequest};
///
/// let pr = PullRequest {
///     number: 123,
///     title: "feat(auth): add token refresh".to_string(),
///     body: Some("Refreshes expired tokens automatically.".to_string()),
///     author: None,
///     head: BranchRef::default(),
///     base: BranchRef::default(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// The pull request number
    pub number: u64,

    /// The title of the pull request
    #[serde(default)]
    pub title: String,

    /// The description/body of the pull request, if any
    #[serde(default)]
    pub body: Option<String>,

    /// The user that opened the pull request
    #[serde(rename = "user", default)]
    pub author: Option<User>,

    /// The source branch of the pull request
    #[serde(default)]
    pub head: BranchRef,

    /// The target branch of the pull request
    #[serde(default)]
    pub base: BranchRef,
}

/// Represents a repository on the hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// The repository name without the owner prefix
    pub name: String,

    /// The repository name including the owner, e.g. `octocat/hello-world`
    #[serde(default)]
    pub full_name: String,

    /// The owner of the repository
    #[serde(default)]
    pub owner: Option<User>,
}

impl Repository {
    /// The owner login, extracted from `owner` or from `full_name`.
    pub fn owner_login(&self) -> Option<&str> {
        if let Some(owner) = &self.owner {
            return Some(owner.login.as_str());
        }

        self.full_name.split_once('/').map(|(owner, _)| owner)
    }
}

/// An inline comment attached to a pull request review.
///
/// Positions follow the Gitea review API: `new_position` refers to a line on
/// the new side of the diff, `old_position` to a line on the old side. A
/// comment targets at least one of the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewComment {
    /// The file the comment applies to, relative to the repository root
    pub path: String,

    /// The comment text, markdown
    pub body: String,

    /// Line number on the new side of the diff
    #[serde(default)]
    pub new_position: u64,

    /// Line number on the old side of the diff
    #[serde(default)]
    pub old_position: u64,
}

/// Represents a user account on the hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier of the user
    #[serde(default)]
    pub id: u64,

    /// The login name of the user
    #[serde(alias = "username")]
    pub login: String,
}

/// A webhook registered on a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// The unique identifier of the webhook
    pub id: u64,

    /// Whether the webhook currently fires
    #[serde(default)]
    pub active: bool,

    /// The events the webhook subscribes to
    #[serde(default)]
    pub events: Vec<String>,

    /// Delivery configuration, e.g. the target URL
    #[serde(default)]
    pub config: std::collections::HashMap<String, String>,
}
