use std::sync::Arc;

use async_trait::async_trait;

pub mod errors;

pub mod gitea;

pub mod models;
use errors::Error;
use models::{CommitStatusState, PullRequest, ReviewComment, Webhook};

/// Trait for interacting with Git hosting platforms that provide pull
/// requests (e.g., Gitea, Forgejo).
///
/// This is a capability facade: it exposes exactly the operations the review
/// pipeline needs, not the full REST surface of any particular platform.
/// Implementations provide diff retrieval, feedback publication, and webhook
/// management.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use review_warden_developer_platforms::{HostingProvider, errors::Error, models::PullRequest};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct MyProvider {
///     token: String,
/// }
///
/// #[async_trait]
/// impl HostingProvider for MyProvider {
///     async fn get_pull_request(
///         &self,
///         repo_owner: &str,
///         repo_name: &str,
///         pr_number: u64,
///     ) -> Result<PullRequest, Error> {
///         // Implementation to fetch the PR from the hosting API
///         // ...
///         # unimplemented!()
///     }
///
///     // Implement other required methods...
///     # async fn get_pull_request_diff(&self, _: &str, _: &str, _: u64) -> Result<String, Error> { unimplemented!() }
///     # async fn list_pull_requests(&self, _: &str, _: &str, _: &str) -> Result<Vec<PullRequest>, Error> { unimplemented!() }
///     # async fn post_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<u64, Error> { unimplemented!() }
///     # async fn update_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<(), Error> { unimplemented!() }
///     # async fn create_review(&self, _: &str, _: &str, _: u64, _: &str, _: &str, _: &[review_warden_developer_platforms::models::ReviewComment]) -> Result<(), Error> { unimplemented!() }
///     # async fn set_commit_status(&self, _: &str, _: &str, _: &str, _: review_warden_developer_platforms::models::CommitStatusState, _: &str) -> Result<(), Error> { unimplemented!() }
///     # async fn list_webhooks(&self, _: &str, _: &str) -> Result<Vec<review_warden_developer_platforms::models::Webhook>, Error> { unimplemented!() }
///     # async fn create_webhook(&self, _: &str, _: &str, _: &str, _: Option<&str>, _: &[String]) -> Result<review_warden_developer_platforms::models::Webhook, Error> { unimplemented!() }
///     # async fn delete_webhook(&self, _: &str, _: &str, _: u64) -> Result<(), Error> { unimplemented!() }
///     # fn clone_url(&self, _: &str, _: &str) -> String { unimplemented!() }
/// }
/// ```
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Retrieves a pull request from the hosting platform.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    ///
    /// # Returns
    ///
    /// A `Result` containing the pull request information
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error>;

    /// Retrieves the unified diff of a pull request as text.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    ///
    /// # Returns
    ///
    /// A `Result` containing the raw diff. An empty string means the pull
    /// request contains no changes.
    async fn get_pull_request_diff(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<String, Error>;

    /// Lists pull requests on a repository.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `state` - Filter by state: `open`, `closed` or `all`
    ///
    /// # Returns
    ///
    /// A `Result` containing the matching pull requests
    async fn list_pull_requests(
        &self,
        repo_owner: &str,
        repo_name: &str,
        state: &str,
    ) -> Result<Vec<PullRequest>, Error>;

    /// Posts a comment on a pull request.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    /// * `body` - The comment text, markdown
    ///
    /// # Returns
    ///
    /// A `Result` containing the identifier of the created comment
    async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, Error>;

    /// Replaces the body of an existing comment.
    ///
    /// Used to turn the "review in progress" placeholder into the final
    /// report without creating a second comment.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `comment_id` - The identifier of the comment to update
    /// * `body` - The new comment text, markdown
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure
    async fn update_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), Error>;

    /// Creates a pull request review with optional inline comments.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    /// * `body` - The review summary, markdown
    /// * `commit_sha` - The commit the inline comments anchor to
    /// * `comments` - Inline comments attached to the review
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure
    async fn create_review(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
        commit_sha: &str,
        comments: &[ReviewComment],
    ) -> Result<(), Error>;

    /// Sets the status of a commit.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `sha` - The commit SHA to attach the status to
    /// * `state` - The status state to report
    /// * `description` - A short human-readable description
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure
    async fn set_commit_status(
        &self,
        repo_owner: &str,
        repo_name: &str,
        sha: &str,
        state: CommitStatusState,
        description: &str,
    ) -> Result<(), Error>;

    /// Lists the webhooks registered on a repository.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    ///
    /// # Returns
    ///
    /// A `Result` containing the registered webhooks
    async fn list_webhooks(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<Webhook>, Error>;

    /// Registers a webhook on a repository.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `target_url` - The URL the platform delivers events to
    /// * `secret` - Optional HMAC secret for payload signing
    /// * `events` - The event names to subscribe to
    ///
    /// # Returns
    ///
    /// A `Result` containing the created webhook
    async fn create_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        target_url: &str,
        secret: Option<&str>,
        events: &[String],
    ) -> Result<Webhook, Error>;

    /// Removes a webhook from a repository.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `hook_id` - The identifier of the webhook to remove
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure
    async fn delete_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        hook_id: u64,
    ) -> Result<(), Error>;

    /// Builds an authenticated clone URL for a repository.
    ///
    /// The returned URL embeds credentials and must never be logged
    /// verbatim.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    fn clone_url(&self, repo_owner: &str, repo_name: &str) -> String;
}

// Shared ownership of a provider is itself a provider: the server hands one
// client to the webhook surface and the background jobs.
#[async_trait]
impl<T: HostingProvider + ?Sized> HostingProvider for Arc<T> {
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        (**self).get_pull_request(repo_owner, repo_name, pr_number).await
    }

    async fn get_pull_request_diff(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<String, Error> {
        (**self)
            .get_pull_request_diff(repo_owner, repo_name, pr_number)
            .await
    }

    async fn list_pull_requests(
        &self,
        repo_owner: &str,
        repo_name: &str,
        state: &str,
    ) -> Result<Vec<PullRequest>, Error> {
        (**self).list_pull_requests(repo_owner, repo_name, state).await
    }

    async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, Error> {
        (**self)
            .post_comment(repo_owner, repo_name, pr_number, body)
            .await
    }

    async fn update_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), Error> {
        (**self)
            .update_comment(repo_owner, repo_name, comment_id, body)
            .await
    }

    async fn create_review(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
        commit_sha: &str,
        comments: &[ReviewComment],
    ) -> Result<(), Error> {
        (**self)
            .create_review(repo_owner, repo_name, pr_number, body, commit_sha, comments)
            .await
    }

    async fn set_commit_status(
        &self,
        repo_owner: &str,
        repo_name: &str,
        sha: &str,
        state: CommitStatusState,
        description: &str,
    ) -> Result<(), Error> {
        (**self)
            .set_commit_status(repo_owner, repo_name, sha, state, description)
            .await
    }

    async fn list_webhooks(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<Webhook>, Error> {
        (**self).list_webhooks(repo_owner, repo_name).await
    }

    async fn create_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        target_url: &str,
        secret: Option<&str>,
        events: &[String],
    ) -> Result<Webhook, Error> {
        (**self)
            .create_webhook(repo_owner, repo_name, target_url, secret, events)
            .await
    }

    async fn delete_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        hook_id: u64,
    ) -> Result<(), Error> {
        (**self).delete_webhook(repo_owner, repo_name, hook_id).await
    }

    fn clone_url(&self, repo_owner: &str, repo_name: &str) -> String {
        (**self).clone_url(repo_owner, repo_name)
    }
}
