//! Gitea implementation of the [`HostingProvider`] capability facade.
//!
//! Wraps the subset of the Gitea REST API (`/api/v1`) that the review
//! pipeline needs. Everything else the API offers is intentionally not
//! exposed here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::{
    errors::Error,
    models::{CommitStatusState, PullRequest, ReviewComment, Webhook},
    HostingProvider,
};

#[cfg(test)]
#[path = "gitea_tests.rs"]
mod tests;

/// Request timeout for hosting API calls. These are expected to be fast;
/// long-running work belongs to the analysis engines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of a response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// The status context reported on commits reviewed by this service.
const STATUS_CONTEXT: &str = "review-warden";

#[derive(Debug, Deserialize)]
struct CommentResponse {
    id: u64,
}

/// A [`HostingProvider`] backed by the Gitea REST API.
///
/// # Examples
///
/// ```rust,no_run
/// use review_warden_developer_platforms::gitea::GiteaProvider;
///
/// let provider = GiteaProvider::new("https://git.example.com", "access-token").unwrap();
/// ```
#[derive(Clone)]
pub struct GiteaProvider {
    client: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for GiteaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiteaProvider")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GiteaProvider {
    /// Creates a provider for the Gitea instance at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The root URL of the Gitea instance, without `/api/v1`
    /// * `token` - A personal access token with repository scope
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] when `base_url` is not a valid URL
    /// and [`Error::NetworkError`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::InvalidResponse(format!("invalid base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.api_url(path))
            .header("Authorization", format!("token {}", self.token))
    }

    /// Sends a GET request, retrying once on a transient network failure.
    ///
    /// Only safe for idempotent reads; mutating calls go out exactly once.
    async fn get_with_retry(&self, path: &str) -> Result<Response, Error> {
        let first = self.send(self.request(Method::GET, path)).await;
        match first {
            Err(Error::NetworkError(e)) => {
                warn!(path, error = e, "Hosting API read failed, retrying once");
                self.send(self.request(Method::GET, path)).await
            }
            other => other,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::AuthError(format!(
                "hosting API rejected the access token (status {})",
                status.as_u16()
            )));
        }

        let message = response.text().await.unwrap_or_default();
        let message = if message.len() > MAX_ERROR_BODY {
            format!("{}...", &message[..MAX_ERROR_BODY])
        } else {
            message
        };

        Err(Error::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, Error> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl HostingProvider for GiteaProvider {
    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        let path = format!("repos/{}/{}/pulls/{}", repo_owner, repo_name, pr_number);
        let response = self.get_with_retry(&path).await?;
        Self::parse_json(response).await
    }

    #[instrument(skip(self))]
    async fn get_pull_request_diff(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<String, Error> {
        let path = format!("repos/{}/{}/pulls/{}.diff", repo_owner, repo_name, pr_number);
        let response = self.get_with_retry(&path).await?;
        let diff = response
            .text()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            diff_bytes = diff.len(),
            "Fetched pull request diff"
        );

        Ok(diff)
    }

    #[instrument(skip(self))]
    async fn list_pull_requests(
        &self,
        repo_owner: &str,
        repo_name: &str,
        state: &str,
    ) -> Result<Vec<PullRequest>, Error> {
        let path = format!("repos/{}/{}/pulls?state={}", repo_owner, repo_name, state);
        let response = self.get_with_retry(&path).await?;
        Self::parse_json(response).await
    }

    #[instrument(skip(self, body))]
    async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, Error> {
        let path = format!(
            "repos/{}/{}/issues/{}/comments",
            repo_owner, repo_name, pr_number
        );
        let request = self
            .request(Method::POST, &path)
            .json(&json!({ "body": body }));
        let response = self.send(request).await?;
        let comment: CommentResponse = Self::parse_json(response).await?;

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            comment_id = comment.id,
            "Posted pull request comment"
        );

        Ok(comment.id)
    }

    #[instrument(skip(self, body))]
    async fn update_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), Error> {
        let path = format!(
            "repos/{}/{}/issues/comments/{}",
            repo_owner, repo_name, comment_id
        );
        let request = self
            .request(Method::PATCH, &path)
            .json(&json!({ "body": body }));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, body, comments))]
    async fn create_review(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
        body: &str,
        commit_sha: &str,
        comments: &[ReviewComment],
    ) -> Result<(), Error> {
        let path = format!(
            "repos/{}/{}/pulls/{}/reviews",
            repo_owner, repo_name, pr_number
        );

        let mut payload = json!({
            "body": body,
            "event": "COMMENT",
        });
        if !commit_sha.is_empty() {
            payload["commit_id"] = json!(commit_sha);
        }
        if !comments.is_empty() {
            payload["comments"] = json!(comments);
        }

        let request = self.request(Method::POST, &path).json(&payload);
        self.send(request).await?;

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            inline_comments = comments.len(),
            "Created pull request review"
        );

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_commit_status(
        &self,
        repo_owner: &str,
        repo_name: &str,
        sha: &str,
        state: CommitStatusState,
        description: &str,
    ) -> Result<(), Error> {
        let path = format!("repos/{}/{}/statuses/{}", repo_owner, repo_name, sha);
        let request = self.request(Method::POST, &path).json(&json!({
            "state": state.as_str(),
            "description": description,
            "context": STATUS_CONTEXT,
        }));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_webhooks(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<Webhook>, Error> {
        let path = format!("repos/{}/{}/hooks", repo_owner, repo_name);
        let response = self.get_with_retry(&path).await?;
        Self::parse_json(response).await
    }

    #[instrument(skip(self, secret))]
    async fn create_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        target_url: &str,
        secret: Option<&str>,
        events: &[String],
    ) -> Result<Webhook, Error> {
        let path = format!("repos/{}/{}/hooks", repo_owner, repo_name);

        let mut config = json!({
            "url": target_url,
            "content_type": "json",
        });
        if let Some(secret) = secret {
            config["secret"] = json!(secret);
        }

        let request = self.request(Method::POST, &path).json(&json!({
            "type": "gitea",
            "active": true,
            "events": events,
            "config": config,
        }));
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    #[instrument(skip(self))]
    async fn delete_webhook(
        &self,
        repo_owner: &str,
        repo_name: &str,
        hook_id: u64,
    ) -> Result<(), Error> {
        let path = format!("repos/{}/{}/hooks/{}", repo_owner, repo_name, hook_id);
        let request = self.request(Method::DELETE, &path);
        self.send(request).await?;
        Ok(())
    }

    fn clone_url(&self, repo_owner: &str, repo_name: &str) -> String {
        let host = self.base_url.authority();
        format!(
            "{}://{}@{}/{}/{}.git",
            self.base_url.scheme(),
            urlencoding::encode(&self.token),
            host,
            repo_owner,
            repo_name
        )
    }
}
