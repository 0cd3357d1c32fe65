use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use review_warden_core::command::CommandParser;
use review_warden_core::config::GlobalEngineConfig;
use review_warden_core::session::InMemorySessionStore;
use review_warden_core::workspace::WorkspaceManager;
use review_warden_core::ReviewWarden;
use review_warden_developer_platforms::errors::Error;
use review_warden_developer_platforms::models::{
    CommitStatusState, PullRequest, ReviewComment, Webhook,
};
use review_warden_developer_platforms::HostingProvider;
use review_warden_engines::registry::EngineRegistry;

use crate::jobs::JobRunner;
use crate::webhook::{handle_webhook, AppState};

#[derive(Debug, Default)]
struct NullHostingProvider;

#[async_trait]
impl HostingProvider for NullHostingProvider {
    async fn get_pull_request(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        Ok(PullRequest {
            number: pr_number,
            title: "feat: quick change".to_string(),
            body: None,
            author: None,
            head: Default::default(),
            base: Default::default(),
        })
    }

    async fn get_pull_request_diff(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<String, Error> {
        Ok(String::new())
    }

    async fn list_pull_requests(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _state: &str,
    ) -> Result<Vec<PullRequest>, Error> {
        Ok(Vec::new())
    }

    async fn post_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
        _body: &str,
    ) -> Result<u64, Error> {
        Ok(1)
    }

    async fn update_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _comment_id: u64,
        _body: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn create_review(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
        _body: &str,
        _commit_sha: &str,
        _comments: &[ReviewComment],
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn set_commit_status(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _sha: &str,
        _state: CommitStatusState,
        _description: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn list_webhooks(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
    ) -> Result<Vec<Webhook>, Error> {
        Ok(Vec::new())
    }

    async fn create_webhook(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _target_url: &str,
        _secret: Option<&str>,
        _events: &[String],
    ) -> Result<Webhook, Error> {
        Err(Error::InvalidResponse("not supported in tests".to_string()))
    }

    async fn delete_webhook(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _hook_id: u64,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn clone_url(&self, repo_owner: &str, repo_name: &str) -> String {
        format!("file:///nonexistent/{}/{}.git", repo_owner, repo_name)
    }
}

fn app_state(
    webhook_secret: Option<&str>,
    repository_secrets: HashMap<String, String>,
) -> Arc<AppState> {
    let workspaces = WorkspaceManager::new(tempfile::tempdir().unwrap().keep()).unwrap();
    let warden = Arc::new(
        ReviewWarden::new(
            NullHostingProvider,
            EngineRegistry::new(),
            workspaces,
            Arc::new(InMemorySessionStore::new()),
            GlobalEngineConfig::default(),
        )
        .with_diff_only_analysis(),
    );

    Arc::new(AppState {
        runner: JobRunner::start(warden, 2),
        command_parser: CommandParser::new(None),
        webhook_secret: webhook_secret.map(str::to_string),
        repository_secrets,
    })
}

fn pull_request_body(action: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": action,
        "pull_request": {
            "number": 42,
            "title": "feat: add retry logic",
            "body": "Retries transient failures",
            "user": { "id": 7, "login": "developer123" },
            "head": { "ref": "feature/retry", "sha": "aaa111" },
            "base": { "ref": "main", "sha": "bbb222" }
        },
        "repository": {
            "name": "widgets",
            "full_name": "octocat/widgets",
            "owner": { "id": 1, "login": "octocat" }
        }
    }))
    .unwrap()
}

fn issue_comment_body(comment: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "created",
        "comment": {
            "body": comment,
            "user": { "id": 5, "login": "commenter" }
        },
        "issue": {
            "number": 42,
            "pull_request": { "url": "https://git.example.com/pr/42" }
        },
        "repository": {
            "name": "widgets",
            "full_name": "octocat/widgets",
            "owner": { "id": 1, "login": "octocat" }
        }
    }))
    .unwrap()
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn headers_for(event: &str, signature: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("X-Gitea-Event", event.parse().unwrap());
    if let Some(signature) = signature {
        headers.insert("X-Gitea-Signature", signature.parse().unwrap());
    }
    headers
}

#[tokio::test]
async fn test_signed_pull_request_event_is_accepted() {
    let state = app_state(Some("secret"), HashMap::new());
    let body = pull_request_body("opened");
    let mut headers = headers_for("pull_request", Some(&sign("secret", &body)));
    headers.insert("X-Review-Features", "comment,status".parse().unwrap());
    headers.insert("X-Review-Focus", "security".parse().unwrap());

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_bad_signature_is_rejected_without_scheduling() {
    let state = app_state(Some("secret"), HashMap::new());
    let body = pull_request_body("opened");
    let headers = headers_for("pull_request", Some(&sign("wrong-secret", &body)));

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_signature_is_rejected_when_secret_configured() {
    let state = app_state(Some("secret"), HashMap::new());
    let body = pull_request_body("opened");
    let headers = headers_for("pull_request", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsigned_delivery_accepted_without_configured_secret() {
    let state = app_state(None, HashMap::new());
    let body = pull_request_body("opened");
    let headers = headers_for("pull_request", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_repository_secret_takes_precedence() {
    let mut repository_secrets = HashMap::new();
    repository_secrets.insert("octocat/widgets".to_string(), "repo-secret".to_string());
    let state = app_state(Some("global-secret"), repository_secrets);
    let body = pull_request_body("opened");

    // Signed with the repository secret: accepted.
    let headers = headers_for("pull_request", Some(&sign("repo-secret", &body)));
    let response = handle_webhook(State(state.clone()), headers, Bytes::from(body.clone())).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Signed with the global secret: this repository expects its own.
    let headers = headers_for("pull_request", Some(&sign("global-secret", &body)));
    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ignored_pull_request_action_returns_ok() {
    let state = app_state(None, HashMap::new());
    let body = pull_request_body("closed");
    let headers = headers_for("pull_request", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_review_command_comment_is_accepted() {
    let state = app_state(None, HashMap::new());
    let body = issue_comment_body("/review --features comment,status --focus security");
    let headers = headers_for("issue_comment", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_ordinary_comment_returns_ok_without_scheduling() {
    let state = app_state(None, HashMap::new());
    let body = issue_comment_body("Nice work, shipping it!");
    let headers = headers_for("issue_comment", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_event_type_returns_ok() {
    let state = app_state(None, HashMap::new());
    let body = pull_request_body("opened");
    let headers = headers_for("push", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_payload_returns_bad_request() {
    let state = app_state(None, HashMap::new());
    let body: Vec<u8> = b"this is not json".to_vec();
    let headers = headers_for("pull_request", None);

    let response = handle_webhook(State(state), headers, Bytes::from(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
