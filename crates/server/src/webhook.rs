//! The inbound webhook surface.
//!
//! `POST /webhook` verifies the payload signature, classifies the event,
//! builds a [`ReviewTrigger`], and hands it to the job runner. The sender
//! always gets an immediate answer: `202` when a job was scheduled, `200`
//! when the event needs no action, `401` on a bad signature, `400` on a
//! payload the pipeline cannot read.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use review_warden_core::command::CommandParser;
use review_warden_core::trigger::{
    IssueCommentEventPayload, PullRequestEventPayload, ReviewTrigger,
};

use crate::errors::ScheduleError;
use crate::jobs::JobRunner;
use crate::signature::verify_signature;

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;

/// Header carrying the payload signature.
const SIGNATURE_HEADER: &str = "X-Gitea-Signature";

/// Header carrying the event type.
const EVENT_HEADER: &str = "X-Gitea-Event";

/// Header overriding the feedback channels for this delivery.
const FEATURES_HEADER: &str = "X-Review-Features";

/// Header overriding the focus areas for this delivery.
const FOCUS_HEADER: &str = "X-Review-Focus";

/// State shared by the webhook handlers.
pub struct AppState {
    /// The background job runner
    pub runner: JobRunner,

    /// Parser for manual review commands
    pub command_parser: CommandParser,

    /// Global webhook secret; `None` plus no repository secret means the
    /// endpoint accepts unsigned deliveries
    pub webhook_secret: Option<String>,

    /// Per-repository webhook secrets, keyed by `owner/name`
    pub repository_secrets: HashMap<String, String>,
}

impl AppState {
    fn secret_for(&self, repository: Option<&str>) -> Option<&str> {
        repository
            .and_then(|key| self.repository_secrets.get(key))
            .map(String::as_str)
            .or(self.webhook_secret.as_deref())
    }
}

/// The fields peeked out of a payload before full parsing, to pick the
/// right webhook secret.
#[derive(Debug, Deserialize)]
struct RepositoryPeek {
    repository: Option<PeekedRepository>,
}

#[derive(Debug, Deserialize)]
struct PeekedRepository {
    #[serde(default)]
    full_name: String,
}

/// `GET /health`
pub async fn handle_health() -> StatusCode {
    StatusCode::OK
}

/// `POST /webhook`
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // The secret can differ per repository, so the repository name is
    // peeked out of the body before the signature check. The signature is
    // still computed over the raw bytes.
    let repository = serde_json::from_slice::<RepositoryPeek>(&body)
        .ok()
        .and_then(|peek| peek.repository)
        .map(|repo| repo.full_name)
        .filter(|name| !name.is_empty());

    match state.secret_for(repository.as_deref()) {
        Some(secret) => {
            let provided = header_str(&headers, SIGNATURE_HEADER).unwrap_or("");
            if !verify_signature(secret, &body, provided) {
                warn!(
                    repository = repository.as_deref().unwrap_or("<unknown>"),
                    "Webhook signature verification failed"
                );
                return message_response(StatusCode::UNAUTHORIZED, "Invalid signature");
            }
        }
        // Accept-all mode: explicitly chosen by leaving every secret unset.
        None => debug!("No webhook secret configured, accepting unsigned delivery"),
    }

    let event = header_str(&headers, EVENT_HEADER).unwrap_or("");
    match event {
        "pull_request" => handle_pull_request_event(&state, &headers, &body),
        "issue_comment" => handle_issue_comment_event(&state, &body),
        other => {
            info!(event = other, "Ignoring event");
            message_response(StatusCode::OK, "Event ignored")
        }
    }
}

fn handle_pull_request_event(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    let payload: PullRequestEventPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed pull_request payload");
            return message_response(StatusCode::BAD_REQUEST, "Malformed payload");
        }
    };

    let features = header_str(headers, FEATURES_HEADER);
    let focus = header_str(headers, FOCUS_HEADER);

    match ReviewTrigger::from_pull_request_event(&payload, features, focus) {
        Ok(Some(trigger)) => schedule(state, trigger),
        Ok(None) => {
            info!(action = payload.action.as_str(), "Pull request action needs no review");
            message_response(StatusCode::OK, "Event ignored")
        }
        Err(e) => {
            warn!(error = %e, "Unusable pull_request payload");
            message_response(StatusCode::BAD_REQUEST, "Malformed payload")
        }
    }
}

fn handle_issue_comment_event(state: &AppState, body: &Bytes) -> Response {
    let payload: IssueCommentEventPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed issue_comment payload");
            return message_response(StatusCode::BAD_REQUEST, "Malformed payload");
        }
    };

    match ReviewTrigger::from_issue_comment_event(&payload, &state.command_parser) {
        Ok(Some(trigger)) => schedule(state, trigger),
        // Ordinary comments are not errors; answer 200 and move on.
        Ok(None) => message_response(StatusCode::OK, "No command found"),
        Err(e) => {
            warn!(error = %e, "Unusable issue_comment payload");
            message_response(StatusCode::BAD_REQUEST, "Malformed payload")
        }
    }
}

fn schedule(state: &AppState, trigger: ReviewTrigger) -> Response {
    let repository = trigger.repository();
    let pr_number = trigger.pr_number;

    match state.runner.schedule(trigger) {
        Ok(()) => {
            info!(
                repository,
                pull_request = pr_number,
                "Review scheduled"
            );
            message_response(
                StatusCode::ACCEPTED,
                "Webhook received, review scheduled in the background",
            )
        }
        Err(ScheduleError::QueueFull) => {
            warn!(repository, pull_request = pr_number, "Review job queue is full");
            message_response(StatusCode::SERVICE_UNAVAILABLE, "Review queue is full")
        }
        Err(ScheduleError::ShuttingDown) => {
            warn!(repository, pull_request = pr_number, "Runner is shutting down");
            message_response(StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down")
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
