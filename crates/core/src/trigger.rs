//! Trigger model: one request to review a pull request.
//!
//! Triggers are built by the webhook handler from a verified payload plus
//! header or command-flag overrides, then consumed exactly once by the
//! orchestrator. Their outcome is persisted as a
//! [`crate::session::ReviewSession`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use review_warden_developer_platforms::models::{PullRequest, Repository, User};
use review_warden_engines::FocusArea;

use crate::command::CommandParser;
use crate::config::EngineOverride;

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;

/// Pull request actions that start an automatic review.
const REVIEWABLE_PR_ACTIONS: [&str; 3] = ["opened", "synchronized", "synchronize"];

/// How a review run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Started by a pull request event
    Automatic,

    /// Started by a `/review` command in a comment
    Manual,
}

impl TriggerKind {
    /// The canonical lowercase name, as persisted on sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Automatic => "automatic",
            TriggerKind::Manual => "manual",
        }
    }
}

/// A way review output is written back to the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackChannel {
    /// A summary comment on the pull request
    Comment,

    /// A pull request review with inline comments
    Review,

    /// A commit status on the head commit
    Status,
}

impl FeedbackChannel {
    /// The canonical lowercase name used in headers and command flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackChannel::Comment => "comment",
            FeedbackChannel::Review => "review",
            FeedbackChannel::Status => "status",
        }
    }
}

impl std::str::FromStr for FeedbackChannel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comment" => Ok(FeedbackChannel::Comment),
            "review" => Ok(FeedbackChannel::Review),
            "status" => Ok(FeedbackChannel::Status),
            _ => Err(()),
        }
    }
}

/// Parses a comma-separated feedback channel list.
///
/// Invalid values are dropped rather than treated as fatal. A missing
/// header or an all-invalid list falls back to the default of
/// `{comment}` — the resulting set is never empty.
pub fn parse_feature_list(raw: Option<&str>) -> Vec<FeedbackChannel> {
    let Some(raw) = raw else {
        return vec![FeedbackChannel::Comment];
    };

    let mut channels = Vec::new();
    for part in raw.split(',') {
        if let Ok(channel) = part.parse::<FeedbackChannel>() {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
    }

    if channels.is_empty() {
        return vec![FeedbackChannel::Comment];
    }
    channels
}

/// Parses a comma-separated focus area list.
///
/// Invalid values are dropped. A missing header or an all-invalid list
/// falls back to all four areas — the resulting set is never empty.
pub fn parse_focus_list(raw: Option<&str>) -> Vec<FocusArea> {
    let Some(raw) = raw else {
        return FocusArea::ALL.to_vec();
    };

    let mut areas = Vec::new();
    for part in raw.split(',') {
        if let Ok(area) = part.parse::<FocusArea>() {
            if !areas.contains(&area) {
                areas.push(area);
            }
        }
    }

    if areas.is_empty() {
        return FocusArea::ALL.to_vec();
    }
    areas
}

/// One request to review a pull request.
#[derive(Debug, Clone)]
pub struct ReviewTrigger {
    /// The owner of the repository
    pub repo_owner: String,

    /// The name of the repository
    pub repo_name: String,

    /// The pull request number
    pub pr_number: u64,

    /// How the review was started
    pub kind: TriggerKind,

    /// The actor that caused the trigger, when known
    pub requested_by: Option<String>,

    /// Enabled feedback channels, never empty
    pub channels: Vec<FeedbackChannel>,

    /// Requested focus areas, never empty
    pub focus: Vec<FocusArea>,

    /// Per-call engine override, highest-precedence configuration layer
    pub engine_override: Option<EngineOverride>,
}

impl ReviewTrigger {
    /// The `owner/name` form of the repository identifier.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    /// Builds a trigger from a `pull_request` webhook payload.
    ///
    /// Returns `Ok(None)` for pull request actions that do not start a
    /// review (closing, labeling, and so on).
    ///
    /// # Arguments
    ///
    /// * `payload` - The deserialized webhook payload
    /// * `features_header` - The `X-Review-Features` header value, if sent
    /// * `focus_header` - The `X-Review-Focus` header value, if sent
    pub fn from_pull_request_event(
        payload: &PullRequestEventPayload,
        features_header: Option<&str>,
        focus_header: Option<&str>,
    ) -> Result<Option<Self>, TriggerError> {
        if !REVIEWABLE_PR_ACTIONS.contains(&payload.action.as_str()) {
            return Ok(None);
        }

        let pr = payload
            .pull_request
            .as_ref()
            .ok_or(TriggerError::MissingField("pull_request"))?;
        let repository = payload
            .repository
            .as_ref()
            .ok_or(TriggerError::MissingField("repository"))?;
        let repo_owner = repository
            .owner_login()
            .ok_or(TriggerError::MissingField("repository.owner"))?;

        let requested_by = payload
            .sender
            .as_ref()
            .or(pr.author.as_ref())
            .map(|user| user.login.clone());

        Ok(Some(Self {
            repo_owner: repo_owner.to_string(),
            repo_name: repository.name.clone(),
            pr_number: pr.number,
            kind: TriggerKind::Automatic,
            requested_by,
            channels: parse_feature_list(features_header),
            focus: parse_focus_list(focus_header),
            engine_override: None,
        }))
    }

    /// Builds a trigger from an `issue_comment` webhook payload.
    ///
    /// Returns `Ok(None)` when the comment is not a newly created review
    /// command on a pull request, so ordinary comments are silently
    /// ignored.
    ///
    /// # Arguments
    ///
    /// * `payload` - The deserialized webhook payload
    /// * `parser` - The command parser, configured with the bot username
    pub fn from_issue_comment_event(
        payload: &IssueCommentEventPayload,
        parser: &CommandParser,
    ) -> Result<Option<Self>, TriggerError> {
        if payload.action != "created" {
            return Ok(None);
        }

        let comment = payload
            .comment
            .as_ref()
            .ok_or(TriggerError::MissingField("comment"))?;

        let Some(command) = parser.parse(&comment.body) else {
            return Ok(None);
        };

        let issue = payload
            .issue
            .as_ref()
            .ok_or(TriggerError::MissingField("issue"))?;

        // Commands on plain issues have no diff to review.
        if issue.pull_request.is_none() {
            return Ok(None);
        }

        let repository = payload
            .repository
            .as_ref()
            .ok_or(TriggerError::MissingField("repository"))?;
        let repo_owner = repository
            .owner_login()
            .ok_or(TriggerError::MissingField("repository.owner"))?;

        Ok(Some(Self {
            repo_owner: repo_owner.to_string(),
            repo_name: repository.name.clone(),
            pr_number: issue.number,
            kind: TriggerKind::Manual,
            requested_by: comment.user.as_ref().map(|user| user.login.clone()),
            channels: command.channels,
            focus: command.focus,
            engine_override: None,
        }))
    }
}

/// A `pull_request` webhook payload, reduced to the fields the pipeline
/// reads.
#[derive(Debug, Deserialize)]
pub struct PullRequestEventPayload {
    /// The action that produced the event, e.g. `opened`
    pub action: String,

    /// The pull request the event concerns
    pub pull_request: Option<PullRequest>,

    /// The repository the event concerns
    pub repository: Option<Repository>,

    /// The user that caused the event
    #[serde(default)]
    pub sender: Option<User>,
}

/// An `issue_comment` webhook payload, reduced to the fields the pipeline
/// reads.
#[derive(Debug, Deserialize)]
pub struct IssueCommentEventPayload {
    /// The action that produced the event, e.g. `created`
    pub action: String,

    /// The comment the event concerns
    pub comment: Option<CommentPayload>,

    /// The issue (or pull request) the comment was made on
    pub issue: Option<IssuePayload>,

    /// The repository the event concerns
    pub repository: Option<Repository>,
}

/// The comment portion of an `issue_comment` payload.
#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    /// The comment text
    #[serde(default)]
    pub body: String,

    /// The comment author
    #[serde(default)]
    pub user: Option<User>,
}

/// The issue portion of an `issue_comment` payload.
#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    /// The issue or pull request number
    pub number: u64,

    /// Present when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

/// Errors raised while building a trigger from a webhook payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    /// The payload lacks a field the trigger needs.
    #[error("Webhook payload is missing the '{0}' field")]
    MissingField(&'static str),
}
