//! Persisted audit record for one review run.
//!
//! A session is created when a background job starts, mutated by the
//! orchestrator as phases complete, and becomes immutable once it is
//! finished. Exactly one job owns a session from creation to completion;
//! the store only ever sees snapshots.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use review_warden_engines::{FocusArea, InlineComment};

use crate::config::ConfigSource;
use crate::errors::SessionStoreError;
use crate::trigger::{FeedbackChannel, ReviewTrigger, TriggerKind};

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

/// Whether a run analyzed the full checkout or only the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Analysis ran inside a repository checkout
    Full,

    /// Analysis ran on the diff text alone
    DiffOnly,
}

impl AnalysisMode {
    /// The canonical name, as persisted on sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Full => "full",
            AnalysisMode::DiffOnly => "diff_only",
        }
    }
}

/// The audit record of one review run.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSession {
    /// Unique identifier of the run
    pub id: String,

    /// Repository in `owner/name` form
    pub repository: String,

    /// The reviewed pull request number
    pub pr_number: u64,

    /// Title of the pull request, once fetched
    pub pr_title: Option<String>,

    /// Author of the pull request, once fetched
    pub pr_author: Option<String>,

    /// How the run was started
    pub trigger: TriggerKind,

    /// The engine selected for the run
    pub engine: String,

    /// The model that produced the result, when known
    pub model: Option<String>,

    /// Which configuration layer supplied the engine
    pub config_source: ConfigSource,

    /// The feedback channels enabled for the run
    pub channels: Vec<FeedbackChannel>,

    /// The focus areas requested for the run
    pub focus: Vec<FocusArea>,

    /// Whether the run analyzed a checkout or only the diff
    pub analysis_mode: Option<AnalysisMode>,

    /// Size of the fetched diff in bytes
    pub diff_size_bytes: usize,

    /// Number of inline comments the engine produced
    pub inline_comment_count: usize,

    /// The inline comments themselves, persisted as child records
    pub inline_comments: Vec<InlineComment>,

    /// Overall outcome; `None` while the run is still in flight
    pub success: Option<bool>,

    /// Why the run failed, redacted
    pub error_message: Option<String>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished; set exactly once
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Creates the session for a trigger at the start of a run.
    pub fn new(trigger: &ReviewTrigger, engine: &str, config_source: ConfigSource) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            repository: trigger.repository(),
            pr_number: trigger.pr_number,
            pr_title: None,
            pr_author: None,
            trigger: trigger.kind,
            engine: engine.to_string(),
            model: None,
            config_source,
            channels: trigger.channels.clone(),
            focus: trigger.focus.clone(),
            analysis_mode: None,
            diff_size_bytes: 0,
            inline_comment_count: 0,
            inline_comments: Vec::new(),
            success: None,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Marks the session as finished.
    ///
    /// A finished session is immutable: calling this again has no effect.
    pub fn finish(&mut self, success: bool, error_message: Option<String>) {
        if self.completed_at.is_some() {
            return;
        }

        self.success = Some(success);
        self.error_message = error_message;
        self.completed_at = Some(Utc::now());
    }

    /// Whether the run has finished.
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Wall-clock duration of the run, once finished.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed| completed - self.started_at)
    }
}

/// Persistence boundary for review sessions.
///
/// The storage technology is an external collaborator; the pipeline only
/// requires saving snapshots and reading them back.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a snapshot of the session, inserting or replacing by id.
    async fn save(&self, session: &ReviewSession) -> Result<(), SessionStoreError>;

    /// Reads a session back by id.
    async fn get(&self, id: &str) -> Result<Option<ReviewSession>, SessionStoreError>;
}

/// A [`SessionStore`] holding sessions in process memory.
///
/// The default store for deployments that do not attach a database, and
/// the store used by tests.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, ReviewSession>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored sessions, unordered.
    pub fn all(&self) -> Vec<ReviewSession> {
        self.sessions
            .lock()
            .expect("session store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session store mutex poisoned")
            .len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &ReviewSession) -> Result<(), SessionStoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionStoreError::Backend("session store mutex poisoned".to_string()))?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ReviewSession>, SessionStoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionStoreError::Backend("session store mutex poisoned".to_string()))?;
        Ok(sessions.get(id).cloned())
    }
}
