//! # Review Warden Core
//!
//! Core orchestration logic for turning webhook triggers into published
//! code review feedback.
//!
//! A [`ReviewWarden`] drives one review run per trigger: it resolves the
//! engine configuration, acquires a disposable repository checkout, fetches
//! the pull request diff, invokes the selected analysis engine, and writes
//! the normalized result back to the pull request through the enabled
//! feedback channels. Every run terminates in a completed
//! [`session::ReviewSession`], whatever happens along the way.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use review_warden_core::config::GlobalEngineConfig;
//! use review_warden_core::session::InMemorySessionStore;
//! use review_warden_core::trigger::ReviewTrigger;
//! use review_warden_core::workspace::WorkspaceManager;
//! use review_warden_core::ReviewWarden;
//! use review_warden_developer_platforms::gitea::GiteaProvider;
//! use review_warden_engines::registry::EngineRegistry;
//!
//! async fn review(trigger: ReviewTrigger) -> anyhow::Result<()> {
//!     let provider = GiteaProvider::new("https://git.example.com", "token")?;
//!     let registry =
//!         EngineRegistry::with_builtin_engines("claude", "codex", Duration::from_secs(900));
//!     let workspaces = WorkspaceManager::new("/var/lib/review-warden")?;
//!     let sessions = Arc::new(InMemorySessionStore::new());
//!
//!     let warden = ReviewWarden::new(
//!         provider,
//!         registry,
//!         workspaces,
//!         sessions,
//!         GlobalEngineConfig::default(),
//!     );
//!
//!     let session = warden.run(trigger).await;
//!     println!("review finished, success: {:?}", session.success);
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use review_warden_developer_platforms::models::{CommitStatusState, PullRequest, ReviewComment};
use review_warden_developer_platforms::HostingProvider;
use review_warden_engines::registry::EngineRegistry;
use review_warden_engines::{InlineComment, PullRequestContext, ReviewResult};

pub mod command;
pub mod config;
pub mod errors;
pub mod session;
pub mod trigger;
pub mod workspace;

use config::{
    resolve_engine_config, GlobalEngineConfig, RepositoryEngineConfig, MAX_STATUS_DESCRIPTION,
    REVIEW_PROGRESS_COMMENT, REVIEW_REPORT_HEADER,
};
use session::{AnalysisMode, ReviewSession, SessionStore};
use trigger::{FeedbackChannel, ReviewTrigger};
use workspace::{Workspace, WorkspaceManager};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Orchestrates review runs against one hosting platform.
///
/// Holds the engine registry, the workspace manager, and the session store,
/// all of which are shared by concurrent runs. Each [`ReviewWarden::run`]
/// call is independent: runs for different pull requests never share
/// workspaces or engine state.
pub struct ReviewWarden<P: HostingProvider> {
    provider: P,
    registry: EngineRegistry,
    workspaces: WorkspaceManager,
    sessions: Arc<dyn SessionStore>,
    global_config: GlobalEngineConfig,
    repositories: HashMap<String, RepositoryEngineConfig>,
    clone_for_analysis: bool,
}

impl<P: HostingProvider> ReviewWarden<P> {
    /// Creates an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `provider` - The hosting platform client
    /// * `registry` - The engine registry, populated at process start
    /// * `workspaces` - The workspace manager for repository checkouts
    /// * `sessions` - The session store receiving audit records
    /// * `global_config` - The global default engine configuration
    pub fn new(
        provider: P,
        registry: EngineRegistry,
        workspaces: WorkspaceManager,
        sessions: Arc<dyn SessionStore>,
        global_config: GlobalEngineConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            workspaces,
            sessions,
            global_config,
            repositories: HashMap::new(),
            clone_for_analysis: true,
        }
    }

    /// Attaches repository-level engine configuration, keyed by
    /// `owner/name`.
    pub fn with_repository_configs(
        mut self,
        repositories: HashMap<String, RepositoryEngineConfig>,
    ) -> Self {
        self.repositories = repositories;
        self
    }

    /// Disables repository checkouts; every run analyzes the diff alone.
    pub fn with_diff_only_analysis(mut self) -> Self {
        self.clone_for_analysis = false;
        self
    }

    /// Runs one review from trigger to completed session.
    ///
    /// The run always terminates in a finished, persisted session. Engine
    /// failures become a failed result that is still delivered to the
    /// feedback channels; feedback channel failures are logged and do not
    /// affect the run outcome or each other.
    #[instrument(
        skip(self, trigger),
        fields(
            repository = %trigger.repository(),
            pull_request = trigger.pr_number,
            trigger_kind = trigger.kind.as_str(),
        )
    )]
    pub async fn run(&self, trigger: ReviewTrigger) -> ReviewSession {
        info!("Starting review run");

        let selection = resolve_engine_config(
            trigger.engine_override.as_ref(),
            self.repositories.get(&trigger.repository()),
            &self.global_config,
        );
        let mut session = ReviewSession::new(&trigger, &selection.engine, selection.source);
        session.model = selection.config.model.clone();

        // Resolve the engine before performing any side effect: a trigger
        // naming an unknown engine fails without touching the pull request.
        let engine = match self.registry.resolve(&selection.engine) {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "Cannot resolve the review engine");
                session.finish(false, Some(e.to_string()));
                self.save_session(&session).await;
                return session;
            }
        };

        let pr = match self
            .provider
            .get_pull_request(&trigger.repo_owner, &trigger.repo_name, trigger.pr_number)
            .await
        {
            Ok(pr) => pr,
            Err(e) => {
                error!(error = %e, "Cannot fetch the pull request");
                session.finish(false, Some(format!("Failed to fetch the pull request: {}", e)));
                self.save_session(&session).await;
                return session;
            }
        };
        session.pr_title = Some(pr.title.clone());
        session.pr_author = pr.author.as_ref().map(|user| user.login.clone());
        let head_sha = pr.head.sha.clone();

        let progress_comment_id = if trigger.channels.contains(&FeedbackChannel::Comment) {
            match self
                .provider
                .post_comment(
                    &trigger.repo_owner,
                    &trigger.repo_name,
                    trigger.pr_number,
                    REVIEW_PROGRESS_COMMENT,
                )
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(error = %e, "Failed to post the progress comment");
                    None
                }
            }
        } else {
            None
        };

        let diff = match self
            .provider
            .get_pull_request_diff(&trigger.repo_owner, &trigger.repo_name, trigger.pr_number)
            .await
        {
            Ok(diff) => diff,
            Err(e) => {
                error!(error = %e, "Cannot fetch the pull request diff");
                let message = format!("Failed to fetch the pull request diff: {}", e);
                self.report_run_error(&trigger, progress_comment_id, &head_sha, &message)
                    .await;
                session.finish(false, Some(message));
                self.save_session(&session).await;
                return session;
            }
        };
        session.diff_size_bytes = diff.len();

        // An empty diff means there is nothing to review: succeed without
        // invoking the engine.
        if diff.trim().is_empty() {
            info!("Empty diff, nothing to review");
            self.report_nothing_to_review(&trigger, progress_comment_id, &head_sha)
                .await;
            session.finish(true, None);
            self.save_session(&session).await;
            return session;
        }

        let workspace = self.acquire_workspace(&trigger, &pr, &mut session).await;

        let pr_context = PullRequestContext {
            title: pr.title.clone(),
            body: pr.body.clone(),
            author: session.pr_author.clone(),
        };

        let analysis = match &workspace {
            Some(workspace) => {
                engine
                    .analyze_full(
                        workspace.path(),
                        &diff,
                        &trigger.focus,
                        &pr_context,
                        &selection.config,
                    )
                    .await
            }
            None => {
                engine
                    .analyze_diff_only(&diff, &trigger.focus, &pr_context, &selection.config)
                    .await
            }
        };

        // Engine errors never propagate: they become a failed result so the
        // feedback channels can still tell the author what happened.
        let result = match analysis {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Analysis failed");
                ReviewResult::failure(engine.name(), e.to_string())
            }
        };

        if result.model.is_some() {
            session.model = result.model.clone();
        }
        session.inline_comment_count = result.inline_comments.len();
        session.inline_comments = result.inline_comments.clone();

        self.dispatch_feedback(&trigger, &result, progress_comment_id, &head_sha)
            .await;

        // Release runs unconditionally; the workspace Drop impl backstops
        // the paths that never reach this point.
        if let Some(workspace) = workspace {
            if let Err(e) = workspace.close() {
                warn!(error = %e, "Failed to remove the workspace");
            }
        }

        session.finish(result.success, result.error_message.clone());
        self.save_session(&session).await;

        info!(
            success = result.success,
            inline_comments = session.inline_comment_count,
            "Review run complete"
        );
        session
    }

    /// Acquires a workspace for full-context analysis.
    ///
    /// Clone failure is not fatal: the run degrades to diff-only analysis
    /// and the session records which mode actually ran.
    async fn acquire_workspace(
        &self,
        trigger: &ReviewTrigger,
        pr: &PullRequest,
        session: &mut ReviewSession,
    ) -> Option<Workspace> {
        if !self.clone_for_analysis {
            session.analysis_mode = Some(AnalysisMode::DiffOnly);
            return None;
        }

        let clone_url = self
            .provider
            .clone_url(&trigger.repo_owner, &trigger.repo_name);

        match self
            .workspaces
            .acquire(
                &clone_url,
                &pr.head.ref_name,
                &trigger.repo_owner,
                &trigger.repo_name,
                trigger.pr_number,
            )
            .await
        {
            Ok(workspace) => {
                session.analysis_mode = Some(AnalysisMode::Full);
                Some(workspace)
            }
            Err(e) => {
                warn!(error = %e, "Clone failed, degrading to diff-only analysis");
                session.analysis_mode = Some(AnalysisMode::DiffOnly);
                None
            }
        }
    }

    /// Publishes the result through every enabled feedback channel.
    ///
    /// Channels are independent: one channel failing is logged and does not
    /// prevent the others from being attempted.
    async fn dispatch_feedback(
        &self,
        trigger: &ReviewTrigger,
        result: &ReviewResult,
        progress_comment_id: Option<u64>,
        head_sha: &str,
    ) {
        if trigger.channels.contains(&FeedbackChannel::Comment) {
            let body = if result.success {
                let summary = result.summary.trim();
                let summary = if summary.is_empty() {
                    "The review produced no report."
                } else {
                    summary
                };
                format!("{}\n\n{}", REVIEW_REPORT_HEADER, summary)
            } else {
                format!(
                    "{}\n\nThe review could not be completed: {}",
                    REVIEW_REPORT_HEADER,
                    result
                        .error_message
                        .as_deref()
                        .unwrap_or("unknown analysis failure")
                )
            };

            let outcome = match progress_comment_id {
                Some(id) => {
                    self.provider
                        .update_comment(&trigger.repo_owner, &trigger.repo_name, id, &body)
                        .await
                }
                None => self
                    .provider
                    .post_comment(
                        &trigger.repo_owner,
                        &trigger.repo_name,
                        trigger.pr_number,
                        &body,
                    )
                    .await
                    .map(|_| ()),
            };
            if let Err(e) = outcome {
                warn!(error = %e, "Failed to publish the review comment");
            }
        }

        if trigger.channels.contains(&FeedbackChannel::Review) {
            if result.success && !result.inline_comments.is_empty() {
                let comments: Vec<ReviewComment> = result
                    .inline_comments
                    .iter()
                    .filter_map(to_review_comment)
                    .collect();

                if let Err(e) = self
                    .provider
                    .create_review(
                        &trigger.repo_owner,
                        &trigger.repo_name,
                        trigger.pr_number,
                        result.summary.trim(),
                        head_sha,
                        &comments,
                    )
                    .await
                {
                    warn!(error = %e, "Failed to create the pull request review");
                }
            } else {
                debug!("Skipping review channel: no successful result with inline comments");
            }
        }

        if trigger.channels.contains(&FeedbackChannel::Status) && !head_sha.is_empty() {
            let (state, description) = if !result.success {
                (
                    CommitStatusState::Error,
                    status_description(
                        result
                            .error_message
                            .as_deref()
                            .unwrap_or("Code review failed"),
                    ),
                )
            } else if result.indicates_failure() {
                (
                    CommitStatusState::Failure,
                    "Code review found significant issues".to_string(),
                )
            } else {
                (CommitStatusState::Success, "Code review complete".to_string())
            };

            if let Err(e) = self
                .provider
                .set_commit_status(
                    &trigger.repo_owner,
                    &trigger.repo_name,
                    head_sha,
                    state,
                    &description,
                )
                .await
            {
                warn!(error = %e, "Failed to set the commit status");
            }
        }
    }

    /// Tells the pull request that there was nothing to review.
    async fn report_nothing_to_review(
        &self,
        trigger: &ReviewTrigger,
        progress_comment_id: Option<u64>,
        head_sha: &str,
    ) {
        if let Some(id) = progress_comment_id {
            let body = format!(
                "{}\n\nNothing to review: the pull request contains no changes.",
                REVIEW_REPORT_HEADER
            );
            if let Err(e) = self
                .provider
                .update_comment(&trigger.repo_owner, &trigger.repo_name, id, &body)
                .await
            {
                warn!(error = %e, "Failed to update the progress comment");
            }
        }

        if trigger.channels.contains(&FeedbackChannel::Status) && !head_sha.is_empty() {
            if let Err(e) = self
                .provider
                .set_commit_status(
                    &trigger.repo_owner,
                    &trigger.repo_name,
                    head_sha,
                    CommitStatusState::Success,
                    "Nothing to review",
                )
                .await
            {
                warn!(error = %e, "Failed to set the commit status");
            }
        }
    }

    /// Reports a pre-analysis failure back to the pull request.
    async fn report_run_error(
        &self,
        trigger: &ReviewTrigger,
        progress_comment_id: Option<u64>,
        head_sha: &str,
        message: &str,
    ) {
        if let Some(id) = progress_comment_id {
            let body = format!(
                "{}\n\nThe review could not be completed: {}",
                REVIEW_REPORT_HEADER, message
            );
            if let Err(e) = self
                .provider
                .update_comment(&trigger.repo_owner, &trigger.repo_name, id, &body)
                .await
            {
                warn!(error = %e, "Failed to update the progress comment");
            }
        }

        if trigger.channels.contains(&FeedbackChannel::Status) && !head_sha.is_empty() {
            if let Err(e) = self
                .provider
                .set_commit_status(
                    &trigger.repo_owner,
                    &trigger.repo_name,
                    head_sha,
                    CommitStatusState::Error,
                    &status_description(message),
                )
                .await
            {
                warn!(error = %e, "Failed to set the commit status");
            }
        }
    }

    async fn save_session(&self, session: &ReviewSession) {
        if let Err(e) = self.sessions.save(session).await {
            error!(
                session_id = session.id.as_str(),
                error = %e,
                "Failed to persist the review session"
            );
        }
    }
}

/// Converts an engine finding into a hosting review comment.
///
/// Findings without a usable body are dropped; the position fields default
/// to zero for the side the finding does not target.
fn to_review_comment(inline: &InlineComment) -> Option<ReviewComment> {
    let path = inline.path.trim();
    if path.is_empty() {
        return None;
    }

    let body = inline.build_body();
    if body.is_empty() {
        return None;
    }

    Some(ReviewComment {
        path: path.to_string(),
        body,
        new_position: inline.new_line.unwrap_or(0),
        old_position: inline.old_line.unwrap_or(0),
    })
}

/// Flattens an error message into a commit status description.
fn status_description(message: &str) -> String {
    let flat = message.replace('\n', " ");
    let flat = flat.trim();

    if flat.is_empty() {
        return "Code review failed".to_string();
    }

    let mut end = flat.len().min(MAX_STATUS_DESCRIPTION);
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    flat[..end].to_string()
}
