//! Review engine backed by the Claude Code CLI.
//!
//! Invokes `claude -p <prompt> --output-format text` with the pull request
//! diff on stdin. In full mode the process runs inside the repository
//! checkout so the CLI can read the surrounding code.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::errors::ProviderError;
use crate::output::{extract_actionable_error, parse_review_output};
use crate::prompt::build_review_prompt;
use crate::{
    redact_secrets, EngineConfig, FocusArea, PullRequestContext, ReviewEngine, ReviewResult,
};

/// Registry name of this engine.
pub const ENGINE_NAME: &str = "claude_code";

/// Default time budget for one analysis run. Engine calls are the
/// long-running part of the pipeline, so the budget is generous.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// A [`ReviewEngine`] that shells out to the Claude Code CLI.
#[derive(Debug, Clone)]
pub struct ClaudeCodeEngine {
    cli_path: String,
    timeout: Duration,
}

impl ClaudeCodeEngine {
    /// Creates an engine invoking the CLI at `cli_path`.
    pub fn new(cli_path: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-invocation time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(
        &self,
        diff: &str,
        focus: &[FocusArea],
        pr: &PullRequestContext,
        config: &EngineConfig,
        workspace: Option<&Path>,
    ) -> Result<ReviewResult, ProviderError> {
        let prompt = build_review_prompt(focus, pr, None);

        // Private config dir per invocation: concurrent reviews must not
        // share CLI session state or credentials.
        let scratch = tempfile::Builder::new()
            .prefix("claude_review_")
            .tempdir()?;

        let mut command = Command::new(&self.cli_path);
        command
            .arg("-p")
            .arg(&prompt)
            .arg("--output-format")
            .arg("text")
            .env("CLAUDE_CONFIG_DIR", scratch.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(workspace) = workspace {
            command.current_dir(workspace);
        }
        if let Some(base_url) = &config.base_url {
            command.env("ANTHROPIC_BASE_URL", base_url);
        }
        if let Some(api_key) = &config.api_key {
            command.env("ANTHROPIC_AUTH_TOKEN", api_key);
        }
        if let Some(model) = &config.model {
            command.env("ANTHROPIC_MODEL", model);
        }

        debug!(
            engine = ENGINE_NAME,
            full_context = workspace.is_some(),
            diff_bytes = diff.len(),
            "Launching analysis engine"
        );

        let mut child = command
            .spawn()
            .map_err(|e| ProviderError::LaunchFailed(self.cli_path.clone(), e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(diff.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        // On timeout the future holding the child is dropped, which kills
        // the process via kill_on_drop.
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let exit_code = output.status.code().unwrap_or(-1);
            let message = extract_actionable_error(&stderr, &stdout);
            let message = if message.is_empty() {
                format!("exit code {}", exit_code)
            } else {
                redact_secrets(&message)
            };

            return Err(ProviderError::EngineFailed { exit_code, message });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let mut result =
            parse_review_output(&raw, ENGINE_NAME).ok_or(ProviderError::EmptyOutput)?;

        if result.model.is_none() {
            result.model = config.model.clone();
        }

        info!(engine = ENGINE_NAME, "Analysis complete");
        Ok(result)
    }
}

#[async_trait]
impl ReviewEngine for ClaudeCodeEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn display_name(&self) -> &'static str {
        "Claude Code"
    }

    #[instrument(skip(self, diff, pr, config))]
    async fn analyze_full(
        &self,
        workspace: &Path,
        diff: &str,
        focus: &[FocusArea],
        pr: &PullRequestContext,
        config: &EngineConfig,
    ) -> Result<ReviewResult, ProviderError> {
        self.run(diff, focus, pr, config, Some(workspace)).await
    }

    #[instrument(skip(self, diff, pr, config))]
    async fn analyze_diff_only(
        &self,
        diff: &str,
        focus: &[FocusArea],
        pr: &PullRequestContext,
        config: &EngineConfig,
    ) -> Result<ReviewResult, ProviderError> {
        self.run(diff, focus, pr, config, None).await
    }
}
