//! Review engine backed by the OpenAI Codex CLI.
//!
//! Invokes `codex exec` in non-interactive mode. Codex does not read the
//! diff from stdin, so the diff is embedded into the prompt text, and the
//! expected output shape is enforced with `--output-schema`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
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
pub const ENGINE_NAME: &str = "codex_cli";

/// Default time budget for one analysis run.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// The JSON schema handed to `codex exec --output-schema`. Mirrors the
/// normalized [`ReviewResult`] shape all engines produce.
fn review_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary_markdown": { "type": "string" },
            "overall_severity": {
                "type": "string",
                "enum": ["critical", "high", "medium", "low", "info"],
            },
            "inline_comments": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "path": { "type": "string" },
                        "new_line": { "type": ["integer", "null"] },
                        "old_line": { "type": ["integer", "null"] },
                        "severity": { "type": ["string", "null"] },
                        "comment": { "type": "string" },
                        "suggestion": { "type": ["string", "null"] },
                    },
                    "required": ["path", "comment"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["summary_markdown", "overall_severity", "inline_comments"],
        "additionalProperties": false,
    })
}

/// A [`ReviewEngine`] that shells out to the Codex CLI.
///
/// Runs with a read-only sandbox so the analyzed checkout cannot be
/// modified.
#[derive(Debug, Clone)]
pub struct CodexCliEngine {
    cli_path: String,
    timeout: Duration,
}

impl CodexCliEngine {
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
        let prompt = build_review_prompt(focus, pr, Some(diff));

        // Private home per invocation: CODEX_HOME carries auth and session
        // state, which concurrent reviews must not share.
        let scratch = tempfile::Builder::new().prefix("codex_review_").tempdir()?;
        let schema_path = scratch.path().join("output_schema.json");
        let schema =
            serde_json::to_vec(&review_output_schema()).map_err(std::io::Error::from)?;
        tokio::fs::write(&schema_path, schema).await?;

        let mut command = Command::new(&self.cli_path);
        command
            .arg("exec")
            .arg(&prompt)
            .arg("--sandbox")
            .arg("read-only")
            .arg("--skip-git-repo-check")
            .arg("--color")
            .arg("never")
            .arg("--output-schema")
            .arg(&schema_path)
            .env("CODEX_HOME", scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(workspace) = workspace {
            command.arg("--cd").arg(workspace);
        }
        if let Some(base_url) = &config.base_url {
            command.env("OPENAI_BASE_URL", base_url);
        }
        if let Some(api_key) = &config.api_key {
            command.env("CODEX_API_KEY", api_key);
        }
        if let Some(model) = &config.model {
            command.arg("--model").arg(model);
        }

        debug!(
            engine = ENGINE_NAME,
            full_context = workspace.is_some(),
            diff_bytes = diff.len(),
            "Launching analysis engine"
        );

        let child = command
            .spawn()
            .map_err(|e| ProviderError::LaunchFailed(self.cli_path.clone(), e.to_string()))?;

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
impl ReviewEngine for CodexCliEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn display_name(&self) -> &'static str {
        "Codex CLI"
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
