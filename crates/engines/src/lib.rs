//! # Review Warden Engines
//!
//! Pluggable code-analysis engines for Review Warden.
//!
//! An engine wraps an external analysis tool (typically a CLI) and exposes
//! two analysis modes behind the [`ReviewEngine`] trait:
//!
//! - `analyze_full`: analysis with the complete repository checked out on
//!   disk, giving the tool full codebase context
//! - `analyze_diff_only`: analysis of the diff text alone, used when no
//!   checkout is available or desired
//!
//! All engines normalize their output into the same [`ReviewResult`] schema
//! so the orchestrator never needs to know which engine produced a result.
//!
//! Engines are resolved by name through the [`registry::EngineRegistry`].
//! Every invocation receives its configuration as a plain [`EngineConfig`]
//! value and runs against a private scratch directory, so concurrent reviews
//! never share mutable engine state.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod claude_code;
pub mod codex_cli;
pub mod errors;
mod output;
mod prompt;
pub mod registry;

use errors::ProviderError;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Maximum length of an error message kept after redaction.
const MAX_ERROR_LENGTH: usize = 500;

lazy_static! {
    /// Matches `token=...`, `key: ...` and similar credential assignments so
    /// they can be blanked out of error text.
    static ref SECRET_ASSIGNMENT_REGEX: Regex =
        Regex::new(r"(?i)(token|key|secret|authorization)\s*[:=]\s*[^\s,;]+")
            .expect("Failed to compile secret assignment regex");
}

/// A review dimension requested for a given run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    /// Code quality and best practices
    Quality,

    /// Security vulnerabilities
    Security,

    /// Performance problems and optimization opportunities
    Performance,

    /// Logic errors and potential bugs
    Logic,
}

impl FocusArea {
    /// All focus areas, in the order they appear in review prompts.
    pub const ALL: [FocusArea; 4] = [
        FocusArea::Quality,
        FocusArea::Security,
        FocusArea::Performance,
        FocusArea::Logic,
    ];

    /// The canonical lowercase name used in headers and command flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusArea::Quality => "quality",
            FocusArea::Security => "security",
            FocusArea::Performance => "performance",
            FocusArea::Logic => "logic",
        }
    }

    /// The human-readable description used when building review prompts.
    pub fn description(&self) -> &'static str {
        match self {
            FocusArea::Quality => "code quality and best practices",
            FocusArea::Security => {
                "security vulnerabilities (SQL injection, XSS, command injection, secrets)"
            }
            FocusArea::Performance => "performance problems and optimization opportunities",
            FocusArea::Logic => "logic errors and potential bugs",
        }
    }
}

impl std::str::FromStr for FocusArea {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quality" => Ok(FocusArea::Quality),
            "security" => Ok(FocusArea::Security),
            "performance" => Ok(FocusArea::Performance),
            "logic" => Ok(FocusArea::Logic),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a finding or of a review as a whole.
///
/// Ordered from least to most severe so severities can be compared
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    /// Parses the severity names engines emit, including a few common
    /// aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" | "minor" => Ok(Severity::Low),
            "medium" | "moderate" => Ok(Severity::Medium),
            "high" | "major" => Ok(Severity::High),
            "critical" | "blocker" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call configuration for one engine invocation.
///
/// Passed by value on every call; engines never read process-global
/// configuration. The API key is redacted from the `Debug` representation
/// so configs can appear in structured logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Override for the engine's API base URL
    pub base_url: Option<String>,

    /// API key handed to the engine. Never logged, never echoed in errors.
    pub api_key: Option<String>,

    /// Model identifier the engine should use
    pub model: Option<String>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

/// The pull request metadata engines embed into their prompts.
#[derive(Debug, Clone, Default)]
pub struct PullRequestContext {
    /// The pull request title
    pub title: String,

    /// The pull request description, if any
    pub body: Option<String>,

    /// Login of the pull request author, if known
    pub author: Option<String>,
}

/// A line-level finding produced by an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineComment {
    /// The file the comment applies to, relative to the repository root
    pub path: String,

    /// Line number on the new side of the diff
    pub new_line: Option<u64>,

    /// Line number on the old side of the diff
    pub old_line: Option<u64>,

    /// Severity of the finding, if the engine assigned one
    pub severity: Option<Severity>,

    /// The finding text, markdown
    pub comment: String,

    /// Suggested replacement, if the engine proposed one
    pub suggestion: Option<String>,
}

impl InlineComment {
    /// Assembles the full comment body published to the pull request.
    ///
    /// Code suggestions are always fenced as markdown code blocks.
    pub fn build_body(&self) -> String {
        let mut parts = Vec::new();

        if let Some(severity) = self.severity {
            parts.push(format!("**Severity**: {}", severity));
        }

        let comment = self.comment.trim();
        if !comment.is_empty() {
            parts.push(comment.to_string());
        }

        if let Some(suggestion) = &self.suggestion {
            let suggestion = suggestion.trim();
            if !suggestion.is_empty() {
                if suggestion.contains("```") {
                    parts.push(format!("**Suggestion**:\n{}", suggestion));
                } else {
                    parts.push(format!("**Suggestion**:\n```\n{}\n```", suggestion));
                }
            }
        }

        parts.join("\n\n")
    }
}

/// Token and call accounting for one engine invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Input tokens consumed, when the engine reports them
    pub input_tokens: Option<u64>,

    /// Output tokens produced, when the engine reports them
    pub output_tokens: Option<u64>,

    /// Number of engine invocations made for this result
    pub engine_calls: u32,
}

/// The normalized result of one analysis run.
///
/// The schema is identical across all engines; the orchestrator and the
/// feedback channels only ever see this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Name of the engine that produced the result
    pub provider: String,

    /// The review report, markdown
    pub summary: String,

    /// Line-level findings
    pub inline_comments: Vec<InlineComment>,

    /// Overall severity the engine assigned to the change
    pub overall_severity: Option<Severity>,

    /// The model that produced the result, when known
    pub model: Option<String>,

    /// Token and call accounting
    pub usage: UsageMetadata,

    /// Whether the analysis itself completed
    pub success: bool,

    /// Why the analysis did not complete, redacted
    pub error_message: Option<String>,
}

impl ReviewResult {
    /// A failed result carrying a redacted error message.
    ///
    /// Used by the orchestrator to convert engine errors into a result that
    /// can still be delivered to the feedback channels.
    pub fn failure(provider: &str, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            summary: String::new(),
            inline_comments: Vec::new(),
            overall_severity: None,
            model: None,
            usage: UsageMetadata::default(),
            success: false,
            error_message: Some(redact_secrets(&message.into())),
        }
    }

    /// Whether the review found issues severe enough to fail a commit
    /// status.
    pub fn indicates_failure(&self) -> bool {
        if !self.success {
            return true;
        }

        if matches!(self.overall_severity, Some(s) if s >= Severity::High) {
            return true;
        }

        self.inline_comments
            .iter()
            .any(|c| matches!(c.severity, Some(s) if s >= Severity::High))
    }
}

/// A pluggable code-analysis engine.
///
/// Implementations must accept the full [`EngineConfig`] override set per
/// call, never mutate process-wide configuration, and redact API keys from
/// any error or returned text. Engine invocations for different reviews can
/// run concurrently.
#[async_trait]
pub trait ReviewEngine: Send + Sync {
    /// The registry name of the engine, e.g. `claude_code`.
    fn name(&self) -> &'static str;

    /// The human-readable name of the engine, e.g. `Claude Code`.
    fn display_name(&self) -> &'static str;

    /// Analyzes a pull request with the full repository context.
    ///
    /// # Arguments
    ///
    /// * `workspace` - Path to a checked-out copy of the repository
    /// * `diff` - The pull request diff text
    /// * `focus` - The review dimensions to concentrate on
    /// * `pr` - Pull request metadata for the prompt
    /// * `config` - Per-call engine configuration
    ///
    /// # Returns
    ///
    /// A `Result` containing the normalized review result
    async fn analyze_full(
        &self,
        workspace: &Path,
        diff: &str,
        focus: &[FocusArea],
        pr: &PullRequestContext,
        config: &EngineConfig,
    ) -> Result<ReviewResult, ProviderError>;

    /// Analyzes a pull request from the diff text alone.
    ///
    /// Fallback mode usable without cloning, for lower latency or when
    /// cloning fails.
    ///
    /// # Arguments
    ///
    /// * `diff` - The pull request diff text
    /// * `focus` - The review dimensions to concentrate on
    /// * `pr` - Pull request metadata for the prompt
    /// * `config` - Per-call engine configuration
    ///
    /// # Returns
    ///
    /// A `Result` containing the normalized review result
    async fn analyze_diff_only(
        &self,
        diff: &str,
        focus: &[FocusArea],
        pr: &PullRequestContext,
        config: &EngineConfig,
    ) -> Result<ReviewResult, ProviderError>;
}

/// Blanks credential assignments out of `text` and bounds its length.
///
/// Applied to every error message an engine reports before it leaves this
/// crate.
pub fn redact_secrets(text: &str) -> String {
    let redacted = SECRET_ASSIGNMENT_REGEX.replace_all(text.trim(), "$1=[REDACTED]");

    if redacted.len() > MAX_ERROR_LENGTH {
        let cut = redacted
            .char_indices()
            .take_while(|(i, _)| *i < MAX_ERROR_LENGTH)
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        format!("{}...", &redacted[..cut])
    } else {
        redacted.into_owned()
    }
}
