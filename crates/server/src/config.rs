//! Server configuration.
//!
//! Loaded from a TOML file with a handful of environment overrides for the
//! secrets that should not live on disk:
//!
//! - `REVIEW_WARDEN_GITEA_TOKEN` overrides `gitea.token`
//! - `REVIEW_WARDEN_WEBHOOK_SECRET` overrides `webhook.secret`
//! - `REVIEW_WARDEN_API_KEY` overrides `review.engine.api_key`

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use review_warden_core::config::{GlobalEngineConfig, RepositoryEngineConfig};

use crate::errors::ServerError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "review-warden.toml";

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: HttpConfig,

    /// Gitea connection settings
    pub gitea: GiteaConfig,

    /// Webhook verification settings
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Review pipeline settings
    #[serde(default)]
    pub review: ReviewConfig,

    /// Per-repository overrides, keyed by `owner/name`
    #[serde(default)]
    pub repositories: HashMap<String, RepositoryConfig>,
}

impl ServerConfig {
    /// The webhook secret for a repository: its own if configured, the
    /// global one otherwise.
    pub fn webhook_secret_for(&self, repository: &str) -> Option<&str> {
        self.repositories
            .get(repository)
            .and_then(|repo| repo.webhook_secret.as_deref())
            .or(self.webhook.secret.as_deref())
    }

    /// The repository-level engine configuration layers, keyed by
    /// `owner/name`.
    pub fn repository_engine_configs(&self) -> HashMap<String, RepositoryEngineConfig> {
        self.repositories
            .iter()
            .map(|(name, repo)| (name.clone(), repo.engine.clone()))
            .collect()
    }

    /// The per-repository webhook secrets, keyed by `owner/name`.
    pub fn repository_webhook_secrets(&self) -> HashMap<String, String> {
        self.repositories
            .iter()
            .filter_map(|(name, repo)| {
                repo.webhook_secret
                    .as_ref()
                    .map(|secret| (name.clone(), secret.clone()))
            })
            .collect()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Gitea connection settings.
#[derive(Clone, Deserialize)]
pub struct GiteaConfig {
    /// Root URL of the Gitea instance
    pub base_url: String,

    /// Access token with repository scope. Never logged.
    #[serde(default)]
    pub token: String,

    /// The bot account commands must mention, when set
    #[serde(default)]
    pub bot_username: Option<String>,
}

impl fmt::Debug for GiteaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiteaConfig")
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "" } else { "[REDACTED]" })
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

/// Webhook verification settings.
#[derive(Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Global HMAC secret. When neither this nor a repository secret is
    /// set, the endpoint runs in accept-all mode.
    #[serde(default)]
    pub secret: Option<String>,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Review pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    /// Global default engine configuration
    #[serde(default)]
    pub engine: GlobalEngineConfig,

    /// Directory holding review workspaces
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum number of review jobs running at once
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Time budget for one clone, in seconds
    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,

    /// Time budget for one engine invocation, in seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,

    /// Path to the Claude Code executable
    #[serde(default = "default_claude_cli_path")]
    pub claude_cli_path: String,

    /// Path to the Codex executable
    #[serde(default = "default_codex_cli_path")]
    pub codex_cli_path: String,

    /// Whether clones are shallow
    #[serde(default = "default_true")]
    pub shallow_clone: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            engine: GlobalEngineConfig::default(),
            work_dir: default_work_dir(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            clone_timeout_secs: default_clone_timeout_secs(),
            engine_timeout_secs: default_engine_timeout_secs(),
            claude_cli_path: default_claude_cli_path(),
            codex_cli_path: default_codex_cli_path(),
            shallow_clone: true,
        }
    }
}

/// Per-repository overrides.
#[derive(Clone, Default, Deserialize)]
pub struct RepositoryConfig {
    /// Webhook secret specific to this repository
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Engine configuration layer for this repository
    #[serde(flatten)]
    pub engine: RepositoryEngineConfig,
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("engine", &self.engine)
            .finish()
    }
}

/// Loads the configuration from `path` and applies environment overrides.
///
/// # Errors
///
/// [`ServerError::ConfigError`] when the file cannot be read or parsed, or
/// when a required setting is missing after overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ServerError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        ServerError::ConfigError(format!(
            "Failed to read the configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut config: ServerConfig = toml::from_str(&content)
        .map_err(|e| ServerError::ConfigError(format!("Failed to parse the configuration: {}", e)))?;

    if let Ok(token) = std::env::var("REVIEW_WARDEN_GITEA_TOKEN") {
        config.gitea.token = token;
    }
    if let Ok(secret) = std::env::var("REVIEW_WARDEN_WEBHOOK_SECRET") {
        config.webhook.secret = Some(secret);
    }
    if let Ok(api_key) = std::env::var("REVIEW_WARDEN_API_KEY") {
        config.review.engine.api_key = Some(api_key);
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &ServerConfig) -> Result<(), ServerError> {
    if config.gitea.base_url.trim().is_empty() {
        return Err(ServerError::ConfigError(
            "gitea.base_url must be set".to_string(),
        ));
    }
    if config.gitea.token.trim().is_empty() {
        return Err(ServerError::ConfigError(
            "gitea.token must be set (or provided via REVIEW_WARDEN_GITEA_TOKEN)".to_string(),
        ));
    }
    if config.review.max_concurrent_jobs == 0 {
        return Err(ServerError::ConfigError(
            "review.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("/tmp/review-warden")
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_clone_timeout_secs() -> u64 {
    300
}

fn default_engine_timeout_secs() -> u64 {
    900
}

fn default_claude_cli_path() -> String {
    "claude".to_string()
}

fn default_codex_cli_path() -> String {
    "codex".to_string()
}

fn default_true() -> bool {
    true
}
