//! Engine configuration layers and their resolution.
//!
//! A review run resolves its engine configuration from up to four layers,
//! highest precedence first: the per-call override on the trigger, the
//! repository-level configuration, the global default configuration, and
//! finally the engine built-in default. Resolution is field-wise: a layer
//! that sets only the model still inherits base URL and API key from the
//! layers below it.

use std::fmt;

use serde::{Deserialize, Serialize};

use review_warden_engines::EngineConfig;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// The engine used when no configuration layer names one.
pub const DEFAULT_ENGINE: &str = "claude_code";

/// Heading of the review report comment posted on pull requests.
pub const REVIEW_REPORT_HEADER: &str = "## Automated code review";

/// Body of the placeholder comment posted while a review runs.
pub const REVIEW_PROGRESS_COMMENT: &str =
    "## Automated code review\n\nReview in progress, please wait...";

/// Maximum length of a commit status description.
pub const MAX_STATUS_DESCRIPTION: usize = 120;

/// Per-call engine override carried on a trigger.
///
/// Highest-precedence configuration layer. The API key is redacted from
/// the `Debug` representation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EngineOverride {
    /// Engine name to use for this run
    pub engine: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,

    /// API key override. Never logged.
    pub api_key: Option<String>,

    /// Model identifier override
    pub model: Option<String>,
}

impl fmt::Debug for EngineOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOverride")
            .field("engine", &self.engine)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

/// Global default engine configuration.
#[derive(Clone, Deserialize)]
pub struct GlobalEngineConfig {
    /// Default engine name
    #[serde(default = "default_engine_name")]
    pub engine: String,

    /// Default API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default API key. Never logged.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model identifier
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for GlobalEngineConfig {
    fn default() -> Self {
        Self {
            engine: default_engine_name(),
            base_url: None,
            api_key: None,
            model: None,
        }
    }
}

impl fmt::Debug for GlobalEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalEngineConfig")
            .field("engine", &self.engine)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

/// Repository-level engine configuration.
#[derive(Clone, Default, Deserialize)]
pub struct RepositoryEngineConfig {
    /// Engine name for this repository
    #[serde(default)]
    pub engine: Option<String>,

    /// API base URL for this repository
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for this repository. Never logged.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for this repository
    #[serde(default)]
    pub model: Option<String>,

    /// When set, this layer is skipped and the global defaults apply.
    #[serde(default)]
    pub inherit_global: bool,
}

impl fmt::Debug for RepositoryEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryEngineConfig")
            .field("engine", &self.engine)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("inherit_global", &self.inherit_global)
            .finish()
    }
}

/// Which configuration layer supplied the engine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// The per-call override on the trigger
    CallOverride,

    /// The repository-level configuration
    Repository,

    /// The global default configuration
    GlobalDefault,

    /// The engine built-in default
    EngineBuiltin,
}

impl ConfigSource {
    /// The canonical name, as persisted on sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::CallOverride => "call_override",
            ConfigSource::Repository => "repository",
            ConfigSource::GlobalDefault => "global_default",
            ConfigSource::EngineBuiltin => "engine_builtin",
        }
    }
}

/// The outcome of configuration resolution for one run.
#[derive(Debug, Clone)]
pub struct EngineSelection {
    /// The engine to invoke
    pub engine: String,

    /// The per-call configuration handed to the engine
    pub config: EngineConfig,

    /// Which layer supplied the engine name
    pub source: ConfigSource,
}

/// Resolves the engine selection for one review run.
///
/// The engine name comes from the highest layer that sets one; the
/// remaining fields merge field-wise across the layers in the same order.
/// A repository layer with `inherit_global` set is skipped entirely.
pub fn resolve_engine_config(
    call_override: Option<&EngineOverride>,
    repository: Option<&RepositoryEngineConfig>,
    global: &GlobalEngineConfig,
) -> EngineSelection {
    let repository = repository.filter(|config| !config.inherit_global);

    let (engine, source) = if let Some(name) = call_override.and_then(|o| o.engine.clone()) {
        (name, ConfigSource::CallOverride)
    } else if let Some(name) = repository.and_then(|r| r.engine.clone()) {
        (name, ConfigSource::Repository)
    } else if !global.engine.trim().is_empty() {
        (global.engine.clone(), ConfigSource::GlobalDefault)
    } else {
        (DEFAULT_ENGINE.to_string(), ConfigSource::EngineBuiltin)
    };

    let base_url = call_override
        .and_then(|o| o.base_url.clone())
        .or_else(|| repository.and_then(|r| r.base_url.clone()))
        .or_else(|| global.base_url.clone());

    let api_key = call_override
        .and_then(|o| o.api_key.clone())
        .or_else(|| repository.and_then(|r| r.api_key.clone()))
        .or_else(|| global.api_key.clone());

    let model = call_override
        .and_then(|o| o.model.clone())
        .or_else(|| repository.and_then(|r| r.model.clone()))
        .or_else(|| global.model.clone());

    EngineSelection {
        engine,
        config: EngineConfig {
            base_url,
            api_key,
            model,
        },
        source,
    }
}

fn default_engine_name() -> String {
    DEFAULT_ENGINE.to_string()
}
