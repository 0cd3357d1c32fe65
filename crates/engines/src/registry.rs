//! Registry mapping engine names to engine factories.
//!
//! Registration happens once at process start; resolution happens per
//! review run. The registry is read-only after start-up, so resolving does
//! not require any locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::claude_code::ClaudeCodeEngine;
use crate::codex_cli::CodexCliEngine;
use crate::errors::ProviderError;
use crate::ReviewEngine;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// Constructs a fresh engine instance for one review run.
pub type EngineFactory = Arc<dyn Fn() -> Arc<dyn ReviewEngine> + Send + Sync>;

/// Maps an engine name to the factory that builds it.
///
/// # Examples
///
/// ```
/// use review_warden_engines::registry::EngineRegistry;
/// use std::time::Duration;
///
/// let registry = EngineRegistry::with_builtin_engines(
///     "claude",
///     "codex",
///     Duration::from_secs(900),
/// );
/// assert!(registry.resolve("claude_code").is_ok());
/// assert!(registry.resolve("no_such_engine").is_err());
/// ```
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in engines registered.
    ///
    /// # Arguments
    ///
    /// * `claude_cli_path` - Path to the Claude Code executable
    /// * `codex_cli_path` - Path to the Codex executable
    /// * `timeout` - Per-invocation time budget for both engines
    pub fn with_builtin_engines(
        claude_cli_path: &str,
        codex_cli_path: &str,
        timeout: Duration,
    ) -> Self {
        let mut registry = Self::new();

        let claude_path = claude_cli_path.to_string();
        registry.register(crate::claude_code::ENGINE_NAME, move || {
            Arc::new(ClaudeCodeEngine::new(claude_path.clone()).with_timeout(timeout))
        });

        let codex_path = codex_cli_path.to_string();
        registry.register(crate::codex_cli::ENGINE_NAME, move || {
            Arc::new(CodexCliEngine::new(codex_path.clone()).with_timeout(timeout))
        });

        registry
    }

    /// Registers a factory under `name`, replacing any previous
    /// registration.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn ReviewEngine> + Send + Sync + 'static,
    {
        debug!(engine = name, "Registered review engine");
        self.engines.insert(name.to_string(), Arc::new(factory));
    }

    /// Builds the engine registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownEngine`] when no factory is
    /// registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ReviewEngine>, ProviderError> {
        match self.engines.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(ProviderError::UnknownEngine {
                name: name.to_string(),
                available: self.engine_names(),
            }),
        }
    }

    /// The registered engine names, sorted.
    pub fn engine_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engine_names())
            .finish()
    }
}
