use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for analysis engine operations.
///
/// Engine errors never abort a review run on their own: the orchestrator
/// converts them into a failed [`crate::ReviewResult`] so the pipeline can
/// still report back to the pull request. All message payloads are redacted
/// at the point where they are constructed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No engine is registered under the requested name.
    #[error("Unknown review engine '{name}'. Available engines: {available:?}")]
    UnknownEngine {
        /// The name that failed to resolve
        name: String,

        /// The names that are registered
        available: Vec<String>,
    },

    /// The engine executable could not be started.
    ///
    /// Typically the configured CLI path does not exist or is not
    /// executable.
    #[error("Failed to launch analysis engine '{0}': {1}")]
    LaunchFailed(String, String),

    /// The engine ran but exited with a non-zero status.
    ///
    /// Carries the most actionable line extracted from the engine's output,
    /// with credentials redacted.
    #[error("Analysis engine exited with code {exit_code}: {message}")]
    EngineFailed {
        /// The process exit code
        exit_code: i32,

        /// Redacted, truncated error description
        message: String,
    },

    /// The engine exited successfully but produced no usable output.
    #[error("Analysis engine produced no usable output")]
    EmptyOutput,

    /// The engine did not finish within the configured time budget.
    #[error("Analysis engine timed out after {0} seconds")]
    Timeout(u64),

    /// An I/O failure while preparing or running the engine.
    #[error("I/O error while running the analysis engine: {0}")]
    Io(#[from] std::io::Error),
}
