use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while starting or running the server binary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration file is missing, malformed, or incomplete.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A component could not be initialized at start-up.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Binding or serving the HTTP listener failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when a trigger cannot be handed to the job runner.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The job queue is at capacity.
    #[error("The review job queue is full")]
    QueueFull,

    /// The runner is shutting down and accepts no new work.
    #[error("The job runner is shutting down")]
    ShuttingDown,
}
