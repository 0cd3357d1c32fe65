#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for hosting platform operations.
///
/// This enum represents all possible errors that can occur when interacting
/// with a Git hosting platform like Gitea. Each variant provides specific
/// context about the type of failure encountered.
///
/// # Examples
///
/// ```rust
/// use review_warden_developer_platforms::errors::Error;
///
/// let err = Error::ApiError {
///     status: 404,
///     message: "pull request not found".to_string(),
/// };
/// assert_eq!(err.to_string(), "API request failed with status 404: pull request not found");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hosting API answered with a non-success status code.
    ///
    /// Carries the HTTP status and the (truncated) response body so the
    /// caller can decide between retry and abort per call site.
    #[error("API request failed with status {status}: {message}")]
    ApiError {
        /// The HTTP status code of the response
        status: u16,

        /// The response body, truncated for logging
        message: String,
    },

    /// Authentication failed with the platform.
    ///
    /// The provided token is invalid, expired, or insufficient for the
    /// requested operation.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The response from the platform API was not in the expected format.
    ///
    /// This can happen on API version changes, malformed JSON responses, or
    /// missing required fields in the response.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The request never produced a response.
    ///
    /// Connection refused, DNS failure, or the configured request timeout
    /// elapsed.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl Error {
    /// The HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() || value.is_connect() {
            return Error::NetworkError(value.to_string());
        }

        if let Some(status) = value.status() {
            return Error::ApiError {
                status: status.as_u16(),
                message: value.to_string(),
            };
        }

        Error::NetworkError(value.to_string())
    }
}
