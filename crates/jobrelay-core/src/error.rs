use thiserror::Error;

/// Application-wide error types for jobrelay.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration (env vars, keyword patterns).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP transport failure that is not a connection error or timeout.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Server responded with a non-success status.
    #[error("HTTP {status}: {message}")]
    StatusError { status: u16, message: String },

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Server answered 429; the wait comes from the `Retry-After` header.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A job record failed validation and was never constructed.
    #[error("Invalid job: {0}")]
    InvalidJob(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    ///
    /// Status errors are excluded here: delivery calls never retry on a
    /// server-side rejection, only on transport-level failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimited { .. }
        )
    }

    /// Retryability for provider page fetches, where an HTTP error status
    /// (e.g. a transient 5xx from a job board) is also worth another attempt.
    pub fn is_retryable_fetch(&self) -> bool {
        self.is_retryable() || matches!(self, AppError::StatusError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::NetworkError("reset".into()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::RateLimited { retry_after_secs: 60 }.is_retryable());
        assert!(!AppError::ConfigError("missing token".into()).is_retryable());
        assert!(
            !AppError::StatusError {
                status: 500,
                message: "server error".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_fetch_retries_on_status_errors() {
        assert!(
            AppError::StatusError {
                status: 503,
                message: "unavailable".into(),
            }
            .is_retryable_fetch()
        );
        assert!(AppError::Timeout(30).is_retryable_fetch());
        assert!(!AppError::InvalidJob("empty title".into()).is_retryable_fetch());
    }
}
