//! Error types for LLM generation operations.

use core::time::Duration;

/// Errors raised by the language-model service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Transport failure (connection refused, reset, TLS, ...).
    #[error("http error: {0}")]
    Http(String),

    /// The call did not complete within its deadline.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the provider.
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimited {
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The request could not be expressed for this provider.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Error returned by the model provider.
    #[error("provider error: {message}")]
    Provider {
        /// HTTP status code if available.
        status: Option<u16>,
        /// Error message.
        message: String,
        /// The underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GenerationError {
    /// Whether repeating the same request may succeed.
    ///
    /// Transport failures, timeouts, rate limits and 5xx provider errors are
    /// transient. Everything else fails the same way on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Provider { status, .. } => status.is_none_or(|code| code >= 500),
            Self::Json(_) | Self::Auth(_) | Self::InvalidRequest(_) | Self::InvalidResponse(_) => {
                false
            }
        }
    }

    /// Provider-suggested delay before the next attempt, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(GenerationError::Http("reset".into()).is_retryable());
        assert!(GenerationError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(GenerationError::RateLimited { retry_after: None }.is_retryable());
        assert!(
            GenerationError::Provider {
                status: Some(503),
                message: "overloaded".into(),
                source: None,
            }
            .is_retryable()
        );
        assert!(
            !GenerationError::Provider {
                status: Some(400),
                message: "bad".into(),
                source: None,
            }
            .is_retryable()
        );
        assert!(!GenerationError::Auth("no key".into()).is_retryable());
    }

    #[test]
    fn rate_limit_message_includes_delay() {
        let err = GenerationError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 2s");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    }
}
