//! Shared mapping from HTTP failures to [`GenerationError`].

use apidocs_models::llm::GenerationError;
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Maps a non-success response to the error taxonomy.
pub(crate) fn status_error(status: StatusCode, headers: &HeaderMap, body: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(body),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited {
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        _ => GenerationError::Provider {
            status: Some(status.as_u16()),
            message: body,
            source: None,
        },
    }
}

/// Maps a transport failure.
pub(crate) fn transport_error(err: &reqwest::Error) -> GenerationError {
    GenerationError::Http(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn rate_limit_reads_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        let err = status_error(StatusCode::TOO_MANY_REQUESTS, &headers, String::new());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        let err = status_error(StatusCode::UNAUTHORIZED, &HeaderMap::new(), "bad key".into());
        assert!(matches!(err, GenerationError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_keep_status() {
        let err = status_error(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "upstream".into());
        assert!(matches!(err, GenerationError::Provider { status: Some(502), .. }));
        assert!(err.is_retryable());
    }
}
