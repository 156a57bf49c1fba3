//! Mapping from HTTP responses and transport failures to API error kinds.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::errors::{ApiError, ApiErrorKind};

/// Classify a non-success HTTP status.
pub fn classify_status(status: StatusCode) -> ApiErrorKind {
    match status.as_u16() {
        401 | 403 => ApiErrorKind::Unauthorized,
        408 => ApiErrorKind::Timeout,
        429 => ApiErrorKind::Throttled,
        500..=599 => ApiErrorKind::ServerError,
        400..=499 => ApiErrorKind::Rejected,
        _ => ApiErrorKind::InvalidResponse,
    }
}

/// Classify a transport-level failure.
pub fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(err.to_string())
    } else if err.is_decode() {
        ApiError::invalid_response(err.to_string())
    } else {
        ApiError::connection(err.to_string())
    }
}

/// Build an [`ApiError`] for a failed response, honouring `Retry-After`
/// (delta-seconds form) on throttling.
pub(crate) fn error_for_status(status: StatusCode, headers: &HeaderMap, body: &str) -> ApiError {
    let kind = classify_status(status);
    let message = if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    };

    let mut err = ApiError::new(kind, message);
    if kind == ApiErrorKind::Throttled {
        err.retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
    }
    err
}
