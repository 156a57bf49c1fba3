//! Catalog API error types.
//!
//! Every failure reported by a catalog client carries a fixed
//! [`ApiErrorKind`]. The retry decision is a total function over that kind
//! (see [`ApiErrorKind::class`]), never a match on message text.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The closed set of failure kinds a catalog call can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The call did not complete within its deadline.
    Timeout,
    /// The catalog asked the caller to slow down (HTTP 429).
    Throttled,
    /// The catalog failed internally (HTTP 5xx).
    ServerError,
    /// The catalog could not be reached.
    Connection,
    /// The catalog refused the payload (HTTP 4xx other than auth/throttling).
    Rejected,
    /// The catalog answered with something the client cannot interpret.
    InvalidResponse,
    /// Credentials were missing, expired or insufficient.
    Unauthorized,
    /// Any other condition after which further calls are pointless.
    Fatal,
}

/// How the submitter reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Retry with backoff until the retry budget runs out.
    Transient,
    /// Record the row as failed, no retry.
    Permanent,
    /// Stop submitting anything else in the batch.
    Fatal,
}

impl ApiErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            ApiErrorKind::Timeout
            | ApiErrorKind::Throttled
            | ApiErrorKind::ServerError
            | ApiErrorKind::Connection => ErrorClass::Transient,
            ApiErrorKind::Rejected | ApiErrorKind::InvalidResponse => ErrorClass::Permanent,
            ApiErrorKind::Unauthorized | ApiErrorKind::Fatal => ErrorClass::Fatal,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ApiErrorKind::Timeout => "timeout",
            ApiErrorKind::Throttled => "throttled",
            ApiErrorKind::ServerError => "server error",
            ApiErrorKind::Connection => "connection error",
            ApiErrorKind::Rejected => "rejected",
            ApiErrorKind::InvalidResponse => "invalid response",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Fatal => "fatal client error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned by a catalog call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// Server-provided hint for when to retry (throttling only).
    pub retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, msg)
    }

    /// Create a throttling error with an optional retry hint.
    pub fn throttled(msg: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            ..Self::new(ApiErrorKind::Throttled, msg)
        }
    }

    /// Create a server-side error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ServerError, msg)
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Connection, msg)
    }

    /// Create a rejected-payload error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Rejected, msg)
    }

    /// Create an invalid-response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidResponse, msg)
    }

    /// Create an authorization error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, msg)
    }

    /// Create a fatal client error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Fatal, msg)
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}
