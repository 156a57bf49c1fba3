//! Error types for the catalog repository.

mod api_error;

pub use api_error::{ApiError, ApiErrorKind, ErrorClass};
