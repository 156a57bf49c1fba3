//! Configuration types for the catalog clients.

use std::time::Duration;

/// Connection settings for [`crate::HttpCatalogClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Pre-issued bearer token. Acquiring it is the caller's concern.
    pub api_token: Option<String>,
    /// Transport-level timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Whether the catalog exposes lookup by identity hash.
    pub identity_lookup: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            identity_lookup: true,
        }
    }
}

impl CatalogConfig {
    /// Create a config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_identity_lookup(mut self, enabled: bool) -> Self {
        self.identity_lookup = enabled;
        self
    }
}
