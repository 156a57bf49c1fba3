//! Settings read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use lineage_pipeline::{RetryPolicy, SubmitterConfig};
use lineage_repository::CatalogConfig;

use crate::IngesterError;

/// Default catalog API base URL.
const DEFAULT_CATALOG_URL: &str = "http://localhost:8080/api";

/// Catalog and submission settings before command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    pub catalog: CatalogConfig,
    pub submitter: SubmitterConfig,
}

impl IngestSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CATALOG_URL`: Catalog API base URL (default: http://localhost:8080/api)
    /// - `CATALOG_API_TOKEN`: Bearer token for the catalog (default: none)
    /// - `INGEST_MAX_CONCURRENCY`: Maximum in-flight calls (default: 8)
    /// - `INGEST_CHUNK_SIZE`: Relationships per call, 1 for per-record mode (default: 1)
    /// - `INGEST_MAX_RETRIES`: Retries on transient errors (default: 3)
    /// - `INGEST_BACKOFF_BASE_MS`: First retry delay (default: 200)
    /// - `INGEST_BACKOFF_MAX_MS`: Retry delay ceiling (default: 5000)
    /// - `INGEST_CALL_TIMEOUT_MS`: Per-call timeout (default: 30000)
    pub fn from_env() -> Result<Self, IngesterError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IngesterError> {
        let defaults = SubmitterConfig::default();

        let base_url = lookup("CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
        let mut catalog = CatalogConfig::new(base_url);
        if let Some(token) = lookup("CATALOG_API_TOKEN").filter(|t| !t.is_empty()) {
            catalog = catalog.with_api_token(token);
        }

        let retry = RetryPolicy {
            max_retries: parse_or(&lookup, "INGEST_MAX_RETRIES", defaults.retry.max_retries)?,
            base_delay: millis_or(&lookup, "INGEST_BACKOFF_BASE_MS", defaults.retry.base_delay)?,
            max_delay: millis_or(&lookup, "INGEST_BACKOFF_MAX_MS", defaults.retry.max_delay)?,
        };

        let submitter = SubmitterConfig::default()
            .with_max_concurrency(parse_or(
                &lookup,
                "INGEST_MAX_CONCURRENCY",
                defaults.max_concurrency,
            )?)
            .with_chunk_size(parse_or(&lookup, "INGEST_CHUNK_SIZE", defaults.chunk_size)?)
            .with_call_timeout(millis_or(
                &lookup,
                "INGEST_CALL_TIMEOUT_MS",
                defaults.call_timeout,
            )?)
            .with_retry(retry);

        Ok(Self { catalog, submitter })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, IngesterError> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            IngesterError::config(format!(
                "{} must be a non-negative integer, got '{}'",
                name, raw
            ))
        }),
        None => Ok(default),
    }
}

fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, IngesterError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(lookup, name, default_ms).map(Duration::from_millis)
}
