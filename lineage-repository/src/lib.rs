//! # Lineage Repository
//!
//! This crate provides the interface the ingestion engine requires from the
//! remote catalog, the error taxonomy that drives retry decisions, and two
//! implementations: an HTTP client and an in-memory store for local runs and
//! tests.

pub mod config;
pub mod errors;
pub mod http;
pub mod interfaces;
pub mod memory;

pub use config::CatalogConfig;
pub use errors::{ApiError, ApiErrorKind, ErrorClass};
pub use http::HttpCatalogClient;
pub use interfaces::CatalogClient;
pub use lineage_shared::RemoteId;
pub use memory::InMemoryCatalogClient;
