//! Interface definitions for the catalog client.
//!
//! This module defines the abstract `CatalogClient` trait that allows
//! for dependency injection and swappable catalog backends.

mod catalog_client;

pub use catalog_client::CatalogClient;
