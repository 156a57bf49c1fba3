//! Catalog client trait definition.
//!
//! This module defines the contract the ingestion engine requires from the
//! remote catalog service. Storage, schema and wire format of the catalog
//! itself are the implementation's concern.

use async_trait::async_trait;

use crate::errors::ApiError;
use lineage_shared::{Relationship, RemoteId};

/// Abstract interface for catalog relationship operations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the submitter shares one client
/// across its concurrent tasks.
///
/// # Error Handling
///
/// Every failure is an [`ApiError`] whose kind determines whether the
/// submitter retries, fails the row, or stops the batch.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Create a single relationship.
    ///
    /// # Returns
    ///
    /// * `Ok(RemoteId)` - The identifier the catalog assigned
    /// * `Err(ApiError)` - If the catalog refused or could not be reached
    async fn create(&self, relationship: &Relationship) -> Result<RemoteId, ApiError>;

    /// Create several relationships in one call.
    ///
    /// The inner vector holds one result per input, in input order. The outer
    /// `Err` is a chunk-level failure (nothing can be said about any item).
    ///
    /// The default implementation calls [`CatalogClient::create`] for each
    /// relationship in turn, for backends without a bulk endpoint.
    async fn bulk_create(
        &self,
        relationships: &[Relationship],
    ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
        let mut results = Vec::with_capacity(relationships.len());
        for relationship in relationships {
            results.push(self.create(relationship).await);
        }
        Ok(results)
    }

    /// Whether [`CatalogClient::find_by_identity_hash`] is backed by a real
    /// lookup. When `false` the submitter skips the idempotency check.
    fn supports_identity_lookup(&self) -> bool {
        false
    }

    /// Look up a previously created relationship by its identity hash.
    async fn find_by_identity_hash(&self, _hash: &str) -> Result<Option<RemoteId>, ApiError> {
        Ok(None)
    }
}
