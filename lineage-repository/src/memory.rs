//! In-memory catalog.
//!
//! Stores relationships keyed by identity hash. Used for local runs without a
//! catalog service and as the reference backend in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::ApiError;
use crate::interfaces::CatalogClient;
use lineage_shared::{Relationship, RemoteId};

/// Thread-safe in-memory relationship store.
pub struct InMemoryCatalogClient {
    relationships: Mutex<HashMap<String, (RemoteId, Relationship)>>,
    next_id: AtomicUsize,
    create_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
    identity_lookup: bool,
}

impl InMemoryCatalogClient {
    pub fn new() -> Self {
        Self {
            relationships: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            create_calls: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
            identity_lookup: true,
        }
    }

    /// Disable identity lookup, as a catalog without that capability would.
    pub fn without_identity_lookup(mut self) -> Self {
        self.identity_lookup = false;
        self
    }

    /// Number of stored relationships.
    pub async fn len(&self) -> usize {
        self.relationships.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, identity_hash: &str) -> bool {
        self.relationships.lock().await.contains_key(identity_hash)
    }

    /// Relationships created, counting each item of a bulk call.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    async fn store(&self, relationship: &Relationship) -> RemoteId {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut relationships = self.relationships.lock().await;
        if let Some((id, _)) = relationships.get(relationship.identity_hash()) {
            return id.clone();
        }

        let id = RemoteId::new(format!(
            "rel-{:06}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        relationships.insert(
            relationship.identity_hash().to_string(),
            (id.clone(), relationship.clone()),
        );
        debug!(remote_id = %id, "Stored relationship");
        id
    }
}

impl Default for InMemoryCatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    async fn create(&self, relationship: &Relationship) -> Result<RemoteId, ApiError> {
        Ok(self.store(relationship).await)
    }

    async fn bulk_create(
        &self,
        relationships: &[Relationship],
    ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        let mut results = Vec::with_capacity(relationships.len());
        for relationship in relationships {
            results.push(Ok(self.store(relationship).await));
        }
        Ok(results)
    }

    fn supports_identity_lookup(&self) -> bool {
        self.identity_lookup
    }

    async fn find_by_identity_hash(&self, hash: &str) -> Result<Option<RemoteId>, ApiError> {
        Ok(self
            .relationships
            .lock()
            .await
            .get(hash)
            .map(|(id, _)| id.clone()))
    }
}
