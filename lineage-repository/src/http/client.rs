//! HTTP catalog client.
//!
//! This module provides the concrete implementation of `CatalogClient`
//! against a JSON-over-HTTP catalog API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::CatalogConfig;
use crate::errors::ApiError;
use crate::http::status::{classify_transport, error_for_status};
use crate::interfaces::CatalogClient;
use lineage_shared::{Relationship, RemoteId};

/// Body of a successful create or lookup response.
#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BulkBody {
    results: Vec<BulkItem>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    id: Option<String>,
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
struct BulkItemError {
    status: u16,
    message: String,
}

/// Catalog client speaking JSON over HTTP.
///
/// # Example
///
/// ```ignore
/// let config = CatalogConfig::new("http://localhost:8080/api").with_api_token(token);
/// let client = HttpCatalogClient::new(config)?;
/// let id = client.create(&relationship).await?;
/// ```
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    config: CatalogConfig,
}

impl HttpCatalogClient {
    /// Create a new client for the configured base URL.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpCatalogClient)` - A new client instance
    /// * `Err(ApiError)` - If the URL is invalid or the HTTP client cannot be built
    pub fn new(config: CatalogConfig) -> Result<Self, ApiError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| ApiError::fatal(format!("Invalid catalog URL: {}", e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::fatal(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            url = %parsed,
            identity_lookup = config.identity_lookup,
            "Created catalog client"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| classify_transport(&e))
    }

    /// Turn a non-success response into an error, reading its body for context.
    async fn fail(response: Response) -> ApiError {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Catalog request failed");
        error_for_status(status, &headers, &body)
    }

    fn item_result(item: BulkItem) -> Result<RemoteId, ApiError> {
        match (item.id, item.error) {
            (Some(id), None) => Ok(RemoteId::new(id)),
            (_, Some(err)) => {
                let status = reqwest::StatusCode::from_u16(err.status).map_err(|_| {
                    ApiError::invalid_response(format!("Invalid item status {}", err.status))
                })?;
                Err(error_for_status(
                    status,
                    &reqwest::header::HeaderMap::new(),
                    &err.message,
                ))
            }
            (None, None) => Err(ApiError::invalid_response(
                "Bulk item has neither id nor error",
            )),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self, relationship), fields(identity_hash = %relationship.identity_hash()))]
    async fn create(&self, relationship: &Relationship) -> Result<RemoteId, ApiError> {
        let request = self
            .client
            .post(self.endpoint("relationships"))
            .json(&relationship.to_payload());

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let body: CreatedBody = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(e.to_string()))?;

        debug!(remote_id = %body.id, "Relationship created");
        Ok(RemoteId::new(body.id))
    }

    #[instrument(skip(self, relationships), fields(count = relationships.len()))]
    async fn bulk_create(
        &self,
        relationships: &[Relationship],
    ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
        let payload: Vec<Value> = relationships.iter().map(|r| r.to_payload()).collect();
        let request = self
            .client
            .post(self.endpoint("relationships/bulk"))
            .json(&serde_json::json!({ "relationships": payload }));

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let body: BulkBody = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(e.to_string()))?;

        if body.results.len() != relationships.len() {
            return Err(ApiError::invalid_response(format!(
                "Bulk response has {} results for {} relationships",
                body.results.len(),
                relationships.len()
            )));
        }

        Ok(body.results.into_iter().map(Self::item_result).collect())
    }

    fn supports_identity_lookup(&self) -> bool {
        self.config.identity_lookup
    }

    async fn find_by_identity_hash(&self, hash: &str) -> Result<Option<RemoteId>, ApiError> {
        let request = self
            .client
            .get(self.endpoint("relationships"))
            .query(&[("identity_hash", hash)]);

        let response = self.send(request).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let body: CreatedBody = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(e.to_string()))?;
        Ok(Some(RemoteId::new(body.id)))
    }
}
