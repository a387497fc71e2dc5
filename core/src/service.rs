//! Async request submission.
//!
//! # Design
//! `ProductService` pairs a `MarketClient` with a `Transport` and turns
//! each operation into a single awaited call. Every call owns its request
//! and response for its whole lifetime; the service itself is immutable
//! and can be shared across tasks. There is no retry: one call, one
//! request. Callers stop a call early with a `CancellationToken`.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::MarketClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::payload::{build_create_payload, build_delete_payload, build_partial_update_payload, Payload};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{PartialProductDraft, ProductDetail, ProductDraft, ProductResponse, ProductSummary};

pub struct ProductService<T = ReqwestTransport> {
    client: MarketClient,
    transport: T,
    timeout: Option<Duration>,
}

impl ProductService<ReqwestTransport> {
    /// Service over a fresh reqwest client.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config, ReqwestTransport::new())
    }
}

impl<T: Transport> ProductService<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        Self {
            client: MarketClient::from_config(config),
            transport,
            timeout: config.timeout,
        }
    }

    pub fn client(&self) -> &MarketClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encodes `payload` for `method`, sends it to `endpoint` and decodes
    /// the product the server answers with.
    pub async fn submit(
        &self,
        payload: &Payload,
        endpoint: &str,
        method: HttpMethod,
        cancel: &CancellationToken,
    ) -> Result<ProductResponse, ApiError> {
        let request = self
            .client
            .build_request(payload, endpoint, method)
            .inspect_err(log_failure)?;
        let response = self.round_trip(request, cancel).await?;
        self.client.parse_product(response).inspect_err(log_failure)
    }

    pub async fn list_products(
        &self,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductSummary>, ApiError> {
        let response = self
            .round_trip(self.client.build_list_products(page), cancel)
            .await?;
        self.client.parse_list_products(response).inspect_err(log_failure)
    }

    pub async fn get_product(&self, id: u64, cancel: &CancellationToken) -> Result<ProductDetail, ApiError> {
        let response = self.round_trip(self.client.build_get_product(id), cancel).await?;
        self.client.parse_product(response).inspect_err(log_failure)
    }

    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        cancel: &CancellationToken,
    ) -> Result<ProductResponse, ApiError> {
        let payload = build_create_payload(draft).inspect_err(log_failure)?;
        self.submit(&payload, "/products", HttpMethod::Post, cancel).await
    }

    pub async fn update_product(
        &self,
        id: u64,
        draft: &PartialProductDraft,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<ProductResponse, ApiError> {
        let payload = build_partial_update_payload(draft, password);
        self.submit(&payload, &format!("/products/{id}"), HttpMethod::Patch, cancel)
            .await
    }

    pub async fn delete_product(
        &self,
        id: u64,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<ProductResponse, ApiError> {
        let payload = build_delete_payload(id, password);
        self.submit(&payload, &format!("/products/{id}"), HttpMethod::Delete, cancel)
            .await
    }

    async fn round_trip(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "Sending request");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = with_timeout(self.timeout, self.transport.execute(request)) => result,
        };

        match &outcome {
            Ok(response) => tracing::debug!(%method, %url, status = response.status, "Received response"),
            Err(e) => tracing::warn!(%method, %url, error = %e, "Request did not complete"),
        }
        outcome
    }
}

async fn with_timeout<F>(limit: Option<Duration>, call: F) -> Result<HttpResponse, ApiError>
where
    F: Future<Output = Result<HttpResponse, ApiError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ApiError::transport(format!("timed out after {}ms", limit.as_millis())))?,
        None => call.await,
    }
}

fn log_failure(err: &ApiError) {
    tracing::warn!(error = %err, status = ?err.status(), "Request failed");
}
