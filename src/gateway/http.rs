//! HTTP client for the indexing backend

use super::wire::{self, ErrorBody, ProcessRequest, ProcessResponse, QueryRequest, QueryResponse};
use super::{GatewayError, IndexGateway, RepositorySnapshot};
use crate::config::{parse_duration, GatewayConfig};
use crate::error::{Result, SmartgrepError};
use crate::types::{SearchModelId, SearchResult};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Gateway that talks JSON over HTTP (`POST /process`, `POST /search`)
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the backend at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .map_err(|e| SmartgrepError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a gateway from the `[gateway]` config section
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let timeout = parse_duration(&config.request_timeout).ok_or_else(|| {
            SmartgrepError::InvalidConfigValue {
                path: "gateway.request_timeout".to_string(),
                message: format!("Cannot parse '{}' as a duration", config.request_timeout),
            }
        })?;
        Self::new(config.base_url.clone(), timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> std::result::Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            GatewayError::Network(format!("Failed to read response from {}: {}", url, e))
        })?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        wire::decode(&text).map_err(|e| {
            GatewayError::Network(format!("Failed to decode response from {}: {}", url, e))
        })
    }
}

/// 4xx means the backend refused the input, anything else is a transport problem
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| body.trim().to_string());

    if status.is_client_error() {
        GatewayError::Validation(detail)
    } else {
        GatewayError::Network(format!("HTTP {}: {}", status.as_u16(), detail))
    }
}

impl IndexGateway for HttpGateway {
    async fn submit_repository(
        &self,
        url: &str,
    ) -> std::result::Result<RepositorySnapshot, GatewayError> {
        let response: ProcessResponse = self
            .post("process", &ProcessRequest { repo_url: url })
            .await?;

        if let Some(status) = &response.status {
            tracing::debug!("Backend reported repository status '{}'", status);
        }

        response.into_snapshot()
    }

    async fn run_query(
        &self,
        query: &str,
        model: SearchModelId,
    ) -> std::result::Result<Vec<SearchResult>, GatewayError> {
        let response: QueryResponse = self.post("search", &QueryRequest { query, model }).await?;
        let mut results = wire::into_results(response.into_inner(), model)?;

        // Callers rely on descending score order; keep the backend's order among ties
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(results)
    }
}
