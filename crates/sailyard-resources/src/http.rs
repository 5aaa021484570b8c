//! HTTP control-plane client
//!
//! Sends each action as a JSON POST to `{endpoint}/{action}`. Faults come
//! back as a non-2xx response with a `{ "code", "message" }` body.

use crate::client::ControlPlane;
use async_trait::async_trait;
use sailyard_cloud::{CloudError, Result};
use serde::Deserialize;
use serde_json::Value;

const REGION_HEADER: &str = "X-Sailyard-Region";

/// Connection settings for the control plane
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub endpoint: String,
    pub region: Option<String>,
    pub api_token: Option<String>,
}

impl ControlPlaneConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: None,
            api_token: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Create ControlPlaneConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SAILYARD_ENDPOINT").map_err(|_| {
            CloudError::InvalidConfig("SAILYARD_ENDPOINT is not set".to_string())
        })?;

        Ok(Self {
            endpoint,
            region: std::env::var("SAILYARD_REGION").ok(),
            api_token: std::env::var("SAILYARD_API_TOKEN").ok(),
        })
    }
}

/// reqwest-backed [`ControlPlane`]
pub struct HttpControlPlane {
    client: reqwest::Client,
    config: ControlPlaneConfig,
}

impl HttpControlPlane {
    pub fn new(config: ControlPlaneConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn url(&self, action: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), action)
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn call(&self, action: &str, request: Value) -> Result<Value> {
        let url = self.url(action);
        tracing::debug!("POST {}", url);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(region) = &self.config.region {
            builder = builder.header(REGION_HEADER, region);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CloudError::Unclassified(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudError::Unclassified(format!("{} response unreadable: {}", action, e)))?;

        if !status.is_success() {
            let fault = fault_from_response(status.as_u16(), &body);
            tracing::debug!("{} failed with {}: {}", action, fault.kind(), fault);
            return Err(fault);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

// ============ API Types ============

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "__type")]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Map an error response to a classified fault
fn fault_from_response(status: u16, body: &str) -> CloudError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body.trim()));

    match parsed.code.or(parsed.error_type) {
        Some(code) if !code.is_empty() => CloudError::from_code(&code, message),
        _ => match status {
            404 => CloudError::ResourceNotFound(message),
            400 | 422 => CloudError::InvalidInput(message),
            409 => CloudError::ResourceAlreadyExists(message),
            _ => CloudError::Unclassified(message),
        },
    }
}
