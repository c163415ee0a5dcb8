//! HTTP JSON-RPC client backed by `reqwest`.
//!
//! One request per call, no retries. Non-success statuses are reported as
//! [`TransportError::Http`] with the response body attached so the
//! dispatcher can classify QuickNode's error payloads.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use quicknode_core::error::TransportError;
use quicknode_core::request::JsonRpcRequest;
use quicknode_core::transport::RpcTransport;

/// Configuration for `HttpRpcClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            user_agent: format!("quicknode-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP JSON-RPC client for a single endpoint.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpRpcClient {
    // The URL embeds the auth token.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpcClient").finish_non_exhaustive()
    }
}

impl HttpRpcClient {
    /// Create a new client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpClientConfig::default())
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http {
                status: e.status().map(|s| s.as_u16()),
                body: None,
                message: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(
                method = %req.method,
                status = status.as_u16(),
                "non-success HTTP status"
            );
            return Err(TransportError::Http {
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {body}", status.as_u16()),
                body: Some(body),
            });
        }

        resp.json::<Value>().await.map_err(|e| TransportError::Http {
            status: Some(status.as_u16()),
            body: None,
            message: e.without_url().to_string(),
        })
    }

    fn url(&self) -> &str {
        &self.url
    }
}
