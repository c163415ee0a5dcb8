//! The two capability sets a provider exposes to the framework.

use async_trait::async_trait;
use serde_json::Value;

use quicknode_core::ProviderError;

/// Connection lifecycle and raw request dispatch.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Resolve the endpoint and open the connection. Fails before any
    /// network I/O when credentials are missing or the network is unknown.
    fn connect(&mut self) -> Result<(), ProviderError>;

    /// Drop the connection. Safe to call when not connected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Send a JSON-RPC request; `params` defaults to `[]`.
    async fn make_request(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
    ) -> Result<Value, ProviderError>;
}

/// Canonical identity of an upstream node service.
pub trait UpstreamIdentity {
    fn name(&self) -> &str;

    /// Endpoint URI including credentials.
    fn uri(&self) -> Result<String, ProviderError>;

    fn http_uri(&self) -> Result<String, ProviderError> {
        self.uri()
    }

    fn ws_uri(&self) -> Result<String, ProviderError>;

    fn connection_str(&self) -> Result<String, ProviderError> {
        self.uri()
    }
}
