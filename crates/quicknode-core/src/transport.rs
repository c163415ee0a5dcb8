//! The `RpcTransport` trait — the seam between the provider and the wire.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::JsonRpcRequest;

/// A single logical connection to a JSON-RPC endpoint.
///
/// `send` returns the decoded response body as-is. Some transports hand back
/// the full `{"jsonrpc", "id", "result"}` envelope, others unwrap it
/// themselves; the dispatcher accepts both.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the raw response body.
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}
