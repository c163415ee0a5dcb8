//! Request dispatch: envelope unwrapping and error classification.
//!
//! Every call made through the provider passes through [`RpcDispatcher`].
//! Transport failures are classified exactly once here; nothing is retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ProviderError, TransportError};
use crate::request::{JsonRpcError, JsonRpcRequest};
use crate::transport::RpcTransport;

/// Substring QuickNode uses for plan and network-tier limitations.
pub const FEATURE_NOT_AVAILABLE_MARKER: &str = "is not available";

/// Issues requests over one transport and normalizes the results.
pub struct RpcDispatcher {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RpcDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcDispatcher")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl RpcDispatcher {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Send `method` with `params` (empty when `None`).
    ///
    /// Returns the `result` member when the response carries a non-empty one,
    /// otherwise the raw response body.
    pub async fn make_request(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
    ) -> Result<Value, ProviderError> {
        let params = params.unwrap_or_default();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, method, "sending request");

        match self.transport.send(JsonRpcRequest::new(id, method, params)).await {
            Ok(raw) => Ok(unwrap_response(raw)),
            Err(err) => {
                let classified = classify_transport_error(err);
                tracing::warn!(id, method, error = %classified, "request failed");
                Err(classified)
            }
        }
    }

    /// Like [`make_request`](Self::make_request) but deserializes the result,
    /// taking the envelope's `result` even when it is empty or `null`.
    ///
    /// A body carrying an `error` member fails through
    /// [`classify_error_envelope`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
    ) -> Result<T, ProviderError> {
        let value = self.make_request(method, params).await?;
        if let Some(err) = classify_error_envelope(&value) {
            tracing::debug!(method, error = %err, "node returned an error");
            return Err(err);
        }
        serde_json::from_value(strip_envelope(value)).map_err(ProviderError::Deserialization)
    }
}

/// Pull a non-empty `result` out of a response body.
///
/// Anything else, error envelopes included, is returned unchanged, which
/// keeps transports that already unwrap the envelope working.
pub fn unwrap_response(raw: Value) -> Value {
    match raw {
        Value::Object(mut map) if map.get("result").is_some_and(is_truthy) => {
            map.remove("result").unwrap_or_default()
        }
        other => other,
    }
}

/// Classify a response body that carries an `error` member and no usable
/// result.
///
/// Uses the same rule as HTTP error bodies: a message containing
/// [`FEATURE_NOT_AVAILABLE_MARKER`] is [`ProviderError::FeatureNotAvailable`].
/// Any other error object becomes [`ProviderError::Rpc`]. `None` when the
/// body is not an error envelope.
pub fn classify_error_envelope(body: &Value) -> Option<ProviderError> {
    let map = body.as_object()?;
    if map.get("result").is_some_and(is_truthy) {
        return None;
    }
    let error = map.get("error").filter(|e| !e.is_null())?;

    let message = error_message(error);
    if message.contains(FEATURE_NOT_AVAILABLE_MARKER) {
        return Some(ProviderError::FeatureNotAvailable {
            message,
            source: None,
        });
    }
    let rpc_error = serde_json::from_value::<JsonRpcError>(error.clone()).unwrap_or(JsonRpcError {
        code: 0,
        message,
        data: None,
    });
    Some(ProviderError::Rpc(rpc_error))
}

/// Return the `result` of a full JSON-RPC envelope, whatever it holds.
pub fn strip_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("jsonrpc") && map.contains_key("result") => {
            map.remove("result").unwrap_or_default()
        }
        other => other,
    }
}

/// Classify a transport failure into a provider error.
///
/// HTTP error bodies of the form `{"error": {"message": ...}}` become
/// [`ProviderError::FeatureNotAvailable`] when the message mentions an
/// unavailable feature and [`ProviderError::Provider`] otherwise. Bodies
/// without an `error` member, and failures with no body at all, wrap the
/// transport error text. The transport error is kept as the source.
pub fn classify_transport_error(err: TransportError) -> ProviderError {
    let error_data = err
        .body()
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .and_then(|body| match body {
            Value::Object(mut map) => map.remove("error"),
            _ => None,
        })
        .filter(|error| !error.is_null());

    let Some(error_data) = error_data else {
        return ProviderError::Provider {
            message: err.to_string(),
            source: Some(err),
        };
    };

    let message = error_message(&error_data);
    if message.contains(FEATURE_NOT_AVAILABLE_MARKER) {
        ProviderError::FeatureNotAvailable {
            message,
            source: Some(err),
        }
    } else {
        ProviderError::Provider {
            message,
            source: Some(err),
        }
    }
}

/// `error.message` when present, the whole error stringified otherwise.
fn error_message(error: &Value) -> String {
    match error {
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => error.to_string(),
        },
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// JSON truthiness: `null`, `false`, zero, and empty strings, arrays and
/// objects are all empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::error::Error as _;
    use std::sync::Mutex;

    fn http_error(status: u16, body: &str) -> TransportError {
        TransportError::Http {
            status: Some(status),
            body: Some(body.to_string()),
            message: format!("HTTP {status}: {body}"),
        }
    }

    #[test]
    fn feature_not_available_from_body() {
        let err = classify_transport_error(http_error(
            403,
            r#"{"error":{"message":"debug_traceTransaction is not available on your plan"}}"#,
        ));
        match &err {
            ProviderError::FeatureNotAvailable { message, .. } => {
                assert_eq!(message, "debug_traceTransaction is not available on your plan");
            }
            other => panic!("expected FeatureNotAvailable, got {other:?}"),
        }
        assert!(err.source().is_some());
    }

    #[test]
    fn generic_message_from_body() {
        let err = classify_transport_error(http_error(400, r#"{"error":{"message":"foo"}}"#));
        assert!(matches!(err, ProviderError::Provider { ref message, .. } if message == "foo"));
    }

    #[test]
    fn unsupported_on_network_is_generic() {
        let err = classify_transport_error(http_error(
            400,
            r#"{"error":{"message":"This feature is not supported on the current network."}}"#,
        ));
        assert!(matches!(err, ProviderError::Provider { .. }));
    }

    #[test]
    fn body_without_error_key_wraps_raw_text() {
        let err = classify_transport_error(http_error(502, r#"{"status":"bad gateway"}"#));
        match err {
            ProviderError::Provider { message, source } => {
                assert!(message.contains("HTTP 502"));
                assert!(message.contains("bad gateway"));
                assert!(source.is_some());
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_wraps_raw_text() {
        let err = classify_transport_error(http_error(500, "<html>oops</html>"));
        assert!(err.to_string().contains("<html>oops</html>"));
    }

    #[test]
    fn error_without_message_is_stringified() {
        let err = classify_transport_error(http_error(400, r#"{"error":{"code":-32000}}"#));
        assert_eq!(err.to_string(), r#"{"code":-32000}"#);
    }

    #[test]
    fn string_error_is_used_directly() {
        let err = classify_transport_error(http_error(429, r#"{"error":"method is not available"}"#));
        assert!(err.is_feature_not_available());
    }

    #[test]
    fn unwrap_returns_result() {
        let raw = json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"});
        assert_eq!(unwrap_response(raw), json!("0x10"));
    }

    #[test]
    fn unwrap_passes_through_already_unwrapped() {
        let raw = json!({"output": "0x", "revertReason": null});
        assert_eq!(unwrap_response(raw.clone()), raw);
        assert_eq!(unwrap_response(json!("0x1")), json!("0x1"));
    }

    #[test]
    fn unwrap_keeps_envelope_for_empty_result() {
        let raw = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(unwrap_response(raw.clone()), raw);
        assert_eq!(strip_envelope(raw), Value::Null);
    }

    #[test]
    fn unwrap_keeps_error_envelope() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "trace_block is not available on your plan"}
        });
        assert_eq!(unwrap_response(raw.clone()), raw);
    }

    #[test]
    fn error_envelope_is_rpc_error() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 3, "message": "execution reverted: nope", "data": "0x"}
        });
        match classify_error_envelope(&raw) {
            Some(ProviderError::Rpc(err)) => {
                assert_eq!(err.code, 3);
                assert_eq!(err.message, "execution reverted: nope");
            }
            other => panic!("expected Rpc, got {other:?}"),
        }
    }

    #[test]
    fn error_envelope_feature_not_available() {
        let raw = json!({"error": {"code": -32000, "message": "trace_block is not available on your plan"}});
        let err = classify_error_envelope(&raw).unwrap();
        assert!(err.is_feature_not_available());
        assert_eq!(err.to_string(), "trace_block is not available on your plan");
    }

    #[test]
    fn non_error_bodies_are_not_classified() {
        assert!(classify_error_envelope(&json!({"jsonrpc": "2.0", "id": 1, "result": null})).is_none());
        assert!(classify_error_envelope(&json!({"result": "0x1", "error": {"message": "x"}})).is_none());
        assert!(classify_error_envelope(&json!({"error": null})).is_none());
        assert!(classify_error_envelope(&json!("0x1")).is_none());
    }

    struct RecordingTransport {
        requests: Mutex<Vec<JsonRpcRequest>>,
        reply: Value,
    }

    #[async_trait]
    impl RpcTransport for RecordingTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
            self.requests.lock().unwrap().push(req);
            Ok(self.reply.clone())
        }
        fn url(&self) -> &str {
            "mock://recording"
        }
    }

    #[tokio::test]
    async fn params_default_to_empty_and_ids_increase() {
        let transport = Arc::new(RecordingTransport {
            requests: Mutex::new(Vec::new()),
            reply: json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}),
        });
        let dispatcher = RpcDispatcher::new(transport.clone());

        dispatcher.make_request("eth_blockNumber", None).await.unwrap();
        dispatcher.make_request("eth_chainId", Some(vec![])).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0].params.is_empty());
        assert_eq!(requests[0].id, crate::request::RpcId::Number(1));
        assert_eq!(requests[1].id, crate::request::RpcId::Number(2));
    }

    #[tokio::test]
    async fn make_request_returns_error_envelope_unchanged() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "trace_block is not available on your plan"}
        });
        let transport = Arc::new(RecordingTransport {
            requests: Mutex::new(Vec::new()),
            reply: body.clone(),
        });
        let dispatcher = RpcDispatcher::new(transport);

        assert_eq!(dispatcher.make_request("trace_block", None).await.unwrap(), body);
        let err = dispatcher.request::<Value>("trace_block", None).await.unwrap_err();
        assert!(err.is_feature_not_available());
    }

    #[tokio::test]
    async fn typed_request_takes_falsy_result() {
        let transport = Arc::new(RecordingTransport {
            requests: Mutex::new(Vec::new()),
            reply: json!({"jsonrpc": "2.0", "id": 1, "result": false}),
        });
        let dispatcher = RpcDispatcher::new(transport);
        let syncing: bool = dispatcher.request("eth_syncing", None).await.unwrap();
        assert!(!syncing);
    }
}
