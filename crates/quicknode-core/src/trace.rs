//! Remote transaction tracing through `debug_traceTransaction`.
//!
//! A [`TransactionTrace`] fetches the top-level call frame once, using the
//! `callTracer` with `onlyTopLevelCall`, and derives the return value and
//! revert reason from that single response.

use std::fmt;
use std::sync::Arc;

use alloy_core::dyn_abi::{DynSolValue, FunctionExt};
use alloy_json_abi::Function;
use alloy_primitives::Bytes;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::dispatch::RpcDispatcher;
use crate::error::ProviderError;

/// How call trees are reconstructed. QuickNode traces are always
/// parity-style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceApproach {
    Parity,
}

impl fmt::Display for TraceApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parity => write!(f, "parity"),
        }
    }
}

/// Optional decoding hints for a trace.
#[derive(Debug, Clone, Default)]
pub struct TraceHints {
    /// ABI of the method the transaction called, used to decode `output`.
    pub root_method_abi: Option<Function>,
}

impl TraceHints {
    pub fn with_method_abi(mut self, abi: Function) -> Self {
        self.root_method_abi = Some(abi);
        self
    }
}

/// Return data of the top-level call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// The frame had no `output`.
    Empty,
    /// Raw output bytes, no ABI to decode them with.
    Raw(Bytes),
    /// Output decoded against the method ABI.
    Decoded(Vec<DynSolValue>),
}

impl ReturnValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Raw(bytes) => bytes.is_empty(),
            Self::Decoded(values) => values.is_empty(),
        }
    }
}

/// Reject anything that is not `0x`-prefixed before touching the network.
pub fn validate_transaction_hash(hash: &str) -> Result<(), ProviderError> {
    if hash.starts_with("0x") {
        Ok(())
    } else {
        Err(ProviderError::InvalidTransactionHash(hash.to_string()))
    }
}

/// Lazily loaded trace of one transaction.
pub struct TransactionTrace {
    transaction_hash: String,
    dispatcher: Arc<RpcDispatcher>,
    hints: TraceHints,
    top_level_call: OnceCell<Value>,
    return_value: OnceCell<ReturnValue>,
    revert_message: OnceCell<Option<String>>,
}

impl fmt::Debug for TransactionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionTrace")
            .field("transaction_hash", &self.transaction_hash)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl TransactionTrace {
    /// Fails with [`ProviderError::InvalidTransactionHash`] unless the hash
    /// starts with `0x`. No request is made here.
    pub fn new(
        transaction_hash: impl Into<String>,
        dispatcher: Arc<RpcDispatcher>,
        hints: TraceHints,
    ) -> Result<Self, ProviderError> {
        let transaction_hash = transaction_hash.into();
        validate_transaction_hash(&transaction_hash)?;
        Ok(Self {
            transaction_hash,
            dispatcher,
            hints,
            top_level_call: OnceCell::new(),
            return_value: OnceCell::new(),
            revert_message: OnceCell::new(),
        })
    }

    pub fn transaction_hash(&self) -> &str {
        &self.transaction_hash
    }

    /// Always [`TraceApproach::Parity`] for QuickNode.
    pub fn call_trace_approach(&self) -> TraceApproach {
        TraceApproach::Parity
    }

    /// Whether the top-level call has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.top_level_call.initialized()
    }

    /// The top-level call frame, fetched on first access.
    pub async fn top_level_call(&self) -> Result<&Value, ProviderError> {
        self.top_level_call
            .get_or_try_init(|| async {
                tracing::debug!(tx = %self.transaction_hash, "fetching top-level call trace");
                self.dispatcher
                    .request::<Value>(
                        "debug_traceTransaction",
                        Some(vec![
                            Value::String(self.transaction_hash.clone()),
                            json!({
                                "tracer": "callTracer",
                                "tracerConfig": {"onlyTopLevelCall": true},
                            }),
                        ]),
                    )
                    .await
            })
            .await
    }

    /// The call's `output`, decoded when a method ABI hint was given.
    pub async fn return_value(&self) -> Result<&ReturnValue, ProviderError> {
        self.return_value
            .get_or_try_init(|| async {
                let frame = self.top_level_call().await?;
                decode_output(frame, self.hints.root_method_abi.as_ref())
            })
            .await
    }

    /// The node-reported `revertReason`, if any.
    pub async fn revert_message(&self) -> Result<Option<&str>, ProviderError> {
        let reason = self
            .revert_message
            .get_or_try_init(|| async {
                let frame = self.top_level_call().await?;
                Ok::<_, ProviderError>(
                    frame
                        .get("revertReason")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                )
            })
            .await?;
        Ok(reason.as_deref())
    }
}

fn decode_output(frame: &Value, abi: Option<&Function>) -> Result<ReturnValue, ProviderError> {
    let Some(output) = frame.get("output").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return Ok(ReturnValue::Empty);
    };

    let bytes: Bytes = output
        .parse()
        .map_err(|e| ProviderError::Decode(format!("invalid output hex '{output}': {e}")))?;
    if bytes.is_empty() {
        return Ok(ReturnValue::Raw(bytes));
    }

    match abi {
        Some(function) => function
            .abi_decode_output(&bytes, true)
            .map(ReturnValue::Decoded)
            .map_err(|e| ProviderError::Decode(format!("{}: {e}", function.name))),
        None => Ok(ReturnValue::Raw(bytes)),
    }
}
