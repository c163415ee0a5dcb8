//! Execution failure translation.
//!
//! Turns the shape of a failed call into either a contract revert with an
//! optional reason or a generic virtual machine error.

use std::fmt;

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use serde_json::Value;
use thiserror::Error;

use crate::request::JsonRpcError;

/// Prefix nodes put on every revert message.
pub const REVERT_PREFIX: &str = "execution reverted";

/// Rendering of a revert that carried no decodable reason.
pub const TRANSACTION_FAILED: &str = "Transaction failed.";

/// The 4-byte selector for `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// A failed contract execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The contract reverted. `revert_message` is `None` when no reason
    /// could be extracted.
    #[error("{}", .revert_message.as_deref().unwrap_or(TRANSACTION_FAILED))]
    ContractLogic {
        revert_message: Option<String>,
        txn: Option<String>,
    },

    /// Any other execution failure.
    #[error("{message}")]
    VirtualMachine {
        message: String,
        txn: Option<String>,
    },
}

impl ExecutionError {
    pub fn is_contract_logic(&self) -> bool {
        matches!(self, Self::ContractLogic { .. })
    }

    /// Transaction the failure belongs to, if known.
    pub fn txn(&self) -> Option<&str> {
        match self {
            Self::ContractLogic { txn, .. } | Self::VirtualMachine { txn, .. } => txn.as_deref(),
        }
    }
}

/// How the client library that produced the failure categorised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Already recognised as a contract revert.
    ContractLogic,
    Other,
}

/// A failed call as reported by the node-facing client.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFailure {
    pub kind: FailureKind,
    /// Structured arguments, first one being the message.
    pub args: Vec<Value>,
    /// Text rendering of the original error.
    pub description: String,
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl CallFailure {
    pub fn new(kind: FailureKind, args: Vec<Value>, description: impl Into<String>) -> Self {
        Self {
            kind,
            args,
            description: description.into(),
        }
    }

    /// A failure carrying a single message argument.
    pub fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(FailureKind::Other, vec![Value::String(text.clone())], text)
    }

    /// A failure the client library already classified as a revert.
    pub fn contract_logic(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(
            FailureKind::ContractLogic,
            vec![Value::String(text.clone())],
            text,
        )
    }

    /// Build a failure from a node's JSON-RPC error object.
    ///
    /// Revert messages become [`FailureKind::ContractLogic`] failures. When
    /// the node only says `execution reverted` but attaches ABI-encoded
    /// `Error(string)` data, the decoded reason is appended to the message.
    /// Anything else keeps the error object as its first argument.
    pub fn from_rpc_error(err: &JsonRpcError) -> Self {
        if !err.message.starts_with(REVERT_PREFIX) {
            let object = serde_json::to_value(err).unwrap_or_else(|_| Value::String(err.message.clone()));
            return Self::new(FailureKind::Other, vec![object], err.to_string());
        }

        let reason = err
            .data
            .as_ref()
            .and_then(revert_data_bytes)
            .and_then(|data| decode_error_string(&data));
        match reason {
            Some(reason) if err.message.trim() == REVERT_PREFIX => {
                Self::contract_logic(format!("{REVERT_PREFIX}: {reason}"))
            }
            _ => Self::contract_logic(err.message.clone()),
        }
    }
}

/// Translate a call failure into an [`ExecutionError`].
///
/// Pure: the result depends only on the failure's shape.
pub fn classify(failure: &CallFailure, txn: Option<&str>) -> ExecutionError {
    let txn = txn.map(str::to_string);
    let Some(first) = failure.args.first() else {
        return ExecutionError::VirtualMachine {
            message: failure.description.clone(),
            txn,
        };
    };

    if failure.kind != FailureKind::ContractLogic {
        if let Some(nested) = first.as_object().and_then(|obj| obj.get("message")) {
            let message = match nested {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return ExecutionError::VirtualMachine { message, txn };
        }
    }

    let Some(message) = first.as_str() else {
        return ExecutionError::VirtualMachine {
            message: failure.description.clone(),
            txn,
        };
    };

    if let Some(rest) = message.strip_prefix(REVERT_PREFIX) {
        let revert_message = rest
            .rsplit_once(':')
            .map(|(_, reason)| reason.trim().to_string());
        return ExecutionError::ContractLogic {
            revert_message,
            txn,
        };
    }

    ExecutionError::VirtualMachine {
        message: message.to_string(),
        txn,
    }
}

/// Decode `Error(string)` revert data. `None` if the data is anything else.
pub fn decode_error_string(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(&ERROR_STRING_SELECTOR)?;
    match DynSolType::String.abi_decode(payload) {
        Ok(DynSolValue::String(s)) => Some(s),
        _ => None,
    }
}

/// Revert data arrives either as a hex string or nested under `data`.
fn revert_data_bytes(data: &Value) -> Option<Vec<u8>> {
    match data {
        Value::String(s) => hex::decode(s.trim_start_matches("0x")).ok(),
        Value::Object(map) => map.get("data").and_then(revert_data_bytes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// `require(false, "Not enough tokens to transfer")`
    const REVERT_HEX: &str = "0x08c379a00000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000000000001d4e6f7420656e6f75676820746f6b656e7320746f207472616e73666572000000";

    #[test]
    fn revert_with_reason() {
        let err = classify(
            &CallFailure::contract_logic("execution reverted : EXPECTED REVERT MESSAGE"),
            Some("0xabc"),
        );
        assert_eq!(
            err,
            ExecutionError::ContractLogic {
                revert_message: Some("EXPECTED REVERT MESSAGE".into()),
                txn: Some("0xabc".into()),
            }
        );
        assert_eq!(err.to_string(), "EXPECTED REVERT MESSAGE");
    }

    #[test]
    fn revert_without_reason() {
        let err = classify(&CallFailure::contract_logic("execution reverted"), None);
        assert_eq!(
            err,
            ExecutionError::ContractLogic {
                revert_message: None,
                txn: None
            }
        );
        assert_eq!(err.to_string(), TRANSACTION_FAILED);
    }

    #[test]
    fn reason_is_text_after_last_colon() {
        let err = classify(&CallFailure::message("execution reverted: Ownable: caller is not the owner"), None);
        assert_eq!(
            err,
            ExecutionError::ContractLogic {
                revert_message: Some("caller is not the owner".into()),
                txn: None
            }
        );
    }

    #[test]
    fn other_text_is_vm_error() {
        let err = classify(&CallFailure::message("out of gas"), None);
        assert_eq!(
            err,
            ExecutionError::VirtualMachine {
                message: "out of gas".into(),
                txn: None
            }
        );
    }

    #[test]
    fn no_args_wraps_description() {
        let failure = CallFailure::new(FailureKind::Other, vec![], "connection dropped");
        let err = classify(&failure, None);
        assert_eq!(err.to_string(), "connection dropped");
        assert!(!err.is_contract_logic());
    }

    #[test]
    fn nested_message_object() {
        let failure = CallFailure::new(
            FailureKind::Other,
            vec![json!({"code": -32000, "message": "insufficient funds for gas"})],
            "ValueError",
        );
        assert_eq!(
            classify(&failure, None),
            ExecutionError::VirtualMachine {
                message: "insufficient funds for gas".into(),
                txn: None
            }
        );
    }

    #[test]
    fn nested_message_ignored_for_native_revert() {
        let failure = CallFailure::new(
            FailureKind::ContractLogic,
            vec![json!({"message": "execution reverted: x"})],
            "ContractLogicError",
        );
        // Not a string and not unpacked: generic wrap.
        assert_eq!(
            classify(&failure, None),
            ExecutionError::VirtualMachine {
                message: "ContractLogicError".into(),
                txn: None
            }
        );
    }

    #[test]
    fn non_string_arg_wraps_description() {
        let failure = CallFailure::new(FailureKind::Other, vec![json!(42)], "weird");
        assert_eq!(classify(&failure, None).to_string(), "weird");
    }

    #[test]
    fn rpc_revert_with_reason_in_message() {
        let rpc = JsonRpcError {
            code: 3,
            message: "execution reverted: too late".into(),
            data: None,
        };
        let failure = CallFailure::from_rpc_error(&rpc);
        assert_eq!(failure.kind, FailureKind::ContractLogic);
        assert_eq!(
            classify(&failure, None),
            ExecutionError::ContractLogic {
                revert_message: Some("too late".into()),
                txn: None
            }
        );
    }

    #[test]
    fn rpc_bare_revert_decodes_data() {
        let rpc = JsonRpcError {
            code: 3,
            message: "execution reverted".into(),
            data: Some(json!(REVERT_HEX)),
        };
        let err = classify(&CallFailure::from_rpc_error(&rpc), None);
        assert_eq!(err.to_string(), "Not enough tokens to transfer");
    }

    #[test]
    fn rpc_other_error_uses_nested_message() {
        let rpc = JsonRpcError {
            code: -32000,
            message: "nonce too low".into(),
            data: None,
        };
        assert_eq!(
            classify(&CallFailure::from_rpc_error(&rpc), None),
            ExecutionError::VirtualMachine {
                message: "nonce too low".into(),
                txn: None
            }
        );
    }

    #[test]
    fn decode_error_string_rejects_other_selectors() {
        let panic = hex::decode("4e487b710000000000000000000000000000000000000000000000000000000000000011").unwrap();
        assert!(decode_error_string(&panic).is_none());
        assert!(decode_error_string(&[0x08, 0xc3]).is_none());
    }
}
