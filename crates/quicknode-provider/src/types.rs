//! Chain data types returned by the provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use quicknode_core::ProviderError;

/// Block selector for state queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    /// `latest`, `pending`, `earliest`, `safe`, `finalized`.
    Tag(String),
    Hash(String),
}

impl Default for BlockId {
    fn default() -> Self {
        Self::Tag("latest".into())
    }
}

impl BlockId {
    /// The JSON-RPC parameter form.
    pub fn to_param(&self) -> Value {
        match self {
            Self::Number(n) => Value::String(format!("0x{n:x}")),
            Self::Tag(tag) => Value::String(tag.clone()),
            Self::Hash(hash) => Value::String(hash.clone()),
        }
    }
}

/// One entry of an EIP-2930 access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListEntry {
    pub address: String,
    #[serde(default)]
    pub storage_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessListResult {
    #[serde(default)]
    pub access_list: Vec<AccessListEntry>,
}

/// A receipt merged with its transaction.
///
/// Receipt fields take precedence over transaction fields with the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub required_confirmations: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TransactionReceipt {
    pub(crate) fn merge(required_confirmations: u64, transaction: Value, receipt: Value) -> Self {
        let mut fields = match transaction {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(receipt) = receipt {
            fields.extend(receipt);
        }
        fields.remove("requiredConfirmations");
        Self {
            required_confirmations,
            fields,
        }
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        self.fields.get("transactionHash").and_then(Value::as_str)
    }

    pub fn block_number(&self) -> Option<u64> {
        self.quantity("blockNumber")
    }

    pub fn gas_used(&self) -> Option<u64> {
        self.quantity("gasUsed")
    }

    /// `1` for success, `0` for failure.
    pub fn status(&self) -> Option<u64> {
        self.quantity("status")
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some(1)
    }

    fn quantity(&self, key: &str) -> Option<u64> {
        let value = self.fields.get(key)?;
        parse_quantity(value, key).ok().and_then(|q| u64::try_from(q).ok())
    }
}

/// Parse a hex (`0x…`) or plain JSON number quantity.
pub fn parse_quantity(value: &Value, what: &str) -> Result<u128, ProviderError> {
    match value {
        Value::String(s) => {
            let digits = s.trim_start_matches("0x");
            let digits = if digits.is_empty() { "0" } else { digits };
            u128::from_str_radix(digits, 16)
                .map_err(|e| ProviderError::provider(format!("invalid {what} '{s}': {e}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ProviderError::provider(format!("invalid {what} {n}"))),
        other => Err(ProviderError::provider(format!(
            "invalid {what}: expected a quantity, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_id_params() {
        assert_eq!(BlockId::Number(255).to_param(), json!("0xff"));
        assert_eq!(BlockId::default().to_param(), json!("latest"));
    }

    #[test]
    fn quantities() {
        assert_eq!(parse_quantity(&json!("0x5208"), "gas").unwrap(), 21000);
        assert_eq!(parse_quantity(&json!("0x"), "gas").unwrap(), 0);
        assert_eq!(parse_quantity(&json!(7), "gas").unwrap(), 7);
        assert!(parse_quantity(&json!(null), "gas").is_err());
        assert!(parse_quantity(&json!("0xnope"), "gas").is_err());
    }

    #[test]
    fn receipt_fields_override_transaction() {
        let receipt = TransactionReceipt::merge(
            0,
            json!({"hash": "0xaa", "gas": "0x10", "status": "0x0"}),
            json!({"transactionHash": "0xaa", "status": "0x1", "blockNumber": "0xe9e446"}),
        );
        assert!(receipt.is_success());
        assert_eq!(receipt.block_number(), Some(15_328_326));
        assert_eq!(receipt.transaction_hash(), Some("0xaa"));
        assert_eq!(receipt.fields["gas"], json!("0x10"));
    }

    #[test]
    fn access_list_deserializes() {
        let result: AccessListResult = serde_json::from_value(json!({
            "accessList": [{"address": "0xabc", "storageKeys": ["0x01"]}],
            "gasUsed": "0x5208"
        }))
        .unwrap();
        assert_eq!(
            result.access_list,
            vec![AccessListEntry {
                address: "0xabc".into(),
                storage_keys: vec!["0x01".into()]
            }]
        );
    }
}
