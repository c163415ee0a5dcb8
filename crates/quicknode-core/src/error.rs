//! Transport-level and provider-level error types.
//!
//! [`TransportError`] is what a raw transport reports. [`ProviderError`] is
//! what callers of the provider see: every remote failure is classified into
//! exactly one of its variants at the dispatch boundary.

use thiserror::Error;

use crate::request::JsonRpcError;
use crate::vm_error::ExecutionError;

/// Errors that can occur while moving a request over the wire.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed. `status` and `body` are set when the server
    /// answered with a non-success status.
    #[error("HTTP error: {message}")]
    Http {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An unexpected error (client construction, I/O outside a request).
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Body of the HTTP error response, if the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

/// Errors surfaced by the QuickNode provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Generic transport or protocol failure.
    #[error("{message}")]
    Provider {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// The requested method is not part of the current plan or network.
    #[error("{message}")]
    FeatureNotAvailable {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// One or both credential variables are unset or empty.
    #[error("Missing environment variables: {}", .vars.join(", "))]
    MissingCredentials { vars: Vec<&'static str> },

    /// The (ecosystem, network) pair is not in the catalog.
    #[error("Unsupported network: {ecosystem} - {network}")]
    UnsupportedNetwork { ecosystem: String, network: String },

    /// A contract revert or virtual machine failure.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The method exists but is not implemented for the active ecosystem.
    #[error("{method} is not implemented for ecosystem '{ecosystem}'")]
    NotImplemented {
        method: &'static str,
        ecosystem: String,
    },

    #[error("Transaction hash must be a hexadecimal string starting with '0x' (got '{0}')")]
    InvalidTransactionHash(String),

    /// A request was issued before `connect()`.
    #[error("Not connected to QuickNode")]
    NotConnected,

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Return data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Waiting on the node took longer than the caller allowed.
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout { what: String, ms: u64 },

    /// A result could not be deserialized into the expected type.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Shorthand for a generic provider error without a cause.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for plan or network-tier limitations.
    pub fn is_feature_not_available(&self) -> bool {
        matches!(self, Self::FeatureNotAvailable { .. })
    }

    /// Returns `true` if the failure happened before any network I/O and
    /// needs operator action (credentials, catalog).
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. } | Self::UnsupportedNetwork { .. }
        )
    }

    /// Revert reason, when this is a contract revert that carried one.
    pub fn revert_message(&self) -> Option<&str> {
        match self {
            Self::Execution(ExecutionError::ContractLogic { revert_message, .. }) => {
                revert_message.as_deref()
            }
            _ => None,
        }
    }
}
