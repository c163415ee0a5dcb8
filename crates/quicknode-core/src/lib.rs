//! quicknode-core — the request/response normalization layer for the
//! QuickNode provider.
//!
//! # Overview
//!
//! - [`catalog`] — the fixed (ecosystem, network) → URI template table
//! - [`UriResolver`] — credential lookup and memoized endpoint URIs
//! - [`RpcTransport`] — the async trait every transport implements
//! - [`RpcDispatcher`] — envelope unwrapping and error classification
//! - [`vm_error`] — execution failure → revert / VM error translation
//! - [`TransactionTrace`] — lazy `debug_traceTransaction` client
//! - [`ProviderError`] — the error taxonomy callers see

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod resolver;
pub mod trace;
pub mod transport;
pub mod vm_error;

pub use dispatch::RpcDispatcher;
pub use error::{ProviderError, TransportError};
pub use request::{JsonRpcError, JsonRpcRequest, RpcId, RpcParam};
pub use resolver::{CredentialSource, Credentials, ProcessEnv, StaticCredentials, UriResolver};
pub use trace::{ReturnValue, TraceApproach, TraceHints, TransactionTrace};
pub use transport::RpcTransport;
pub use vm_error::{CallFailure, ExecutionError, FailureKind};
