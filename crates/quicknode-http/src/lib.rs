//! quicknode-http — HTTP JSON-RPC transport for the QuickNode provider.

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
