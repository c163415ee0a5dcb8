//! quicknode-provider — QuickNode as an upstream provider.
//!
//! [`QuickNode`] implements [`RemoteProvider`] (connection lifecycle and raw
//! requests) and [`UpstreamIdentity`] (name and endpoint URIs) on top of the
//! normalization layer in `quicknode-core`.
//!
//! # Quick start
//! ```rust,no_run
//! use quicknode_provider::{NetworkId, ProviderRegistry, RemoteProvider};
//!
//! # async fn run() -> Result<(), quicknode_core::ProviderError> {
//! let registry = ProviderRegistry::default();
//! let mut provider = registry.create(&NetworkId::new("ethereum", "mainnet"))?;
//! provider.connect()?; // reads QUICKNODE_SUBDOMAIN / QUICKNODE_AUTH_TOKEN
//! let block = provider.block_number().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod network;
pub mod quicknode;
pub mod registry;
pub mod traits;
pub mod types;

pub use config::ProviderConfig;
pub use network::NetworkId;
pub use quicknode::{Connector, QuickNode};
pub use registry::ProviderRegistry;
pub use traits::{RemoteProvider, UpstreamIdentity};
pub use types::{AccessListEntry, BlockId, TransactionReceipt};
