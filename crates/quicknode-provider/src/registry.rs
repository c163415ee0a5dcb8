//! Provider registry: one QuickNode factory per catalog entry.

use std::sync::Arc;

use quicknode_core::catalog;
use quicknode_core::resolver::{CredentialSource, ProcessEnv};
use quicknode_core::ProviderError;

use crate::config::ProviderConfig;
use crate::network::NetworkId;
use crate::quicknode::QuickNode;

/// Builds providers for every (ecosystem, network) in the catalog.
///
/// Providers built by the same registry share a credential source but each
/// has its own URI cache.
pub struct ProviderRegistry {
    config: ProviderConfig,
    credentials: Arc<dyn CredentialSource>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(ProviderConfig::default())
    }
}

impl ProviderRegistry {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            credentials: Arc::new(ProcessEnv),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Every network a provider can be created for, in catalog order.
    pub fn networks(&self) -> impl Iterator<Item = NetworkId> {
        catalog::entries().map(|(eco, net, _)| NetworkId::new(eco, net))
    }

    /// Build an unconnected provider for `network`.
    pub fn create(&self, network: &NetworkId) -> Result<QuickNode, ProviderError> {
        if !network.is_supported() {
            return Err(ProviderError::UnsupportedNetwork {
                ecosystem: network.ecosystem.clone(),
                network: network.network.clone(),
            });
        }
        tracing::debug!(network = %network, "creating QuickNode provider");
        Ok(QuickNode::with_config(network.clone(), self.config.clone())
            .with_credentials(self.credentials.clone()))
    }
}
