//! Provider configuration.

use std::time::Duration;

use quicknode_http::HttpClientConfig;

/// Display name used when none is configured.
pub const DEFAULT_PROVIDER_NAME: &str = "QuickNode";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    /// How often `get_receipt` polls while waiting for confirmations.
    pub receipt_poll_interval: Duration,
    pub http: HttpClientConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_NAME.to_string(),
            receipt_poll_interval: Duration::from_secs(1),
            http: HttpClientConfig::default(),
        }
    }
}
