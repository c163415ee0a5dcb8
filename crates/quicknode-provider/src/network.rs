//! Network selection.

use std::fmt;
use std::str::FromStr;

use quicknode_core::{catalog, ProviderError};

/// An (ecosystem, network) pair, e.g. `arbitrum:sepolia`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkId {
    pub ecosystem: String,
    pub network: String,
}

impl NetworkId {
    pub fn new(ecosystem: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            ecosystem: ecosystem.into(),
            network: network.into(),
        }
    }

    /// Returns `true` if the pair is in the QuickNode catalog.
    pub fn is_supported(&self) -> bool {
        catalog::is_supported(&self.ecosystem, &self.network)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ecosystem, self.network)
    }
}

impl FromStr for NetworkId {
    type Err = ProviderError;

    /// Parses `ecosystem:network`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((eco, net)) if !eco.is_empty() && !net.is_empty() => Ok(Self::new(eco, net)),
            _ => Err(ProviderError::provider(format!(
                "expected 'ecosystem:network', got '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: NetworkId = "polygon-zkevm:testnet".parse().unwrap();
        assert_eq!(id, NetworkId::new("polygon-zkevm", "testnet"));
        assert_eq!(id.to_string(), "polygon-zkevm:testnet");
        assert!(id.is_supported());
    }

    #[test]
    fn parse_rejects_missing_half() {
        assert!("ethereum".parse::<NetworkId>().is_err());
        assert!("ethereum:".parse::<NetworkId>().is_err());
    }
}
