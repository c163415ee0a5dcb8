//! Credential lookup and endpoint URI resolution.
//!
//! The resolver memoizes one URI per (ecosystem, network). Once a pair has
//! been resolved, later calls return the cached URI without re-reading the
//! credentials: rotating `QUICKNODE_AUTH_TOKEN` mid-process has no effect on
//! a resolver that already produced a URI for that pair. Build a new
//! provider to pick up new credentials.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::catalog;
use crate::error::ProviderError;

/// Environment variable holding the endpoint subdomain.
pub const SUBDOMAIN_VAR: &str = "QUICKNODE_SUBDOMAIN";
/// Environment variable holding the endpoint auth token.
pub const AUTH_TOKEN_VAR: &str = "QUICKNODE_AUTH_TOKEN";
/// Both variables, in the order they are reported.
pub const CREDENTIAL_VARS: [&str; 2] = [SUBDOMAIN_VAR, AUTH_TOKEN_VAR];

/// Where credential variables are read from.
pub trait CredentialSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl CredentialSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An in-memory credential set, e.g. loaded from a secrets file.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    vars: Mutex<HashMap<String, String>>,
}

impl StaticCredentials {
    pub fn new(subdomain: impl Into<String>, auth_token: impl Into<String>) -> Self {
        let source = Self::default();
        source.set(SUBDOMAIN_VAR, subdomain);
        source.set(AUTH_TOKEN_VAR, auth_token);
        source
    }

    pub fn set(&self, name: &str, value: impl Into<String>) {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.into());
    }

    pub fn remove(&self, name: &str) {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl CredentialSource for StaticCredentials {
    fn var(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

/// Subdomain and auth token for a QuickNode endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub subdomain: String,
    pub auth_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subdomain", &self.subdomain)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read both variables. Either one missing or empty is reported as both
    /// missing so the operator sees the full set to configure.
    pub fn load(source: &dyn CredentialSource) -> Result<Self, ProviderError> {
        let subdomain = source.var(SUBDOMAIN_VAR).filter(|v| !v.is_empty());
        let auth_token = source.var(AUTH_TOKEN_VAR).filter(|v| !v.is_empty());
        match (subdomain, auth_token) {
            (Some(subdomain), Some(auth_token)) => Ok(Self {
                subdomain,
                auth_token,
            }),
            _ => Err(ProviderError::MissingCredentials {
                vars: CREDENTIAL_VARS.to_vec(),
            }),
        }
    }
}

type NetworkKey = (String, String);

/// Resolves and caches endpoint URIs.
pub struct UriResolver {
    source: Arc<dyn CredentialSource>,
    cache: Mutex<HashMap<NetworkKey, String>>,
}

impl Default for UriResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for UriResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.cache.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("UriResolver").field("cached", &cached).finish()
    }
}

impl UriResolver {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver backed by the process environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }

    /// HTTPS endpoint for the pair.
    pub fn resolve(&self, ecosystem: &str, network: &str) -> Result<String, ProviderError> {
        if let Some(uri) = self.cached(ecosystem, network) {
            return Ok(uri);
        }

        let credentials = Credentials::load(self.source.as_ref())?;
        let template = catalog::uri_template(ecosystem, network).ok_or_else(|| {
            ProviderError::UnsupportedNetwork {
                ecosystem: ecosystem.to_string(),
                network: network.to_string(),
            }
        })?;
        let uri = catalog::render(template, &credentials.subdomain, &credentials.auth_token);

        tracing::debug!(ecosystem, network, "resolved QuickNode endpoint");
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let uri = cache
            .entry((ecosystem.to_string(), network.to_string()))
            .or_insert(uri)
            .clone();
        Ok(uri)
    }

    /// WebSocket endpoint for the pair: the HTTPS endpoint with a `wss` scheme.
    pub fn resolve_ws(&self, ecosystem: &str, network: &str) -> Result<String, ProviderError> {
        let uri = self.resolve(ecosystem, network)?;
        if !catalog::supports_websockets(ecosystem) {
            tracing::warn!(ecosystem, network, "ecosystem is not listed as WebSocket-capable");
        }
        Ok(to_ws_uri(&uri))
    }

    /// The cached URI for the pair, if it has been resolved.
    pub fn cached(&self, ecosystem: &str, network: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(ecosystem.to_string(), network.to_string()))
            .cloned()
    }
}

/// Swap an `https` scheme for `wss`; anything else is returned untouched.
pub fn to_ws_uri(uri: &str) -> String {
    match uri.strip_prefix("https") {
        Some(rest) => format!("wss{rest}"),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(subdomain: &str, token: &str) -> (Arc<StaticCredentials>, UriResolver) {
        let source = Arc::new(StaticCredentials::new(subdomain, token));
        let resolver = UriResolver::new(source.clone());
        (source, resolver)
    }

    #[test]
    fn every_catalog_pair_resolves() {
        let (_, resolver) = resolver("sub", "tok");
        for (eco, net, template) in catalog::entries() {
            let uri = resolver.resolve(eco, net).unwrap();
            assert_eq!(uri, catalog::render(template, "sub", "tok"));

            let ws = resolver.resolve_ws(eco, net).unwrap();
            assert_eq!(ws.strip_prefix("wss").unwrap(), uri.strip_prefix("https").unwrap());
        }
    }

    #[test]
    fn missing_subdomain_names_both_vars() {
        let (source, resolver) = resolver("sub", "tok");
        source.remove(SUBDOMAIN_VAR);
        let err = resolver.resolve("ethereum", "mainnet").unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials { .. }));
        let msg = err.to_string();
        assert!(msg.contains(SUBDOMAIN_VAR));
        assert!(msg.contains(AUTH_TOKEN_VAR));
    }

    #[test]
    fn empty_token_names_both_vars() {
        let (_, resolver) = resolver("sub", "");
        let msg = resolver.resolve("base", "mainnet").unwrap_err().to_string();
        assert!(msg.contains(SUBDOMAIN_VAR));
        assert!(msg.contains(AUTH_TOKEN_VAR));
    }

    #[test]
    fn unsupported_network_cites_pair() {
        let (_, resolver) = resolver("sub", "tok");
        let err = resolver
            .resolve("unsupported_ecosystem", "unsupported_network")
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedNetwork { .. }));
        assert_eq!(
            err.to_string(),
            "Unsupported network: unsupported_ecosystem - unsupported_network"
        );
    }

    #[test]
    fn credentials_checked_before_catalog() {
        let resolver = UriResolver::new(Arc::new(StaticCredentials::default()));
        let err = resolver.resolve("nope", "nope").unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials { .. }));
    }

    #[test]
    fn first_resolution_wins() {
        let (source, resolver) = resolver("first", "one");
        let first = resolver.resolve("optimism", "sepolia").unwrap();

        source.set(SUBDOMAIN_VAR, "second");
        source.set(AUTH_TOKEN_VAR, "two");
        assert_eq!(resolver.resolve("optimism", "sepolia").unwrap(), first);

        source.remove(AUTH_TOKEN_VAR);
        assert_eq!(resolver.resolve("optimism", "sepolia").unwrap(), first);

        // A pair never resolved before still sees the current source.
        assert!(resolver.resolve("optimism", "mainnet").is_err());
    }

    #[test]
    fn ws_uri_only_rewrites_https() {
        assert_eq!(to_ws_uri("https://a.quiknode.pro/t/"), "wss://a.quiknode.pro/t/");
        assert_eq!(to_ws_uri("http://localhost:8545"), "http://localhost:8545");
    }

    #[test]
    fn credentials_debug_hides_token() {
        let creds = Credentials {
            subdomain: "sub".into(),
            auth_token: "secret".into(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
