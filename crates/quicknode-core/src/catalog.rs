//! QuickNode network catalog.
//!
//! Every supported (ecosystem, network) pair maps to a URI template with
//! `{subdomain}` and `{auth_token}` placeholders. The table is fixed at
//! compile time; adding a network means adding a row here.

/// Ecosystem → network → URI template.
pub const QUICKNODE_NETWORKS: &[(&str, &[(&str, &str)])] = &[
    (
        "ethereum",
        &[
            ("mainnet", "https://{subdomain}.quiknode.pro/{auth_token}/"),
            ("sepolia", "https://{subdomain}.ethereum-sepolia.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "arbitrum",
        &[
            ("mainnet", "https://{subdomain}.arbitrum-mainnet.quiknode.pro/{auth_token}/"),
            ("sepolia", "https://{subdomain}.arbitrum-sepolia.quiknode.pro/{auth_token}/"),
            ("nova", "https://{subdomain}.arbitrum-nova.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "optimism",
        &[
            ("mainnet", "https://{subdomain}.optimism-mainnet.quiknode.pro/{auth_token}/"),
            ("sepolia", "https://{subdomain}.optimism-sepolia.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "base",
        &[
            ("mainnet", "https://{subdomain}.base-mainnet.quiknode.pro/{auth_token}/"),
            ("sepolia", "https://{subdomain}.base-sepolia.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "polygon",
        &[
            ("mainnet", "https://{subdomain}.polygon-mainnet.quiknode.pro/{auth_token}/"),
            ("amoy", "https://{subdomain}.polygon-amoy.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "polygon-zkevm",
        &[
            ("mainnet", "https://{subdomain}.polygon-zkevm-mainnet.quiknode.pro/{auth_token}/"),
            ("testnet", "https://{subdomain}.polygon-zkevm-testnet.quiknode.pro/{auth_token}/"),
        ],
    ),
    (
        "avalanche",
        &[
            ("mainnet", "https://{subdomain}.avalanche-mainnet.quiknode.pro/{auth_token}/"),
            ("fuji", "https://{subdomain}.avalanche-fuji.quiknode.pro/{auth_token}/"),
        ],
    ),
];

/// Ecosystems whose QuickNode endpoints also accept WebSocket connections.
pub const WEBSOCKET_ECOSYSTEMS: &[&str] = &["ethereum", "arbitrum", "base", "optimism", "polygon"];

/// Ecosystems that need proof-of-authority extra-data handling.
pub const POA_ECOSYSTEMS: &[&str] = &["optimism", "base", "polygon"];

/// Ecosystems where `eth_maxPriorityFeePerGas` and `eth_createAccessList`
/// are not served.
pub const UNSUPPORTED_FEE_ECOSYSTEMS: &[&str] = &["polygon-zkevm"];

/// Look up the URI template for an exact (case-sensitive) pair.
pub fn uri_template(ecosystem: &str, network: &str) -> Option<&'static str> {
    QUICKNODE_NETWORKS
        .iter()
        .find(|(eco, _)| *eco == ecosystem)?
        .1
        .iter()
        .find(|(net, _)| *net == network)
        .map(|(_, template)| *template)
}

/// Returns `true` if the pair is in the catalog.
pub fn is_supported(ecosystem: &str, network: &str) -> bool {
    uri_template(ecosystem, network).is_some()
}

/// Iterate every `(ecosystem, network, template)` row in catalog order.
pub fn entries() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    QUICKNODE_NETWORKS.iter().flat_map(|(eco, networks)| {
        networks
            .iter()
            .map(move |(net, template)| (*eco, *net, *template))
    })
}

/// Returns `true` if the ecosystem is in the WebSocket-capable subset.
pub fn supports_websockets(ecosystem: &str) -> bool {
    WEBSOCKET_ECOSYSTEMS.contains(&ecosystem)
}

/// Substitute credentials into a template.
pub fn render(template: &str, subdomain: &str, auth_token: &str) -> String {
    template
        .replace("{subdomain}", subdomain)
        .replace("{auth_token}", auth_token)
}
