/// Chain registry and fixed endpoints
///
/// The registry is static for the lifetime of the process; the dashboard only
/// ever points at one of these entries.

/// Block explorer network the dashboard can query approvals on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOption {
    pub id: &'static str,
    pub name: &'static str,
    pub base_url: &'static str,
    pub chain_id: u64,
    pub native_symbol: &'static str,
}

/// Supported chains, in selector order. The first entry is the default.
pub const CHAIN_OPTIONS: &[ChainOption] = &[
    ChainOption {
        id: "gnosis",
        name: "Gnosis Chain",
        base_url: "https://gnosis.blockscout.com",
        chain_id: 100,
        native_symbol: "xDAI",
    },
    ChainOption {
        id: "optimism",
        name: "Optimism",
        base_url: "https://optimism.blockscout.com",
        chain_id: 10,
        native_symbol: "ETH",
    },
    ChainOption {
        id: "base",
        name: "Base",
        base_url: "https://base.blockscout.com",
        chain_id: 8453,
        native_symbol: "ETH",
    },
    ChainOption {
        id: "ethereum",
        name: "Ethereum",
        base_url: "https://eth.blockscout.com",
        chain_id: 1,
        native_symbol: "ETH",
    },
];

/// Swap widget rendered by the swap card
pub const DEFAULT_SWAP_WIDGET_URL: &str = "https://swapscout.blockscout.com";

/// Environment variable holding a hex private key for local signing
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "CCC_PRIVATE_KEY";

/// Environment overrides for the config file
pub const WALLET_RPC_ENV: &str = "CCC_WALLET_RPC";
pub const DEFAULT_CHAIN_ENV: &str = "CCC_DEFAULT_CHAIN";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Decimals of every supported chain's native token
pub const NATIVE_DECIMALS: u32 = 18;

/// Symbol shown when the wallet is attached to a chain outside the registry
pub const FALLBACK_NATIVE_SYMBOL: &str = "ETH";

/// Look up a registry entry by its identifier
pub fn find_chain(id: &str) -> Option<&'static ChainOption> {
    CHAIN_OPTIONS.iter().find(|c| c.id == id)
}

/// Look up a registry entry by EVM chain id
pub fn find_chain_by_id(chain_id: u64) -> Option<&'static ChainOption> {
    CHAIN_OPTIONS.iter().find(|c| c.chain_id == chain_id)
}

/// Position of a chain in the selector
pub fn chain_index(id: &str) -> Option<usize> {
    CHAIN_OPTIONS.iter().position(|c| c.id == id)
}

/// Native currency symbol for a wallet network
pub fn native_symbol(chain_id: Option<u64>) -> &'static str {
    chain_id
        .and_then(find_chain_by_id)
        .map(|c| c.native_symbol)
        .unwrap_or(FALLBACK_NATIVE_SYMBOL)
}
