use fancy_regex::Regex;
use lazy_static::lazy_static;

/// Ethereum Mainnet chain ID
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Sepolia testnet chain ID
pub const CHAIN_ID_SEPOLIA: u64 = 11155111;
/// Polygon Mainnet chain ID
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One chain ID
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism chain ID
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Base chain ID
pub const CHAIN_ID_BASE: u64 = 8453;

/// Human readable names for the chains we know about, used in logs and health output.
pub const KNOWN_CHAINS: [(u64, &str); 6] = [
    (CHAIN_ID_ETHEREUM, "ethereum"),
    (CHAIN_ID_SEPOLIA, "sepolia"),
    (CHAIN_ID_POLYGON, "polygon"),
    (CHAIN_ID_ARBITRUM, "arbitrum"),
    (CHAIN_ID_OPTIMISM, "optimism"),
    (CHAIN_ID_BASE, "base"),
];

/// Returns the human readable name of a chain, or its id if it is unknown.
///
/// ```
/// use slotscope_common::constants::chain_name;
///
/// assert_eq!(chain_name(1), "ethereum");
/// assert_eq!(chain_name(31337), "31337");
/// ```
pub fn chain_name(chain_id: u64) -> String {
    KNOWN_CHAINS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| chain_id.to_string())
}

lazy_static! {
    /// Matches a 20-byte hex address, e.g. `0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2`
    pub static ref ADDRESS_REGEX: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("failed to compile regex");
}
