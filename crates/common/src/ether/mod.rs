/// A thin wrapper around the alloy provider.
pub mod provider;
/// One-shot JSON-RPC calls by URL.
pub mod rpc;
