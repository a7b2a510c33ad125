use alloy::{
    eips::BlockId,
    primitives::{Address, B256},
};
use async_trait::async_trait;
use slotscope_common::{error::Error as CommonError, ether::rpc};
use std::{future::Future, time::Duration};

use crate::error::Error;

/// The chain reads needed to assemble a [`ContractStorage`](crate::ContractStorage).
#[async_trait]
pub trait StorageRpc: Send + Sync {
    /// Whether `address` holds non-empty code at the latest block.
    async fn is_contract(&self, address: Address) -> Result<bool, Error>;

    /// Read `slots` of `address` at `block` in a single upstream round-trip. The returned
    /// words are in the same order as `slots`.
    async fn get_storage_chunk(
        &self,
        address: Address,
        slots: &[u64],
        block: BlockId,
    ) -> Result<Vec<B256>, Error>;

    /// The latest block height.
    async fn get_block_number(&self) -> Result<u64, Error>;
}

/// A [`StorageRpc`] backed by a JSON-RPC endpoint. Every call fails with
/// [`Error::UpstreamTimeout`] once `timeout` elapses.
#[derive(Debug, Clone)]
pub struct JsonRpcStorage {
    rpc_url: String,
    timeout: Duration,
}

impl JsonRpcStorage {
    /// Read from `rpc_url`, giving up on each call after `timeout`.
    pub fn new(rpc_url: &str, timeout: Duration) -> Self {
        Self { rpc_url: rpc_url.to_string(), timeout }
    }

    /// The endpoint this instance reads from.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn with_timeout<T>(
        &self,
        method: &str,
        call: impl Future<Output = Result<T, CommonError>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::UpstreamTimeout(format!(
                "{method} did not complete within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl StorageRpc for JsonRpcStorage {
    async fn is_contract(&self, address: Address) -> Result<bool, Error> {
        let code = self
            .with_timeout("eth_getCode", rpc::get_code(address, BlockId::latest(), &self.rpc_url))
            .await?;
        Ok(!code.is_empty())
    }

    async fn get_storage_chunk(
        &self,
        address: Address,
        slots: &[u64],
        block: BlockId,
    ) -> Result<Vec<B256>, Error> {
        self.with_timeout(
            "eth_getStorageAt",
            rpc::get_storage_batch(address, slots, block, &self.rpc_url),
        )
        .await
    }

    async fn get_block_number(&self) -> Result<u64, Error> {
        self.with_timeout("eth_blockNumber", rpc::latest_block_number(&self.rpc_url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_rpc_url_is_unavailable() {
        let storage = JsonRpcStorage::new("", Duration::from_secs(1));
        let result = storage.get_block_number().await;

        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_is_contract() {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| {
            println!("RPC_URL not set, skipping test");
            std::process::exit(0);
        });

        let storage = JsonRpcStorage::new(&rpc_url, Duration::from_secs(10));
        let weth: Address =
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().expect("valid address");

        assert!(storage.is_contract(weth).await.expect("is_contract() returned an error!"));
        assert!(!storage.is_contract(Address::ZERO).await.expect("is_contract() returned an error!"));
    }
}
