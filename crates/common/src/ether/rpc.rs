use crate::{error::Error, ether::provider::MultiTransportProvider};
use alloy::{
    eips::BlockId,
    primitives::{Address, B256},
};
use tracing::trace;

/// Get the latest block number of the provided RPC URL
///
/// ```no_run
/// use slotscope_common::ether::rpc::latest_block_number;
/// // let block_number = latest_block_number("https://eth.llamarpc.com").await?;
/// // assert!(block_number > 0);
/// ```
pub async fn latest_block_number(rpc_url: &str) -> Result<u64, Error> {
    let provider = MultiTransportProvider::connect(rpc_url)
        .await
        .map_err(|e| Error::from_transport(&format!("failed to connect to provider '{rpc_url}'"), e))?;
    provider
        .get_block_number()
        .await
        .map_err(|e| Error::from_transport("failed to get block number", e))
}

/// Get the bytecode of the provided contract address at the given block
///
/// ```no_run
/// use slotscope_common::ether::rpc::get_code;
///
/// // let bytecode = get_code(address, BlockId::latest(), "https://eth.llamarpc.com").await;
/// // assert!(bytecode.is_ok());
/// ```
pub async fn get_code(address: Address, block: BlockId, rpc_url: &str) -> Result<Vec<u8>, Error> {
    trace!("fetching code for '{}' at {}", address, block);
    let provider = MultiTransportProvider::connect(rpc_url)
        .await
        .map_err(|e| Error::from_transport(&format!("failed to connect to provider '{rpc_url}'"), e))?;
    provider
        .get_code_at(address, block)
        .await
        .map_err(|e| Error::from_transport("failed to get account code", e))
}

/// Get the raw values of `slots` in the storage of `address` at the given block, using a
/// single JSON-RPC batch request.
///
/// ```no_run
/// use slotscope_common::ether::rpc::get_storage_batch;
///
/// // let values = get_storage_batch(address, &[0, 1, 2], BlockId::latest(), rpc_url).await?;
/// // assert_eq!(values.len(), 3);
/// ```
pub async fn get_storage_batch(
    address: Address,
    slots: &[u64],
    block: BlockId,
    rpc_url: &str,
) -> Result<Vec<B256>, Error> {
    trace!("fetching {} storage slots for '{}' at {}", slots.len(), address, block);
    let provider = MultiTransportProvider::connect(rpc_url)
        .await
        .map_err(|e| Error::from_transport(&format!("failed to connect to provider '{rpc_url}'"), e))?;
    let values = provider
        .get_storage_batch(address, slots, block)
        .await
        .map_err(|e| Error::from_transport("failed to get storage slots", e))?;

    if values.len() != slots.len() {
        return Err(Error::RpcError(format!(
            "expected {} storage values, node returned {}",
            slots.len(),
            values.len()
        )));
    }

    Ok(values)
}

#[cfg(test)]
pub mod tests {
    use crate::ether::rpc::*;

    #[tokio::test]
    async fn test_block_number_empty_rpc_url() {
        let block_number = latest_block_number("").await;

        assert!(block_number.is_err())
    }

    #[tokio::test]
    async fn test_get_code() {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| {
            println!("RPC_URL not set, skipping test");
            std::process::exit(0);
        });

        let address: Address =
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().expect("valid address");
        let bytecode = get_code(address, BlockId::latest(), &rpc_url)
            .await
            .expect("get_code() returned an error!");

        assert!(!bytecode.is_empty());
    }

    #[tokio::test]
    async fn test_get_storage_batch() {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| {
            println!("RPC_URL not set, skipping test");
            std::process::exit(0);
        });

        // WETH stores its name as a short string in slot 0
        let address: Address =
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().expect("valid address");
        let values = get_storage_batch(address, &[0, 1, 2], BlockId::latest(), &rpc_url)
            .await
            .expect("get_storage_batch() returned an error!");

        assert_eq!(values.len(), 3);
        assert!(!values[0].is_zero());
    }
}
