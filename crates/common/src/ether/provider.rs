//! Create a custom data transport to use with a Provider.
use alloy::{
    eips::BlockId,
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::client::BatchRequest,
    transports::{TransportErrorKind, TransportResult},
};

/// [`MultiTransportProvider`] is a convenience wrapper around the different transport types
/// supported by the [`Provider`].
#[derive(Clone, Debug)]
pub struct MultiTransportProvider {
    provider: RootProvider<Ethereum>,
}

// We implement a convenience "constructor" method, to easily initialize the transport.
// This will connect to [`Http`] if the rpc_url contains 'http', to [`Ws`] if it contains 'ws',
// otherwise it'll default to [`Ipc`].
impl MultiTransportProvider {
    /// Connect to a provider using the given rpc_url.
    pub async fn connect(rpc_url: &str) -> TransportResult<Self> {
        if rpc_url.is_empty() {
            return Err(TransportErrorKind::custom_str("No RPC URL provided"));
        }

        let provider = ProviderBuilder::new().connect(rpc_url).await?.root().clone();
        Ok(Self { provider })
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> TransportResult<u64> {
        self.provider.get_block_number().await
    }

    /// Get the bytecode at the given address and block.
    pub async fn get_code_at(&self, address: Address, block: BlockId) -> TransportResult<Vec<u8>> {
        Ok(self.provider.get_code_at(address).block_id(block).await?.to_vec())
    }

    /// Read a list of storage slots of `address` at `block`.
    ///
    /// All reads are sent as a single JSON-RPC batch, so the upstream sees one request
    /// regardless of how many slots are asked for. Values are returned in the same order
    /// as `slots`.
    pub async fn get_storage_batch(
        &self,
        address: Address,
        slots: &[u64],
        block: BlockId,
    ) -> TransportResult<Vec<B256>> {
        let mut batch = BatchRequest::new(self.provider.client());
        let waiters = slots
            .iter()
            .map(|slot| {
                batch.add_call::<_, U256>("eth_getStorageAt", &(address, U256::from(*slot), block))
            })
            .collect::<TransportResult<Vec<_>>>()?;

        batch.send().await?;

        let mut values = Vec::with_capacity(waiters.len());
        for waiter in waiters {
            let value = waiter.await?;
            values.push(B256::from(value.to_be_bytes::<32>()));
        }

        Ok(values)
    }
}
