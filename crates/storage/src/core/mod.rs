pub(crate) mod decode;
pub(crate) mod fetch;
pub(crate) mod validate;

use alloy::eips::{BlockId, BlockNumberOrTag};
use serde::Serialize;
use slotscope_cache::Cache;
use slotscope_common::utils::{
    hex::ToLowerHex,
    time::{elapsed_millis, now_utc},
};
use slotscope_config::Configuration;
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    core::{
        decode::decode_slots,
        fetch::{get_batch_storage_slots, BatchStorageRequest, FetchOptions},
        validate::{parse_block_tag, validate_request, ValidatedRequest},
    },
    error::Error,
    interfaces::{
        ContractMetadata, ContractStorage, HttpMetadataSource, InspectArgs, JsonRpcStorage,
        MetadataSource, NoMetadata, StorageQuery, StorageRpc,
    },
};

/// Identifies one cached [`ContractStorage`]. Overlapping ranges are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    /// Lowercase hex
    pub address: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// First slot, inclusive
    pub start: u64,
    /// Last slot, inclusive
    pub end: u64,
    /// Canonical form of the block tag, so `16` and `0x10` share an entry
    pub block_tag: String,
}

impl StorageKey {
    fn new(request: &ValidatedRequest, block: &BlockNumberOrTag) -> Self {
        Self {
            address: request.address.to_lower_hex(),
            chain_id: request.chain_id,
            start: request.range.start,
            end: request.range.end,
            block_tag: block.to_string(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}[{}..={}]#{}",
            self.address, self.chain_id, self.start, self.end, self.block_tag
        )
    }
}

/// The result of [`StorageService::get_storage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageResponse {
    /// The decoded storage
    pub data: ContractStorage,
    /// Whether `data` was served from the cache without waiting on an upstream fetch
    pub cached: bool,
}

/// Validates storage requests, reads and decodes the requested slots and caches the result.
///
/// Concurrent requests for the same [`StorageKey`] share a single upstream fetch.
pub struct StorageService {
    endpoints: BTreeMap<u64, Arc<dyn StorageRpc>>,
    metadata: Arc<dyn MetadataSource>,
    cache: Cache<StorageKey, ContractStorage, Error>,
    options: FetchOptions,
}

impl fmt::Debug for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageService")
            .field("chains", &self.endpoints.keys().collect::<Vec<_>>())
            .field("cache_ttl", &self.cache.ttl())
            .field("options", &self.options)
            .finish()
    }
}

impl StorageService {
    /// A service with no chains; add them with [`StorageService::with_rpc`].
    pub fn new(metadata: Arc<dyn MetadataSource>, cache_ttl: Duration) -> Self {
        Self {
            endpoints: BTreeMap::new(),
            metadata,
            cache: Cache::new("storage", cache_ttl),
            options: FetchOptions::default(),
        }
    }

    /// Serve `chain_id` from `rpc`, replacing any previous endpoint for that chain.
    pub fn with_rpc(mut self, chain_id: u64, rpc: Arc<dyn StorageRpc>) -> Self {
        self.endpoints.insert(chain_id, rpc);
        self
    }

    /// Override how slots are batched and retried.
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a service from the configured endpoints, metadata API and limits.
    pub fn from_config(config: &Configuration) -> Result<Self, Error> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let metadata: Arc<dyn MetadataSource> = if config.metadata_url.is_empty() {
            Arc::new(NoMetadata)
        } else {
            Arc::new(HttpMetadataSource::new(&config.metadata_url, config.request_timeout_secs))
        };

        let options = FetchOptions {
            batch_size: config.batch_size,
            max_concurrency: config.max_concurrency,
            max_attempts: config.max_attempts,
            metadata_timeout: timeout,
            ..Default::default()
        };

        let endpoints = config
            .rpc_endpoints()
            .map_err(|e| Error::Internal(format!("invalid configuration: {e}")))?;
        if endpoints.is_empty() {
            warn!("no rpc endpoints are configured, every storage request will be rejected");
        }

        let service = endpoints.into_iter().fold(
            Self::new(metadata, Duration::from_secs(config.cache_ttl_secs))
                .with_fetch_options(options),
            |service, (chain_id, rpc_url)| {
                debug!("serving chain {} from {}", chain_id, rpc_url);
                service.with_rpc(chain_id, Arc::new(JsonRpcStorage::new(&rpc_url, timeout)))
            },
        );

        Ok(service)
    }

    /// The chain ids this service can read from.
    pub fn chains(&self) -> Vec<u64> {
        self.endpoints.keys().copied().collect()
    }

    /// Returns the decoded storage for `query`, from the cache when a fresh entry exists.
    pub async fn get_storage(&self, query: &StorageQuery) -> Result<StorageResponse, Error> {
        let request = validate_request(&query.address, query.chain_id, query.start, query.end)?;
        let block = parse_block_tag(&query.block_tag)?;
        let rpc = self
            .endpoints
            .get(&request.chain_id)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("Unsupported chainId: {}", request.chain_id)))?;

        let key = StorageKey::new(&request, &block);
        let metadata = self.metadata.clone();
        let options = self.options;

        let (data, lookup) = self
            .cache
            .get_or_fetch(key.clone(), || fetch_contract_storage(rpc, metadata, request, block, options))
            .await?;

        debug!("served {} ({:?})", key, lookup);
        Ok(StorageResponse { data, cached: lookup.is_hit() })
    }
}

/// Assembles a [`ContractStorage`] from upstream reads. This is the cache-miss path.
async fn fetch_contract_storage(
    rpc: Arc<dyn StorageRpc>,
    metadata: Arc<dyn MetadataSource>,
    request: ValidatedRequest,
    block: BlockNumberOrTag,
    options: FetchOptions,
) -> Result<ContractStorage, Error> {
    let start_time = Instant::now();
    let address = request.address.to_lower_hex();

    if !rpc.is_contract(request.address).await? {
        return Err(Error::NotFound(format!("No contract found at address {address}")));
    }

    let slots_request = BatchStorageRequest {
        address: request.address,
        slots: request.range.indices(),
        block: BlockId::from(block),
        chain_id: request.chain_id,
    };

    // metadata, slots and block number are independent; none cancels the others
    let (metadata, slots, block_number) = tokio::join!(
        fetch_metadata(metadata.as_ref(), &address, request.chain_id, options.metadata_timeout),
        get_batch_storage_slots(rpc.clone(), slots_request, options),
        fetch_block_number(rpc.as_ref(), block),
    );

    let values = slots.into_values()?;
    let fetched_at = now_utc();
    let slots = decode_slots(
        &values,
        metadata.as_ref().and_then(|metadata| metadata.storage_layout.as_ref()),
        fetched_at,
    );

    info!(
        "read {} slots of {} on chain {} in {}ms",
        slots.len(),
        address,
        request.chain_id,
        elapsed_millis(start_time)
    );

    Ok(ContractStorage {
        address,
        chain_id: request.chain_id,
        total_slots_fetched: slots.len(),
        slots,
        metadata,
        slot_range: request.range,
        fetched_at,
        block_number,
    })
}

async fn fetch_metadata(
    source: &dyn MetadataSource,
    address: &str,
    chain_id: u64,
    timeout: Duration,
) -> Option<ContractMetadata> {
    match tokio::time::timeout(timeout, source.get_metadata(address, chain_id)).await {
        Ok(Ok(metadata)) => metadata,
        Ok(Err(e)) => {
            warn!("failed to fetch metadata for {} on chain {}: {:#}", address, chain_id, e);
            None
        }
        Err(_) => {
            warn!(
                "metadata for {} on chain {} timed out after {}ms",
                address,
                chain_id,
                timeout.as_millis()
            );
            None
        }
    }
}

/// An explicit block number is reported as is; otherwise the latest height is looked up on a
/// best-effort basis.
async fn fetch_block_number(rpc: &dyn StorageRpc, block: BlockNumberOrTag) -> Option<u64> {
    if let BlockNumberOrTag::Number(number) = block {
        return Some(number);
    }

    match rpc.get_block_number().await {
        Ok(number) => Some(number),
        Err(e) => {
            warn!("failed to fetch block number: {}", e);
            None
        }
    }
}

/// Reads and decodes a range of a contract's storage once, outside of the HTTP server.
///
/// Endpoints and limits come from the configuration file; `args.rpc_url` and
/// `args.metadata_url` override it when set.
pub async fn inspect(args: InspectArgs) -> Result<ContractStorage, Error> {
    let mut config = Configuration::load()
        .map_err(|e| Error::Internal(format!("failed to load configuration: {e}")))?;

    if !args.rpc_url.is_empty() {
        config.chain_rpc_urls.insert(args.chain_id.to_string(), args.rpc_url.clone());
    }
    if !args.metadata_url.is_empty() {
        config.metadata_url = args.metadata_url.clone();
    }

    let service = StorageService::from_config(&config)?;
    let response = service.get_storage(&args.query()).await?;

    Ok(response.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_is_canonical() {
        let request = validate_request("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 1, 0, 5)
            .expect("valid request");

        let by_number = StorageKey::new(&request, &parse_block_tag("16").expect("valid tag"));
        let by_hex = StorageKey::new(&request, &parse_block_tag("0x10").expect("valid tag"));
        let latest = StorageKey::new(&request, &parse_block_tag("latest").expect("valid tag"));

        assert_eq!(by_number, by_hex);
        assert_ne!(by_number, latest);
        assert_eq!(latest.address, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert_eq!(latest.to_string(), "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2@1[0..=5]#latest");
    }

    #[test]
    fn test_from_config() {
        let mut config = Configuration::default();
        config.set("rpc_url", "http://localhost:8545").expect("failed to set rpc_url");
        config.set("chain_rpc_urls.8453", "http://localhost:9545").expect("failed to set url");

        let service = StorageService::from_config(&config).expect("failed to build service");
        assert_eq!(service.chains(), vec![1, 8453]);
        assert_eq!(service.options.batch_size, 100);
        assert_eq!(service.options.metadata_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unsupported_chain() {
        let service = StorageService::new(Arc::new(NoMetadata), Duration::from_secs(300));
        let mut query = StorageQuery::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        query.chain_id = 10;

        let err = service.get_storage(&query).await.expect_err("expected an error");
        assert_eq!(err.to_string(), "Unsupported chainId: 10");
        assert_eq!(err.status_code(), 400);
    }
}
