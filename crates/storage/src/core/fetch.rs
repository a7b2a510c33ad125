use alloy::{
    eips::BlockId,
    primitives::{Address, B256},
};
use backoff::{future::retry, ExponentialBackoff, ExponentialBackoffBuilder};
use futures::future::join_all;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tracing::{debug, trace, warn};

use crate::{error::Error, interfaces::StorageRpc};

/// A set of slots to read from one contract at one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStorageRequest {
    /// The contract to read from
    pub address: Address,
    /// The slot indices to read
    pub slots: Vec<u64>,
    /// The block to read at
    pub block: BlockId,
    /// Used for logging only
    pub chain_id: u64,
}

/// How [`get_batch_storage_slots`] splits, schedules and retries upstream reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    /// The maximum number of slots read in one JSON-RPC batch
    pub batch_size: usize,
    /// The maximum number of batches in flight at once
    pub max_concurrency: usize,
    /// Attempts per batch, including the first one
    pub max_attempts: u32,
    /// The delay before the first retry
    pub initial_interval: Duration,
    /// The factor each delay grows by
    pub multiplier: f64,
    /// Delays are picked uniformly from `delay * (1 ± randomization_factor)`
    pub randomization_factor: f64,
    /// How long a cache miss waits on the metadata source before carrying on without it
    pub metadata_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrency: 4,
            max_attempts: 3,
            initial_interval: Duration::from_millis(250),
            multiplier: 2.0,
            randomization_factor: 0.5,
            metadata_timeout: Duration::from_secs(10),
        }
    }
}

impl FetchOptions {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.randomization_factor)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// The outcome of [`get_batch_storage_slots`]: every requested slot appears in exactly one of
/// `values` or `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStorageResult {
    /// Slots which were read
    pub values: BTreeMap<u64, B256>,
    /// Slots whose batch failed every attempt
    pub failures: BTreeMap<u64, Error>,
}

impl BatchStorageResult {
    /// Whether every requested slot was read.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The values, or the most specific failure if any slot could not be read.
    pub fn into_values(self) -> Result<BTreeMap<u64, B256>, Error> {
        match Error::most_specific(self.failures.values()) {
            Some(err) => Err(err),
            None => Ok(self.values),
        }
    }
}

/// Reads every slot in `request`.
///
/// The slot list is split into batches of `options.batch_size`, at most
/// `options.max_concurrency` batches run at once, and each batch is retried with exponential
/// backoff on its own. A batch that still fails records all of its slots in
/// [`BatchStorageResult::failures`]; the other batches are unaffected.
pub async fn get_batch_storage_slots(
    rpc: Arc<dyn StorageRpc>,
    request: BatchStorageRequest,
    options: FetchOptions,
) -> BatchStorageResult {
    let mut result = BatchStorageResult::default();
    if request.slots.is_empty() {
        return result;
    }

    let chunks: Vec<Vec<u64>> =
        request.slots.chunks(options.batch_size.max(1)).map(<[u64]>::to_vec).collect();
    debug!(
        "reading {} slots of {} on chain {} in {} batches",
        request.slots.len(),
        request.address,
        request.chain_id,
        chunks.len()
    );

    // create a semaphore with the correct number of permits
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let (address, block) = (request.address, request.block);
    let handles = chunks.into_iter().map(|chunk| {
        let semaphore = semaphore.clone();
        let rpc = rpc.clone();
        tokio::spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    fetch_chunk(rpc, address, &chunk, block, options).await
                }
                Err(e) => Err(Error::Internal(format!("failed to acquire semaphore permit: {e}"))),
            };
            (chunk, outcome)
        })
    });

    for handle in join_all(handles).await {
        match handle {
            Ok((chunk, Ok(values))) => result.values.extend(chunk.into_iter().zip(values)),
            Ok((chunk, Err(err))) => {
                warn!("failed to read {} slots of {}: {}", chunk.len(), request.address, err);
                result.failures.extend(chunk.into_iter().map(|slot| (slot, err.clone())));
            }
            Err(e) => {
                // the task panicked or was cancelled, so its slots are unaccounted for
                let err = Error::Internal(format!("failed to join batch task: {e}"));
                for slot in &request.slots {
                    if !result.values.contains_key(slot) {
                        result.failures.entry(*slot).or_insert_with(|| err.clone());
                    }
                }
            }
        }
    }

    result
}

/// Reads one batch, retrying retryable failures up to `options.max_attempts` times.
async fn fetch_chunk(
    rpc: Arc<dyn StorageRpc>,
    address: Address,
    slots: &[u64],
    block: BlockId,
    options: FetchOptions,
) -> Result<Vec<B256>, Error> {
    let mut attempt = 0u32;

    retry(options.backoff(), || {
        attempt += 1;
        let current = attempt;
        let rpc = rpc.clone();

        async move {
            trace!("reading {} slots of {} (attempt {})", slots.len(), address, current);
            match rpc.get_storage_chunk(address, slots, block).await {
                Ok(values) if values.len() == slots.len() => Ok(values),
                Ok(values) => Err(backoff::Error::permanent(Error::UpstreamUnavailable(format!(
                    "expected {} storage values, got {}",
                    slots.len(),
                    values.len()
                )))),
                Err(err) if err.is_retryable() && current < options.max_attempts => {
                    debug!(
                        "attempt {} of {} failed, retrying: {}",
                        current, options.max_attempts, err
                    );
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        }
    })
    .await
}
