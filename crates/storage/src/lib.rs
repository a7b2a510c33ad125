//! The storage module reads a range of a contract's storage slots and decodes every word into a
//! set of candidate interpretations.
//!
//! It validates requests, checks that the target is a deployed contract, fetches the raw words
//! in batched JSON-RPC calls, decodes them with an optional storage layout and caches the
//! assembled [`ContractStorage`] per request key.

/// Error types for the storage module
pub mod error;

mod core;
mod interfaces;

// re-export the public interface
pub use core::{
    decode::{decode_slot, decode_slots},
    fetch::{get_batch_storage_slots, BatchStorageRequest, BatchStorageResult, FetchOptions},
    inspect,
    validate::{parse_block_tag, validate_request, ValidatedRequest, MAX_SLOT_RANGE},
    StorageKey, StorageResponse, StorageService,
};
pub use error::Error;
pub use interfaces::{
    Confidence, ContractMetadata, ContractStorage, DataType, HttpMetadataSource, InspectArgs,
    InspectArgsBuilder, Interpretations, JsonRpcStorage, LayoutEntry, MetadataSource, NoMetadata,
    SlotRange, StorageLayout, StorageQuery, StorageQueryBuilder, StorageRpc, StorageSlot,
};
