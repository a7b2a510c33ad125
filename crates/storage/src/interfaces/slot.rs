use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interfaces::ContractMetadata;

/// The decoder's best guess at the type stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// A 20-byte address, right aligned
    Address,
    /// An unsigned integer
    Uint256,
    /// A two's complement signed integer
    Int256,
    /// A boolean
    Bool,
    /// A short string stored inline
    String,
    /// A fixed size byte array
    Bytes32,
    /// A dynamic byte array
    Bytes,
    /// An all-zero word
    Empty,
    /// Nothing could be inferred
    Unknown,
}

/// Whether a slot's type was declared by a storage layout or guessed from its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// A storage layout entry declared the type
    Layout,
    /// The type was guessed from the word itself
    Heuristic,
}

/// Every candidate reading of a storage word. Readings that do not apply are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretations {
    /// Lowercase hex, when the top 12 bytes are zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Decimal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uint256: Option<String>,
    /// Decimal, two's complement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int256: Option<String>,
    /// The raw word as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes32: Option<String>,
    /// Present only for words equal to 1
    #[serde(rename = "bool", default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    /// The inline short string, when the word has that shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

impl Interpretations {
    /// Whether no reading applies, which is only the case for empty slots.
    pub fn is_empty(&self) -> bool {
        self == &Interpretations::default()
    }
}

/// A single decoded storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSlot {
    /// The slot index
    pub index: u64,
    /// The raw 32-byte word
    pub raw_value: B256,
    /// Whether the word is all zeroes
    pub is_empty: bool,
    /// The best guess at the type stored in the slot
    pub data_type: DataType,
    /// `raw_value` rendered as `data_type`
    pub decoded_value: String,
    /// Every interpretation the word admits
    pub interpretations: Interpretations,
    /// Whether a layout hint or the heuristics picked `data_type`
    pub confidence: Confidence,
    /// The variable name, when a storage layout supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// When the word was read
    pub last_updated: DateTime<Utc>,
}

/// An inclusive range of slot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRange {
    /// First slot, inclusive
    pub start: u64,
    /// Last slot, inclusive
    pub end: u64,
}

impl SlotRange {
    /// The number of slots in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A range always holds at least one slot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The slot indices in ascending order.
    pub fn indices(&self) -> Vec<u64> {
        (self.start..=self.end).collect()
    }
}

/// The decoded storage of a contract over a slot range, as observed at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStorage {
    /// The contract address, lowercase hex
    pub address: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Decoded slots, ascending by index
    pub slots: Vec<StorageSlot>,
    /// Name, symbol and layout, when the metadata source knows the contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContractMetadata>,
    /// The requested range
    pub slot_range: SlotRange,
    /// The number of slots in `slots`
    pub total_slots_fetched: usize,
    /// When the range was read
    pub fetched_at: DateTime<Utc>,
    /// The block height the range was read at, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}
