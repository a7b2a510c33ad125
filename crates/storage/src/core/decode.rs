//! Turns raw storage words into typed, multi-interpretation [`StorageSlot`]s.

use alloy::primitives::{Address, B256, I256, U256};
use chrono::{DateTime, Utc};
use slotscope_common::utils::{
    hex::ToLowerHex,
    strings::{printable_ascii, sign_uint},
};
use std::collections::BTreeMap;

use crate::interfaces::{
    Confidence, DataType, Interpretations, LayoutEntry, StorageLayout, StorageSlot,
};

/// Rendering of an all-zero slot.
pub(crate) const EMPTY_VALUE: &str = "(empty)";

/// Decodes every word in `raw`, returning slots in ascending index order.
///
/// `layout`, when given, upgrades the guess for the slots it declares.
pub fn decode_slots(
    raw: &BTreeMap<u64, B256>,
    layout: Option<&StorageLayout>,
    fetched_at: DateTime<Utc>,
) -> Vec<StorageSlot> {
    raw.iter()
        .map(|(index, word)| {
            decode_slot(*index, *word, layout.and_then(|layout| layout.get(index)), fetched_at)
        })
        .collect()
}

/// Decodes a single storage word.
///
/// All heuristics run independently and fill [`Interpretations`]; the best guess is then picked
/// in order: declared layout type, address, non-empty short string, bool, and `UINT256`
/// otherwise.
///
/// ```
/// use alloy::primitives::B256;
/// use chrono::Utc;
/// use slotscope_storage::{decode_slot, DataType};
///
/// let word: B256 =
///     "0x000000000000000000000000c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap();
/// let slot = decode_slot(3, word, None, Utc::now());
///
/// assert_eq!(slot.data_type, DataType::Address);
/// assert_eq!(slot.decoded_value, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
/// assert_eq!(slot.interpretations.uint256.is_some(), true);
/// ```
pub fn decode_slot(
    index: u64,
    raw: B256,
    layout: Option<&LayoutEntry>,
    fetched_at: DateTime<Utc>,
) -> StorageSlot {
    let label = layout.and_then(|entry| entry.label.clone());

    if raw.is_zero() {
        return StorageSlot {
            index,
            raw_value: raw,
            is_empty: true,
            data_type: DataType::Empty,
            decoded_value: EMPTY_VALUE.to_string(),
            interpretations: Interpretations::default(),
            confidence: Confidence::Heuristic,
            label,
            last_updated: fetched_at,
        };
    }

    let value = U256::from_be_bytes(raw.0);
    let interpretations = Interpretations {
        address: address_heuristic(&raw),
        uint256: Some(value.to_string()),
        int256: Some(sign_uint(value).to_string()),
        bytes32: Some(raw.to_lower_hex()),
        boolean: bool_heuristic(value),
        string: short_string_heuristic(&raw),
    };

    let declared = layout.and_then(|entry| decode_declared(&entry.type_name, &raw));
    let (data_type, decoded_value, confidence) = match declared {
        Some((data_type, decoded_value)) => (data_type, decoded_value, Confidence::Layout),
        None => {
            let (data_type, decoded_value) = best_guess(&interpretations);
            (data_type, decoded_value, Confidence::Heuristic)
        }
    };

    StorageSlot {
        index,
        raw_value: raw,
        is_empty: false,
        data_type,
        decoded_value,
        interpretations,
        confidence,
        label,
        last_updated: fetched_at,
    }
}

fn best_guess(interpretations: &Interpretations) -> (DataType, String) {
    if let Some(address) = &interpretations.address {
        return (DataType::Address, address.clone());
    }
    if let Some(string) = interpretations.string.as_ref().filter(|s| !s.is_empty()) {
        return (DataType::String, string.clone());
    }
    if let Some(boolean) = interpretations.boolean {
        return (DataType::Bool, boolean.to_string());
    }

    match &interpretations.uint256 {
        Some(uint256) => (DataType::Uint256, uint256.clone()),
        None => (DataType::Unknown, String::new()),
    }
}

/// The low 20 bytes, if the high 12 bytes are zero and the low 20 are not.
fn address_heuristic(raw: &B256) -> Option<String> {
    if raw[..12].iter().any(|b| *b != 0) || raw[12..].iter().all(|b| *b == 0) {
        return None;
    }

    Some(Address::from_word(*raw).to_lower_hex())
}

/// Zero is already reported as an empty slot, so in practice only `1` yields `Some(true)`.
fn bool_heuristic(value: U256) -> Option<bool> {
    if value == U256::ZERO {
        Some(false)
    } else if value == U256::from(1) {
        Some(true)
    } else {
        None
    }
}

/// Solidity stores strings shorter than 32 bytes left aligned, with twice their length in the
/// lowest byte.
fn short_string_heuristic(raw: &B256) -> Option<String> {
    let marker = raw[31];
    if marker % 2 != 0 {
        return None;
    }

    let len = (marker / 2) as usize;
    if len > 31 {
        return None;
    }

    printable_ascii(&raw[..len])
}

/// Decodes `raw` as the declared `type_name`, or `None` when the type is not a value type
/// stored inline in its slot.
fn decode_declared(type_name: &str, raw: &B256) -> Option<(DataType, String)> {
    let type_name = normalize_type_name(type_name);
    let value = U256::from_be_bytes(raw.0);

    match type_name.as_str() {
        "address" | "address payable" | "contract" => {
            Some((DataType::Address, Address::from_word(*raw).to_lower_hex()))
        }
        "bool" => Some((DataType::Bool, (!value.is_zero()).to_string())),
        "enum" => Some((DataType::Uint256, raw[31].to_string())),
        "string" => decode_dynamic(raw, value, true).map(|s| (DataType::String, s)),
        "bytes" => decode_dynamic(raw, value, false).map(|s| (DataType::Bytes, s)),
        other => {
            if let Some(width) = other.strip_prefix("bytes") {
                let width = width.parse::<usize>().ok().filter(|w| (1..=32).contains(w))?;
                Some((DataType::Bytes32, raw[..width].to_lower_hex()))
            } else if let Some(bits) = other.strip_prefix("uint") {
                let bits = integer_width(bits)?;
                Some((DataType::Uint256, low_bits(value, bits).to_string()))
            } else if let Some(bits) = other.strip_prefix("int") {
                let bits = integer_width(bits)?;
                Some((DataType::Int256, sign_extend(value, bits).to_string()))
            } else {
                None
            }
        }
    }
}

/// Maps solc type identifiers (`t_uint256`, `t_string_storage`, `t_enum(Status)12`) and
/// source-level names (`enum Status`, `contract IERC20`) onto one vocabulary.
fn normalize_type_name(type_name: &str) -> String {
    let type_name = type_name.trim().to_lowercase();

    let Some(id) = type_name.strip_prefix("t_") else {
        if type_name.starts_with("enum ") {
            return "enum".to_string();
        }
        if type_name.starts_with("contract ") {
            return "contract".to_string();
        }
        return type_name;
    };

    match id {
        "string_storage" | "string_memory_ptr" => "string".to_string(),
        "bytes_storage" | "bytes_memory_ptr" => "bytes".to_string(),
        "address_payable" => "address payable".to_string(),
        id if id.starts_with("enum(") => "enum".to_string(),
        id if id.starts_with("contract(") => "contract".to_string(),
        id => id.to_string(),
    }
}

/// `uint`/`int` default to 256 bits; explicit widths must be a multiple of 8 up to 256.
fn integer_width(suffix: &str) -> Option<usize> {
    if suffix.is_empty() {
        return Some(256);
    }

    suffix.parse::<usize>().ok().filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
}

fn low_bits(value: U256, bits: usize) -> U256 {
    if bits >= 256 {
        value
    } else {
        value & ((U256::from(1) << bits) - U256::from(1))
    }
}

fn sign_extend(value: U256, bits: usize) -> I256 {
    let truncated = low_bits(value, bits);
    if bits < 256 && truncated.bit(bits - 1) {
        I256::from_raw(truncated | !low_bits(U256::MAX, bits))
    } else {
        I256::from_raw(truncated)
    }
}

/// Short `string`/`bytes` values are stored inline; long ones only store `2 * len + 1` here
/// and keep their data at `keccak256(slot)`.
fn decode_dynamic(raw: &B256, value: U256, utf8: bool) -> Option<String> {
    if value.bit(0) {
        let len = (value - U256::from(1)) / U256::from(2);
        return Some(format!("<dynamic, {len} bytes>"));
    }

    let len = (raw[31] / 2) as usize;
    if len > 31 {
        return None;
    }

    let bytes = &raw[..len];
    Some(if utf8 { String::from_utf8_lossy(bytes).into_owned() } else { bytes.to_lower_hex() })
}
