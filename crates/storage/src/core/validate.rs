use alloy::{eips::BlockNumberOrTag, primitives::Address};
use slotscope_common::constants::ADDRESS_REGEX;
use std::str::FromStr;

use crate::{error::Error, interfaces::SlotRange};

/// The maximum value of `end - start` in a single request.
pub const MAX_SLOT_RANGE: u64 = 1000;

/// A request which passed [`validate_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// The contract address
    pub address: Address,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// The slots to read
    pub range: SlotRange,
}

/// Validates the address, chain id and slot range of a storage request.
///
/// ```
/// use slotscope_storage::validate_request;
///
/// let request = validate_request("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 1, 0, 5)
///     .expect("valid request");
/// assert_eq!(request.range.len(), 6);
///
/// let err = validate_request("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 1, 10, 5).unwrap_err();
/// assert!(err.to_string().starts_with("Invalid slot range"));
/// ```
pub fn validate_request(
    address: &str,
    chain_id: u64,
    start: i64,
    end: i64,
) -> Result<ValidatedRequest, Error> {
    if !ADDRESS_REGEX.is_match(address).unwrap_or(false) {
        return Err(Error::Validation("Invalid contract address format".to_string()));
    }
    let address = Address::from_str(address)
        .map_err(|_| Error::Validation("Invalid contract address format".to_string()))?;

    if chain_id == 0 {
        return Err(Error::Validation("Invalid chainId".to_string()));
    }

    if start < 0 || end < 0 {
        return Err(Error::Validation(format!(
            "Invalid slot range: start ({start}) and end ({end}) must be non-negative integers"
        )));
    }
    if start > end {
        return Err(Error::Validation(format!(
            "Invalid slot range: start ({start}) must not be greater than end ({end})"
        )));
    }

    let range = SlotRange { start: start as u64, end: end as u64 };
    if range.end - range.start > MAX_SLOT_RANGE {
        return Err(Error::Validation(format!(
            "Slot range too large: end - start is {}, the maximum is {MAX_SLOT_RANGE}",
            range.end - range.start
        )));
    }

    Ok(ValidatedRequest { address, chain_id, range })
}

/// Parses a block tag: `latest`, `earliest`, `pending`, `safe`, `finalized`, a decimal block
/// number or a `0x` prefixed hex block number.
pub fn parse_block_tag(tag: &str) -> Result<BlockNumberOrTag, Error> {
    let tag = tag.trim().to_lowercase();
    if !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit()) {
        return tag
            .parse::<u64>()
            .map(BlockNumberOrTag::Number)
            .map_err(|_| Error::Validation(format!("Invalid blockTag: '{tag}'")));
    }

    BlockNumberOrTag::from_str(&tag).map_err(|_| Error::Validation(format!("Invalid blockTag: '{tag}'")))
}
