use alloy::primitives::{I256, U256};
use std::fmt::Write;

/// Reinterprets an unsigned 256-bit word as a two's complement signed integer
///
/// ```
/// use slotscope_common::utils::strings::sign_uint;
/// use alloy::primitives::{I256, U256};
///
/// assert_eq!(sign_uint(U256::MAX), I256::MINUS_ONE);
/// assert!(!sign_uint(U256::from(7)).is_negative());
/// ```
pub fn sign_uint(unsigned: U256) -> I256 {
    I256::from_raw(unsigned)
}

/// Encodes a vector of bytes into a hex string
///
/// ```
/// use slotscope_common::utils::strings::encode_hex;
///
/// let bytes = vec![72, 101, 108, 108, 111, 32, 87, 111, 114, 108, 100];
/// let result = encode_hex(&bytes);
/// assert_eq!(result, "48656c6c6f20576f726c64");
/// ```
pub fn encode_hex(s: &[u8]) -> String {
    s.iter().fold(String::new(), |mut acc, b| {
        write!(acc, "{b:02x}").expect("unable to write");
        acc
    })
}

/// Returns the bytes as a string if every byte is printable ASCII (`0x20..=0x7e`)
///
/// ```
/// use slotscope_common::utils::strings::printable_ascii;
///
/// assert_eq!(printable_ascii(b"Wrapped Ether"), Some("Wrapped Ether".to_string()));
/// assert_eq!(printable_ascii(&[0x57, 0x00]), None);
/// ```
pub fn printable_ascii(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
        Some(bytes.iter().map(|b| *b as char).collect())
    } else {
        None
    }
}
