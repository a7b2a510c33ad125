use super::strings::encode_hex;
use alloy::primitives::{Address, FixedBytes, I256, U256};

/// A convenience function which encodes a given EVM type into a sized, lowercase hex string.
pub trait ToLowerHex {
    /// Encodes `self` as a `0x`-prefixed, lowercase hex string.
    fn to_lower_hex(&self) -> String;
}

impl ToLowerHex for U256 {
    fn to_lower_hex(&self) -> String {
        format!("{:#066x}", self)
    }
}

impl ToLowerHex for I256 {
    fn to_lower_hex(&self) -> String {
        format!("{:#066x}", self.into_raw())
    }
}

impl ToLowerHex for Vec<u8> {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for [u8] {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for FixedBytes<32> {
    fn to_lower_hex(&self) -> String {
        format!("{:#x}", self)
    }
}

impl ToLowerHex for Address {
    fn to_lower_hex(&self) -> String {
        format!("{:#x}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_is_zero_padded() {
        assert_eq!(U256::from(1).to_lower_hex(), format!("0x{}1", "0".repeat(63)));
        assert_eq!(FixedBytes::<32>::ZERO.to_lower_hex(), format!("0x{}", "0".repeat(64)));
    }

    #[test]
    fn test_negative_int_is_twos_complement() {
        assert_eq!(I256::MINUS_ONE.to_lower_hex(), format!("0x{}", "f".repeat(64)));
    }

    #[test]
    fn test_address_is_lowercase() {
        let address: Address =
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".parse().expect("valid address");
        assert_eq!(address.to_lower_hex(), "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    }
}
