//! Field elements at the crate boundary
//!
//! [`Felt`] wraps a `U256` that is guaranteed to lie in [0, P). It converts
//! losslessly to and from the canonical hex form used by the surrounding SDK:
//! `0x`-prefixed, lowercase, no leading zeros (`0x0` for zero).

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;

use crate::error::{CryptoError, Result};
use crate::field::STARK_PRIME;

/// An element of the STARK prime field.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Felt(U256);

impl Felt {
    pub const ZERO: Felt = Felt(U256::ZERO);
    pub const ONE: Felt = Felt(U256::from_limbs([1, 0, 0, 0]));

    /// Longest byte string that always fits below the prime.
    pub const MAX_SHORT_STRING_LEN: usize = 31;

    /// Wrap a value already known to be below P.
    pub(crate) const fn from_raw(value: U256) -> Self {
        Felt(value)
    }

    /// Checked conversion; values >= P are rejected, never wrapped.
    pub fn from_u256(value: U256) -> Result<Self> {
        if value >= STARK_PRIME {
            return Err(CryptoError::out_of_range("field element", value));
        }
        Ok(Felt(value))
    }

    #[inline(always)]
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    /// Parse a hex string with or without a `0x` prefix, any case.
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Err(CryptoError::encoding(input, "no hex digits"));
        }
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Felt::ZERO);
        }
        if digits.len() > 64 {
            return Err(CryptoError::encoding(input, "more than 256 bits"));
        }

        let padded;
        let digits = if digits.len() % 2 == 1 {
            padded = format!("0{digits}");
            padded.as_str()
        } else {
            digits
        };
        let bytes = hex::decode(digits).map_err(|e| CryptoError::encoding(input, e))?;
        Self::from_u256(U256::from_be_slice(&bytes))
    }

    /// Parse an unsigned decimal string.
    pub fn from_dec_str(input: &str) -> Result<Self> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CryptoError::encoding(input, "not a decimal number"));
        }
        let value = U256::from_str_radix(input, 10).map_err(|e| CryptoError::encoding(input, e))?;
        Self::from_u256(value)
    }

    /// Encode a short ASCII/UTF-8 string as the big-endian integer of its bytes.
    pub fn from_short_string(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > Self::MAX_SHORT_STRING_LEN {
            return Err(CryptoError::OutOfRange {
                what: "short string length",
                value: U256::from(bytes.len()),
            });
        }
        Ok(Felt(U256::from_be_slice(bytes)))
    }

    pub fn from_bytes_be(bytes: &[u8; 32]) -> Result<Self> {
        Self::from_u256(U256::from_be_bytes(*bytes))
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    /// Canonical hex form: `0x` + lowercase digits, no leading zeros.
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Felt(U256::from(value))
    }
}

impl From<u128> for Felt {
    fn from(value: u128) -> Self {
        Felt(U256::from(value))
    }
}

impl TryFrom<U256> for Felt {
    type Error = CryptoError;

    fn try_from(value: U256) -> Result<Self> {
        Self::from_u256(value)
    }
}

impl From<Felt> for U256 {
    fn from(value: Felt) -> Self {
        value.0
    }
}

impl FromStr for Felt {
    type Err = CryptoError;

    /// `0x…` is hex, anything else must be decimal.
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({:#x})", self.0)
    }
}

impl fmt::LowerHex for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Felt;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Felt {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    struct FeltVisitor;

    impl Visitor<'_> for FeltVisitor {
        type Value = Felt;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a hex string, decimal string or unsigned integer below the STARK prime")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Felt, E> {
            Ok(Felt::from(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Felt, E> {
            v.parse().map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Felt {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Felt, D::Error> {
            deserializer.deserialize_any(FeltVisitor)
        }
    }
}
