//! Keccak-based selectors
//!
//! `starknet_keccak` is Keccak-256 (pre-standard padding, not SHA3-256) with
//! the result masked to its low 250 bits, so every output is a valid field
//! element. Entry-point selectors and typed-data type hashes are both built
//! on it.
//!
//! Encoding contract:
//!   1. The input is hashed as raw bytes; names are taken as their UTF-8 bytes.
//!   2. The 32-byte digest is read as a big-endian integer.
//!   3. The top 6 bits are cleared.

use alloy_primitives::U256;
use tiny_keccak::{Hasher, Keccak};

use crate::felt::Felt;

/// 2^250 - 1
const MASK_250: U256 = U256::from_limbs([u64::MAX, u64::MAX, u64::MAX, 0x03ff_ffff_ffff_ffff]);

/// Keccak256 hash of a byte slice.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Keccak-256 of `data`, truncated to 250 bits.
pub fn starknet_keccak(data: &[u8]) -> Felt {
    let raw = U256::from_be_bytes(keccak256(data));
    Felt::from_raw(raw & MASK_250)
}

/// Selector of a contract entry point.
pub fn selector_from_name(name: &str) -> Felt {
    starknet_keccak(name.as_bytes())
}
