//! Deterministic nonce derivation (RFC 6979, HMAC-SHA256)
//!
//! The DRBG is seeded with the private key as entropy, the message hash as
//! nonce and the caller's seed (big-endian, leading zero bytes stripped) as
//! personalization string. Each 32-byte output is shifted right by 4 bits so the
//! candidate fits the 252-bit curve order, and rejected unless it lies in
//! [1, N).

use alloy_primitives::U256;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::curve::EC_ORDER;
use crate::error::{CryptoError, Result};
use crate::felt::Felt;

type HmacSha256 = Hmac<Sha256>;

struct HmacDrbg {
    k: [u8; 32],
    v: [u8; 32],
}

impl HmacDrbg {
    fn new(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self> {
        let mut k = [0u8; 32];
        let mut v = [1u8; 32];
        for round in [0x00u8, 0x01] {
            k = hmac(&k, &[&v, &[round], entropy, nonce, personalization])?;
            v = hmac(&k, &[&v])?;
        }
        Ok(HmacDrbg { k, v })
    }

    fn next_block(&mut self) -> Result<[u8; 32]> {
        self.v = hmac(&self.k, &[&self.v])?;
        let out = self.v;
        self.k = hmac(&self.k, &[&self.v, &[0x00]])?;
        self.v = hmac(&self.k, &[&self.v])?;
        Ok(out)
    }
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32]> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).map_err(|e| CryptoError::encoding("hmac key", e))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// Derive the signing nonce k in [1, N) for `message_hash` under `private_key`.
///
/// `seed` is extra personalization; zero means none. Signing retries pass
/// successive seeds to obtain fresh candidates.
pub fn generate_k(message_hash: &Felt, private_key: &Felt, seed: U256) -> Result<U256> {
    let seed_bytes = seed.to_be_bytes::<32>();
    let first_non_zero = seed_bytes.iter().position(|b| *b != 0).unwrap_or(seed_bytes.len());

    let mut drbg = HmacDrbg::new(
        &private_key.to_bytes_be(),
        &message_hash.to_bytes_be(),
        &seed_bytes[first_non_zero..],
    )?;

    loop {
        let k = U256::from_be_bytes(drbg.next_block()?) >> 4;
        if k != U256::ZERO && k < EC_ORDER {
            return Ok(k);
        }
    }
}
