//! STARK-curve ECDSA
//!
//! Key derivation, deterministic signing and verification. Verification runs
//! the circuit-mimicking multiplication so it accepts exactly the signatures
//! the on-chain verifier accepts, including the ones produced for -Q.

use std::fmt;

use alloy_primitives::U256;

use crate::curve::{CurvePoint, EC_ORDER, GENERATOR, MINUS_SHIFT_POINT, SHIFT_POINT};
use crate::ec_mult::{ec_mult, mimic_ec_mult_air};
use crate::error::{CryptoError, Result};
use crate::felt::Felt;
use crate::field::{div_mod, mod_inverse};
use crate::rfc6979::generate_k;

/// 2^251, exclusive upper bound for message hashes, r and w.
pub const ELEMENT_UPPER_BOUND: U256 = U256::from_limbs([0, 0, 0, 0x0800000000000000]);

/// Nonce candidates tried by [`sign`] before giving up.
pub const MAX_SIGN_ATTEMPTS: usize = 64;

/// An (r, s) signature pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    pub r: Felt,
    pub s: Felt,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.r, self.s)
    }
}

fn check_below(what: &'static str, value: U256, bound: U256) -> Result<()> {
    if value == U256::ZERO || value >= bound {
        return Err(CryptoError::out_of_range(what, value));
    }
    Ok(())
}

fn check_private_key(private_key: &Felt) -> Result<()> {
    check_below("private key", private_key.as_u256(), EC_ORDER)
}

/// Public key `private_key * G`. The key must lie in [1, N).
pub fn private_to_public(private_key: &Felt) -> Result<CurvePoint> {
    check_private_key(private_key)?;
    let public = ec_mult(private_key.as_u256(), &GENERATOR)?;
    if public.is_infinity() {
        return Err(CryptoError::InvalidPoint("public key is the point at infinity"));
    }
    Ok(public)
}

/// Sign `message_hash` (in [1, 2^251)) with `private_key`.
///
/// Deterministic for a given `(private_key, message_hash, seed)`. A rejected
/// nonce is retried with the next seed, at most [`MAX_SIGN_ATTEMPTS`] times.
pub fn sign(private_key: &Felt, message_hash: &Felt, seed: &Felt) -> Result<Signature> {
    sign_with_attempts(private_key, message_hash, seed, MAX_SIGN_ATTEMPTS)
}

/// [`sign`] with an explicit retry budget.
pub fn sign_with_attempts(
    private_key: &Felt,
    message_hash: &Felt,
    seed: &Felt,
    max_attempts: usize,
) -> Result<Signature> {
    check_below("message hash", message_hash.as_u256(), ELEMENT_UPPER_BOUND)?;
    check_private_key(private_key)?;

    for attempt in 0..max_attempts {
        let candidate_seed = seed.as_u256() + U256::from(attempt);
        let k = generate_k(message_hash, private_key, candidate_seed)?;
        match sign_with_nonce(private_key, message_hash, k) {
            Ok(signature) => return Ok(signature),
            Err(reason) => {
                tracing::debug!(attempt, %reason, "rejected signing nonce, retrying with next seed");
            }
        }
    }

    Err(CryptoError::SignatureDerivationExhausted {
        attempts: max_attempts,
    })
}

/// One signing attempt with a fixed nonce. Any error means the nonce is unusable.
fn sign_with_nonce(private_key: &Felt, message_hash: &Felt, k: U256) -> Result<Signature> {
    let r = ec_mult(k, &GENERATOR)?
        .x()
        .ok_or(CryptoError::InvalidPoint("nonce point is the point at infinity"))?;
    check_below("r", r, ELEMENT_UPPER_BOUND)?;

    let agg = r
        .mul_mod(private_key.as_u256(), EC_ORDER)
        .add_mod(message_hash.as_u256(), EC_ORDER);
    let w = div_mod(k, agg, EC_ORDER)?;
    check_below("w", w, ELEMENT_UPPER_BOUND)?;

    let s = mod_inverse(w, EC_ORDER)?;
    Ok(Signature {
        r: Felt::from_raw(r),
        s: Felt::from_raw(s),
    })
}

/// Verify `signature` over `message_hash` against `public_key`.
///
/// Out-of-range components and keys off the curve are errors. A well-formed
/// signature that does not match is `Ok(false)`. Both Q and -Q are tried, so
/// either y-coordinate for the key's x verifies.
pub fn verify(public_key: &CurvePoint, message_hash: &Felt, signature: &Signature) -> Result<bool> {
    let (r, s) = (signature.r.as_u256(), signature.s.as_u256());
    let hash = message_hash.as_u256();

    check_below("r", r, ELEMENT_UPPER_BOUND)?;
    check_below("s", s, EC_ORDER)?;
    check_below("message hash", hash, ELEMENT_UPPER_BOUND)?;
    if public_key.is_infinity() || !public_key.is_on_curve() {
        return Err(CryptoError::InvalidPoint("public key is not a finite curve point"));
    }

    let w = mod_inverse(s, EC_ORDER)?;
    check_below("w", w, ELEMENT_UPPER_BOUND)?;

    if matches_r(hash, r, w, public_key) {
        return Ok(true);
    }
    tracing::trace!("signature did not verify against Q, trying -Q");
    Ok(matches_r(hash, r, w, &-*public_key))
}

fn matches_r(hash: U256, r: U256, w: U256, public_key: &CurvePoint) -> bool {
    match recompute_r(hash, r, w, public_key) {
        Ok(Some(x)) => x == r,
        Ok(None) => false,
        Err(err) => {
            tracing::trace!(%err, "verification circuit rejected inputs");
            false
        }
    }
}

/// x-coordinate of w * (h * G + r * Q), computed with shifted circuit multiplications.
fn recompute_r(hash: U256, r: U256, w: U256, public_key: &CurvePoint) -> Result<Option<U256>> {
    let z_g = mimic_ec_mult_air(hash, &GENERATOR, &MINUS_SHIFT_POINT)?;
    let r_q = mimic_ec_mult_air(r, public_key, &SHIFT_POINT)?;
    let w_b = mimic_ec_mult_air(w, &z_g.checked_add(&r_q)?, &SHIFT_POINT)?;
    Ok(w_b.checked_add(&MINUS_SHIFT_POINT)?.x())
}
