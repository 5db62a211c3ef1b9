//! STARK Field Arithmetic
//!
//! Modular arithmetic over the STARK prime P = 2^251 + 17 * 2^192 + 1.
//! Values are plain `U256`s that callers keep reduced into [0, P).
//!
//! Inversion uses the extended Euclidean algorithm rather than Fermat so that a
//! non-invertible input is reported instead of silently mapping to zero. The
//! same routine serves arithmetic modulo the curve order.

use alloy_primitives::U256;

use crate::error::{CryptoError, Result};

/// STARK field prime
pub const STARK_PRIME: U256 = U256::from_limbs([
    0x0000000000000001,
    0x0000000000000000,
    0x0000000000000000,
    0x0800000000000011,
]);

pub struct StarkField;

impl StarkField {
    #[inline(always)]
    pub fn add(a: U256, b: U256) -> U256 {
        let (sum, overflow) = a.overflowing_add(b);
        if overflow || sum >= STARK_PRIME {
            sum.wrapping_sub(STARK_PRIME)
        } else {
            sum
        }
    }

    #[inline(always)]
    pub fn sub(a: U256, b: U256) -> U256 {
        sub_mod(a, b, STARK_PRIME)
    }

    #[inline(always)]
    pub fn mul(a: U256, b: U256) -> U256 {
        a.mul_mod(b, STARK_PRIME)
    }

    #[inline(always)]
    pub fn square(a: U256) -> U256 {
        Self::mul(a, a)
    }

    #[inline(always)]
    pub fn neg(a: U256) -> U256 {
        if a == U256::ZERO {
            U256::ZERO
        } else {
            STARK_PRIME.wrapping_sub(a)
        }
    }

    #[inline]
    pub fn inv(a: U256) -> Result<U256> {
        mod_inverse(a, STARK_PRIME)
    }

    #[inline]
    pub fn div(a: U256, b: U256) -> Result<U256> {
        div_mod(a, b, STARK_PRIME)
    }
}

/// (a - b) mod m for a, b already reduced below m.
#[inline(always)]
pub(crate) fn sub_mod(a: U256, b: U256, modulus: U256) -> U256 {
    if a >= b {
        a.wrapping_sub(b)
    } else {
        modulus.wrapping_sub(b.wrapping_sub(a))
    }
}

/// Inverse of `value` modulo `modulus` via the extended Euclidean algorithm.
///
/// Bezout coefficients are tracked modulo `modulus`, so no signed arithmetic is
/// needed. Fails with [`CryptoError::NotInvertible`] when gcd(value, modulus) != 1,
/// which includes `value ≡ 0`.
pub fn mod_inverse(value: U256, modulus: U256) -> Result<U256> {
    if modulus < U256::from(2u64) {
        return Err(CryptoError::out_of_range("modulus", modulus));
    }

    let mut old_r = value.reduce_mod(modulus);
    let mut r = modulus;
    let mut old_s = U256::from(1u64);
    let mut s = U256::ZERO;

    while r != U256::ZERO {
        let q = old_r / r;
        // q * r <= old_r, never wraps
        let next_r = old_r - q * r;
        old_r = r;
        r = next_r;

        let next_s = sub_mod(old_s, q.mul_mod(s, modulus), modulus);
        old_s = s;
        s = next_s;
    }

    if old_r != U256::from(1u64) {
        return Err(CryptoError::NotInvertible { value, modulus });
    }
    Ok(old_s)
}

/// x / y mod p, i.e. `x * mod_inverse(y, p) mod p`, normalized into [0, p).
pub fn div_mod(x: U256, y: U256, modulus: U256) -> Result<U256> {
    let y_inv = mod_inverse(y, modulus)?;
    Ok(x.mul_mod(y_inv, modulus))
}
