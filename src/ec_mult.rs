//! Scalar Multiplication
//!
//! Two flavours:
//!
//! - [`ec_mult`]: plain double-and-add, used for key derivation and the
//!   nonce point in signing.
//! - [`mimic_ec_mult_air`]: the fixed-length variant the on-chain verifier
//!   circuit constrains. It starts from a shift point so the accumulator never
//!   passes through infinity, and fails whenever the accumulator and the
//!   doubled base share an x-coordinate. Signature verification must use it so
//!   that exactly the same signatures are accepted off-chain and on-chain.

use alloy_primitives::U256;

use crate::curve::CurvePoint;
use crate::error::{CryptoError, Result};

/// Scalar width of the verifier circuit; scalars must lie in [1, 2^251).
pub const N_ELEMENT_BITS_ECDSA: usize = 251;

/// m * point by least-significant-bit-first double-and-add.
///
/// `m = 0` or an infinite base point gives [`CurvePoint::Infinity`].
pub fn ec_mult(m: U256, point: &CurvePoint) -> Result<CurvePoint> {
    let mut acc = CurvePoint::Infinity;
    let mut base = *point;
    let bits = m.bit_len();

    for i in 0..bits {
        if m.bit(i) {
            acc = acc.checked_add(&base)?;
        }
        if i + 1 < bits {
            base = base.double()?;
        }
    }
    Ok(acc)
}

/// Computes `m * point + shift` the way the verifier circuit does.
///
/// Runs exactly [`N_ELEMENT_BITS_ECDSA`] rounds. Each round requires the
/// accumulator and the current base to have distinct x-coordinates, adds the
/// base when the low bit of `m` is set, then doubles the base. The caller
/// removes the shift by adding its negation.
pub fn mimic_ec_mult_air(m: U256, point: &CurvePoint, shift: &CurvePoint) -> Result<CurvePoint> {
    if m == U256::ZERO || m.bit_len() > N_ELEMENT_BITS_ECDSA {
        return Err(CryptoError::out_of_range("circuit scalar", m));
    }
    if point.is_infinity() || shift.is_infinity() {
        return Err(CryptoError::InvalidPoint("circuit multiplication needs finite points"));
    }

    let mut acc = *shift;
    let mut base = *point;
    for i in 0..N_ELEMENT_BITS_ECDSA {
        match (acc.x(), base.x()) {
            (Some(ax), Some(bx)) if ax != bx => {}
            _ => {
                return Err(CryptoError::InvalidPoint(
                    "accumulator collided with the doubled base point",
                ))
            }
        }
        if m.bit(i) {
            acc = acc.checked_add(&base)?;
        }
        base = base.double()?;
    }
    Ok(acc)
}
