//! Pedersen Hash
//!
//! Hashes up to two field elements by walking their 252 bits each against a
//! table of precomputed base points, starting from the shift point. The result
//! is the x-coordinate of the accumulated point.
//!
//! The 504-point table is derived once from the four Pedersen base points and
//! shared read-only afterwards.

use std::sync::LazyLock;

use alloy_primitives::U256;

use crate::curve::{CurvePoint, PEDERSEN_P0, PEDERSEN_P1, PEDERSEN_P2, PEDERSEN_P3, SHIFT_POINT};
use crate::error::{CryptoError, Result};
use crate::felt::Felt;

/// Bits consumed per input element.
pub const N_ELEMENT_BITS_HASH: usize = 252;

/// Bits of each element handled by its low base point; the rest use the high one.
const LOW_PART_BITS: usize = 248;

/// Inputs accepted by a single [`pedersen_hash`] call.
pub const MAX_PEDERSEN_INPUTS: usize = 2;

static CONSTANT_POINTS: LazyLock<Result<Vec<CurvePoint>>> = LazyLock::new(build_constant_points);

fn build_constant_points() -> Result<Vec<CurvePoint>> {
    let mut points = Vec::with_capacity(MAX_PEDERSEN_INPUTS * N_ELEMENT_BITS_HASH);
    for (low, high) in [(PEDERSEN_P0, PEDERSEN_P1), (PEDERSEN_P2, PEDERSEN_P3)] {
        push_doublings(&mut points, low, LOW_PART_BITS)?;
        push_doublings(&mut points, high, N_ELEMENT_BITS_HASH - LOW_PART_BITS)?;
    }
    tracing::debug!(points = points.len(), "pedersen constant table built");
    Ok(points)
}

fn push_doublings(points: &mut Vec<CurvePoint>, base: CurvePoint, count: usize) -> Result<()> {
    let mut p = base;
    for _ in 0..count {
        points.push(p);
        p = p.double()?;
    }
    Ok(())
}

fn constant_points() -> Result<&'static [CurvePoint]> {
    match &*CONSTANT_POINTS {
        Ok(points) => Ok(points.as_slice()),
        Err(err) => Err(err.clone()),
    }
}

/// Pedersen hash of at most [`MAX_PEDERSEN_INPUTS`] elements.
///
/// `pedersen_hash(&[a, b])` is the two-to-one hash used everywhere else in the
/// crate. Longer sequences go through [`hash_elements`] or
/// [`compute_hash_on_elements`].
pub fn pedersen_hash(elements: &[Felt]) -> Result<Felt> {
    if elements.len() > MAX_PEDERSEN_INPUTS {
        return Err(CryptoError::out_of_range(
            "pedersen input count",
            U256::from(elements.len()),
        ));
    }

    let table = constant_points()?;
    let mut acc = SHIFT_POINT;
    for (i, element) in elements.iter().enumerate() {
        let value = element.as_u256();
        let points = &table[i * N_ELEMENT_BITS_HASH..(i + 1) * N_ELEMENT_BITS_HASH];
        for (bit, point) in points.iter().enumerate() {
            if acc.x() == point.x() {
                return Err(CryptoError::InvalidPoint(
                    "pedersen accumulator collided with a constant point",
                ));
            }
            if value.bit(bit) {
                acc = acc.checked_add(point)?;
            }
        }
    }

    acc.x()
        .map(Felt::from_raw)
        .ok_or(CryptoError::InvalidPoint("pedersen accumulator reached infinity"))
}

/// Left fold of the two-to-one hash starting from zero:
/// `h = H(...H(H(0, e0), e1)..., en)`. An empty slice hashes as `[0]`.
pub fn hash_elements(elements: &[Felt]) -> Result<Felt> {
    if elements.is_empty() {
        return pedersen_hash(&[Felt::ZERO, Felt::ZERO]);
    }
    elements
        .iter()
        .try_fold(Felt::ZERO, |acc, e| pedersen_hash(&[acc, *e]))
}

/// [`hash_elements`] over the elements followed by their count.
pub fn compute_hash_on_elements(elements: &[Felt]) -> Result<Felt> {
    let mut with_len = Vec::with_capacity(elements.len() + 1);
    with_len.extend_from_slice(elements);
    with_len.push(Felt::from(elements.len() as u64));
    hash_elements(&with_len)
}
