//! STARK Curve Geometry
//!
//! Short-Weierstrass curve y^2 = x^3 + alpha * x + beta over the STARK field,
//! in affine coordinates. The point at infinity is an explicit variant: adding a
//! point to its negation, or doubling a point with y = 0, yields
//! [`CurvePoint::Infinity`] instead of dividing by zero. Callers that need a
//! finite point turn `Infinity` into [`CryptoError::InvalidPoint`].

use std::ops::Neg;

use alloy_primitives::U256;

use crate::error::{CryptoError, Result};
use crate::field::{StarkField, STARK_PRIME};

/// alpha = 1
pub const ALPHA: U256 = U256::from_limbs([1, 0, 0, 0]);

/// beta = 0x6f21413efbe40de150e596d72f7a8c5609ad26c15c915c1f4cdfcb99cee9e89
pub const BETA: U256 = U256::from_limbs([
    0xf4cdfcb99cee9e89,
    0x609ad26c15c915c1,
    0x150e596d72f7a8c5,
    0x06f21413efbe40de,
]);

/// Number of points on the curve (prime).
/// 0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f
pub const EC_ORDER: U256 = U256::from_limbs([
    0x1e66a241adc64d2f,
    0xb781126dcae7b232,
    0xffffffffffffffff,
    0x0800000000000010,
]);

/// Generator used for key derivation and signing.
pub const GENERATOR: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0x3d723d8bc943cfca,
        0xdeacfd9b0d1819e0,
        0x7beced415a40f0c7,
        0x01ef15c18599971b,
    ]),
    U256::from_limbs([
        0x2873000c36e8dc1f,
        0xde53ecd11abe43a3,
        0xb7be4801df46ec62,
        0x005668060aa49730,
    ]),
);

/// Shift point: starting accumulator of the Pedersen hash and of the
/// circuit-mimicking multiplication.
pub const SHIFT_POINT: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0x551fde4050ca6804,
        0x716b0b1022947733,
        0x00ee1b87eb599f16,
        0x049ee3eba8c16007,
    ]),
    U256::from_limbs([
        0xd0405d266e10268a,
        0x4e621062c0e056c1,
        0xf346d49d06ea0ed3,
        0x03ca0cfe4b3bc6dd,
    ]),
);

/// -SHIFT_POINT, i.e. (S.x, P - S.y).
pub const MINUS_SHIFT_POINT: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0x551fde4050ca6804,
        0x716b0b1022947733,
        0x00ee1b87eb599f16,
        0x049ee3eba8c16007,
    ]),
    U256::from_limbs([
        0x2fbfa2d991efd977,
        0xb19def9d3f1fa93e,
        0x0cb92b62f915f12c,
        0x0435f301b4c43933,
    ]),
);

/// Pedersen base point for the low 248 bits of the first input.
pub const PEDERSEN_P0: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0x1080d17957ebe47b,
        0x8fa8120b6d56eb0c,
        0x969c748655fca9e5,
        0x0234287dcbaffe7f,
    ]),
    U256::from_limbs([
        0x6ed0268ee89e5615,
        0x940135dd7a6c94cc,
        0x1e889527d41f4e39,
        0x03b056f100f96fb2,
    ]),
);

/// Pedersen base point for the high 4 bits of the first input.
pub const PEDERSEN_P1: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0xb7a6932dba8aa378,
        0x99099ec1de5e3018,
        0x3f9dab2656558f33,
        0x04fa56f376c83db3,
    ]),
    U256::from_limbs([
        0x5168f4e80ff5b54d,
        0x562761f92a7a23b4,
        0x8113e0c0e47e4401,
        0x03fa0984c931c9e3,
    ]),
);

/// Pedersen base point for the low 248 bits of the second input.
pub const PEDERSEN_P2: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0x3aa372f0bd2d6997,
        0x40c690c74709e90f,
        0x764910f75b45f74b,
        0x04ba4cc166be8dec,
    ]),
    U256::from_limbs([
        0x48151f27b24b219c,
        0xcac5c59a5ce5ae7c,
        0x4b971e46c4ede85f,
        0x0040301cf5c1751f,
    ]),
);

/// Pedersen base point for the high 4 bits of the second input.
pub const PEDERSEN_P3: CurvePoint = CurvePoint::from_raw(
    U256::from_limbs([
        0xd36ff12c49a58202,
        0x2ca65048d53fb325,
        0x6e44cca8f61a63bb,
        0x054302dcb0e6cc1c,
    ]),
    U256::from_limbs([
        0x879dcc77e99c2426,
        0xce98ad783c25561a,
        0xb348046268d8ae25,
        0x01b77b3e37d13504,
    ]),
);

/// An affine curve point, or the point at infinity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurvePoint {
    Infinity,
    Affine { x: U256, y: U256 },
}

impl CurvePoint {
    /// Build a point from coordinates without checking the curve equation.
    pub const fn from_raw(x: U256, y: U256) -> Self {
        CurvePoint::Affine { x, y }
    }

    /// Build a point, requiring reduced coordinates that satisfy the curve equation.
    pub fn new(x: U256, y: U256) -> Result<Self> {
        if x >= STARK_PRIME {
            return Err(CryptoError::out_of_range("point x-coordinate", x));
        }
        if y >= STARK_PRIME {
            return Err(CryptoError::out_of_range("point y-coordinate", y));
        }
        let point = CurvePoint::Affine { x, y };
        if !point.is_on_curve() {
            return Err(CryptoError::InvalidPoint("coordinates do not satisfy the curve equation"));
        }
        Ok(point)
    }

    pub fn x(&self) -> Option<U256> {
        match self {
            CurvePoint::Affine { x, .. } => Some(*x),
            CurvePoint::Infinity => None,
        }
    }

    pub fn y(&self) -> Option<U256> {
        match self {
            CurvePoint::Affine { y, .. } => Some(*y),
            CurvePoint::Infinity => None,
        }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, CurvePoint::Infinity)
    }

    /// y^2 == x^3 + alpha * x + beta. Infinity counts as on the curve.
    pub fn is_on_curve(&self) -> bool {
        match *self {
            CurvePoint::Infinity => true,
            CurvePoint::Affine { x, y } => {
                let x3 = StarkField::mul(StarkField::square(x), x);
                let rhs = StarkField::add(StarkField::add(x3, StarkField::mul(ALPHA, x)), BETA);
                StarkField::square(y) == rhs
            }
        }
    }

    /// Point addition. Doubles when both operands are equal.
    pub fn checked_add(&self, other: &CurvePoint) -> Result<CurvePoint> {
        match (*self, *other) {
            (CurvePoint::Infinity, p) | (p, CurvePoint::Infinity) => Ok(p),
            (CurvePoint::Affine { x: x1, y: y1 }, CurvePoint::Affine { x: x2, y: y2 }) => {
                ec_add(x1, y1, x2, y2)
            }
        }
    }

    pub fn double(&self) -> Result<CurvePoint> {
        match *self {
            CurvePoint::Infinity => Ok(CurvePoint::Infinity),
            CurvePoint::Affine { x, y } => ec_double(x, y),
        }
    }
}

impl Neg for CurvePoint {
    type Output = CurvePoint;

    fn neg(self) -> CurvePoint {
        match self {
            CurvePoint::Infinity => CurvePoint::Infinity,
            CurvePoint::Affine { x, y } => CurvePoint::Affine {
                x,
                y: StarkField::neg(y),
            },
        }
    }
}

/// Add (x1, y1) and (x2, y2).
///
/// Equal inputs are doubled; inputs sharing an x-coordinate otherwise are
/// negations of each other and sum to infinity. The curve equation is not
/// checked, so any pair of coordinates is accepted.
pub fn ec_add(x1: U256, y1: U256, x2: U256, y2: U256) -> Result<CurvePoint> {
    let (x1, y1) = (x1.reduce_mod(STARK_PRIME), y1.reduce_mod(STARK_PRIME));
    let (x2, y2) = (x2.reduce_mod(STARK_PRIME), y2.reduce_mod(STARK_PRIME));

    if x1 == x2 {
        if y1 == y2 {
            return ec_double(x1, y1);
        }
        return Ok(CurvePoint::Infinity);
    }

    let slope = StarkField::div(StarkField::sub(y2, y1), StarkField::sub(x2, x1))?;
    Ok(from_slope(slope, x1, y1, x2))
}

/// Double (x, y) with slope (3x^2 + alpha) / 2y.
pub fn ec_double(x: U256, y: U256) -> Result<CurvePoint> {
    let (x, y) = (x.reduce_mod(STARK_PRIME), y.reduce_mod(STARK_PRIME));
    if y == U256::ZERO {
        return Ok(CurvePoint::Infinity);
    }

    let three_x2 = StarkField::mul(U256::from(3u64), StarkField::square(x));
    let numerator = StarkField::add(three_x2, ALPHA);
    let slope = StarkField::div(numerator, StarkField::add(y, y))?;
    Ok(from_slope(slope, x, y, x))
}

#[inline]
fn from_slope(slope: U256, x1: U256, y1: U256, x2: U256) -> CurvePoint {
    let x3 = StarkField::sub(StarkField::sub(StarkField::square(slope), x1), x2);
    let y3 = StarkField::sub(StarkField::mul(slope, StarkField::sub(x1, x3)), y1);
    CurvePoint::Affine { x: x3, y: y3 }
}
