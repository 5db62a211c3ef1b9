//! STARK Curve Library
//!
//! Field arithmetic, curve operations, Pedersen hashing, ECDSA and typed-data
//! hashing over the STARK curve, bit-compatible with the on-chain verifier.
//! Can be used natively or compiled to WASM (feature `wasm`).

pub mod curve;
pub mod ec_mult;
pub mod error;
pub mod felt;
pub mod field;
pub mod pedersen;
pub mod rfc6979;
pub mod selector;
pub mod signature;
pub mod typed_data;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use curve::CurvePoint;
pub use error::{CryptoError, Result};
pub use felt::Felt;
pub use pedersen::{compute_hash_on_elements, hash_elements, pedersen_hash};
pub use selector::{selector_from_name, starknet_keccak};
pub use signature::{private_to_public, sign, verify, Signature};
pub use typed_data::{Definition, Domain, TypeDef, TypedData, TypedValue};

#[cfg(feature = "serde")]
pub use typed_data::json::TypedDataDocument;
