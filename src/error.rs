//! Error taxonomy
//!
//! Every fallible operation in the crate returns [`CryptoError`]. None of these
//! are ever collapsed into a zero or default value: a wrong hash that looks
//! plausible is worse than an error.
//!
//! A signature that simply does not match is *not* an error; `verify` reports
//! that as `Ok(false)`.

use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A field element, scalar or signature component outside its valid domain.
    #[error("{what} out of range: {value:#x}")]
    OutOfRange { what: &'static str, value: U256 },

    /// Inverse of a value that shares a factor with the modulus.
    #[error("{value:#x} is not invertible modulo {modulus:#x}")]
    NotInvertible { value: U256, modulus: U256 },

    /// A point operation produced (or was given) a point it cannot work with.
    #[error("invalid curve point: {0}")]
    InvalidPoint(&'static str),

    /// The typed-data type graph references an undefined type, contains a
    /// cycle, or a value does not match its declared field type.
    #[error("type resolution failed: {0}")]
    TypeResolution(String),

    /// No candidate nonce produced a valid signature within the retry budget.
    #[error("no valid signature nonce found after {attempts} attempts")]
    SignatureDerivationExhausted { attempts: usize },

    /// Malformed text: a field element, or a typed-data JSON document.
    #[error("invalid encoding of {input:?}: {reason}")]
    InvalidEncoding { input: String, reason: String },
}

impl CryptoError {
    pub(crate) fn out_of_range(what: &'static str, value: U256) -> Self {
        CryptoError::OutOfRange { what, value }
    }

    pub(crate) fn type_resolution(msg: impl Into<String>) -> Self {
        CryptoError::TypeResolution(msg.into())
    }

    pub(crate) fn encoding(input: &str, reason: impl ToString) -> Self {
        CryptoError::InvalidEncoding {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = CryptoError> = std::result::Result<T, E>;
