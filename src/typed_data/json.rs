//! JSON typed-data documents
//!
//! Loads the wallet-facing layout:
//!
//! ```json
//! { "types": { "Mail": [{ "name": "from", "type": "Person" }, ...] },
//!   "primaryType": "Mail",
//!   "domain": { "name": "StarkNet Mail", "version": "1", "chainId": 1 },
//!   "message": { ... } }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;

use super::{Domain, TypeDef, TypedData, TypedValue};
use crate::error::{CryptoError, Result};
use crate::felt::Felt;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDocument {
    pub types: BTreeMap<String, TypeDef>,
    pub primary_type: String,
    pub domain: Domain,
    pub message: Value,
}

impl TypedDataDocument {
    /// A missing or malformed `domain` is a type resolution error; any other
    /// structural problem is an encoding error.
    pub fn from_json(input: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(input).map_err(|e| CryptoError::encoding("typed data document", e))?;
        let domain = raw
            .get("domain")
            .ok_or_else(|| CryptoError::type_resolution("typed data document has no domain"))?;
        Domain::deserialize(domain)
            .map_err(|e| CryptoError::type_resolution(format!("malformed domain: {e}")))?;
        serde_json::from_value(raw).map_err(|e| CryptoError::encoding("typed data document", e))
    }

    /// Validated schema plus the message as a [`TypedValue`].
    pub fn into_parts(self) -> Result<(TypedData, TypedValue)> {
        let message = value_from_json(&self.message)?;
        let typed_data = TypedData::new(self.types, &self.primary_type, self.domain)?;
        Ok((typed_data, message))
    }

    /// Message hash for `account` in one step.
    pub fn message_hash(self, account: &Felt) -> Result<Felt> {
        let (typed_data, message) = self.into_parts()?;
        typed_data.message_hash(account, &message)
    }
}

/// Strings are inferred, unsigned integers become felts, arrays and objects recurse.
pub fn value_from_json(value: &Value) -> Result<TypedValue> {
    match value {
        Value::String(s) => Ok(TypedValue::inferred(s)),
        Value::Number(n) => n.as_u64().map(TypedValue::from).ok_or_else(|| {
            CryptoError::type_resolution(format!("number {n} is not an unsigned 64-bit integer"))
        }),
        Value::Bool(b) => Ok(TypedValue::from(u64::from(*b))),
        Value::Array(items) => items
            .iter()
            .map(value_from_json)
            .collect::<Result<Vec<_>>>()
            .map(TypedValue::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| value_from_json(v).map(|v| (k.clone(), v)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(TypedValue::Struct),
        Value::Null => Err(CryptoError::type_resolution("null has no typed data encoding")),
    }
}

struct StringOrNumber;

impl Visitor<'_> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

/// Domain values appear both as `"1"` and as `1` in the wild.
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(StringOrNumber)
}
