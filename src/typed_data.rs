//! Typed Data Hashing
//!
//! Off-chain structured messages are hashed against a schema of named types.
//! Each type's canonical encoding `Name(field:type,...)` is followed by the
//! encodings of every composite type it references, depth-first in
//! first-reference order. A type hash is the `starknet_keccak` of that string;
//! a struct hash folds the type hash and the encoded field values through
//! [`compute_hash_on_elements`].
//!
//! Encodings and type hashes are computed once in [`TypedData::new`], which
//! also rejects undeclared types, cycles and malformed domains. The instance is
//! immutable afterwards.

use std::collections::BTreeMap;

use crate::error::{CryptoError, Result};
use crate::felt::Felt;
use crate::pedersen::compute_hash_on_elements;
use crate::selector::starknet_keccak;

#[cfg(feature = "serde")]
pub mod json;

/// Single field element.
pub const FELT_TYPE: &str = "felt";
/// Array of field elements, hashed with `compute_hash_on_elements`.
pub const FELT_ARRAY_TYPE: &str = "felt*";

/// Name of the domain separator type as it enters the encoding.
pub const DOMAIN_TYPE: &str = "StarkNetDomain";
/// Accepted spelling of [`DOMAIN_TYPE`], normalized on construction.
pub const DOMAIN_TYPE_ALIAS: &str = "StarknetDomain";

/// Short-string prefix of every message hash.
pub const MESSAGE_PREFIX: &str = "StarkNet Message";

fn is_primitive(type_name: &str) -> bool {
    type_name == FELT_TYPE || type_name == FELT_ARRAY_TYPE
}

fn canonical_type_name(name: &str) -> &str {
    if name == DOMAIN_TYPE_ALIAS {
        DOMAIN_TYPE
    } else {
        name
    }
}

/// One `name:type` entry of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Definition {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
}

impl Definition {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Definition {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Ordered field list of a composite type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TypeDef {
    pub definitions: Vec<Definition>,
}

impl TypeDef {
    /// `TypeDef::new([("name", "felt"), ("wallet", "felt")])`
    pub fn new<N, T>(fields: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        TypeDef {
            definitions: fields
                .into_iter()
                .map(|(name, type_name)| Definition::new(name, type_name))
                .collect(),
        }
    }
}

/// Domain separator values. Each is interpreted with [`TypedValue::inferred`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "json::string_or_number"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "json::string_or_number"))]
    pub version: String,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "chainId", deserialize_with = "json::string_or_number")
    )]
    pub chain_id: String,
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: impl Into<String>,
    ) -> Self {
        Domain {
            name: name.into(),
            version: version.into(),
            chain_id: chain_id.into(),
        }
    }

    pub fn to_value(&self) -> TypedValue {
        TypedValue::structure([
            ("name", TypedValue::inferred(&self.name)),
            ("version", TypedValue::inferred(&self.version)),
            ("chainId", TypedValue::inferred(&self.chain_id)),
        ])
    }
}

/// A message value. Each variant fixes how a scalar becomes a field element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedValue {
    /// Used as-is.
    Felt(Felt),
    /// UTF-8 bytes read as a big-endian integer, at most 31 bytes.
    ShortString(String),
    /// Hex digits with optional `0x`, e.g. an account address.
    Hex(String),
    /// Value of a `felt*` field.
    Array(Vec<TypedValue>),
    /// Value of a composite type, keyed by field name.
    Struct(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    /// `0x...` is hex, all-decimal is a number, anything else a short string.
    pub fn inferred(s: &str) -> Self {
        if s.starts_with("0x") || s.starts_with("0X") {
            TypedValue::Hex(s.to_string())
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            match Felt::from_dec_str(s) {
                Ok(felt) => TypedValue::Felt(felt),
                Err(_) => TypedValue::ShortString(s.to_string()),
            }
        } else {
            TypedValue::ShortString(s.to_string())
        }
    }

    pub fn short_string(s: impl Into<String>) -> Self {
        TypedValue::ShortString(s.into())
    }

    pub fn hex(s: impl Into<String>) -> Self {
        TypedValue::Hex(s.into())
    }

    pub fn structure<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        TypedValue::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            TypedValue::Felt(_) => "felt",
            TypedValue::ShortString(_) => "short string",
            TypedValue::Hex(_) => "hex",
            TypedValue::Array(_) => "array",
            TypedValue::Struct(_) => "struct",
        }
    }

    /// Encoding of a scalar value; arrays and structs are rejected.
    pub fn to_felt(&self) -> Result<Felt> {
        match self {
            TypedValue::Felt(felt) => Ok(*felt),
            TypedValue::ShortString(s) => Felt::from_short_string(s),
            TypedValue::Hex(s) => Felt::from_hex(s),
            other => Err(CryptoError::type_resolution(format!(
                "{} value has no single field element encoding",
                other.kind()
            ))),
        }
    }
}

impl From<Felt> for TypedValue {
    fn from(value: Felt) -> Self {
        TypedValue::Felt(value)
    }
}

impl From<u64> for TypedValue {
    fn from(value: u64) -> Self {
        TypedValue::Felt(Felt::from(value))
    }
}

#[derive(Clone, Debug)]
struct ResolvedType {
    def: TypeDef,
    encoding: String,
    hash: Felt,
}

/// A validated schema with its domain.
#[derive(Clone, Debug)]
pub struct TypedData {
    types: BTreeMap<String, ResolvedType>,
    primary_type: String,
    domain: Domain,
}

impl TypedData {
    /// Validate the schema and precompute every type's encoding and hash.
    pub fn new<K: Into<String>>(
        types: impl IntoIterator<Item = (K, TypeDef)>,
        primary_type: &str,
        domain: Domain,
    ) -> Result<Self> {
        let defs = normalize_types(types)?;

        let primary_type = canonical_type_name(primary_type).to_string();
        if !defs.contains_key(&primary_type) {
            return Err(CryptoError::type_resolution(format!(
                "primary type `{primary_type}` is not declared"
            )));
        }
        validate_domain(&defs, &domain)?;

        let mut types = BTreeMap::new();
        for (name, def) in &defs {
            let encoding = encode_type_in(&defs, name)?;
            let hash = starknet_keccak(encoding.as_bytes());
            types.insert(
                name.clone(),
                ResolvedType {
                    def: def.clone(),
                    encoding,
                    hash,
                },
            );
        }

        tracing::debug!(
            primary_type = %primary_type,
            types = types.len(),
            "typed data schema resolved"
        );
        Ok(TypedData {
            types,
            primary_type,
            domain,
        })
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(canonical_type_name(name)).map(|t| &t.def)
    }

    fn resolved(&self, name: &str) -> Result<&ResolvedType> {
        self.types
            .get(canonical_type_name(name))
            .ok_or_else(|| CryptoError::type_resolution(format!("type `{name}` is not declared")))
    }

    /// Canonical encoding of `name` and its dependencies.
    pub fn encode_type(&self, name: &str) -> Result<&str> {
        Ok(&self.resolved(name)?.encoding)
    }

    /// `starknet_keccak(encode_type(name))`
    pub fn type_hash(&self, name: &str) -> Result<Felt> {
        Ok(self.resolved(name)?.hash)
    }

    /// Hash of `value` under the composite type `name`.
    pub fn struct_hash(&self, name: &str, value: &TypedValue) -> Result<Felt> {
        let resolved = self.resolved(name)?;
        let TypedValue::Struct(fields) = value else {
            return Err(CryptoError::type_resolution(format!(
                "type `{name}` expects a struct value, got {}",
                value.kind()
            )));
        };

        let mut elements = Vec::with_capacity(resolved.def.definitions.len() + 1);
        elements.push(resolved.hash);
        for def in &resolved.def.definitions {
            let field_value = fields.get(&def.name).ok_or_else(|| {
                CryptoError::type_resolution(format!("`{name}` value is missing field `{}`", def.name))
            })?;
            let encoded = self
                .encode_value(&def.type_name, field_value)
                .map_err(|err| match err {
                    CryptoError::TypeResolution(msg) => CryptoError::type_resolution(format!(
                        "field `{name}.{}`: {msg}",
                        def.name
                    )),
                    other => other,
                })?;
            elements.push(encoded);
        }
        compute_hash_on_elements(&elements)
    }

    fn encode_value(&self, type_name: &str, value: &TypedValue) -> Result<Felt> {
        match type_name {
            FELT_TYPE => value.to_felt(),
            FELT_ARRAY_TYPE => match value {
                TypedValue::Array(items) => {
                    let felts = items.iter().map(TypedValue::to_felt).collect::<Result<Vec<_>>>()?;
                    compute_hash_on_elements(&felts)
                }
                other => Err(CryptoError::type_resolution(format!(
                    "`felt*` expects an array, got {}",
                    other.kind()
                ))),
            },
            composite => self.struct_hash(composite, value),
        }
    }

    /// Struct hash of the domain separator.
    pub fn domain_hash(&self) -> Result<Felt> {
        self.struct_hash(DOMAIN_TYPE, &self.domain.to_value())
    }

    /// Final signable hash of `value` (of the primary type) for `account`.
    pub fn message_hash(&self, account: &Felt, value: &TypedValue) -> Result<Felt> {
        let elements = [
            Felt::from_short_string(MESSAGE_PREFIX)?,
            self.domain_hash()?,
            *account,
            self.struct_hash(&self.primary_type, value)?,
        ];
        compute_hash_on_elements(&elements)
    }
}

fn normalize_types<K: Into<String>>(
    types: impl IntoIterator<Item = (K, TypeDef)>,
) -> Result<BTreeMap<String, TypeDef>> {
    let mut defs = BTreeMap::new();
    for (name, mut def) in types {
        let name: String = name.into();
        let name = canonical_type_name(&name).to_string();
        if is_primitive(&name) {
            return Err(CryptoError::type_resolution(format!(
                "`{name}` is a primitive type and cannot be redeclared"
            )));
        }
        for field in &mut def.definitions {
            if field.type_name == DOMAIN_TYPE_ALIAS {
                field.type_name = DOMAIN_TYPE.to_string();
            }
        }
        if defs.insert(name.clone(), def).is_some() {
            return Err(CryptoError::type_resolution(format!("type `{name}` is declared twice")));
        }
    }
    Ok(defs)
}

fn validate_domain(defs: &BTreeMap<String, TypeDef>, values: &Domain) -> Result<()> {
    let domain = defs.get(DOMAIN_TYPE).ok_or_else(|| {
        CryptoError::type_resolution(format!("domain type `{DOMAIN_TYPE}` is not declared"))
    })?;
    for field in &domain.definitions {
        let value = match field.name.as_str() {
            "name" => &values.name,
            "version" => &values.version,
            "chainId" => &values.chain_id,
            other => {
                return Err(CryptoError::type_resolution(format!(
                    "malformed domain: unknown field `{other}`"
                )))
            }
        };
        if field.type_name != FELT_TYPE {
            return Err(CryptoError::type_resolution(format!(
                "malformed domain: field `{}` must be `felt`, found `{}`",
                field.name, field.type_name
            )));
        }
        TypedValue::inferred(value).to_felt().map_err(|err| {
            CryptoError::type_resolution(format!("malformed domain: `{}`: {err}", field.name))
        })?;
    }
    Ok(())
}

fn encode_type_in(defs: &BTreeMap<String, TypeDef>, name: &str) -> Result<String> {
    let mut deps = Vec::new();
    collect_dependencies(defs, name, &mut Vec::new(), &mut deps)?;

    let mut out = String::new();
    for type_name in std::iter::once(name).chain(deps.iter().map(String::as_str)) {
        let Some(def) = defs.get(type_name) else {
            continue;
        };
        out.push_str(type_name);
        out.push('(');
        for (i, field) in def.definitions.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.name);
            out.push(':');
            out.push_str(&field.type_name);
        }
        out.push(')');
    }
    Ok(out)
}

/// Depth-first walk recording composite types in first-reference order.
/// `path` holds the types currently being expanded; meeting one again is a cycle.
fn collect_dependencies(
    defs: &BTreeMap<String, TypeDef>,
    name: &str,
    path: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    let def = defs
        .get(name)
        .ok_or_else(|| CryptoError::type_resolution(format!("type `{name}` is not declared")))?;

    path.push(name.to_string());
    for field in &def.definitions {
        let ty = field.type_name.as_str();
        if is_primitive(ty) {
            continue;
        }
        if path.iter().any(|p| p == ty) {
            return Err(CryptoError::type_resolution(format!(
                "cyclic type reference {} -> {ty}",
                path.join(" -> ")
            )));
        }
        if order.iter().any(|o| o == ty) {
            continue;
        }
        order.push(ty.to_string());
        collect_dependencies(defs, ty, path, order)?;
    }
    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826";

    fn mail_types(domain_name: &str) -> Vec<(String, TypeDef)> {
        vec![
            (
                domain_name.to_string(),
                TypeDef::new([("name", "felt"), ("version", "felt"), ("chainId", "felt")]),
            ),
            (
                "Mail".to_string(),
                TypeDef::new([("from", "Person"), ("to", "Person"), ("contents", "felt")]),
            ),
            (
                "Person".to_string(),
                TypeDef::new([("name", "felt"), ("wallet", "felt")]),
            ),
        ]
    }

    fn mail_typed_data() -> TypedData {
        TypedData::new(
            mail_types(DOMAIN_TYPE_ALIAS),
            "Mail",
            Domain::new("StarkNet Mail", "1", "1"),
        )
        .unwrap()
    }

    fn person(name: &str, wallet: &str) -> TypedValue {
        TypedValue::structure([
            ("name", TypedValue::inferred(name)),
            ("wallet", TypedValue::inferred(wallet)),
        ])
    }

    fn mail() -> TypedValue {
        TypedValue::structure([
            ("from", person("Cow", ACCOUNT)),
            ("to", person("Bob", "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB")),
            ("contents", TypedValue::inferred("Hello, Bob!")),
        ])
    }

    fn felt(s: &str) -> Felt {
        s.parse().unwrap()
    }

    #[test]
    fn test_encode_type_mail() {
        let td = mail_typed_data();
        assert_eq!(
            td.encode_type("Mail").unwrap(),
            "Mail(from:Person,to:Person,contents:felt)Person(name:felt,wallet:felt)"
        );
        assert_eq!(td.encode_type("Person").unwrap(), "Person(name:felt,wallet:felt)");
    }

    #[test]
    fn test_type_hashes() {
        let td = mail_typed_data();
        let domain_hash = felt("0x1bfc207425a47a5dfa1a50a4f5241203f50624ca5fdf5e18755765416b8e288");
        assert_eq!(td.type_hash("StarknetDomain").unwrap(), domain_hash);
        assert_eq!(td.type_hash("StarkNetDomain").unwrap(), domain_hash);
        assert_eq!(
            td.type_hash("Person").unwrap(),
            felt("0x2896dbe4b96a67110f454c01e5336edc5bbc3635537efd690f122f4809cc855")
        );
        // repeated lookups are stable
        assert_eq!(td.type_hash("Person").unwrap(), td.type_hash("Person").unwrap());
        assert_eq!(
            td.encode_type("StarknetDomain").unwrap(),
            "StarkNetDomain(name:felt,version:felt,chainId:felt)"
        );
    }

    #[test]
    fn test_domain_and_struct_hashes() {
        let td = mail_typed_data();
        assert_eq!(
            td.domain_hash().unwrap(),
            felt("0x54833b121883a3e3aebff48ec08a962f5742e5f7b973469c1f8f4f55d470b07")
        );
        assert_eq!(
            td.struct_hash("Mail", &mail()).unwrap(),
            felt("0x4758f1ed5e7503120c228cbcaba626f61514559e9ef5ed653b0b885e0f38aec")
        );
    }

    #[test]
    fn test_message_hash() {
        let td = mail_typed_data();
        let hash = td.message_hash(&felt(ACCOUNT), &mail()).unwrap();
        assert_eq!(
            hash,
            felt("0x6fcff244f63e38b9d88b9e3378d44757710d1b244282b435cb472053c8d78d0")
        );
    }

    #[test]
    fn test_canonical_domain_name_gives_same_hashes() {
        let td = TypedData::new(
            mail_types(DOMAIN_TYPE),
            "Mail",
            Domain::new("StarkNet Mail", "1", "1"),
        )
        .unwrap();
        assert_eq!(
            td.message_hash(&felt(ACCOUNT), &mail()).unwrap(),
            mail_typed_data().message_hash(&felt(ACCOUNT), &mail()).unwrap()
        );
    }

    #[test]
    fn test_both_domain_spellings_rejected() {
        let mut types = mail_types(DOMAIN_TYPE);
        types.push((
            DOMAIN_TYPE_ALIAS.to_string(),
            TypeDef::new([("name", "felt")]),
        ));
        let err = TypedData::new(types, "Mail", Domain::new("a", "1", "1")).unwrap_err();
        assert!(matches!(err, CryptoError::TypeResolution(_)));
    }

    #[test]
    fn test_dependency_order_is_first_reference() {
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("A", TypeDef::new([("c", "C"), ("b", "B")])),
            ("B", TypeDef::new([("c", "C"), ("d", "D")])),
            ("C", TypeDef::new([("x", "felt")])),
            ("D", TypeDef::new([("xs", "felt*")])),
        ];
        let td = TypedData::new(types, "A", Domain::new("n", "1", "1")).unwrap();
        assert_eq!(
            td.encode_type("A").unwrap(),
            "A(c:C,b:B)C(x:felt)B(c:C,d:D)D(xs:felt*)"
        );
    }

    #[test]
    fn test_construction_errors() {
        let domain = || Domain::new("n", "1", "1");

        // undeclared field type
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("A", TypeDef::new([("b", "Missing")])),
        ];
        assert!(matches!(
            TypedData::new(types, "A", domain()),
            Err(CryptoError::TypeResolution(_))
        ));

        // missing primary type
        let types = vec![("StarkNetDomain", TypeDef::new([("name", "felt")]))];
        assert!(TypedData::new(types, "Mail", domain()).is_err());

        // missing domain type
        let types = vec![("A", TypeDef::new([("x", "felt")]))];
        assert!(TypedData::new(types, "A", domain()).is_err());

        // malformed domain
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("salt", "felt")])),
            ("A", TypeDef::new([("x", "felt")])),
        ];
        assert!(TypedData::new(types, "A", domain()).is_err());
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt*")])),
            ("A", TypeDef::new([("x", "felt")])),
        ];
        assert!(TypedData::new(types, "A", domain()).is_err());

        // domain name longer than a short string
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("A", TypeDef::new([("x", "felt")])),
        ];
        let long = Domain::new("x".repeat(40), "1", "1");
        assert!(TypedData::new(types, "A", long).is_err());
    }

    #[test]
    fn test_cycles_rejected() {
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("A", TypeDef::new([("b", "B")])),
            ("B", TypeDef::new([("a", "A")])),
        ];
        let err = TypedData::new(types, "A", Domain::new("n", "1", "1")).unwrap_err();
        let CryptoError::TypeResolution(msg) = err else {
            panic!("expected a type resolution error");
        };
        assert!(msg.contains("cyclic"), "{msg}");

        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("Node", TypeDef::new([("next", "Node")])),
        ];
        assert!(TypedData::new(types, "Node", Domain::new("n", "1", "1")).is_err());
    }

    #[test]
    fn test_value_mismatches() {
        let td = mail_typed_data();

        let missing = TypedValue::structure([("from", person("Cow", ACCOUNT))]);
        assert!(matches!(
            td.struct_hash("Mail", &missing),
            Err(CryptoError::TypeResolution(_))
        ));

        let scalar_for_struct = TypedValue::structure([
            ("from", TypedValue::from(1u64)),
            ("to", person("Bob", ACCOUNT)),
            ("contents", TypedValue::from(2u64)),
        ]);
        assert!(td.struct_hash("Mail", &scalar_for_struct).is_err());

        let struct_for_felt = TypedValue::structure([
            ("from", person("Cow", ACCOUNT)),
            ("to", person("Bob", ACCOUNT)),
            ("contents", person("x", "0x1")),
        ]);
        assert!(td.struct_hash("Mail", &struct_for_felt).is_err());

        assert!(td.struct_hash("Nope", &mail()).is_err());
        assert!(td.type_hash("Nope").is_err());
    }

    #[test]
    fn test_felt_array_field() {
        let types = vec![
            ("StarkNetDomain", TypeDef::new([("name", "felt")])),
            ("Batch", TypeDef::new([("ids", "felt*")])),
        ];
        let td = TypedData::new(types, "Batch", Domain::new("n", "1", "1")).unwrap();
        let ids = [Felt::from(1u64), Felt::from(2u64), Felt::from(3u64)];
        let value = TypedValue::structure([(
            "ids",
            TypedValue::Array(ids.iter().copied().map(TypedValue::from).collect()),
        )]);

        let expected = compute_hash_on_elements(&[
            td.type_hash("Batch").unwrap(),
            compute_hash_on_elements(&ids).unwrap(),
        ])
        .unwrap();
        assert_eq!(td.struct_hash("Batch", &value).unwrap(), expected);

        let not_array = TypedValue::structure([("ids", TypedValue::from(1u64))]);
        assert!(td.struct_hash("Batch", &not_array).is_err());
    }

    #[test]
    fn test_inferred_values() {
        assert_eq!(TypedValue::inferred("0xabc"), TypedValue::Hex("0xabc".to_string()));
        assert_eq!(TypedValue::inferred("42"), TypedValue::Felt(Felt::from(42u64)));
        assert_eq!(
            TypedValue::inferred("StarkNet Mail"),
            TypedValue::ShortString("StarkNet Mail".to_string())
        );
        assert_eq!(TypedValue::inferred(""), TypedValue::ShortString(String::new()));
        assert_eq!(TypedValue::inferred("1").to_felt().unwrap(), Felt::ONE);
        assert!(TypedValue::Array(vec![]).to_felt().is_err());
    }
}
