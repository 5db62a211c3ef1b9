//! WASM bindings for STARK-curve hashing and signing.
//!
//! Field elements cross the boundary as hex strings (decimal is accepted on
//! input). Errors surface as JS exceptions carrying the error text.
//! Build with: `wasm-pack build --target web --features wasm`

use alloy_primitives::U256;
use wasm_bindgen::prelude::*;

use crate::curve::CurvePoint;
use crate::error::CryptoError;
use crate::felt::Felt;
use crate::signature::Signature;
use crate::typed_data::json::TypedDataDocument;

fn to_js(err: CryptoError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse(input: &str) -> Result<Felt, JsValue> {
    input.parse::<Felt>().map_err(to_js)
}

fn point_to_hex(point: &CurvePoint) -> Vec<String> {
    let coord = |c: Option<U256>| c.map(|v| format!("{v:#x}")).unwrap_or_default();
    vec![coord(point.x()), coord(point.y())]
}

/// WASM-accessible STARK-curve toolkit.
#[wasm_bindgen]
pub struct StarkCurveWasm;

#[wasm_bindgen]
impl StarkCurveWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> StarkCurveWasm {
        StarkCurveWasm
    }

    #[wasm_bindgen(js_name = "pedersenHash")]
    pub fn pedersen_hash(&self, a: &str, b: &str) -> Result<String, JsValue> {
        let hash = crate::pedersen::pedersen_hash(&[parse(a)?, parse(b)?]).map_err(to_js)?;
        Ok(hash.to_hex())
    }

    #[wasm_bindgen(js_name = "computeHashOnElements")]
    pub fn compute_hash_on_elements(&self, elements: Vec<String>) -> Result<String, JsValue> {
        let felts = elements
            .iter()
            .map(|e| parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        let hash = crate::pedersen::compute_hash_on_elements(&felts).map_err(to_js)?;
        Ok(hash.to_hex())
    }

    #[wasm_bindgen(js_name = "selectorFromName")]
    pub fn selector_from_name(&self, name: &str) -> String {
        crate::selector::selector_from_name(name).to_hex()
    }

    /// Returns `[x, y]` of the public key.
    #[wasm_bindgen(js_name = "privateToPublic")]
    pub fn private_to_public(&self, private_key: &str) -> Result<Vec<String>, JsValue> {
        let public = crate::signature::private_to_public(&parse(private_key)?).map_err(to_js)?;
        Ok(point_to_hex(&public))
    }

    /// Returns `[r, s]`.
    pub fn sign(&self, private_key: &str, message_hash: &str, seed: &str) -> Result<Vec<String>, JsValue> {
        let signature = crate::signature::sign(&parse(private_key)?, &parse(message_hash)?, &parse(seed)?)
            .map_err(to_js)?;
        Ok(vec![signature.r.to_hex(), signature.s.to_hex()])
    }

    pub fn verify(
        &self,
        public_x: &str,
        public_y: &str,
        message_hash: &str,
        r: &str,
        s: &str,
    ) -> Result<bool, JsValue> {
        let public = CurvePoint::new(parse(public_x)?.as_u256(), parse(public_y)?.as_u256()).map_err(to_js)?;
        let signature = Signature {
            r: parse(r)?,
            s: parse(s)?,
        };
        crate::signature::verify(&public, &parse(message_hash)?, &signature).map_err(to_js)
    }

    /// Message hash of a JSON typed-data document for `account`.
    #[wasm_bindgen(js_name = "typedDataMessageHash")]
    pub fn typed_data_message_hash(&self, document: &str, account: &str) -> Result<String, JsValue> {
        let account = parse(account)?;
        let hash = TypedDataDocument::from_json(document)
            .and_then(|doc| doc.message_hash(&account))
            .map_err(to_js)?;
        Ok(hash.to_hex())
    }
}
