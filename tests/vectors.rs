#![cfg(feature = "serde")]

use std::sync::Arc;

use alloy_primitives::U256;
use rstest::rstest;
use serde::Deserialize;
use stark_curve::rfc6979::generate_k;
use stark_curve::typed_data::DOMAIN_TYPE;
use stark_curve::{
    compute_hash_on_elements, pedersen_hash, private_to_public, sign, verify, Felt, TypedData,
    TypedDataDocument,
};

#[derive(Deserialize)]
struct Rfc6979Vector {
    msg_hash: String,
    priv_key: String,
    seed: String,
    k: String,
}

fn be_hex(s: &str) -> U256 {
    U256::from_str_radix(s, 16).unwrap()
}

fn felt(s: &str) -> Felt {
    Felt::from_u256(be_hex(s)).unwrap()
}

#[rstest]
#[case::padded("tests/data/rfc6979_padded.json")]
#[case::not_padded("tests/data/rfc6979_not_padded.json")]
fn rfc6979_nonces_match_reference(#[case] path: &str) {
    let data = std::fs::read_to_string(path).unwrap();
    let vectors: Vec<Rfc6979Vector> = serde_json::from_str(&data).unwrap();
    assert!(!vectors.is_empty());

    for v in &vectors {
        let k = generate_k(&felt(&v.msg_hash), &felt(&v.priv_key), be_hex(&v.seed)).unwrap();
        assert_eq!(k, be_hex(&v.k), "nonce mismatch for message {}", v.msg_hash);
    }
}

#[test_log::test]
fn typed_data_document_from_fixture() {
    let data = std::fs::read_to_string("tests/data/mail_typed_data.json").unwrap();
    let doc = TypedDataDocument::from_json(&data).unwrap();
    let (typed_data, message) = doc.into_parts().unwrap();

    // the fixture spells the domain type with a lowercase n
    assert_eq!(
        typed_data.encode_type(DOMAIN_TYPE).unwrap(),
        "StarkNetDomain(name:felt,version:felt,chainId:felt)"
    );

    let account: Felt = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826".parse().unwrap();
    assert_eq!(
        typed_data.message_hash(&account, &message).unwrap().to_hex(),
        "0x6fcff244f63e38b9d88b9e3378d44757710d1b244282b435cb472053c8d78d0"
    );
}

#[test_log::test]
fn sign_then_verify_across_keys_and_seeds() {
    let keys = [
        "0x1",
        "0x1e0",
        "0x3c1e9550e66958296d11b60f8e8e7a7ad990d07fa65d5f7652c4a6c87d4e3cc",
    ];
    let hashes = [
        "0x2",
        "0x397e76d1667c4454bfb83514e120583af836f8e32a516765497823eabe16a3f",
    ];

    for key in keys {
        let key: Felt = key.parse().unwrap();
        let public = private_to_public(&key).unwrap();
        for hash in hashes {
            let hash: Felt = hash.parse().unwrap();
            for seed in [0u64, 1, 42] {
                let signature = sign(&key, &hash, &Felt::from(seed)).unwrap();
                assert!(
                    verify(&public, &hash, &signature).unwrap(),
                    "signature by {key} over {hash} with seed {seed} did not verify"
                );
            }
        }
    }
}

#[test_log::test]
fn message_hash_signs_like_any_other_hash() {
    let data = std::fs::read_to_string("tests/data/mail_typed_data.json").unwrap();
    let (typed_data, message) = TypedDataDocument::from_json(&data).unwrap().into_parts().unwrap();

    let key = Felt::from(0x1e0u64);
    let account = private_to_public(&key).unwrap().x().unwrap();
    let account = Felt::from_u256(account).unwrap();
    let hash = typed_data.message_hash(&account, &message).unwrap();

    let signature = sign(&key, &hash, &Felt::ZERO).unwrap();
    assert!(verify(&private_to_public(&key).unwrap(), &hash, &signature).unwrap());
}

#[test_log::test]
fn hashes_are_shared_across_threads() {
    let expected = pedersen_hash(&[Felt::from(0x12773u64), Felt::from(0x872362u64)]).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                pedersen_hash(&[Felt::from(0x12773u64), Felt::from(0x872362u64)]).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }

    let chained = compute_hash_on_elements(&[expected, expected]).unwrap();
    assert_ne!(chained, expected);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn typed_data_is_send_and_sync() {
    assert_send_sync::<TypedData>();
    assert_send_sync::<TypedDataDocument>();
}

#[test_log::test]
fn typed_data_is_shared_across_threads() {
    let data = std::fs::read_to_string("tests/data/mail_typed_data.json").unwrap();
    let (typed_data, message) = TypedDataDocument::from_json(&data).unwrap().into_parts().unwrap();
    let account: Felt = "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826".parse().unwrap();

    let expected_type_hash = typed_data.type_hash("Mail").unwrap();
    let expected_message_hash = typed_data.message_hash(&account, &message).unwrap();

    let typed_data = Arc::new(typed_data);
    let message = Arc::new(message);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let typed_data = Arc::clone(&typed_data);
            let message = Arc::clone(&message);
            std::thread::spawn(move || {
                (
                    typed_data.type_hash("Mail").unwrap(),
                    typed_data.message_hash(&account, &message).unwrap(),
                )
            })
        })
        .collect();
    for handle in handles {
        let (type_hash, message_hash) = handle.join().unwrap();
        assert_eq!(type_hash, expected_type_hash);
        assert_eq!(message_hash, expected_message_hash);
    }
}
