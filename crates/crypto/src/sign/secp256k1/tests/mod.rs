// Path: crates/crypto/src/sign/secp256k1/tests/mod.rs
use super::*;
use crate::address::format_address;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const TWO: &str = "0x0000000000000000000000000000000000000000000000000000000000000002";

#[test]
fn test_known_private_keys_derive_known_addresses() {
    let one = NodeKeyPair::from_private_hex(ONE).unwrap();
    assert_eq!(
        format_address(&one.address()),
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
    );
    assert!(one
        .enode_id()
        .starts_with("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"));

    let two = NodeKeyPair::from_private_hex(TWO).unwrap();
    assert_eq!(
        format_address(&two.address()),
        "0x2b5ad5c4795c026514f8317c7a215e218dccd6cf"
    );
}

#[test]
fn test_secret_field_encodings() {
    let pair = NodeKeyPair::from_private_hex(ONE).unwrap();
    assert_eq!(pair.private_key_hex().as_str(), ONE);
    assert_eq!(pair.enode_id().len(), 128);
    assert_eq!(pair.public_key_hex(), format!("0x{}", pair.enode_id()));
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let a = NodeKeyPair::generate_with(&mut StdRng::seed_from_u64(7));
    let b = NodeKeyPair::generate_with(&mut StdRng::seed_from_u64(7));
    let c = NodeKeyPair::generate_with(&mut StdRng::seed_from_u64(8));
    assert_eq!(a.public_key_bytes(), b.public_key_bytes());
    assert_ne!(a.public_key_bytes(), c.public_key_bytes());
    validate_point(a.public_key_bytes()).unwrap();
}

#[test]
fn test_supplied_pair_must_match() {
    let one = NodeKeyPair::from_private_hex(ONE).unwrap();
    let ok = NodeKeyPair::from_supplied(&one.public_key_hex(), ONE).unwrap();
    assert_eq!(ok.address(), one.address());

    let err = NodeKeyPair::from_supplied(&one.public_key_hex(), TWO).unwrap_err();
    assert!(matches!(err, CryptoError::KeyMismatch { .. }));
}

#[test]
fn test_off_curve_public_key_is_rejected() {
    let bogus = format!("0x{}", "11".repeat(64));
    let err = NodeKeyPair::from_supplied(&bogus, ONE).unwrap_err();
    assert!(matches!(err, CryptoError::InvalidPublicKey(_)));
}

#[test]
fn test_invalid_private_keys_are_rejected() {
    assert!(matches!(
        NodeKeyPair::from_private_hex("abcd"),
        Err(CryptoError::InvalidLength { expected: 32, got: 2 })
    ));
    let zero = "00".repeat(32);
    assert!(matches!(
        NodeKeyPair::from_private_hex(&zero),
        Err(CryptoError::InvalidPrivateKey(_))
    ));
}

#[test]
fn test_debug_output_omits_private_key() {
    let pair = NodeKeyPair::from_private_hex(ONE).unwrap();
    let shown = format!("{pair:?}");
    assert!(!shown.contains(ONE));
}
