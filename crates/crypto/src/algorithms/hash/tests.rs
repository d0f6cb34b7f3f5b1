//! Tests for the Keccak-256 wrapper

use super::keccak256;

#[test]
fn test_keccak256_known_vectors() {
    // Legacy Keccak, not NIST SHA3-256: the empty-input digest differs.
    assert_eq!(
        hex::encode(keccak256(b"")),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
    assert_eq!(
        hex::encode(keccak256(b"abc")),
        "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
    );
}

#[test]
fn test_keccak256_is_deterministic() {
    let message = b"test message";
    assert_eq!(keccak256(message), keccak256(message.to_vec()));
}
