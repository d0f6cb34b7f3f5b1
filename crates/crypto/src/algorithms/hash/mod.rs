// Path: crates/crypto/src/algorithms/hash/mod.rs
//! Keccak-256, the pre-standard SHA-3 variant used for Ethereum addresses.

use sha3::{Digest, Keccak256};

/// Digest size of [`keccak256`] in bytes.
pub const KECCAK256_LEN: usize = 32;

/// Create a Keccak-256 hash of any type that can be referenced as bytes
pub fn keccak256<T: AsRef<[u8]>>(data: T) -> [u8; KECCAK256_LEN] {
    Keccak256::digest(data.as_ref()).into()
}

#[cfg(test)]
mod tests;
