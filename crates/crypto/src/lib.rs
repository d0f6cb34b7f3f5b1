// Path: crates/crypto/src/lib.rs
//! # Besu Operator Crypto Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # Besu Operator Cryptography
//!
//! secp256k1 node keys, Keccak-256 hashing, and Ethereum address derivation.

pub mod address;
pub mod algorithms;
pub mod error;
pub mod sign;

pub use address::{address_from_public_key, format_address, Address};
pub use algorithms::hash::keccak256;
pub use sign::secp256k1::NodeKeyPair;
