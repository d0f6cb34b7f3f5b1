// Path: crates/crypto/src/error.rs
//! Local error types for the `besu-crypto` crate.

// Re-export the canonical error type from the types crate.
pub use besu_types::error::CryptoError;
