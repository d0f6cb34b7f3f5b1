// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Besu Operator Types
//!
//! This crate is the foundational library for the Besu operator, containing the
//! custom resource definitions, error types, and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `besu-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This structure prevents
//! circular dependencies and provides a stable, canonical definition for shared
//! types like `BesuNetwork`, `BesuNode`, `KeyPair`, and the error enums.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::ReconcileError> = std::result::Result<T, E>;

/// Operator configuration loaded from `operator.toml`.
pub mod config;
/// The `hyperledger.org/v1alpha1` custom resources managed by the operator.
pub mod crd;
/// A unified set of all error types used across the workspace.
pub mod error;
/// Well-known object names, label keys and data keys.
pub mod keys;
