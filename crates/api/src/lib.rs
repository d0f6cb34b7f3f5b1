// Path: crates/api/src/lib.rs

//! # Besu Operator API Crate Lints
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
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Besu Operator API
//!
//! The stable contract between the reconcilers and the orchestration
//! platform. Reconcilers are written against [`cluster::ClusterApi`]; the
//! production adapter lives in `besu-client` and an in-memory double lives in
//! `besu-test-utils`.

/// The `ClusterApi` trait and object helpers.
pub mod cluster;
/// Re-exports all core error types from the central `besu-types` crate.
pub mod error;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::cluster::{ClusterApi, ManagedObject, ObjectRef};
    pub use crate::error::{ApiError, ErrorCode};
}
