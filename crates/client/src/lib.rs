// Path: crates/client/src/lib.rs
//! # Besu Operator Client Crate Lints
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
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Besu Operator Client
//!
//! Implements the `ClusterApi` seam on top of a live Kubernetes API server.

pub mod cluster_client;

// Re-export for convenience
pub use cluster_client::KubeClusterApi;
