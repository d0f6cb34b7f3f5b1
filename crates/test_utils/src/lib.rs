// Path: crates/test_utils/src/lib.rs
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

//! # Besu Operator Test Utilities
//!
//! An in-memory cluster, a recording metrics sink, deterministic randomness,
//! and fixtures for exercising the reconcilers without an API server.

pub mod assertions;
pub mod cluster;
pub mod fixtures;
pub mod randomness;
pub mod sink;

pub use cluster::{InMemoryCluster, Verb};
pub use sink::RecordingSink;

#[doc(hidden)]
pub use kube as __kube;
