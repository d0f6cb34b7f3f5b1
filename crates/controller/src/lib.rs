// Path: crates/controller/src/lib.rs
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
#![warn(missing_docs)]

//! # Besu Operator Controller
//!
//! Two reconcilers converge the cluster towards the declared networks:
//!
//! - [`network::reconcile_network`] drives a `BesuNetwork` through teardown,
//!   key provisioning, genesis and node-group creation, and aggregates
//!   readiness into its status.
//! - [`node::reconcile_node`] expands each `BesuNode` into the workloads that
//!   run it.
//!
//! Both are written against [`besu_api::cluster::ClusterApi`] and hold no state
//! between passes; everything they know is read back from the cluster.
//! [`bootstrap`] holds the one-shot tasks the reconcilers schedule as Jobs.

pub mod bootstrap;
pub mod context;
pub mod ensure;
pub mod finalizer;
pub mod graph;
pub mod keys;
pub mod network;
pub mod node;
pub mod runtime;

pub use context::{Context, Outcome};
