// Path: crates/consensus/src/lib.rs
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
//! Genesis and IBFT2 consensus encoding for a Besu network.
//!
//! Everything in this crate is a pure function of its inputs. Two builds from
//! the same parameters and the same ordered validator list produce identical
//! bytes, which is what keeps independently started nodes on the same genesis
//! hash.

pub mod genesis;
pub mod ibft2;

pub use genesis::{ChainParams, Genesis, GenesisBuilder, GenesisDocument};
pub use ibft2::encode_extra_data;
