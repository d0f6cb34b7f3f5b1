// Path: crates/api/src/error/mod.rs
// Re-export all core error types from the central types crate.
pub use besu_types::error::{
    ApiError, ConfigError, CryptoError, ErrorCode, GenesisError, ReconcileError,
};
pub use besu_types::Result;
