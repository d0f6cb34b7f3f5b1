//! Fixtures for reproducible reconcile scenarios.

use besu_crypto::NodeKeyPair;
use besu_types::crd::{BesuNetwork, BesuNetworkSpec, KeyPair};
use besu_types::error::CryptoError;
use kube::api::ObjectMeta;

/// Namespace every fixture object lives in.
pub const NAMESPACE: &str = "besu";

/// Address of the key whose private scalar is `1`.
pub const ADDRESS_OF_KEY_ONE: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";
/// Address of the key whose private scalar is `2`.
pub const ADDRESS_OF_KEY_TWO: &str = "0x2b5ad5c4795c026514f8317c7a215e218dccd6cf";

/// The key pair whose private scalar is `n`. `n` must be non-zero.
pub fn key_pair(n: u64) -> Result<NodeKeyPair, CryptoError> {
    NodeKeyPair::from_private_hex(&format!("{n:064x}"))
}

/// The supplied-key form of [`key_pair`].
pub fn supplied_key(n: u64) -> Result<KeyPair, CryptoError> {
    let pair = key_pair(n)?;
    Ok(KeyPair {
        public_key: pair.public_key_hex(),
        private_key: pair.private_key_hex().to_string(),
    })
}

/// A network named `name` in [`NAMESPACE`] with default templates.
pub fn network(name: &str, bootnodes: u32, validators: u32, members: u32) -> BesuNetwork {
    BesuNetwork {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: BesuNetworkSpec {
            bootnodes_count: bootnodes,
            validators_count: validators,
            members,
            ..Default::default()
        },
        status: None,
    }
}
