// Path: crates/types/src/crd/template.rs
//! Shared sub-structures of the `BesuNetwork` and `BesuNode` specs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A secp256k1 key pair supplied by the user or generated during bootstrap.
///
/// Both halves are hex strings; an optional `0x` prefix is accepted.
#[derive(Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// Uncompressed public key, 64 bytes (or 65 with the `04` prefix).
    #[serde(alias = "pubkey")]
    pub public_key: String,
    /// 32-byte private scalar.
    #[serde(alias = "privkey")]
    pub private_key: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Container image reference.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image repository.
    pub repository: String,
    /// Image tag.
    pub tag: String,
    /// Kubernetes image pull policy.
    #[serde(default = "default_pull_policy")]
    pub pull_policy: String,
}

impl ImageSpec {
    /// The `repository:tag` reference used in pod specs.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

fn default_pull_policy() -> String {
    "IfNotPresent".to_string()
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            repository: "hyperledger/besu".to_string(),
            tag: "1.4.6".to_string(),
            pull_policy: default_pull_policy(),
        }
    }
}

/// CPU and memory requests and limits, in Kubernetes quantity syntax.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Memory request.
    pub mem_request: String,
    /// CPU request.
    pub cpu_request: String,
    /// Memory limit.
    pub mem_limit: String,
    /// CPU limit.
    pub cpu_limit: String,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            mem_request: "1024Mi".to_string(),
            cpu_request: "100m".to_string(),
            mem_limit: "2048Mi".to_string(),
            cpu_limit: "500m".to_string(),
        }
    }
}

/// Configuration of one network-facing Besu interface.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    /// Whether the interface is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Comma-separated API namespaces (JSON-RPC only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Allowed CORS origins.
    #[serde(default = "default_cors")]
    pub cors_origins: String,
    /// Whether request authentication is enabled.
    #[serde(default)]
    pub authentication_enabled: bool,
    /// Whether peer discovery is enabled (P2P only).
    #[serde(default)]
    pub discovery: bool,
}

fn default_true() -> bool {
    true
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_cors() -> String {
    "*".to_string()
}

impl PortConfig {
    fn on(port: u16) -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port,
            api: None,
            cors_origins: default_cors(),
            authentication_enabled: false,
            discovery: false,
        }
    }
}

fn default_p2p() -> PortConfig {
    PortConfig {
        discovery: true,
        ..PortConfig::on(30303)
    }
}
fn default_rpc() -> PortConfig {
    PortConfig {
        api: Some("ETH,NET,IBFT".to_string()),
        ..PortConfig::on(8545)
    }
}
fn default_ws() -> PortConfig {
    PortConfig::on(8546)
}
fn default_graphql() -> PortConfig {
    PortConfig::on(8547)
}
fn default_metrics() -> PortConfig {
    PortConfig::on(9545)
}

/// Pod template shared by every node group of a network.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    /// Besu image.
    #[serde(default)]
    pub image: ImageSpec,
    /// Container resources.
    #[serde(default)]
    pub resources: ResourceSpec,
    /// Peer-to-peer interface.
    #[serde(default = "default_p2p")]
    pub p2p: PortConfig,
    /// HTTP JSON-RPC interface.
    #[serde(default = "default_rpc")]
    pub rpc: PortConfig,
    /// WebSocket JSON-RPC interface.
    #[serde(default = "default_ws")]
    pub ws: PortConfig,
    /// GraphQL interface.
    #[serde(default = "default_graphql")]
    pub graphql: PortConfig,
    /// Prometheus metrics interface.
    #[serde(default = "default_metrics")]
    pub metrics: PortConfig,
    /// Value of `--host-whitelist`.
    #[serde(default = "default_cors")]
    pub http_whitelist: String,
}

impl Default for NodeTemplate {
    fn default() -> Self {
        Self {
            image: ImageSpec::default(),
            resources: ResourceSpec::default(),
            p2p: default_p2p(),
            rpc: default_rpc(),
            ws: default_ws(),
            graphql: default_graphql(),
            metrics: default_metrics(),
            http_whitelist: default_cors(),
        }
    }
}

/// IBFT2 consensus parameters. Unset fields take the template defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Ibft2Params {
    /// Target seconds between blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_period_seconds: Option<u64>,
    /// Blocks per epoch, after which pending votes are discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_length: Option<u64>,
    /// Round change timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

/// A prefunded account.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AllocEntry {
    /// Balance as a decimal or `0x` hex string, copied verbatim.
    pub balance: String,
}

/// User-facing genesis parameters. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenesisParams {
    /// Chain id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Constantinople fix fork block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constantinople_fix_block: Option<u64>,
    /// IBFT2 parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibft2: Option<Ibft2Params>,
    /// Genesis nonce, hex quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Genesis timestamp, hex quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Block gas limit, hex quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    /// Difficulty, hex quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// 32-byte mix hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<String>,
    /// 20-byte coinbase address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    /// Prefunded accounts keyed by address.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alloc: BTreeMap<String, AllocEntry>,
}
