// Path: crates/types/src/crd/node.rs
//! The per-node-group `BesuNode` resource.

use super::template::NodeTemplate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The part a node group plays in the network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Advertised for peer discovery.
    Bootnode,
    /// Participates in IBFT2 block production.
    Validator,
    /// Follows the chain without a persisted key.
    Member,
}

impl NodeRole {
    /// Lower-case name used in object names and labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootnode => "bootnode",
            Self::Validator => "validator",
            Self::Member => "member",
        }
    }

    /// Whether nodes of this role run with a key pair from a secret.
    pub fn has_key(self) -> bool {
        !matches!(self, Self::Member)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of one node group.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "hyperledger.org",
    version = "v1alpha1",
    kind = "BesuNode",
    plural = "besunodes",
    namespaced,
    status = "BesuNodeStatus",
    printcolumn = r#"{"name":"Role", "type":"string", "jsonPath":".spec.role"}"#,
    printcolumn = r#"{"name":"Ready", "type":"integer", "jsonPath":".status.readyReplicas"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BesuNodeSpec {
    /// Role of every replica in this group.
    pub role: NodeRole,
    /// Desired replica count.
    pub replicas: i32,
    /// Name of the owning `BesuNetwork`.
    pub network: String,
    /// Number of bootnode groups in the network, for enode URL construction.
    #[serde(default)]
    pub bootnodes: u32,
    /// Pod template.
    #[serde(default)]
    pub template: NodeTemplate,
}

/// Observed state of a node group's StatefulSet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BesuNodeStatus {
    /// Replicas created.
    #[serde(default)]
    pub replicas: i32,
    /// Replicas passing readiness.
    #[serde(default)]
    pub ready_replicas: i32,
}

impl BesuNode {
    /// Ready replicas as last observed, zero if never observed.
    pub fn ready_replicas(&self) -> i32 {
        self.status.as_ref().map(|s| s.ready_replicas).unwrap_or(0)
    }
}
