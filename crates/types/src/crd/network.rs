// Path: crates/types/src/crd/network.rs
//! The root `BesuNetwork` resource.

use super::monitoring::{GrafanaSpec, PrometheusSpec};
use super::template::{GenesisParams, KeyPair, NodeTemplate};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a permissioned IBFT2 Besu network.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "hyperledger.org",
    version = "v1alpha1",
    kind = "BesuNetwork",
    plural = "besunetworks",
    shortname = "besu",
    namespaced,
    status = "BesuNetworkStatus",
    printcolumn = r#"{"name":"Keys", "type":"string", "jsonPath":".status.keyState"}"#,
    printcolumn = r#"{"name":"Bootnodes", "type":"string", "jsonPath":".status.bootnodesReady"}"#,
    printcolumn = r#"{"name":"Validators", "type":"string", "jsonPath":".status.validatorsReady"}"#,
    printcolumn = r#"{"name":"Members", "type":"string", "jsonPath":".status.membersReady"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BesuNetworkSpec {
    /// Number of bootnode groups.
    #[serde(default)]
    pub bootnodes_count: u32,
    /// Number of validator groups.
    #[serde(default)]
    pub validators_count: u32,
    /// Replica count of the shared member group.
    #[serde(default)]
    pub members: u32,
    /// Pre-supplied bootnode keys, used in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bootnode_keys: Vec<KeyPair>,
    /// Pre-supplied validator keys, used in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validator_keys: Vec<KeyPair>,
    /// Pod template shared by every node group.
    #[serde(default)]
    pub node: NodeTemplate,
    /// Genesis parameters.
    #[serde(default)]
    pub genesis: GenesisParams,
    /// Whether to deploy the Prometheus and Grafana objects.
    #[serde(default)]
    pub monitoring: bool,
    /// Prometheus settings, used when `monitoring` is set.
    #[serde(default)]
    pub prometheus: PrometheusSpec,
    /// Grafana settings, used when `monitoring` is set.
    #[serde(default)]
    pub grafana: GrafanaSpec,
}

/// Key provisioning progress of a network.
///
/// Persisted in status so that it survives restarts. `Ready` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ProvisioningState {
    /// No bootstrap has been attempted.
    #[default]
    NoKeys,
    /// The bootstrap RBAC, identity, or job is being created or is running.
    Provisioning,
    /// Key secrets and the genesis document exist.
    Ready,
}

impl ProvisioningState {
    /// Returns `true` once keys have been provisioned.
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// Number of key slots covered by the bootstrap task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub struct ProvisionedSlots {
    /// Bootnode key secrets written.
    pub bootnodes: u32,
    /// Validator key secrets written.
    pub validators: u32,
}

/// Observed state of a `BesuNetwork`. Written only by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BesuNetworkStatus {
    /// Key provisioning progress.
    #[serde(default)]
    pub key_state: ProvisioningState,
    /// Slots provisioned by the bootstrap task, set on entering `Ready`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned: Option<ProvisionedSlots>,
    /// Ready bootnode groups over desired, e.g. `"2/3"`.
    #[serde(default)]
    pub bootnodes_ready: String,
    /// Ready validator groups over desired.
    #[serde(default)]
    pub validators_ready: String,
    /// Ready member replicas over desired.
    #[serde(default)]
    pub members_ready: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_parses_with_defaults() {
        let spec: BesuNetworkSpec = serde_json::from_str(
            r#"{"bootnodesCount": 2, "validatorsCount": 4, "members": 1}"#,
        )
        .unwrap();
        assert_eq!(spec.bootnodes_count, 2);
        assert_eq!(spec.validators_count, 4);
        assert!(spec.validator_keys.is_empty());
        assert!(!spec.monitoring);
        assert_eq!(spec.grafana.node_port, 30030);
    }

    #[test]
    fn missing_status_fields_default_to_no_keys() {
        let status: BesuNetworkStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status.key_state, ProvisioningState::NoKeys);
        assert!(status.provisioned.is_none());
        assert!(!status.key_state.is_ready());
    }

    #[test]
    fn provisioning_state_serializes_by_name() {
        let v = serde_json::to_value(ProvisioningState::Provisioning).unwrap();
        assert_eq!(v, serde_json::json!("Provisioning"));
    }
}
