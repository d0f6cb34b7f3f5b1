// Path: crates/types/src/keys/mod.rs
//! Defines well-known object names, label keys and data keys.
//!
//! Every child object the operator creates is named by a pure function of its
//! owner's name, so identity can be re-derived on every reconcile without a
//! persisted mapping table. Both the reconciler and the one-shot tasks use
//! these helpers, so the names they agree on live in exactly one place.

use crate::crd::NodeRole;

/// The API group of every custom resource served by the operator.
pub const API_GROUP: &str = "hyperledger.org";
/// The API version of every custom resource served by the operator.
pub const API_VERSION: &str = "v1alpha1";

/// The deletion guard attached to every `BesuNetwork`.
pub const FINALIZER: &str = "finalizer.besu.hyperledger.org";

/// The config map key holding the finalized genesis document.
pub const GENESIS_FILE_KEY: &str = "genesis.json";
/// Secret field holding the unprefixed hex private key.
pub const PRIVATE_KEY_FIELD: &str = "private.key";
/// Secret field holding the `0x`-prefixed hex public key.
pub const PUBLIC_KEY_FIELD: &str = "public.key";
/// Secret field holding the unprefixed hex public key used in enode URLs.
pub const ENODE_KEY_FIELD: &str = "enode.key";

/// Label naming the `BesuNetwork` an object belongs to.
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
/// Label naming the controller that manages an object.
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
/// Label naming the role an object plays in the network.
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";
/// Pod selector label of a node group.
pub const LABEL_APP: &str = "app";
/// Value of [`LABEL_MANAGED_BY`].
pub const MANAGED_BY: &str = "besu-operator";

/// Component label value of key secrets.
pub const COMPONENT_NODE_KEY: &str = "node-key";
/// Component label value of the genesis config map.
pub const COMPONENT_GENESIS: &str = "genesis";
/// Component label value of the bootstrap RBAC objects and jobs.
pub const COMPONENT_BOOTSTRAP: &str = "bootstrap";

/// Name of the node group for the `index`-th (1-based) member of `role`.
///
/// Member nodes share a single group regardless of `index`.
pub fn node_group_name(network: &str, role: NodeRole, index: u32) -> String {
    match role {
        NodeRole::Member => format!("{network}-member"),
        _ => format!("{network}-{}{index}", role.as_str()),
    }
}

/// Name of the secret holding a node group's key pair.
pub fn key_secret_name(node_group: &str) -> String {
    format!("{node_group}-key")
}

/// Name of the config map holding the network's genesis document.
pub fn genesis_config_map_name(network: &str) -> String {
    format!("{network}-genesis")
}

/// Name of the Role granted to the bootstrap and cleanup jobs.
pub fn bootstrap_role_name(network: &str) -> String {
    format!("{network}-bootstrap-role")
}

/// Name of the RoleBinding granting the bootstrap Role.
pub fn bootstrap_role_binding_name(network: &str) -> String {
    format!("{network}-bootstrap-rb")
}

/// Name of the identity the bootstrap and cleanup jobs run as.
pub fn bootstrap_service_account_name(network: &str) -> String {
    format!("{network}-bootstrap-sa")
}

/// Name of the one-shot key generation job.
pub fn bootstrap_job_name(network: &str) -> String {
    format!("{network}-bootstrap")
}

/// Name of the one-shot teardown job.
pub fn cleanup_job_name(network: &str) -> String {
    format!("{network}-cleanup")
}

/// Name of the network's `Prometheus` object.
pub fn prometheus_name(network: &str) -> String {
    format!("{network}-prometheus")
}

/// Name of the network's `Grafana` object.
pub fn grafana_name(network: &str) -> String {
    format!("{network}-grafana")
}

/// Name of the Role letting a node group read its own key secret.
pub fn node_key_read_role_name(node_group: &str) -> String {
    format!("{node_group}-key-read-role")
}

/// Name of the RoleBinding granting [`node_key_read_role_name`].
pub fn node_role_binding_name(node_group: &str) -> String {
    format!("{node_group}-rb")
}

/// Name of the identity a node group's pods run as.
pub fn node_service_account_name(node_group: &str) -> String {
    format!("{node_group}-sa")
}

/// Prefix of the `*_SERVICE_HOST` / `*_SERVICE_PORT` variables the platform
/// injects for a service with this name.
pub fn service_env_prefix(service: &str) -> String {
    service.to_ascii_uppercase().replace('-', "_")
}

/// Label selector matching every key secret of a network.
pub fn key_secret_selector(network: &str) -> String {
    format!("{LABEL_INSTANCE}={network},{LABEL_COMPONENT}={COMPONENT_NODE_KEY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_groups_are_one_based_and_members_share_a_name() {
        assert_eq!(node_group_name("net", NodeRole::Bootnode, 1), "net-bootnode1");
        assert_eq!(node_group_name("net", NodeRole::Validator, 4), "net-validator4");
        assert_eq!(node_group_name("net", NodeRole::Member, 1), "net-member");
        assert_eq!(node_group_name("net", NodeRole::Member, 7), "net-member");
    }

    #[test]
    fn service_env_prefix_matches_platform_convention() {
        assert_eq!(service_env_prefix("net-bootnode2"), "NET_BOOTNODE2");
    }

    #[test]
    fn key_secret_selector_targets_one_network() {
        assert_eq!(
            key_secret_selector("net"),
            "app.kubernetes.io/instance=net,app.kubernetes.io/component=node-key"
        );
    }
}
