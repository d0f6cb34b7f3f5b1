// Path: crates/types/src/crd/mod.rs
//! Custom resources of the `hyperledger.org/v1alpha1` API group.

mod monitoring;
mod network;
mod node;
mod template;

pub use monitoring::{Grafana, GrafanaSpec, Prometheus, PrometheusSpec};
pub use network::{
    BesuNetwork, BesuNetworkSpec, BesuNetworkStatus, ProvisionedSlots, ProvisioningState,
};
pub use node::{BesuNode, BesuNodeSpec, BesuNodeStatus, NodeRole};
pub use template::{
    AllocEntry, GenesisParams, Ibft2Params, ImageSpec, KeyPair, NodeTemplate, PortConfig,
    ResourceSpec,
};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Every custom resource definition the operator serves, in install order.
pub fn definitions() -> Vec<CustomResourceDefinition> {
    vec![
        BesuNetwork::crd(),
        BesuNode::crd(),
        Prometheus::crd(),
        Grafana::crd(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_cover_all_kinds_in_one_group() {
        let crds = definitions();
        let kinds: Vec<_> = crds.iter().map(|c| c.spec.names.kind.as_str()).collect();
        assert_eq!(kinds, ["BesuNetwork", "BesuNode", "Prometheus", "Grafana"]);
        assert!(crds.iter().all(|c| c.spec.group == crate::keys::API_GROUP));
    }
}
