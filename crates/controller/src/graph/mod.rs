// Path: crates/controller/src/graph/mod.rs
//! Identity, labels and owner links of every managed object.
//!
//! Two tiers: a `BesuNetwork` owns its node groups, key secrets, genesis
//! config map, task RBAC and jobs, and monitoring objects; each `BesuNode`
//! owns the workload objects that run it. Every builder here is a pure
//! function of its owner, so a reconcile can always re-derive the full set.

pub mod network;
pub mod node_group;

use besu_api::cluster::{namespaced_name, ManagedObject};
use besu_types::error::ReconcileError;
use besu_types::keys::{LABEL_COMPONENT, LABEL_INSTANCE, LABEL_MANAGED_BY, MANAGED_BY};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// The labels every child of `network` carries.
pub fn labels(network: &str, component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_INSTANCE.to_string(), network.to_string()),
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY.to_string()),
        (LABEL_COMPONENT.to_string(), component.to_string()),
    ])
}

/// A controller reference to `owner`, so the platform collects the child
/// when the owner goes away and routes child events back to it.
pub fn owner_reference<K: ManagedObject>(owner: &K) -> Result<OwnerReference, ReconcileError> {
    owner
        .controller_owner_ref(&())
        .ok_or(ReconcileError::MissingMetadata("metadata.uid"))
}

/// Metadata for an object named `name`, owned by `owner`, in its namespace.
pub fn owned_meta<K: ManagedObject>(
    owner: &K,
    name: String,
    labels: BTreeMap<String, String>,
) -> Result<ObjectMeta, ReconcileError> {
    let (namespace, _) = namespaced_name(owner).map_err(ReconcileError::MissingMetadata)?;
    Ok(ObjectMeta {
        name: Some(name),
        namespace: Some(namespace),
        labels: Some(labels),
        owner_references: Some(vec![owner_reference(owner)?]),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests;
