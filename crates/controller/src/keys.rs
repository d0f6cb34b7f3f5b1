// Path: crates/controller/src/keys.rs
//! The key-lifecycle state machine: `NoKeys -> Provisioning -> Ready`.
//!
//! The state is persisted in `status.keyState` and advanced by at most one
//! step per reconcile pass. `Ready` is terminal; nothing here clears it.

use crate::context::Context;
use crate::ensure::ensure_exists;
use crate::graph::network::{
    bootstrap_role, bootstrap_role_binding, bootstrap_service_account, task_job, Task,
};
use besu_api::cluster::{namespaced_name, ClusterApi};
use besu_crypto::NodeKeyPair;
use besu_types::crd::{
    BesuNetwork, BesuNetworkSpec, KeyPair, NodeRole, ProvisionedSlots, ProvisioningState,
};
use besu_types::error::ReconcileError;
use besu_types::keys::{key_secret_name, key_secret_selector, node_group_name};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Secret;
use serde_json::json;
use std::collections::BTreeSet;

/// Where the key of one slot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource<'a> {
    /// A pair supplied by the user.
    Supplied(&'a KeyPair),
    /// A fresh pair generated during bootstrap.
    Generated,
}

/// The key source of each of `count` slots: supplied pairs in order, excess
/// pairs ignored, any shortfall generated.
pub fn slot_sources(supplied: &[KeyPair], count: u32) -> Vec<KeySource<'_>> {
    let count = count as usize;
    let mut sources: Vec<KeySource<'_>> = supplied
        .iter()
        .take(count)
        .map(KeySource::Supplied)
        .collect();
    sources.resize(count, KeySource::Generated);
    sources
}

/// Checks every supplied pair that will actually be used.
pub fn validate_supplied(spec: &BesuNetworkSpec) -> Result<(), ReconcileError> {
    let used = slot_sources(&spec.bootnode_keys, spec.bootnodes_count)
        .into_iter()
        .chain(slot_sources(&spec.validator_keys, spec.validators_count));
    for source in used {
        if let KeySource::Supplied(pair) = source {
            NodeKeyPair::from_supplied(&pair.public_key, &pair.private_key)?;
        }
    }
    Ok(())
}

/// What [`advance`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProgress {
    /// Keys exist for these slots.
    Ready(ProvisionedSlots),
    /// A step was taken or is running; requeue.
    Pending,
}

fn key_state(network: &BesuNetwork) -> ProvisioningState {
    network
        .status
        .as_ref()
        .map(|s| s.key_state)
        .unwrap_or_default()
}

/// Number of leading slots of `role` whose key secret exists.
fn contiguous_slots(existing: &BTreeSet<String>, network: &str, role: NodeRole, max: u32) -> u32 {
    (1..=max)
        .take_while(|i| existing.contains(&key_secret_name(&node_group_name(network, role, *i))))
        .fold(0, |n, _| n + 1)
}

async fn provisioned_slots<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
) -> Result<ProvisionedSlots, ReconcileError> {
    let (namespace, name) = namespaced_name(network).map_err(ReconcileError::MissingMetadata)?;
    let existing: BTreeSet<String> = ctx
        .api
        .list::<Secret>(&namespace, &key_secret_selector(&name))
        .await?
        .into_iter()
        .filter_map(|s| s.metadata.name)
        .collect();
    Ok(ProvisionedSlots {
        bootnodes: contiguous_slots(
            &existing,
            &name,
            NodeRole::Bootnode,
            network.spec.bootnodes_count,
        ),
        validators: contiguous_slots(
            &existing,
            &name,
            NodeRole::Validator,
            network.spec.validators_count,
        ),
    })
}

async fn set_key_state<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
    state: ProvisioningState,
    provisioned: Option<ProvisionedSlots>,
) -> Result<(), ReconcileError> {
    let (namespace, name) = namespaced_name(network).map_err(ReconcileError::MissingMetadata)?;
    let mut status = json!({ "keyState": state });
    if let (Some(slots), Some(obj)) = (provisioned, status.as_object_mut()) {
        obj.insert("provisioned".to_string(), json!(slots));
    }
    ctx.api
        .patch_status::<BesuNetwork>(&namespace, &name, status)
        .await?;
    let label = match state {
        ProvisioningState::NoKeys => "NoKeys",
        ProvisioningState::Provisioning => "Provisioning",
        ProvisioningState::Ready => "Ready",
    };
    ctx.metrics.inc_key_state_transition(label);
    tracing::info!(target: "keys", %namespace, network = %name, state = label, "key state changed");
    Ok(())
}

/// Takes the next provisioning step for `network`.
pub async fn advance<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
) -> Result<KeyProgress, ReconcileError> {
    let spec = &network.spec;
    match key_state(network) {
        ProvisioningState::Ready => {
            let slots = network
                .status
                .as_ref()
                .and_then(|s| s.provisioned)
                .unwrap_or(ProvisionedSlots {
                    bootnodes: spec.bootnodes_count,
                    validators: spec.validators_count,
                });
            return Ok(KeyProgress::Ready(slots));
        }
        ProvisioningState::NoKeys => {
            validate_supplied(spec)?;
            set_key_state(ctx, network, ProvisioningState::Provisioning, None).await?;
            return Ok(KeyProgress::Pending);
        }
        ProvisioningState::Provisioning => {}
    }

    if ensure_exists(ctx, bootstrap_role(network)?).await?.changed() {
        return Ok(KeyProgress::Pending);
    }
    if ensure_exists(ctx, bootstrap_role_binding(network)?)
        .await?
        .changed()
    {
        return Ok(KeyProgress::Pending);
    }
    if ensure_exists(ctx, bootstrap_service_account(network)?)
        .await?
        .changed()
    {
        return Ok(KeyProgress::Pending);
    }
    let job = ensure_exists(ctx, task_job(network, &ctx.config, Task::Bootstrap)?).await?;
    if job.changed() {
        return Ok(KeyProgress::Pending);
    }

    let status = job.get().status.clone().unwrap_or_default();
    if status.succeeded.unwrap_or(0) > 0 {
        let slots = provisioned_slots(ctx, network).await?;
        set_key_state(ctx, network, ProvisioningState::Ready, Some(slots)).await?;
        return Ok(KeyProgress::Ready(slots));
    }
    let failed = status.failed.unwrap_or(0);
    let limit = job
        .get()
        .spec
        .as_ref()
        .and_then(|s| s.backoff_limit)
        .unwrap_or(ctx.config.job_backoff_limit);
    if failed >= limit {
        let (namespace, name) = namespaced_name::<Job>(job.get())
            .map_err(ReconcileError::MissingMetadata)?;
        tracing::warn!(target: "keys", %namespace, job = %name, failed, "bootstrap job exhausted its retries");
    }
    Ok(KeyProgress::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use besu_test_utils::fixtures::supplied_key;

    #[test]
    fn excess_supplied_keys_are_ignored() {
        let keys: Vec<KeyPair> = (1..=5).map(|n| supplied_key(n).unwrap()).collect();
        let sources = slot_sources(&keys, 3);
        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|s| matches!(s, KeySource::Supplied(_))));
        assert_eq!(sources[2], KeySource::Supplied(&keys[2]));
    }

    #[test]
    fn shortfall_is_generated() {
        let keys = vec![supplied_key(1).unwrap()];
        let sources = slot_sources(&keys, 3);
        assert_eq!(
            sources,
            vec![
                KeySource::Supplied(&keys[0]),
                KeySource::Generated,
                KeySource::Generated
            ]
        );
    }

    #[test]
    fn only_used_pairs_are_validated() {
        let mut spec = BesuNetworkSpec {
            validators_count: 1,
            validator_keys: vec![
                supplied_key(1).unwrap(),
                KeyPair {
                    public_key: "0x00".into(),
                    private_key: "zz".into(),
                },
            ],
            ..Default::default()
        };
        assert!(validate_supplied(&spec).is_ok());

        spec.validators_count = 2;
        assert!(matches!(
            validate_supplied(&spec),
            Err(ReconcileError::Crypto(_))
        ));
    }

    #[test]
    fn mismatched_halves_are_rejected() {
        let one = supplied_key(1).unwrap();
        let two = supplied_key(2).unwrap();
        let spec = BesuNetworkSpec {
            bootnodes_count: 1,
            bootnode_keys: vec![KeyPair {
                public_key: one.public_key,
                private_key: two.private_key,
            }],
            ..Default::default()
        };
        assert!(validate_supplied(&spec).is_err());
    }

    #[test]
    fn contiguous_slots_stop_at_the_first_gap() {
        let existing: BTreeSet<String> = ["net-validator1-key", "net-validator2-key", "net-validator4-key"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(contiguous_slots(&existing, "net", NodeRole::Validator, 4), 2);
        assert_eq!(contiguous_slots(&existing, "net", NodeRole::Bootnode, 4), 0);
    }
}
