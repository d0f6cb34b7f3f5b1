// Path: crates/controller/src/network.rs
//! The `BesuNetwork` reconciler.

use crate::bootstrap::{build_genesis_config_map, validator_public_keys};
use crate::context::{Context, Outcome};
use crate::ensure::{ensure, ensure_exists};
use crate::finalizer::{ensure_guard, finalize};
use crate::graph::network::{besu_node, grafana, prometheus, sync_besu_node};
use crate::keys::{advance, KeyProgress};
use besu_api::cluster::{is_deleting, ClusterApi};
use besu_types::crd::{BesuNetwork, BesuNetworkStatus, NodeRole, ProvisionedSlots};
use besu_types::error::ReconcileError;
use besu_types::keys::genesis_config_map_name;
use k8s_openapi::api::core::v1::ConfigMap;
use serde_json::json;

/// Metric label of this controller.
pub const CONTROLLER: &str = "besunetwork";

/// Ready over desired counts of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    /// Ready groups (bootnodes, validators) or replicas (members).
    pub ready: u32,
    /// Desired count from the network settings.
    pub desired: u32,
}

impl Readiness {
    /// Whether every desired instance is ready.
    pub fn complete(self) -> bool {
        self.ready == self.desired
    }

    fn render(self) -> String {
        format!("{}/{}", self.ready, self.desired)
    }
}

fn ready_count(replicas: i32) -> u32 {
    u32::try_from(replicas).unwrap_or(0)
}

async fn ensure_genesis<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
    namespace: &str,
    name: &str,
    slots: ProvisionedSlots,
) -> Result<(), ReconcileError> {
    let cm_name = genesis_config_map_name(name);
    if ctx.api.get::<ConfigMap>(namespace, &cm_name).await?.is_some() {
        return Ok(());
    }
    tracing::warn!(target: "reconcile", %namespace, config_map = %cm_name, "genesis config map missing, rebuilding from key secrets");
    let keys = validator_public_keys(&ctx.api, namespace, name, slots.validators).await?;
    let (config_map, _) = build_genesis_config_map(network, &keys)?;
    ensure_exists(ctx, config_map).await?;
    Ok(())
}

/// Ensures the keyed groups of `role`, returning how many are ready.
async fn ensure_keyed_groups<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
    role: NodeRole,
    groups: u32,
    bootnodes: u32,
) -> Result<(u32, Outcome), ReconcileError> {
    let mut ready = 0;
    let mut outcome = Outcome::Converged;
    for index in 1..=groups {
        let desired = besu_node(network, role, index, 1, bootnodes)?;
        let node = ensure(ctx, desired, sync_besu_node).await?;
        if node.changed() {
            outcome = Outcome::Requeue;
        }
        if node.get().ready_replicas() >= 1 {
            ready += 1;
        }
    }
    Ok((ready, outcome))
}

/// Converges one `BesuNetwork` towards its spec.
pub async fn reconcile_network<C: ClusterApi>(
    ctx: &Context<C>,
    namespace: &str,
    name: &str,
) -> Result<Outcome, ReconcileError> {
    let Some(network) = ctx.api.get::<BesuNetwork>(namespace, name).await? else {
        tracing::debug!(target: "reconcile", %namespace, network = %name, "network is gone");
        return Ok(Outcome::Converged);
    };
    if is_deleting(&network) {
        return finalize(ctx, &network).await;
    }
    let network = ensure_guard(ctx, network).await?;

    let slots = match advance(ctx, &network).await? {
        KeyProgress::Ready(slots) => slots,
        KeyProgress::Pending => return Ok(Outcome::Requeue),
    };
    ensure_genesis(ctx, &network, namespace, name, slots).await?;

    let spec = &network.spec;
    let bootnode_groups = spec.bootnodes_count.min(slots.bootnodes);
    let validator_groups = spec.validators_count.min(slots.validators);
    if bootnode_groups < spec.bootnodes_count || validator_groups < spec.validators_count {
        tracing::warn!(
            target: "reconcile",
            %namespace,
            network = %name,
            bootnodes = spec.bootnodes_count,
            validators = spec.validators_count,
            provisioned_bootnodes = slots.bootnodes,
            provisioned_validators = slots.validators,
            "counts exceed the provisioned key slots; extra groups will not be created"
        );
    }

    let (bootnodes_ready, bootnode_outcome) =
        ensure_keyed_groups(ctx, &network, NodeRole::Bootnode, bootnode_groups, bootnode_groups).await?;
    let (validators_ready, validator_outcome) =
        ensure_keyed_groups(ctx, &network, NodeRole::Validator, validator_groups, bootnode_groups).await?;

    let member_replicas = i32::try_from(spec.members)
        .map_err(|_| ReconcileError::InvalidSpec(format!("members {} is too large", spec.members)))?;
    let members = ensure(
        ctx,
        besu_node(&network, NodeRole::Member, 1, member_replicas, bootnode_groups)?,
        sync_besu_node,
    )
    .await?;
    let mut outcome = bootnode_outcome.and(validator_outcome);
    if members.changed() {
        outcome = Outcome::Requeue;
    }

    if spec.monitoring {
        ensure_exists(ctx, prometheus(&network)?).await?;
        ensure_exists(ctx, grafana(&network)?).await?;
    }

    let readiness = [
        Readiness {
            ready: bootnodes_ready,
            desired: spec.bootnodes_count,
        },
        Readiness {
            ready: validators_ready,
            desired: spec.validators_count,
        },
        Readiness {
            ready: ready_count(members.get().ready_replicas()),
            desired: spec.members,
        },
    ];
    write_readiness(ctx, &network, namespace, name, readiness).await?;

    if readiness.iter().all(|r| r.complete()) {
        Ok(outcome)
    } else {
        Ok(Outcome::Requeue)
    }
}

async fn write_readiness<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
    namespace: &str,
    name: &str,
    [bootnodes, validators, members]: [Readiness; 3],
) -> Result<(), ReconcileError> {
    let current = network.status.clone().unwrap_or_default();
    let desired = BesuNetworkStatus {
        bootnodes_ready: bootnodes.render(),
        validators_ready: validators.render(),
        members_ready: members.render(),
        ..current.clone()
    };
    if desired == current {
        return Ok(());
    }
    ctx.api
        .patch_status::<BesuNetwork>(
            namespace,
            name,
            json!({
                "bootnodesReady": desired.bootnodes_ready,
                "validatorsReady": desired.validators_ready,
                "membersReady": desired.members_ready,
            }),
        )
        .await?;
    ctx.metrics.inc_child_write("BesuNetworkStatus", "update");
    tracing::info!(
        target: "reconcile",
        %namespace,
        network = %name,
        bootnodes = %desired.bootnodes_ready,
        validators = %desired.validators_ready,
        members = %desired.members_ready,
        "readiness changed"
    );
    Ok(())
}
