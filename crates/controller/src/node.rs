// Path: crates/controller/src/node.rs
//! The `BesuNode` reconciler.

use crate::context::{Context, Outcome};
use crate::ensure::{ensure, ensure_exists};
use crate::graph::node_group::{
    key_read_role, role_binding, service, service_account, statefulset, sync_statefulset,
};
use besu_api::cluster::{is_deleting, ClusterApi};
use besu_types::crd::{BesuNode, BesuNodeStatus};
use besu_types::error::ReconcileError;
use k8s_openapi::api::apps::v1::StatefulSet;
use serde_json::json;

/// Metric label of this controller.
pub const CONTROLLER: &str = "besunode";

fn observed(sts: &StatefulSet) -> BesuNodeStatus {
    let status = sts.status.as_ref();
    BesuNodeStatus {
        replicas: status.map(|s| s.replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
    }
}

/// Converges one `BesuNode` towards its spec.
pub async fn reconcile_node<C: ClusterApi>(
    ctx: &Context<C>,
    namespace: &str,
    name: &str,
) -> Result<Outcome, ReconcileError> {
    let Some(node) = ctx.api.get::<BesuNode>(namespace, name).await? else {
        return Ok(Outcome::Converged);
    };
    // Owned objects are collected with the node.
    if is_deleting(&node) {
        return Ok(Outcome::Converged);
    }

    if node.spec.role.has_key() {
        ensure_exists(ctx, key_read_role(&node)?).await?;
        ensure_exists(ctx, role_binding(&node)?).await?;
    }
    ensure_exists(ctx, service_account(&node)?).await?;
    ensure_exists(ctx, service(&node)?).await?;

    let sts = ensure(
        ctx,
        statefulset(&node, &ctx.config.helper_image)?,
        sync_statefulset,
    )
    .await?;
    let outcome = if sts.changed() {
        Outcome::Requeue
    } else {
        Outcome::Converged
    };

    let status = observed(sts.get());
    if node.status.as_ref() != Some(&status) {
        ctx.api
            .patch_status::<BesuNode>(
                namespace,
                name,
                json!({
                    "replicas": status.replicas,
                    "readyReplicas": status.ready_replicas,
                }),
            )
            .await?;
        tracing::debug!(
            target: "reconcile",
            %namespace,
            node = %name,
            replicas = status.replicas,
            ready = status.ready_replicas,
            "node status updated"
        );
    }
    Ok(outcome)
}
