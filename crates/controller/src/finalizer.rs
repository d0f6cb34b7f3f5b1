// Path: crates/controller/src/finalizer.rs
//! The deletion guard and the teardown protocol behind it.
//!
//! `Active -> PendingFinalization -> Deleted`. The guard is only removed once
//! the cleanup job has succeeded, so key material never outlives its network.
//! The job runs under the bootstrap identity, which is recreated if it has
//! gone missing.

use crate::context::{Context, Outcome};
use crate::ensure::ensure_exists;
use crate::graph::network::{
    bootstrap_role, bootstrap_role_binding, bootstrap_service_account, task_job, Task,
};
use besu_api::cluster::{has_finalizer, namespaced_name, ClusterApi};
use besu_types::crd::BesuNetwork;
use besu_types::error::ReconcileError;
use besu_types::keys::FINALIZER;
use k8s_openapi::api::batch::v1::Job;

/// Attaches the guard if it is missing, returning the network as stored.
pub async fn ensure_guard<C: ClusterApi>(
    ctx: &Context<C>,
    network: BesuNetwork,
) -> Result<BesuNetwork, ReconcileError> {
    if has_finalizer(&network, FINALIZER) {
        return Ok(network);
    }
    let (namespace, name) = namespaced_name(&network).map_err(ReconcileError::MissingMetadata)?;
    let mut guarded = network;
    guarded
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(FINALIZER.to_string());
    let stored = ctx.api.replace(&namespace, &guarded).await?;
    ctx.metrics.inc_finalizer_step("guard_added");
    tracing::debug!(target: "finalizer", %namespace, network = %name, "deletion guard attached");
    Ok(stored)
}

async fn remove_guard<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
    step: &'static str,
) -> Result<(), ReconcileError> {
    let (namespace, name) = namespaced_name(network).map_err(ReconcileError::MissingMetadata)?;
    let mut released = network.clone();
    if let Some(finalizers) = released.metadata.finalizers.as_mut() {
        finalizers.retain(|f| f != FINALIZER);
    }
    ctx.api.replace(&namespace, &released).await?;
    ctx.metrics.inc_finalizer_step(step);
    tracing::info!(target: "finalizer", %namespace, network = %name, step, "deletion guard removed");
    Ok(())
}

/// Drives a network that is being deleted towards removal.
pub async fn finalize<C: ClusterApi>(
    ctx: &Context<C>,
    network: &BesuNetwork,
) -> Result<Outcome, ReconcileError> {
    if !has_finalizer(network, FINALIZER) {
        return Ok(Outcome::Converged);
    }
    let (namespace, name) = namespaced_name(network).map_err(ReconcileError::MissingMetadata)?;

    let job_name = Task::Cleanup.job_name(&name);
    let Some(job) = ctx.api.get::<Job>(&namespace, &job_name).await? else {
        ensure_exists(ctx, bootstrap_role(network)?).await?;
        ensure_exists(ctx, bootstrap_role_binding(network)?).await?;
        ensure_exists(ctx, bootstrap_service_account(network)?).await?;
        let job = task_job(network, &ctx.config, Task::Cleanup)?;
        ctx.api.create(&namespace, &job).await?;
        ctx.metrics.inc_child_write("Job", "create");
        ctx.metrics.inc_finalizer_step("cleanup_started");
        tracing::info!(target: "finalizer", %namespace, network = %name, job = %job_name, "cleanup job started");
        return Ok(Outcome::Requeue);
    };

    let succeeded = job
        .status
        .as_ref()
        .and_then(|s| s.succeeded)
        .unwrap_or(0);
    if succeeded > 0 {
        remove_guard(ctx, network, "guard_removed").await?;
        return Ok(Outcome::Converged);
    }
    tracing::debug!(target: "finalizer", %namespace, network = %name, "waiting for cleanup job");
    Ok(Outcome::Requeue)
}
