// Path: crates/controller/src/runtime.rs
//! Wires the reconcilers into kube-runtime watch loops.

use crate::context::{Context, Outcome};
use crate::{network, node};
use besu_client::KubeClusterApi;
use besu_telemetry::time::Timer;
use besu_types::crd::{BesuNetwork, BesuNode, Grafana, Prometheus};
use besu_types::error::{ErrorCode, ReconcileError};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;

type SharedContext = Arc<Context<KubeClusterApi>>;

fn api_for<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

fn into_action(ctx: &SharedContext, outcome: Outcome) -> Action {
    match outcome {
        Outcome::Requeue => Action::requeue(ctx.requeue_interval()),
        Outcome::Converged => Action::await_change(),
    }
}

fn record(ctx: &SharedContext, controller: &'static str, result: &Result<Outcome, ReconcileError>) {
    let outcome = match result {
        Ok(o) => o.as_str(),
        Err(_) => "error",
    };
    ctx.metrics.inc_reconcile(controller, outcome);
}

async fn reconcile_network_object(
    object: Arc<BesuNetwork>,
    ctx: SharedContext,
) -> Result<Action, ReconcileError> {
    let _timer = Timer::new(ctx.metrics, network::CONTROLLER);
    let namespace = object.namespace().unwrap_or_default();
    let name = object.name_any();
    let result = network::reconcile_network(&ctx, &namespace, &name).await;
    record(&ctx, network::CONTROLLER, &result);
    Ok(into_action(&ctx, result?))
}

async fn reconcile_node_object(
    object: Arc<BesuNode>,
    ctx: SharedContext,
) -> Result<Action, ReconcileError> {
    let _timer = Timer::new(ctx.metrics, node::CONTROLLER);
    let namespace = object.namespace().unwrap_or_default();
    let name = object.name_any();
    let result = node::reconcile_node(&ctx, &namespace, &name).await;
    record(&ctx, node::CONTROLLER, &result);
    Ok(into_action(&ctx, result?))
}

/// Logs a failed pass and schedules a retry. Nothing is fatal.
fn error_policy<K: Resource<DynamicType = ()>>(
    object: Arc<K>,
    err: &ReconcileError,
    ctx: SharedContext,
) -> Action {
    tracing::warn!(
        target: "reconcile",
        kind = %K::kind(&()),
        name = %object.name_any(),
        error = %err,
        code = err.code(),
        "reconcile failed"
    );
    ctx.metrics.inc_error(err.kind(), err.code());
    Action::requeue(std::time::Duration::from_secs(ctx.config.error_requeue_secs))
}

/// Runs both controllers until a termination signal arrives.
pub async fn run(ctx: SharedContext) {
    let client = ctx.api.client().clone();
    let ns = ctx.config.watch_namespace.clone();
    let ns = ns.as_deref();
    let cfg = watcher::Config::default;

    let networks = Controller::new(api_for::<BesuNetwork>(&client, ns), cfg())
        .owns(api_for::<BesuNode>(&client, ns), cfg())
        .owns(api_for::<ConfigMap>(&client, ns), cfg())
        .owns(api_for::<Job>(&client, ns), cfg())
        .owns(api_for::<Secret>(&client, ns), cfg())
        .owns(api_for::<Prometheus>(&client, ns), cfg())
        .owns(api_for::<Grafana>(&client, ns), cfg())
        .shutdown_on_signal()
        .run(reconcile_network_object, error_policy, ctx.clone())
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => tracing::debug!(target: "reconcile", network = %obj.name, "reconciled"),
                Err(e) => tracing::debug!(target: "reconcile", error = %e, "network controller event"),
            }
        });

    let nodes = Controller::new(api_for::<BesuNode>(&client, ns), cfg())
        .owns(api_for::<StatefulSet>(&client, ns), cfg())
        .owns(api_for::<Service>(&client, ns), cfg())
        .owns(api_for::<ServiceAccount>(&client, ns), cfg())
        .owns(api_for::<Role>(&client, ns), cfg())
        .owns(api_for::<RoleBinding>(&client, ns), cfg())
        .shutdown_on_signal()
        .run(reconcile_node_object, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => tracing::debug!(target: "reconcile", node = %obj.name, "reconciled"),
                Err(e) => tracing::debug!(target: "reconcile", error = %e, "node controller event"),
            }
        });

    tracing::info!(target: "reconcile", namespace = ?ns, "controllers started");
    futures::join!(networks, nodes);
    tracing::info!(target: "reconcile", "controllers stopped");
}
