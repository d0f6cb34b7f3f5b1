// Path: crates/controller/src/graph/network.rs
//! Children of a `BesuNetwork`.

use super::{labels, owned_meta};
use besu_crypto::NodeKeyPair;
use besu_types::config::OperatorConfig;
use besu_types::crd::{
    BesuNetwork, BesuNode, BesuNodeSpec, Grafana, GrafanaSpec, NodeRole, Prometheus,
    PrometheusSpec,
};
use besu_types::error::ReconcileError;
use besu_types::keys::{
    bootstrap_job_name, bootstrap_role_binding_name, bootstrap_role_name,
    bootstrap_service_account_name, cleanup_job_name, genesis_config_map_name, grafana_name,
    key_secret_name, node_group_name, prometheus_name, API_GROUP, COMPONENT_BOOTSTRAP,
    COMPONENT_GENESIS, COMPONENT_NODE_KEY, ENODE_KEY_FIELD, GENESIS_FILE_KEY, PRIVATE_KEY_FIELD,
    PUBLIC_KEY_FIELD,
};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, EnvVar, PodSpec, PodTemplateSpec, Secret, ServiceAccount,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Component label value of the monitoring objects.
pub const COMPONENT_MONITORING: &str = "monitoring";

/// Entry point of the operator image, used by the task jobs.
const TASK_BINARY: &str = "besu-operator";

fn root_name(network: &BesuNetwork) -> Result<&str, ReconcileError> {
    network
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcileError::MissingMetadata("metadata.name"))
}

fn root_namespace(network: &BesuNetwork) -> Result<&str, ReconcileError> {
    network
        .metadata
        .namespace
        .as_deref()
        .ok_or(ReconcileError::MissingMetadata("metadata.namespace"))
}

/// The `index`-th node group of `role`. Bootnode and validator groups run a
/// single replica; the member group runs `replicas`.
pub fn besu_node(
    network: &BesuNetwork,
    role: NodeRole,
    index: u32,
    replicas: i32,
    bootnodes: u32,
) -> Result<BesuNode, ReconcileError> {
    let root = root_name(network)?;
    let name = node_group_name(root, role, index);
    let mut node = BesuNode::new(
        &name,
        BesuNodeSpec {
            role,
            replicas,
            network: root.to_string(),
            bootnodes,
            template: network.spec.node.clone(),
        },
    );
    node.metadata = owned_meta(network, name, labels(root, role.as_str()))?;
    Ok(node)
}

/// Copies the image and replica count of `desired` into `current`.
pub fn sync_besu_node(current: &mut BesuNode, desired: &BesuNode) -> bool {
    let mut changed = false;
    if current.spec.template.image != desired.spec.template.image {
        current.spec.template.image = desired.spec.template.image.clone();
        changed = true;
    }
    if current.spec.replicas != desired.spec.replicas {
        current.spec.replicas = desired.spec.replicas;
        changed = true;
    }
    changed
}

/// The secret holding `pair` for node group `group`.
pub fn key_secret(
    network: &BesuNetwork,
    group: &str,
    pair: &NodeKeyPair,
) -> Result<Secret, ReconcileError> {
    let root = root_name(network)?;
    let data = BTreeMap::from([
        (
            PRIVATE_KEY_FIELD.to_string(),
            ByteString(pair.private_key_hex().as_bytes().to_vec()),
        ),
        (
            PUBLIC_KEY_FIELD.to_string(),
            ByteString(pair.public_key_hex().into_bytes()),
        ),
        (
            ENODE_KEY_FIELD.to_string(),
            ByteString(pair.enode_id().into_bytes()),
        ),
    ]);
    Ok(Secret {
        metadata: owned_meta(
            network,
            key_secret_name(group),
            labels(root, COMPONENT_NODE_KEY),
        )?,
        data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    })
}

/// The config map holding the finalized genesis document.
pub fn genesis_config_map(
    network: &BesuNetwork,
    genesis_json: String,
) -> Result<ConfigMap, ReconcileError> {
    let root = root_name(network)?;
    Ok(ConfigMap {
        metadata: owned_meta(
            network,
            genesis_config_map_name(root),
            labels(root, COMPONENT_GENESIS),
        )?,
        data: Some(BTreeMap::from([(GENESIS_FILE_KEY.to_string(), genesis_json)])),
        ..Default::default()
    })
}

fn rule(api_group: &str, resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![api_group.to_string()]),
        resources: Some(resources.iter().map(|r| r.to_string()).collect()),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// The Role the bootstrap and cleanup jobs run under.
pub fn bootstrap_role(network: &BesuNetwork) -> Result<Role, ReconcileError> {
    let root = root_name(network)?;
    Ok(Role {
        metadata: owned_meta(
            network,
            bootstrap_role_name(root),
            labels(root, COMPONENT_BOOTSTRAP),
        )?,
        rules: Some(vec![
            rule(
                "",
                &["secrets", "configmaps"],
                &["get", "create", "list", "update", "delete"],
            ),
            rule("", &["pods"], &["get", "list", "watch"]),
            rule(API_GROUP, &["besunetworks"], &["get"]),
        ]),
    })
}

/// Binds [`bootstrap_role`] to [`bootstrap_service_account`].
pub fn bootstrap_role_binding(network: &BesuNetwork) -> Result<RoleBinding, ReconcileError> {
    let root = root_name(network)?;
    Ok(RoleBinding {
        metadata: owned_meta(
            network,
            bootstrap_role_binding_name(root),
            labels(root, COMPONENT_BOOTSTRAP),
        )?,
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: bootstrap_role_name(root),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: bootstrap_service_account_name(root),
            namespace: Some(root_namespace(network)?.to_string()),
            ..Default::default()
        }]),
    })
}

/// The identity the bootstrap and cleanup jobs run as.
pub fn bootstrap_service_account(network: &BesuNetwork) -> Result<ServiceAccount, ReconcileError> {
    let root = root_name(network)?;
    Ok(ServiceAccount {
        metadata: owned_meta(
            network,
            bootstrap_service_account_name(root),
            labels(root, COMPONENT_BOOTSTRAP),
        )?,
        ..Default::default()
    })
}

/// A one-shot task of the operator binary, run as a Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Generates key secrets and the genesis config map.
    Bootstrap,
    /// Deletes key secrets and the genesis config map.
    Cleanup,
}

impl Task {
    /// The subcommand of the operator binary.
    pub fn subcommand(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Cleanup => "cleanup",
        }
    }

    /// Name of the Job running this task for `network`.
    pub fn job_name(self, network: &str) -> String {
        match self {
            Self::Bootstrap => bootstrap_job_name(network),
            Self::Cleanup => cleanup_job_name(network),
        }
    }
}

/// The Job running `task` for `network` under the bootstrap identity.
pub fn task_job(
    network: &BesuNetwork,
    config: &OperatorConfig,
    task: Task,
) -> Result<Job, ReconcileError> {
    let root = root_name(network)?;
    let namespace = root_namespace(network)?;
    let pod_labels = labels(root, COMPONENT_BOOTSTRAP);
    Ok(Job {
        metadata: owned_meta(network, task.job_name(root), pod_labels.clone())?,
        spec: Some(JobSpec {
            backoff_limit: Some(config.job_backoff_limit),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(bootstrap_service_account_name(root)),
                    restart_policy: Some("Never".to_string()),
                    containers: vec![Container {
                        name: task.subcommand().to_string(),
                        image: Some(config.task_image.clone()),
                        image_pull_policy: Some(config.task_image_pull_policy.clone()),
                        command: Some(vec![TASK_BINARY.to_string()]),
                        args: Some(vec![
                            task.subcommand().to_string(),
                            "--namespace".to_string(),
                            namespace.to_string(),
                            "--network".to_string(),
                            root.to_string(),
                        ]),
                        env: Some(vec![EnvVar {
                            name: "RUST_LOG".to_string(),
                            value: Some("info".to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// The network's `Prometheus` object, from the user's settings.
pub fn prometheus(network: &BesuNetwork) -> Result<Prometheus, ReconcileError> {
    let root = root_name(network)?;
    let name = prometheus_name(root);
    let mut object = Prometheus::new(
        &name,
        PrometheusSpec {
            owner: root.to_string(),
            ..network.spec.prometheus.clone()
        },
    );
    object.metadata = owned_meta(network, name, labels(root, COMPONENT_MONITORING))?;
    Ok(object)
}

/// The network's `Grafana` object, from the user's settings.
pub fn grafana(network: &BesuNetwork) -> Result<Grafana, ReconcileError> {
    let root = root_name(network)?;
    let name = grafana_name(root);
    let mut object = Grafana::new(
        &name,
        GrafanaSpec {
            owner: root.to_string(),
            ..network.spec.grafana.clone()
        },
    );
    object.metadata = owned_meta(network, name, labels(root, COMPONENT_MONITORING))?;
    Ok(object)
}
