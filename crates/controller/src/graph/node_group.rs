// Path: crates/controller/src/graph/node_group.rs
//! Children of a `BesuNode`: the workload running one node group.

use super::{labels, owned_meta};
use besu_api::cluster::namespaced_name;
use besu_types::crd::{BesuNode, BesuNodeSpec, NodeRole, PortConfig};
use besu_types::error::{ApiError, ReconcileError};
use besu_types::keys::{
    genesis_config_map_name, key_secret_name, node_group_name, node_key_read_role_name,
    node_role_binding_name, node_service_account_name, service_env_prefix, ENODE_KEY_FIELD,
    GENESIS_FILE_KEY, LABEL_APP, PRIVATE_KEY_FIELD,
};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Service, ServiceAccount, ServicePort, ServiceSpec};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Where the genesis config map is mounted.
pub const GENESIS_MOUNT_PATH: &str = "/etc/genesis";
/// Where the node key secret is mounted.
pub const KEY_MOUNT_PATH: &str = "/secrets";

const BESU_BINARY: &str = "/opt/besu/bin/besu";
const DEFAULT_RPC_API: &str = "ETH,NET,IBFT";

fn node_name(node: &BesuNode) -> Result<String, ReconcileError> {
    namespaced_name(node)
        .map(|(_, name)| name)
        .map_err(ReconcileError::MissingMetadata)
}

/// Pod selector of a node group.
pub fn selector(node_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(LABEL_APP.to_string(), node_name.to_string())])
}

fn object_labels(node: &BesuNode, name: &str) -> BTreeMap<String, String> {
    let mut l = labels(&node.spec.network, node.spec.role.as_str());
    l.extend(selector(name));
    l
}

/// Service names of the network's bootnode groups, in slot order.
fn bootnode_services(spec: &BesuNodeSpec) -> impl Iterator<Item = (u32, String)> + '_ {
    (1..=spec.bootnodes).map(|i| (i, node_group_name(&spec.network, NodeRole::Bootnode, i)))
}

fn rpc_flags(prefix: &str, port: &PortConfig, cors: bool) -> Vec<String> {
    let mut flags = vec![
        format!("--{prefix}-enabled={}", port.enabled),
        format!("--{prefix}-host={}", port.host),
        format!("--{prefix}-port={}", port.port),
    ];
    if cors {
        flags.push(format!("--{prefix}-cors-origins=${{NODES_HTTP_CORS_ORIGINS}}"));
    }
    flags
}

/// The shell command line of the Besu container.
///
/// Peer addresses are resolved at pod start from the `*_SERVICE_HOST` and
/// `*_SERVICE_PORT` variables the platform injects for each bootnode service,
/// and from the `BOOTNODE<i>_PUBKEY` variables read from their key secrets.
pub fn besu_command(spec: &BesuNodeSpec) -> String {
    let t = &spec.template;
    let mut args = vec![
        format!("exec {BESU_BINARY}"),
        format!("--genesis-file={GENESIS_MOUNT_PATH}/{GENESIS_FILE_KEY}"),
    ];
    if spec.role.has_key() {
        args.push(format!(
            "--node-private-key-file={KEY_MOUNT_PATH}/{PRIVATE_KEY_FIELD}"
        ));
    }
    args.push(format!("--p2p-port={}", t.p2p.port));
    args.push(format!("--discovery-enabled={}", t.p2p.discovery));

    args.extend(rpc_flags("rpc-http", &t.rpc, true));
    args.push(format!(
        "--rpc-http-api={}",
        t.rpc.api.as_deref().unwrap_or(DEFAULT_RPC_API)
    ));
    if t.rpc.authentication_enabled {
        args.push("--rpc-http-authentication-enabled=true".to_string());
    }
    args.extend(rpc_flags("graphql-http", &t.graphql, true));
    args.extend(rpc_flags("rpc-ws", &t.ws, false));
    if let Some(api) = &t.ws.api {
        args.push(format!("--rpc-ws-api={api}"));
    }
    args.extend(rpc_flags("metrics", &t.metrics, false));
    args.push("--host-whitelist=${NODES_HOST_WHITELIST}".to_string());

    let enodes: Vec<String> = bootnode_services(spec)
        .map(|(i, service)| {
            let env = service_env_prefix(&service);
            format!("enode://${{BOOTNODE{i}_PUBKEY}}@${{{env}_SERVICE_HOST}}:${{{env}_SERVICE_PORT}}")
        })
        .collect();
    if !enodes.is_empty() {
        args.push(format!("--bootnodes={}", enodes.join(",")));
    }
    args.join(" ")
}

/// The init container command that blocks until every bootnode answers its
/// liveness endpoint.
pub fn bootnode_wait_command(spec: &BesuNodeSpec) -> String {
    bootnode_services(spec)
        .map(|(_, service)| {
            format!(
                "curl -X GET --connect-timeout 30 --max-time 10 --retry 6 --retry-delay 0 \
                 --retry-max-time 300 ${{{}_SERVICE_HOST}}:{}/liveness",
                service_env_prefix(&service),
                spec.template.rpc.port
            )
        })
        .collect::<Vec<_>>()
        .join(" && ")
}

fn container_port(name: &str, port: u16, protocol: &str) -> Value {
    json!({ "name": name, "containerPort": port, "protocol": protocol })
}

fn http_probe(path: &str, port: u16, initial_delay: i32, period: i32) -> Value {
    json!({
        "httpGet": { "path": path, "port": port },
        "initialDelaySeconds": initial_delay,
        "periodSeconds": period,
    })
}

/// The StatefulSet running a node group.
pub fn statefulset(node: &BesuNode, helper_image: &str) -> Result<StatefulSet, ReconcileError> {
    let name = node_name(node)?;
    let spec = &node.spec;
    let t = &spec.template;
    let role = spec.role;

    let mut env = vec![
        json!({ "name": "POD_IP", "valueFrom": { "fieldRef": { "fieldPath": "status.podIP" } } }),
        json!({ "name": "NODES_HTTP_CORS_ORIGINS", "value": t.rpc.cors_origins }),
        json!({ "name": "NODES_HOST_WHITELIST", "value": t.http_whitelist }),
    ];
    for (i, service) in bootnode_services(spec) {
        env.push(json!({
            "name": format!("BOOTNODE{i}_PUBKEY"),
            "valueFrom": { "secretKeyRef": { "name": key_secret_name(&service), "key": ENODE_KEY_FIELD } },
        }));
    }

    let mut volumes = vec![json!({
        "name": "genesis-config",
        "configMap": {
            "name": genesis_config_map_name(&spec.network),
            "items": [{ "key": GENESIS_FILE_KEY, "path": GENESIS_FILE_KEY }],
        },
    })];
    let mut mounts = vec![json!({
        "name": "genesis-config", "mountPath": GENESIS_MOUNT_PATH, "readOnly": true,
    })];
    let mut readiness = Some(http_probe("/readiness", t.rpc.port, 50, 30));
    if role.has_key() {
        env.push(json!({ "name": "POD_NAME", "valueFrom": { "fieldRef": { "fieldPath": "metadata.name" } } }));
        volumes.push(json!({ "name": "key", "secret": { "secretName": key_secret_name(&name) } }));
        mounts.push(json!({ "name": "key", "mountPath": KEY_MOUNT_PATH, "readOnly": true }));
        readiness = None;
    }

    let mut init_containers = Vec::new();
    if role != NodeRole::Bootnode && spec.bootnodes > 0 {
        init_containers.push(json!({
            "name": "init-bootnode",
            "image": helper_image,
            "command": ["sh", "-c", bootnode_wait_command(spec)],
        }));
    }

    let mut container = json!({
        "name": name,
        "image": t.image.reference(),
        "imagePullPolicy": t.image.pull_policy,
        "resources": {
            "requests": { "cpu": t.resources.cpu_request, "memory": t.resources.mem_request },
            "limits": { "cpu": t.resources.cpu_limit, "memory": t.resources.mem_limit },
        },
        "env": env,
        "volumeMounts": mounts,
        "ports": [
            container_port("json-rpc", t.rpc.port, "TCP"),
            container_port("ws", t.ws.port, "TCP"),
            container_port("graphql", t.graphql.port, "TCP"),
            container_port("rlpx", t.p2p.port, "TCP"),
            container_port("discovery", t.p2p.port, "UDP"),
            container_port("metrics", t.metrics.port, "TCP"),
        ],
        "command": ["/bin/sh", "-c"],
        "args": [besu_command(spec)],
        "livenessProbe": http_probe("/liveness", t.rpc.port, 60, 30),
    });
    if let (Some(probe), Some(obj)) = (readiness, container.as_object_mut()) {
        obj.insert("readinessProbe".to_string(), probe);
    }

    let manifest = json!({
        "apiVersion": "apps/v1",
        "kind": "StatefulSet",
        "metadata": {},
        "spec": {
            "replicas": spec.replicas,
            "podManagementPolicy": "OrderedReady",
            "serviceName": name,
            "selector": { "matchLabels": selector(&name) },
            "template": {
                "metadata": {
                    "labels": object_labels(node, &name),
                    "annotations": {
                        "prometheus.io/scrape": "true",
                        "prometheus.io/port": t.metrics.port.to_string(),
                        "prometheus.io/path": "/metrics",
                    },
                },
                "spec": {
                    "serviceAccountName": node_service_account_name(&name),
                    "initContainers": init_containers,
                    "containers": [container],
                    "volumes": volumes,
                },
            },
        },
    });
    let mut sts: StatefulSet = serde_json::from_value(manifest)
        .map_err(|e| ReconcileError::Api(ApiError::Serialization(e.to_string())))?;
    sts.metadata = owned_meta(node, name.clone(), object_labels(node, &name))?;
    Ok(sts)
}

fn main_image(sts: &StatefulSet) -> Option<String> {
    sts.spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .first()?
        .image
        .clone()
}

/// Copies the image and replica count of `desired` into `current`.
pub fn sync_statefulset(current: &mut StatefulSet, desired: &StatefulSet) -> bool {
    let desired_replicas = desired.spec.as_ref().and_then(|s| s.replicas);
    let desired_image = main_image(desired);
    let Some(spec) = current.spec.as_mut() else {
        current.spec = desired.spec.clone();
        return true;
    };
    let mut changed = false;
    if spec.replicas != desired_replicas {
        spec.replicas = desired_replicas;
        changed = true;
    }
    if let Some(container) = spec
        .template
        .spec
        .as_mut()
        .and_then(|p| p.containers.first_mut())
    {
        if container.image != desired_image {
            container.image = desired_image;
            changed = true;
        }
    }
    changed
}

fn service_port(name: &str, protocol: &str, port: u16) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        protocol: Some(protocol.to_string()),
        port: i32::from(port),
        target_port: Some(IntOrString::Int(i32::from(port))),
        ..Default::default()
    }
}

/// The ClusterIP service fronting a node group. Discovery comes first so that
/// `<SERVICE>_SERVICE_PORT` resolves to the p2p port.
pub fn service(node: &BesuNode) -> Result<Service, ReconcileError> {
    let name = node_name(node)?;
    let t = &node.spec.template;
    Ok(Service {
        metadata: owned_meta(node, name.clone(), object_labels(node, &name))?,
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(selector(&name)),
            ports: Some(vec![
                service_port("discovery", "UDP", t.p2p.port),
                service_port("rlpx", "TCP", t.p2p.port),
                service_port("json-rpc", "TCP", t.rpc.port),
                service_port("ws", "TCP", t.ws.port),
                service_port("graphql", "TCP", t.graphql.port),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// The identity a node group's pods run as.
pub fn service_account(node: &BesuNode) -> Result<ServiceAccount, ReconcileError> {
    let name = node_name(node)?;
    Ok(ServiceAccount {
        metadata: owned_meta(
            node,
            node_service_account_name(&name),
            object_labels(node, &name),
        )?,
        ..Default::default()
    })
}

/// Grants read access to the group's own key secret and nothing else.
pub fn key_read_role(node: &BesuNode) -> Result<Role, ReconcileError> {
    let name = node_name(node)?;
    Ok(Role {
        metadata: owned_meta(node, node_key_read_role_name(&name), object_labels(node, &name))?,
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec![String::new()]),
            resources: Some(vec!["secrets".to_string()]),
            resource_names: Some(vec![key_secret_name(&name)]),
            verbs: vec!["get".to_string()],
            ..Default::default()
        }]),
    })
}

/// Binds [`key_read_role`] to [`service_account`].
pub fn role_binding(node: &BesuNode) -> Result<RoleBinding, ReconcileError> {
    let (namespace, name) = namespaced_name(node).map_err(ReconcileError::MissingMetadata)?;
    Ok(RoleBinding {
        metadata: owned_meta(node, node_role_binding_name(&name), object_labels(node, &name))?,
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: node_key_read_role_name(&name),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: node_service_account_name(&name),
            namespace: Some(namespace),
            ..Default::default()
        }]),
    })
}
