// Path: crates/controller/src/graph/tests.rs

use super::network::{besu_node, bootstrap_role, key_secret, task_job, Task};
use super::node_group::{
    besu_command, bootnode_wait_command, key_read_role, role_binding, service, statefulset,
    sync_statefulset,
};
use super::*;
use besu_test_utils::fixtures::{key_pair, network, NAMESPACE};
use besu_types::config::OperatorConfig;
use besu_types::crd::{BesuNetwork, BesuNode, NodeRole};
use besu_types::keys::{LABEL_APP, PUBLIC_KEY_FIELD};

fn root() -> BesuNetwork {
    let mut net = network("net", 2, 4, 3);
    net.metadata.uid = Some("root-uid".into());
    net
}

fn node(role: NodeRole, index: u32, bootnodes: u32) -> BesuNode {
    let replicas = if role == NodeRole::Member { 3 } else { 1 };
    let mut node = besu_node(&root(), role, index, replicas, bootnodes).unwrap();
    node.metadata.uid = Some(format!("{}-uid", node.metadata.name.clone().unwrap()));
    node
}

#[test]
fn children_are_controlled_by_their_owner() {
    let net = root();
    let group = besu_node(&net, NodeRole::Validator, 2, 1, 2).unwrap();
    assert_eq!(group.metadata.name.as_deref(), Some("net-validator2"));
    assert_eq!(group.metadata.namespace.as_deref(), Some(NAMESPACE));
    let refs = group.metadata.owner_references.unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].uid, "root-uid");
    assert_eq!(refs[0].kind, "BesuNetwork");
    assert_eq!(refs[0].controller, Some(true));
}

#[test]
fn owner_without_uid_is_rejected() {
    let net = network("net", 1, 1, 0);
    let err = besu_node(&net, NodeRole::Bootnode, 1, 1, 1).unwrap_err();
    assert!(matches!(err, ReconcileError::MissingMetadata("metadata.uid")));
}

#[test]
fn every_child_carries_the_network_labels() {
    let labels = besu_node(&root(), NodeRole::Member, 1, 3, 2)
        .unwrap()
        .metadata
        .labels
        .unwrap();
    assert_eq!(labels[LABEL_INSTANCE], "net");
    assert_eq!(labels[LABEL_MANAGED_BY], MANAGED_BY);
    assert_eq!(labels[LABEL_COMPONENT], "member");
}

#[test]
fn key_secret_holds_all_three_encodings() {
    let pair = key_pair(1).unwrap();
    let secret = key_secret(&root(), "net-bootnode1", &pair).unwrap();
    assert_eq!(secret.metadata.name.as_deref(), Some("net-bootnode1-key"));
    let data = secret.data.unwrap();
    let public = String::from_utf8(data[PUBLIC_KEY_FIELD].0.clone()).unwrap();
    assert!(public.starts_with("0x"));
    assert_eq!(public.len(), 2 + 128);
    let enode = String::from_utf8(data["enode.key"].0.clone()).unwrap();
    assert_eq!(format!("0x{enode}"), public);
}

#[test]
fn bootstrap_role_covers_secrets_configmaps_and_pods() {
    let role = bootstrap_role(&root()).unwrap();
    let rules = role.rules.unwrap();
    assert_eq!(rules.len(), 3);
    let resources = rules[0].resources.clone().unwrap();
    assert_eq!(resources, vec!["secrets", "configmaps"]);
    assert!(rules[0].verbs.contains(&"delete".to_string()));
    assert_eq!(rules[2].api_groups.clone().unwrap(), vec!["hyperledger.org"]);
}

#[test]
fn task_jobs_run_the_operator_subcommand() {
    let config = OperatorConfig::default();
    let job = task_job(&root(), &config, Task::Cleanup).unwrap();
    assert_eq!(job.metadata.name.as_deref(), Some("net-cleanup"));
    let spec = job.spec.unwrap();
    assert_eq!(spec.backoff_limit, Some(config.job_backoff_limit));
    let pod = spec.template.spec.unwrap();
    assert_eq!(pod.service_account_name.as_deref(), Some("net-bootstrap-sa"));
    assert_eq!(pod.restart_policy.as_deref(), Some("Never"));
    assert_eq!(
        pod.containers[0].args.clone().unwrap(),
        vec!["cleanup", "--namespace", NAMESPACE, "--network", "net"]
    );
}

#[test]
fn besu_command_lists_every_bootnode() {
    let validator = node(NodeRole::Validator, 1, 2);
    let cmd = besu_command(&validator.spec);
    assert!(cmd.starts_with("exec /opt/besu/bin/besu --genesis-file=/etc/genesis/genesis.json"));
    assert!(cmd.contains("--node-private-key-file=/secrets/private.key"));
    assert!(cmd.contains("--rpc-http-api=ETH,NET,IBFT"));
    assert!(cmd.contains(
        "--bootnodes=enode://${BOOTNODE1_PUBKEY}@${NET_BOOTNODE1_SERVICE_HOST}:${NET_BOOTNODE1_SERVICE_PORT},\
         enode://${BOOTNODE2_PUBKEY}@${NET_BOOTNODE2_SERVICE_HOST}:${NET_BOOTNODE2_SERVICE_PORT}"
    ));
}

#[test]
fn members_run_without_a_key_file_and_without_bootnodes_when_none_exist() {
    let member = node(NodeRole::Member, 1, 0);
    let cmd = besu_command(&member.spec);
    assert!(!cmd.contains("--node-private-key-file"));
    assert!(!cmd.contains("--bootnodes"));
    assert_eq!(bootnode_wait_command(&member.spec), "");
}

#[test]
fn wait_command_probes_each_bootnode_liveness() {
    let member = node(NodeRole::Member, 1, 2);
    let port = member.spec.template.rpc.port;
    let cmd = bootnode_wait_command(&member.spec);
    let parts: Vec<&str> = cmd.split(" && ").collect();
    assert_eq!(parts.len(), 2);
    assert!(parts[1].ends_with(&format!("${{NET_BOOTNODE2_SERVICE_HOST}}:{port}/liveness")));
}

#[test]
fn statefulset_mounts_key_only_for_keyed_roles() {
    let helper = OperatorConfig::default().helper_image;
    let validator = statefulset(&node(NodeRole::Validator, 1, 1), &helper).unwrap();
    let pod = validator.spec.clone().unwrap().template.spec.unwrap();
    let volumes: Vec<String> = pod.volumes.unwrap().into_iter().map(|v| v.name).collect();
    assert_eq!(volumes, vec!["genesis-config", "key"]);
    assert_eq!(pod.init_containers.unwrap().len(), 1);
    assert!(pod.containers[0].readiness_probe.is_none());
    assert_eq!(
        pod.service_account_name.as_deref(),
        Some("net-validator1-sa")
    );

    let member = statefulset(&node(NodeRole::Member, 1, 1), &helper).unwrap();
    let spec = member.spec.unwrap();
    assert_eq!(spec.replicas, Some(3));
    assert_eq!(spec.pod_management_policy.as_deref(), Some("OrderedReady"));
    let pod = spec.template.spec.unwrap();
    assert_eq!(pod.volumes.unwrap().len(), 1);
    assert!(pod.containers[0].readiness_probe.is_some());
    let env: Vec<String> = pod.containers[0]
        .env
        .clone()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert!(env.contains(&"BOOTNODE1_PUBKEY".to_string()));
    assert!(!env.contains(&"POD_NAME".to_string()));
}

#[test]
fn bootnodes_do_not_wait_for_themselves() {
    let helper = OperatorConfig::default().helper_image;
    let sts = statefulset(&node(NodeRole::Bootnode, 1, 2), &helper).unwrap();
    let pod = sts.spec.unwrap().template.spec.unwrap();
    assert!(pod.init_containers.unwrap_or_default().is_empty());
}

#[test]
fn statefulset_sync_reconciles_only_image_and_replicas() {
    let helper = OperatorConfig::default().helper_image;
    let desired = statefulset(&node(NodeRole::Member, 1, 1), &helper).unwrap();
    let mut current = desired.clone();
    assert!(!sync_statefulset(&mut current, &desired));

    if let Some(spec) = current.spec.as_mut() {
        spec.replicas = Some(1);
        spec.min_ready_seconds = Some(10);
    }
    assert!(sync_statefulset(&mut current, &desired));
    let spec = current.spec.unwrap();
    assert_eq!(spec.replicas, Some(3));
    assert_eq!(spec.min_ready_seconds, Some(10));
}

#[test]
fn service_selects_the_group_and_exposes_discovery_first() {
    let svc = service(&node(NodeRole::Bootnode, 1, 1)).unwrap();
    let spec = svc.spec.unwrap();
    assert_eq!(spec.selector.unwrap()[LABEL_APP], "net-bootnode1");
    let ports = spec.ports.unwrap();
    assert_eq!(ports[0].name.as_deref(), Some("discovery"));
    assert_eq!(ports[0].protocol.as_deref(), Some("UDP"));
    assert_eq!(ports.len(), 5);
}

#[test]
fn key_read_role_is_scoped_to_one_secret() {
    let group = node(NodeRole::Validator, 3, 1);
    let role = key_read_role(&group).unwrap();
    assert_eq!(role.metadata.name.as_deref(), Some("net-validator3-key-read-role"));
    let rule = &role.rules.unwrap()[0];
    assert_eq!(
        rule.resource_names.clone().unwrap(),
        vec!["net-validator3-key"]
    );
    assert_eq!(rule.verbs, vec!["get"]);

    let rb = role_binding(&group).unwrap();
    assert_eq!(rb.role_ref.name, "net-validator3-key-read-role");
    let subject = &rb.subjects.unwrap()[0];
    assert_eq!(subject.name, "net-validator3-sa");
    assert_eq!(subject.namespace.as_deref(), Some(NAMESPACE));
}
