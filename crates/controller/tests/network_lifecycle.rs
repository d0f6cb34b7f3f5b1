// Path: crates/controller/tests/network_lifecycle.rs
mod common;

use besu_api::cluster::ClusterApi;
use besu_consensus::ibft2::extra_data_hex;
use besu_consensus::GenesisDocument;
use besu_controller::Outcome;
use besu_crypto::address::parse_address;
use besu_test_utils::assert_controlled_by;
use besu_test_utils::fixtures::{
    network, supplied_key, ADDRESS_OF_KEY_ONE, ADDRESS_OF_KEY_TWO, NAMESPACE,
};
use besu_types::crd::{BesuNode, Grafana, NodeRole, Prometheus, ProvisioningState};
use besu_types::keys::{genesis_config_map_name, FINALIZER, GENESIS_FILE_KEY};
use common::Harness;
use k8s_openapi::api::core::v1::ConfigMap;

fn stored_genesis(h: &Harness, name: &str) -> GenesisDocument {
    let cm = h
        .cluster
        .fetch::<ConfigMap>(NAMESPACE, &genesis_config_map_name(name))
        .unwrap();
    GenesisDocument::from_json(&cm.data.unwrap()[GENESIS_FILE_KEY]).unwrap()
}

#[tokio::test]
async fn absent_network_converges_without_writes() {
    let h = Harness::new();
    assert_eq!(h.reconcile("missing").await.unwrap(), Outcome::Converged);
    assert_eq!(h.cluster.write_count(), 0);
}

#[tokio::test]
async fn first_pass_attaches_guard_and_enters_provisioning() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 0));
    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);

    let stored = h.network("net");
    assert_eq!(stored.metadata.finalizers, Some(vec![FINALIZER.to_string()]));
    assert_eq!(h.key_state("net"), ProvisioningState::Provisioning);
    assert_eq!(h.sink.count("key_state:Provisioning"), 1);
    assert_eq!(h.sink.count("finalizer:guard_added"), 1);
}

#[tokio::test]
async fn provisioning_takes_one_step_per_pass() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 0));
    h.reconcile("net").await.unwrap();
    h.cluster.clear_writes();

    for expected in ["Role", "RoleBinding", "ServiceAccount", "Job"] {
        assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
        let writes = h.cluster.writes();
        assert_eq!(writes.len(), 1, "one write per pass, got {writes:?}");
        assert_eq!(writes[0].kind, expected);
        h.cluster.clear_writes();
    }

    // The job has not finished; nothing else happens.
    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    assert_eq!(h.cluster.write_count(), 0);
    assert_eq!(h.key_state("net"), ProvisioningState::Provisioning);
}

#[tokio::test]
async fn failed_bootstrap_job_blocks_progress() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 0));
    h.start_bootstrap("net").await;
    h.cluster
        .fail_job(NAMESPACE, "net-bootstrap", h.ctx.config.job_backoff_limit)
        .unwrap();

    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    assert_eq!(h.key_state("net"), ProvisioningState::Provisioning);
    assert!(h.cluster.names::<BesuNode>(NAMESPACE).is_empty());
}

#[tokio::test]
async fn ready_network_gets_one_group_per_slot() {
    let h = Harness::new();
    let root = h.seed(&network("net", 2, 3, 2));
    h.provision("net").await;

    assert_eq!(
        h.cluster.names::<BesuNode>(NAMESPACE),
        vec![
            "net-bootnode1",
            "net-bootnode2",
            "net-member",
            "net-validator1",
            "net-validator2",
            "net-validator3",
        ]
    );
    let member = h.cluster.fetch::<BesuNode>(NAMESPACE, "net-member").unwrap();
    assert_eq!(member.spec.role, NodeRole::Member);
    assert_eq!(member.spec.replicas, 2);
    assert_eq!(member.spec.bootnodes, 2);
    assert_controlled_by!(member, root);

    let provisioned = h.network("net").status.unwrap().provisioned.unwrap();
    assert_eq!((provisioned.bootnodes, provisioned.validators), (2, 3));
}

#[tokio::test]
async fn convergence_is_reported_only_when_every_role_is_ready() {
    let h = Harness::new();
    h.seed(&network("net", 1, 2, 3));
    h.provision("net").await;

    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    let status = h.network("net").status.unwrap();
    assert_eq!(status.bootnodes_ready, "0/1");
    assert_eq!(status.validators_ready, "0/2");
    assert_eq!(status.members_ready, "0/3");

    h.mark_groups_ready();
    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Converged);
    let status = h.network("net").status.unwrap();
    assert_eq!(status.bootnodes_ready, "1/1");
    assert_eq!(status.validators_ready, "2/2");
    assert_eq!(status.members_ready, "3/3");
}

#[tokio::test]
async fn converged_network_is_not_rewritten() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 1));
    h.provision("net").await;
    h.mark_groups_ready();
    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Converged);

    h.cluster.clear_writes();
    for _ in 0..3 {
        assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Converged);
    }
    assert_eq!(h.cluster.write_count(), 0, "{:?}", h.cluster.writes());
}

#[tokio::test]
async fn drifted_replicas_are_written_back_and_requeued() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 2));
    h.provision("net").await;
    h.mark_groups_ready();
    h.reconcile("net").await.unwrap();

    h.edit("net", |n| n.spec.members = 4).await;

    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    let member = h.cluster.fetch::<BesuNode>(NAMESPACE, "net-member").unwrap();
    assert_eq!(member.spec.replicas, 4);
    assert_eq!(h.network("net").status.unwrap().members_ready, "2/4");
}

#[tokio::test]
async fn genesis_extra_data_lists_validator_slots_in_order() {
    let h = Harness::new();
    let mut root = network("net", 1, 2, 0);
    root.spec.validator_keys = vec![supplied_key(1).unwrap(), supplied_key(2).unwrap()];
    // A bootnode key must never end up in the validator set.
    root.spec.bootnode_keys = vec![supplied_key(3).unwrap()];
    h.seed(&root);
    let report = h.provision("net").await;

    assert_eq!(report.validators, vec![ADDRESS_OF_KEY_ONE, ADDRESS_OF_KEY_TWO]);
    let expected = extra_data_hex(&[
        parse_address(ADDRESS_OF_KEY_ONE).unwrap(),
        parse_address(ADDRESS_OF_KEY_TWO).unwrap(),
    ]);
    assert_eq!(stored_genesis(&h, "net").extra_data, expected);
}

#[tokio::test]
async fn missing_genesis_is_rebuilt_identically() {
    let h = Harness::new();
    h.seed(&network("net", 0, 3, 0));
    h.provision("net").await;
    let before = stored_genesis(&h, "net");

    h.cluster
        .delete::<ConfigMap>(NAMESPACE, &genesis_config_map_name("net"))
        .await
        .unwrap();
    h.reconcile("net").await.unwrap();
    assert_eq!(stored_genesis(&h, "net"), before);
}

#[tokio::test]
async fn ready_is_never_cleared_when_supplied_keys_are_removed() {
    let h = Harness::new();
    let mut root = network("net", 0, 1, 0);
    root.spec.validator_keys = vec![supplied_key(1).unwrap()];
    h.seed(&root);
    h.provision("net").await;

    h.edit("net", |n| n.spec.validator_keys.clear()).await;
    h.reconcile("net").await.unwrap();
    assert_eq!(h.key_state("net"), ProvisioningState::Ready);
    let expected = extra_data_hex(&[parse_address(ADDRESS_OF_KEY_ONE).unwrap()]);
    assert_eq!(stored_genesis(&h, "net").extra_data, expected);
}

#[tokio::test]
async fn counts_raised_after_ready_are_not_provisioned() {
    let h = Harness::new();
    h.seed(&network("net", 1, 1, 0));
    h.provision("net").await;

    h.edit("net", |n| n.spec.validators_count = 3).await;
    h.mark_groups_ready();

    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    assert!(!h.cluster.contains::<BesuNode>(NAMESPACE, "net-validator2"));
    assert_eq!(h.network("net").status.unwrap().validators_ready, "1/3");
}

#[tokio::test]
async fn monitoring_objects_are_created_when_enabled() {
    let h = Harness::new();
    let mut root = network("net", 0, 1, 0);
    root.spec.monitoring = true;
    root.spec.prometheus.node_port = 31090;
    root.spec.prometheus.replicas = 2;
    root.spec.grafana.replicas = 3;
    let root = h.seed(&root);
    h.provision("net").await;

    let grafana = h.cluster.fetch::<Grafana>(NAMESPACE, "net-grafana").unwrap();
    assert_eq!(grafana.spec.owner, "net");
    assert_eq!(grafana.spec.replicas, 3);
    assert_controlled_by!(grafana, root);
    let prometheus = h.cluster.fetch::<Prometheus>(NAMESPACE, "net-prometheus").unwrap();
    assert_eq!(prometheus.spec.owner, "net");
    assert_eq!(prometheus.spec.node_port, 31090);
    assert_eq!(prometheus.spec.replicas, 2);
    assert_eq!(prometheus.spec.image.repository, "prom/prometheus");
    assert_controlled_by!(prometheus, root);
}

#[tokio::test]
async fn invalid_supplied_key_is_surfaced() {
    let h = Harness::new();
    let mut root = network("net", 0, 1, 0);
    let mut key = supplied_key(1).unwrap();
    key.private_key = supplied_key(2).unwrap().private_key;
    root.spec.validator_keys = vec![key];
    h.seed(&root);

    let err = h.reconcile("net").await.unwrap_err();
    assert_eq!(err.kind(), "crypto");
    assert_eq!(h.key_state("net"), ProvisioningState::NoKeys);
}
