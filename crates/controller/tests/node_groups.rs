// Path: crates/controller/tests/node_groups.rs
mod common;

use besu_controller::Outcome;
use besu_test_utils::assert_controlled_by;
use besu_test_utils::fixtures::{network, NAMESPACE};
use besu_types::crd::BesuNode;
use common::Harness;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};

async fn provisioned(bootnodes: u32, validators: u32, members: u32) -> Harness {
    let h = Harness::new();
    h.seed(&network("net", bootnodes, validators, members));
    h.provision("net").await;
    h
}

fn node(h: &Harness, name: &str) -> BesuNode {
    h.cluster.fetch::<BesuNode>(NAMESPACE, name).unwrap()
}

#[tokio::test]
async fn keyed_group_gets_workload_and_key_access() {
    let h = provisioned(1, 1, 0).await;
    assert_eq!(h.reconcile_node("net-validator1").await.unwrap(), Outcome::Requeue);

    let owner = node(&h, "net-validator1");
    let sts = h.cluster.fetch::<StatefulSet>(NAMESPACE, "net-validator1").unwrap();
    assert_controlled_by!(sts, owner);
    let role = h
        .cluster
        .fetch::<Role>(NAMESPACE, "net-validator1-key-read-role")
        .unwrap();
    assert_controlled_by!(role, owner);
    assert!(h.cluster.contains::<RoleBinding>(NAMESPACE, "net-validator1-rb"));
    assert!(h.cluster.contains::<ServiceAccount>(NAMESPACE, "net-validator1-sa"));
    assert!(h.cluster.contains::<Service>(NAMESPACE, "net-validator1"));
}

#[tokio::test]
async fn member_group_has_no_key_access() {
    let h = provisioned(1, 1, 2).await;
    h.reconcile_node("net-member").await.unwrap();

    assert!(h.cluster.contains::<StatefulSet>(NAMESPACE, "net-member"));
    assert!(h.cluster.contains::<ServiceAccount>(NAMESPACE, "net-member-sa"));
    assert!(!h.cluster.contains::<Role>(NAMESPACE, "net-member-key-read-role"));
    assert!(!h.cluster.contains::<RoleBinding>(NAMESPACE, "net-member-rb"));
}

#[tokio::test]
async fn observed_replicas_flow_into_node_status() {
    let h = provisioned(0, 0, 3).await;
    h.reconcile_node("net-member").await.unwrap();
    h.cluster
        .set_statefulset_replicas(NAMESPACE, "net-member", 3, 2)
        .unwrap();

    assert_eq!(h.reconcile_node("net-member").await.unwrap(), Outcome::Converged);
    let status = node(&h, "net-member").status.unwrap();
    assert_eq!((status.replicas, status.ready_replicas), (3, 2));
}

#[tokio::test]
async fn settled_group_is_not_rewritten() {
    let h = provisioned(1, 0, 0).await;
    h.reconcile_node("net-bootnode1").await.unwrap();
    h.reconcile_node("net-bootnode1").await.unwrap();
    h.cluster.clear_writes();

    assert_eq!(h.reconcile_node("net-bootnode1").await.unwrap(), Outcome::Converged);
    assert_eq!(h.cluster.write_count(), 0, "{:?}", h.cluster.writes());
}

#[tokio::test]
async fn replica_changes_propagate_to_the_statefulset() {
    let h = provisioned(0, 0, 1).await;
    h.reconcile_node("net-member").await.unwrap();

    h.edit("net", |n| n.spec.members = 5).await;
    h.reconcile("net").await.unwrap();
    assert_eq!(h.reconcile_node("net-member").await.unwrap(), Outcome::Requeue);

    let sts = h.cluster.fetch::<StatefulSet>(NAMESPACE, "net-member").unwrap();
    assert_eq!(sts.spec.unwrap().replicas, Some(5));
}

#[tokio::test]
async fn image_changes_propagate_through_both_tiers() {
    let h = provisioned(0, 1, 0).await;
    h.reconcile_node("net-validator1").await.unwrap();

    h.edit("net", |n| n.spec.node.image.tag = "24.1.0".into()).await;
    assert_eq!(h.reconcile("net").await.unwrap(), Outcome::Requeue);
    assert_eq!(h.reconcile_node("net-validator1").await.unwrap(), Outcome::Requeue);

    let sts = h.cluster.fetch::<StatefulSet>(NAMESPACE, "net-validator1").unwrap();
    let image = sts.spec.unwrap().template.spec.unwrap().containers[0]
        .image
        .clone()
        .unwrap();
    assert!(image.ends_with(":24.1.0"));
}

#[tokio::test]
async fn missing_node_converges() {
    let h = Harness::new();
    assert_eq!(h.reconcile_node("net-member").await.unwrap(), Outcome::Converged);
    assert_eq!(h.cluster.write_count(), 0);
}
