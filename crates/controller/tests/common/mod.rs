// Path: crates/controller/tests/common/mod.rs
#![allow(dead_code)]

use besu_api::cluster::ClusterApi;
use besu_controller::bootstrap::{run_bootstrap, BootstrapReport};
use besu_controller::network::reconcile_network;
use besu_controller::node::reconcile_node;
use besu_controller::{Context, Outcome};
use besu_test_utils::fixtures::NAMESPACE;
use besu_test_utils::randomness::TestRng;
use besu_test_utils::{InMemoryCluster, RecordingSink};
use besu_types::config::OperatorConfig;
use besu_types::crd::{BesuNetwork, BesuNode, ProvisioningState};
use besu_types::error::ReconcileError;
use besu_types::keys::bootstrap_job_name;
use k8s_openapi::api::batch::v1::Job;
use serde_json::json;

/// A cluster, a recording sink and a context over both.
pub struct Harness {
    pub cluster: InMemoryCluster,
    pub sink: &'static RecordingSink,
    pub ctx: Context<InMemoryCluster>,
}

impl Harness {
    pub fn new() -> Self {
        let cluster = InMemoryCluster::new();
        let sink = RecordingSink::leaked();
        let ctx = Context::new(cluster.clone(), OperatorConfig::default(), sink);
        Self { cluster, sink, ctx }
    }

    pub fn seed(&self, network: &BesuNetwork) -> BesuNetwork {
        self.cluster.insert(NAMESPACE, network).unwrap()
    }

    pub fn network(&self, name: &str) -> BesuNetwork {
        self.cluster.fetch::<BesuNetwork>(NAMESPACE, name).unwrap()
    }

    /// Applies a user edit to a stored network.
    pub async fn edit(&self, name: &str, f: impl FnOnce(&mut BesuNetwork)) {
        let mut network = self.network(name);
        f(&mut network);
        self.cluster.replace(NAMESPACE, &network).await.unwrap();
    }

    pub fn key_state(&self, name: &str) -> ProvisioningState {
        self.network(name)
            .status
            .map(|s| s.key_state)
            .unwrap_or_default()
    }

    pub async fn reconcile(&self, name: &str) -> Result<Outcome, ReconcileError> {
        reconcile_network(&self.ctx, NAMESPACE, name).await
    }

    pub async fn reconcile_node(&self, name: &str) -> Result<Outcome, ReconcileError> {
        reconcile_node(&self.ctx, NAMESPACE, name).await
    }

    /// Reconciles until the bootstrap job exists, without running it.
    pub async fn start_bootstrap(&self, name: &str) {
        for _ in 0..10 {
            if self.cluster.contains::<Job>(NAMESPACE, &bootstrap_job_name(name)) {
                return;
            }
            assert_eq!(self.reconcile(name).await.unwrap(), Outcome::Requeue);
        }
        panic!("bootstrap job was never created");
    }

    /// Runs the bootstrap task as its Job would and marks the Job succeeded.
    pub async fn run_bootstrap_job(&self, name: &str, seed: u64) -> BootstrapReport {
        let mut rng = TestRng::new(seed);
        let report = run_bootstrap(&self.cluster, NAMESPACE, name, &mut rng)
            .await
            .unwrap();
        self.cluster
            .complete_job(NAMESPACE, &bootstrap_job_name(name))
            .unwrap();
        report
    }

    /// Takes a fresh network all the way to `Ready` with its node groups created.
    pub async fn provision(&self, name: &str) -> BootstrapReport {
        self.start_bootstrap(name).await;
        let report = self.run_bootstrap_job(name, 7).await;
        self.reconcile(name).await.unwrap();
        assert_eq!(self.key_state(name), ProvisioningState::Ready);
        report
    }

    /// Reports every node group as fully ready, as the node controller would.
    pub fn mark_groups_ready(&self) {
        for group in self.cluster.names::<BesuNode>(NAMESPACE) {
            let node = self.cluster.fetch::<BesuNode>(NAMESPACE, &group).unwrap();
            self.cluster
                .set_status::<BesuNode>(
                    NAMESPACE,
                    &group,
                    json!({ "replicas": node.spec.replicas, "readyReplicas": node.spec.replicas }),
                )
                .unwrap();
        }
    }
}
