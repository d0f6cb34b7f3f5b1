// Path: crates/controller/src/context.rs
//! The per-pass context shared by both reconcilers and the outcome of a pass.

use besu_api::cluster::ClusterApi;
use besu_telemetry::MetricsSink;
use besu_types::config::OperatorConfig;
use std::time::Duration;

/// Everything a reconcile pass needs, passed explicitly.
pub struct Context<C> {
    /// The cluster.
    pub api: C,
    /// Operator settings.
    pub config: OperatorConfig,
    /// Where reconcile, write and lifecycle events are counted.
    pub metrics: &'static dyn MetricsSink,
}

impl<C> std::fmt::Debug for Context<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: ClusterApi> Context<C> {
    /// Bundles the collaborators of a reconciler.
    pub fn new(api: C, config: OperatorConfig, metrics: &'static dyn MetricsSink) -> Self {
        Self {
            api,
            config,
            metrics,
        }
    }

    /// Delay before a soft requeue.
    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.config.requeue_interval_secs)
    }
}

/// The result of a successful reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Observed state matches desired state; wait for the next change.
    Converged,
    /// Progress was made or is pending elsewhere; run again shortly.
    Requeue,
}

impl Outcome {
    /// Whether another pass should be scheduled.
    pub fn requeue(self) -> bool {
        self == Self::Requeue
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::Requeue => "requeue",
        }
    }

    /// `Requeue` if either outcome is.
    pub fn and(self, other: Self) -> Self {
        if self.requeue() || other.requeue() {
            Self::Requeue
        } else {
            Self::Converged
        }
    }
}
