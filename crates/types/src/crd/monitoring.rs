// Path: crates/types/src/crd/monitoring.rs
//! Monitoring resources created for a network when monitoring is enabled.
//!
//! Their workloads are rendered by a separate monitoring controller; this
//! operator only ensures the objects exist and are owned by the network.

use super::template::{ImageSpec, ResourceSpec};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of the network's Prometheus instance.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "hyperledger.org",
    version = "v1alpha1",
    kind = "Prometheus",
    plural = "prometheus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusSpec {
    /// Name of the owning `BesuNetwork`. Filled in by the operator.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Container resources.
    #[serde(default = "default_monitoring_resources")]
    pub resources: ResourceSpec,
    /// Prometheus image.
    #[serde(default = "default_prometheus_image")]
    pub image: ImageSpec,
    /// Replica count.
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    /// Node port of the query service.
    #[serde(default = "default_prometheus_node_port", rename = "nodeport")]
    pub node_port: i32,
}

fn default_prometheus_image() -> ImageSpec {
    ImageSpec {
        repository: "prom/prometheus".to_string(),
        tag: "v2.11.1".to_string(),
        pull_policy: "IfNotPresent".to_string(),
    }
}
fn default_prometheus_node_port() -> i32 {
    30090
}

impl Default for PrometheusSpec {
    fn default() -> Self {
        Self {
            owner: String::new(),
            resources: default_monitoring_resources(),
            image: default_prometheus_image(),
            replicas: default_replicas(),
            node_port: default_prometheus_node_port(),
        }
    }
}

/// Desired state of the network's Grafana instance.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "hyperledger.org",
    version = "v1alpha1",
    kind = "Grafana",
    plural = "grafanas",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaSpec {
    /// Name of the owning `BesuNetwork`. Filled in by the operator.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Container resources.
    #[serde(default = "default_monitoring_resources")]
    pub resources: ResourceSpec,
    /// Grafana image.
    #[serde(default = "default_grafana_image")]
    pub image: ImageSpec,
    /// Replica count.
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    /// Node port of the dashboard service.
    #[serde(default = "default_grafana_node_port", rename = "nodeport")]
    pub node_port: i32,
}

fn default_monitoring_resources() -> ResourceSpec {
    ResourceSpec {
        mem_request: "256Mi".to_string(),
        cpu_request: "100m".to_string(),
        mem_limit: "512Mi".to_string(),
        cpu_limit: "500m".to_string(),
    }
}
fn default_grafana_image() -> ImageSpec {
    ImageSpec {
        repository: "grafana/grafana".to_string(),
        tag: "6.2.5".to_string(),
        pull_policy: "IfNotPresent".to_string(),
    }
}
fn default_replicas() -> i32 {
    1
}
fn default_grafana_node_port() -> i32 {
    30030
}

impl Default for GrafanaSpec {
    fn default() -> Self {
        Self {
            owner: String::new(),
            resources: default_monitoring_resources(),
            image: default_grafana_image(),
            replicas: default_replicas(),
            node_port: default_grafana_node_port(),
        }
    }
}
