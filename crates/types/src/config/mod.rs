// Path: crates/types/src/config/mod.rs

//! Runtime configuration for the operator process.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration read from `operator.toml`.
///
/// Every field has a default so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch. `None` watches every namespace the operator can see.
    #[serde(default)]
    pub watch_namespace: Option<String>,
    /// Delay before a soft requeue (waiting on a job or on pod readiness).
    #[serde(default = "default_requeue_interval_secs")]
    pub requeue_interval_secs: u64,
    /// Delay before retrying a reconcile that returned an error.
    #[serde(default = "default_error_requeue_secs")]
    pub error_requeue_secs: u64,
    /// Image that runs the `bootstrap` and `cleanup` subcommands of this binary.
    #[serde(default = "default_task_image")]
    pub task_image: String,
    /// Pull policy for `task_image`.
    #[serde(default = "default_task_image_pull_policy")]
    pub task_image_pull_policy: String,
    /// Retry budget of the bootstrap and cleanup jobs.
    #[serde(default = "default_job_backoff_limit")]
    pub job_backoff_limit: i32,
    /// Image of the init container that waits for bootnode liveness.
    #[serde(default = "default_helper_image")]
    pub helper_image: String,
    /// Listen address of the `/metrics`, `/healthz` and `/readyz` server.
    #[serde(default = "default_metrics_listen_address")]
    pub metrics_listen_address: String,
}

fn default_requeue_interval_secs() -> u64 {
    5
}
fn default_error_requeue_secs() -> u64 {
    30
}
fn default_task_image() -> String {
    "hyperledger/besu-operator:latest".to_string()
}
fn default_task_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}
fn default_job_backoff_limit() -> i32 {
    4
}
fn default_helper_image() -> String {
    "pegasyseng/k8s-helper:v1.18.4".to_string()
}
fn default_metrics_listen_address() -> String {
    "0.0.0.0:9615".to_string()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            requeue_interval_secs: default_requeue_interval_secs(),
            error_requeue_secs: default_error_requeue_secs(),
            task_image: default_task_image(),
            task_image_pull_policy: default_task_image_pull_policy(),
            job_backoff_limit: default_job_backoff_limit(),
            helper_image: default_helper_image(),
            metrics_listen_address: default_metrics_listen_address(),
        }
    }
}

impl OperatorConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = OperatorConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, OperatorConfig::default());
        assert_eq!(cfg.job_backoff_limit, 4);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "watch_namespace = \"besu\"\nrequeue_interval_secs = 2\ntask_image = \"registry.local/besu-operator:dev\""
        )
        .unwrap();

        let cfg = OperatorConfig::load(file.path()).unwrap();
        assert_eq!(cfg.watch_namespace.as_deref(), Some("besu"));
        assert_eq!(cfg.requeue_interval_secs, 2);
        assert_eq!(cfg.task_image, "registry.local/besu-operator:dev");
        assert_eq!(cfg.error_requeue_secs, 30);
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = OperatorConfig::load(Path::new("/nonexistent/operator.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = OperatorConfig::from_toml_str("requeue_interval_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
