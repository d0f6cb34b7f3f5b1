// Path: crates/client/src/cluster_client/mod.rs

use async_trait::async_trait;
use besu_api::cluster::{ClusterApi, ManagedObject};
use besu_types::error::ApiError;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;

/// Maps a kube error onto the operator's error taxonomy.
///
/// Responses the API server produced (`Api`) are classified by status code;
/// anything that never reached a response is a transport failure.
fn map_kube_error(kind: &str, name: &str, err: kube::Error) -> ApiError {
    match err {
        kube::Error::Api(resp) => match resp.code {
            404 => ApiError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            409 => ApiError::Conflict(resp.message),
            code => ApiError::Rejected {
                code,
                message: resp.message,
            },
        },
        kube::Error::SerdeError(e) => ApiError::Serialization(e.to_string()),
        other => ApiError::Transport(other.to_string()),
    }
}

fn object_name<K: ManagedObject>(object: &K) -> Result<String, ApiError> {
    object
        .meta()
        .name
        .clone()
        .ok_or_else(|| ApiError::Serialization("object has no metadata.name".into()))
}

/// A [`ClusterApi`] backed by a `kube::Client`.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl std::fmt::Debug for KubeClusterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterApi")
            .field("default_namespace", &self.client.default_namespace())
            .finish_non_exhaustive()
    }
}

impl KubeClusterApi {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects using the in-cluster service account or the local kubeconfig.
    pub async fn try_default() -> Result<Self, ApiError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// The underlying client, for building watchers.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K: ManagedObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn get<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>, ApiError> {
        self.api::<K>(namespace)
            .get_opt(name)
            .await
            .map_err(|e| map_kube_error(&K::kind(&()), name, e))
    }

    async fn list<K: ManagedObject>(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<K>, ApiError> {
        let params = ListParams::default().labels(label_selector);
        let list = self
            .api::<K>(namespace)
            .list(&params)
            .await
            .map_err(|e| map_kube_error(&K::kind(&()), label_selector, e))?;
        Ok(list.items)
    }

    async fn create<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let name = object_name(object)?;
        let kind = K::kind(&());
        tracing::debug!(target: "client", %kind, %namespace, %name, "create");
        self.api::<K>(namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| map_kube_error(&kind, &name, e))
    }

    async fn replace<K: ManagedObject>(
        &self,
        namespace: &str,
        object: &K,
    ) -> Result<K, ApiError> {
        let name = object_name(object)?;
        let kind = K::kind(&());
        tracing::debug!(target: "client", %kind, %namespace, %name, "replace");
        self.api::<K>(namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| map_kube_error(&kind, &name, e))
    }

    async fn patch_status<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
        status: serde_json::Value,
    ) -> Result<K, ApiError> {
        let patch = serde_json::json!({ "status": status });
        self.api::<K>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_kube_error(&K::kind(&()), name, e))
    }

    async fn delete<K: ManagedObject>(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        let kind = K::kind(&());
        tracing::debug!(target: "client", %kind, %namespace, %name, "delete");
        // Background propagation so Jobs take their Pods with them.
        match self
            .api::<K>(namespace)
            .delete(name, &DeleteParams::background())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match map_kube_error(&kind, name, e) {
                ApiError::NotFound { .. } => Ok(()),
                other => Err(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: format!("status {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(map_kube_error("Secret", "a", api_error(404)).is_not_found());
        assert!(map_kube_error("Secret", "a", api_error(409)).is_conflict());
        assert_eq!(
            map_kube_error("Secret", "a", api_error(422)),
            ApiError::Rejected {
                code: 422,
                message: "status 422".into()
            }
        );
    }

    #[test]
    fn not_found_carries_kind_and_name() {
        assert_eq!(
            map_kube_error("Job", "net-cleanup", api_error(404)),
            ApiError::NotFound {
                kind: "Job".into(),
                name: "net-cleanup".into()
            }
        );
    }
}
