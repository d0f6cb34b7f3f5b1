// Path: crates/api/src/cluster/mod.rs

//! The orchestration platform as seen by a reconciler.

use crate::error::ApiError;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Any namespaced object with a static type that the operator reads or writes.
pub trait ManagedObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Serialize
    + DeserializeOwned
    + Debug
    + Send
    + Sync
    + 'static
{
}

impl<T> ManagedObject for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static
{
}

/// Identifies one object of kind `K`, for logging and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// The object's kind.
    pub kind: String,
    /// The object's namespace.
    pub namespace: String,
    /// The object's name.
    pub name: String,
}

impl ObjectRef {
    /// Builds a reference for kind `K`.
    pub fn new<K: ManagedObject>(namespace: &str, name: &str) -> Self {
        Self {
            kind: K::kind(&()).into_owned(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// The `NotFound` error for this object.
    pub fn not_found(&self) -> ApiError {
        ApiError::NotFound {
            kind: self.kind.clone(),
            name: self.name.clone(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// CRUD access to namespaced objects.
///
/// Every method maps platform failures onto [`ApiError`]. Ownership-based
/// garbage collection and finalizer semantics are the platform's job.
#[async_trait]
pub trait ClusterApi: Send + Sync + 'static {
    /// Fetches an object, returning `None` if it does not exist.
    async fn get<K: ManagedObject>(&self, namespace: &str, name: &str)
        -> Result<Option<K>, ApiError>;

    /// Lists objects matching a label selector (`k=v,k2=v2`).
    async fn list<K: ManagedObject>(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<K>, ApiError>;

    /// Creates an object. Fails with `Conflict` if it already exists.
    async fn create<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError>;

    /// Replaces an object's metadata and spec. Fails with `Conflict` if the
    /// object's `resourceVersion` is stale.
    async fn replace<K: ManagedObject>(&self, namespace: &str, object: &K)
        -> Result<K, ApiError>;

    /// Merges `status` into the status subresource.
    async fn patch_status<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
        status: serde_json::Value,
    ) -> Result<K, ApiError>;

    /// Requests deletion. A missing object is not an error.
    async fn delete<K: ManagedObject>(&self, namespace: &str, name: &str) -> Result<(), ApiError>;
}

/// Returns the namespace and name of an object, or the name of the missing field.
pub fn namespaced_name<K: ManagedObject>(object: &K) -> Result<(String, String), &'static str> {
    let meta = object.meta();
    let namespace = meta.namespace.clone().ok_or("metadata.namespace")?;
    let name = meta.name.clone().ok_or("metadata.name")?;
    Ok((namespace, name))
}

/// Returns `true` if the object has been marked for deletion.
pub fn is_deleting<K: ManagedObject>(object: &K) -> bool {
    object.meta().deletion_timestamp.is_some()
}

/// Returns `true` if `finalizer` is present on the object.
pub fn has_finalizer<K: ManagedObject>(object: &K, finalizer: &str) -> bool {
    object
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;

    #[test]
    fn helpers_read_metadata() {
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("net-genesis".into()),
                namespace: Some("besu".into()),
                finalizers: Some(vec!["a".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            namespaced_name(&cm).unwrap(),
            ("besu".to_string(), "net-genesis".to_string())
        );
        assert!(has_finalizer(&cm, "a"));
        assert!(!has_finalizer(&cm, "b"));
        assert!(!is_deleting(&cm));
        assert_eq!(
            ObjectRef::new::<ConfigMap>("besu", "net-genesis").to_string(),
            "ConfigMap/besu/net-genesis"
        );
    }

    #[test]
    fn missing_namespace_is_reported() {
        let cm = ConfigMap::default();
        assert_eq!(namespaced_name(&cm).unwrap_err(), "metadata.namespace");
    }
}
