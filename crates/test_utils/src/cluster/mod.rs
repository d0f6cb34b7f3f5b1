//! An in-memory stand-in for the orchestration platform.
//!
//! Objects are stored as JSON, keyed by `apiVersion/kind`, namespace and name.
//! The double models the parts of the API server the reconcilers rely on:
//! uid and `resourceVersion` assignment, optimistic concurrency on replace,
//! the status subresource, finalizer-gated deletion and owner-based garbage
//! collection. Every successful write is recorded so tests can assert on
//! idempotence.

use async_trait::async_trait;
use besu_api::cluster::{ClusterApi, ManagedObject};
use besu_types::error::ApiError;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::batch::v1::Job;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Timestamp stamped on objects whose deletion is deferred by a finalizer.
pub const DELETION_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

/// A mutating API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    /// `create`
    Create,
    /// `replace`
    Replace,
    /// `patch_status`
    PatchStatus,
    /// `delete`
    Delete,
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    /// The call that was made.
    pub verb: Verb,
    /// Kind of the object written.
    pub kind: String,
    /// Name of the object written.
    pub name: String,
}

type Key = (String, String, String);

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<Key, Value>,
    writes: Vec<Write>,
    failures: Vec<(Verb, String, ApiError)>,
    next_uid: u64,
}

impl State {
    fn take_failure(&mut self, verb: Verb, type_key: &str) -> Option<ApiError> {
        let pos = self
            .failures
            .iter()
            .position(|(v, k, _)| *v == verb && k == type_key)?;
        Some(self.failures.remove(pos).2)
    }

    fn record(&mut self, verb: Verb, kind: &str, name: &str) {
        self.writes.push(Write {
            verb,
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }

    fn assign_identity(&mut self, meta: &mut Map<String, Value>, namespace: &str) {
        self.next_uid += 1;
        meta.insert("namespace".into(), json!(namespace));
        meta.insert("uid".into(), json!(format!("uid-{}", self.next_uid)));
        meta.insert("resourceVersion".into(), json!("1"));
    }

    /// Removes an object and, transitively, everything it owns.
    fn remove_cascading(&mut self, key: &Key) {
        let mut pending: Vec<String> = Vec::new();
        if let Some(removed) = self.objects.remove(key) {
            pending.extend(uid_of(&removed));
        }
        while let Some(uid) = pending.pop() {
            let owned: Vec<Key> = self
                .objects
                .iter()
                .filter(|(_, v)| owner_uids(v).any(|u| u == uid))
                .map(|(k, _)| k.clone())
                .collect();
            for k in owned {
                if let Some(child) = self.objects.remove(&k) {
                    pending.extend(uid_of(&child));
                }
            }
        }
    }
}

fn type_key<K: ManagedObject>() -> String {
    format!("{}/{}", K::api_version(&()), K::kind(&()))
}

fn encode<K: ManagedObject>(object: &K) -> Result<Value, ApiError> {
    serde_json::to_value(object).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<K: ManagedObject>(value: &Value) -> Result<K, ApiError> {
    serde_json::from_value(value.clone()).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn meta_mut(value: &mut Value) -> Result<&mut Map<String, Value>, ApiError> {
    value
        .as_object_mut()
        .and_then(|o| {
            o.entry("metadata")
                .or_insert_with(|| json!({}))
                .as_object_mut()
        })
        .ok_or_else(|| ApiError::Serialization("object has no metadata".into()))
}

fn meta_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get("metadata")?.get(field)?.as_str()
}

fn uid_of(value: &Value) -> Option<String> {
    meta_str(value, "uid").map(str::to_string)
}

fn owner_uids(value: &Value) -> impl Iterator<Item = &str> {
    value
        .get("metadata")
        .and_then(|m| m.get("ownerReferences"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|r| r.get("uid").and_then(Value::as_str))
}

fn has_finalizers(value: &Value) -> bool {
    value
        .get("metadata")
        .and_then(|m| m.get("finalizers"))
        .and_then(Value::as_array)
        .is_some_and(|f| !f.is_empty())
}

fn bump_version(meta: &mut Map<String, Value>) {
    let next = meta
        .get("resourceVersion")
        .and_then(Value::as_str)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    meta.insert("resourceVersion".into(), json!(next.to_string()));
}

fn matches_selector(value: &Value, selector: &str) -> bool {
    let labels = value.get("metadata").and_then(|m| m.get("labels"));
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels
                .and_then(|l| l.get(k))
                .and_then(Value::as_str)
                .is_some_and(|actual| actual == v),
            None => labels.and_then(|l| l.get(term)).is_some(),
        })
}

/// JSON merge patch (RFC 7386).
fn merge(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(t), Some(p)) => {
            for (k, v) in p {
                if v.is_null() {
                    t.remove(k);
                } else {
                    merge(t.entry(k.clone()).or_insert(Value::Null), v);
                }
            }
        }
        (None, Some(_)) => {
            *target = json!({});
            merge(target, patch);
        }
        _ => *target = patch.clone(),
    }
}

/// An in-memory [`ClusterApi`]. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    state: Arc<Mutex<State>>,
}

impl InMemoryCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores an object verbatim, status included, assigning a uid. Used to
    /// seed a scenario; not recorded as a write.
    pub fn insert<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let mut value = encode(object)?;
        let name = meta_str(&value, "name")
            .ok_or_else(|| ApiError::Serialization("object has no metadata.name".into()))?
            .to_string();
        let mut state = self.lock();
        state.assign_identity(meta_mut(&mut value)?, namespace);
        state
            .objects
            .insert((type_key::<K>(), namespace.to_string(), name), value.clone());
        decode(&value)
    }

    /// Reads an object without going through the async API.
    pub fn fetch<K: ManagedObject>(&self, namespace: &str, name: &str) -> Option<K> {
        let state = self.lock();
        state
            .objects
            .get(&(type_key::<K>(), namespace.to_string(), name.to_string()))
            .and_then(|v| decode(v).ok())
    }

    /// Returns `true` if the object exists.
    pub fn contains<K: ManagedObject>(&self, namespace: &str, name: &str) -> bool {
        self.lock()
            .objects
            .contains_key(&(type_key::<K>(), namespace.to_string(), name.to_string()))
    }

    /// Names of every stored object of kind `K` in `namespace`, sorted.
    pub fn names<K: ManagedObject>(&self, namespace: &str) -> Vec<String> {
        let tk = type_key::<K>();
        self.lock()
            .objects
            .keys()
            .filter(|(t, ns, _)| *t == tk && ns == namespace)
            .map(|(_, _, name)| name.clone())
            .collect()
    }

    /// Merges `status` into an object as another controller would, without
    /// recording a write.
    pub fn set_status<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
        status: Value,
    ) -> Result<(), ApiError> {
        let mut state = self.lock();
        let key = (type_key::<K>(), namespace.to_string(), name.to_string());
        let value = state.objects.get_mut(&key).ok_or_else(|| ApiError::NotFound {
            kind: K::kind(&()).into_owned(),
            name: name.to_string(),
        })?;
        merge(value, &json!({ "status": status }));
        bump_version(meta_mut(value)?);
        Ok(())
    }

    /// Marks a Job as having completed successfully.
    pub fn complete_job(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        self.set_status::<Job>(namespace, name, json!({ "succeeded": 1 }))
    }

    /// Records `failed` failed pods on a Job.
    pub fn fail_job(&self, namespace: &str, name: &str, failed: i32) -> Result<(), ApiError> {
        self.set_status::<Job>(namespace, name, json!({ "failed": failed }))
    }

    /// Reports a StatefulSet's observed and ready replica counts.
    pub fn set_statefulset_replicas(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
        ready: i32,
    ) -> Result<(), ApiError> {
        self.set_status::<StatefulSet>(
            namespace,
            name,
            json!({ "replicas": replicas, "readyReplicas": ready }),
        )
    }

    /// Makes the next `verb` on kind `K` fail with `error`.
    pub fn fail_next<K: ManagedObject>(&self, verb: Verb, error: ApiError) {
        self.lock().failures.push((verb, type_key::<K>(), error));
    }

    /// Every write recorded so far, in order.
    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Forgets recorded writes.
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    fn do_get<K: ManagedObject>(&self, namespace: &str, name: &str) -> Result<Option<K>, ApiError> {
        self.lock()
            .objects
            .get(&(type_key::<K>(), namespace.to_string(), name.to_string()))
            .map(decode)
            .transpose()
    }

    fn do_list<K: ManagedObject>(&self, namespace: &str, selector: &str) -> Result<Vec<K>, ApiError> {
        let tk = type_key::<K>();
        self.lock()
            .objects
            .iter()
            .filter(|((t, ns, _), v)| *t == tk && ns == namespace && matches_selector(v, selector))
            .map(|(_, v)| decode(v))
            .collect()
    }

    fn do_create<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let tk = type_key::<K>();
        let kind = K::kind(&());
        let mut value = encode(object)?;
        let name = meta_str(&value, "name")
            .ok_or_else(|| ApiError::Serialization("object has no metadata.name".into()))?
            .to_string();
        let mut state = self.lock();
        if let Some(err) = state.take_failure(Verb::Create, &tk) {
            return Err(err);
        }
        let key = (tk, namespace.to_string(), name.clone());
        if state.objects.contains_key(&key) {
            return Err(ApiError::Conflict(format!("{kind} {name} already exists")));
        }
        if let Some(obj) = value.as_object_mut() {
            obj.remove("status");
        }
        {
            let meta = meta_mut(&mut value)?;
            meta.remove("deletionTimestamp");
            state.assign_identity(meta, namespace);
        }
        state.objects.insert(key, value.clone());
        state.record(Verb::Create, &kind, &name);
        decode(&value)
    }

    fn do_replace<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let tk = type_key::<K>();
        let kind = K::kind(&());
        let mut value = encode(object)?;
        let name = meta_str(&value, "name")
            .ok_or_else(|| ApiError::Serialization("object has no metadata.name".into()))?
            .to_string();
        let mut state = self.lock();
        if let Some(err) = state.take_failure(Verb::Replace, &tk) {
            return Err(err);
        }
        let key = (tk, namespace.to_string(), name.clone());
        let existing = state.objects.get(&key).cloned().ok_or_else(|| ApiError::NotFound {
            kind: kind.to_string(),
            name: name.clone(),
        })?;
        if let Some(rv) = meta_str(&value, "resourceVersion") {
            if Some(rv) != meta_str(&existing, "resourceVersion") {
                return Err(ApiError::Conflict(format!(
                    "{kind} {name}: resourceVersion {rv} is stale"
                )));
            }
        }

        if let Some(obj) = value.as_object_mut() {
            obj.remove("status");
            if let Some(status) = existing.get("status") {
                obj.insert("status".into(), status.clone());
            }
        }
        {
            let meta = meta_mut(&mut value)?;
            meta.insert("namespace".into(), json!(namespace));
            for field in ["uid", "resourceVersion", "deletionTimestamp"] {
                match existing.get("metadata").and_then(|m| m.get(field)) {
                    Some(v) => meta.insert(field.into(), v.clone()),
                    None => meta.remove(field),
                };
            }
            bump_version(meta);
        }
        state.record(Verb::Replace, &kind, &name);

        let deleting = meta_str(&value, "deletionTimestamp").is_some();
        if deleting && !has_finalizers(&value) {
            state.objects.insert(key.clone(), value.clone());
            state.remove_cascading(&key);
        } else {
            state.objects.insert(key, value.clone());
        }
        decode(&value)
    }

    fn do_patch_status<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
        status: Value,
    ) -> Result<K, ApiError> {
        let tk = type_key::<K>();
        let kind = K::kind(&());
        let mut state = self.lock();
        if let Some(err) = state.take_failure(Verb::PatchStatus, &tk) {
            return Err(err);
        }
        let key = (tk, namespace.to_string(), name.to_string());
        let value = state.objects.get_mut(&key).ok_or_else(|| ApiError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        })?;
        merge(value, &json!({ "status": status }));
        bump_version(meta_mut(value)?);
        let updated = value.clone();
        state.record(Verb::PatchStatus, &kind, name);
        decode(&updated)
    }

    fn do_delete<K: ManagedObject>(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        let tk = type_key::<K>();
        let kind = K::kind(&());
        let mut state = self.lock();
        if let Some(err) = state.take_failure(Verb::Delete, &tk) {
            return Err(err);
        }
        let key = (tk, namespace.to_string(), name.to_string());
        let Some(value) = state.objects.get_mut(&key) else {
            return Ok(());
        };
        if has_finalizers(value) {
            let meta = meta_mut(value)?;
            if !meta.contains_key("deletionTimestamp") {
                meta.insert("deletionTimestamp".into(), json!(DELETION_TIMESTAMP));
                bump_version(meta);
            }
        } else {
            state.remove_cascading(&key);
        }
        state.record(Verb::Delete, &kind, name);
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for InMemoryCluster {
    async fn get<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>, ApiError> {
        self.do_get(namespace, name)
    }

    async fn list<K: ManagedObject>(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<K>, ApiError> {
        self.do_list(namespace, label_selector)
    }

    async fn create<K: ManagedObject>(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        self.do_create(namespace, object)
    }

    async fn replace<K: ManagedObject>(
        &self,
        namespace: &str,
        object: &K,
    ) -> Result<K, ApiError> {
        self.do_replace(namespace, object)
    }

    async fn patch_status<K: ManagedObject>(
        &self,
        namespace: &str,
        name: &str,
        status: Value,
    ) -> Result<K, ApiError> {
        self.do_patch_status(namespace, name, status)
    }

    async fn delete<K: ManagedObject>(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        self.do_delete::<K>(namespace, name)
    }
}
