// Path: crates/controller/src/ensure.rs
//! Get-or-create with a drift comparator.

use crate::context::Context;
use besu_api::cluster::{namespaced_name, ClusterApi, ManagedObject};
use besu_types::error::ReconcileError;

/// What [`ensure`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Ensured<K> {
    /// The object did not exist and was created.
    Created(K),
    /// The object existed and drifted fields were written back.
    Updated(K),
    /// The object existed and matched.
    Unchanged(K),
}

impl<K> Ensured<K> {
    /// Whether a write was made.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }

    /// The object as last seen.
    pub fn get(&self) -> &K {
        match self {
            Self::Created(k) | Self::Updated(k) | Self::Unchanged(k) => k,
        }
    }

    /// Unwraps the object as last seen.
    pub fn into_inner(self) -> K {
        match self {
            Self::Created(k) | Self::Updated(k) | Self::Unchanged(k) => k,
        }
    }
}

/// Makes sure `desired` exists.
///
/// If it is absent it is created as given. If it exists, `sync` is called
/// with the live object and `desired`; it copies the reconciled fields over
/// and returns `true` if anything changed, in which case the live object is
/// written back. Fields `sync` does not touch are never modified.
pub async fn ensure<C, K, F>(
    ctx: &Context<C>,
    desired: K,
    sync: F,
) -> Result<Ensured<K>, ReconcileError>
where
    C: ClusterApi,
    K: ManagedObject,
    F: FnOnce(&mut K, &K) -> bool + Send,
{
    let (namespace, name) = namespaced_name(&desired).map_err(ReconcileError::MissingMetadata)?;
    let kind = K::kind(&());
    match ctx.api.get::<K>(&namespace, &name).await? {
        None => {
            let created = ctx.api.create(&namespace, &desired).await?;
            ctx.metrics.inc_child_write(&kind, "create");
            tracing::info!(target: "reconcile", %kind, %namespace, %name, "created");
            Ok(Ensured::Created(created))
        }
        Some(mut current) => {
            if !sync(&mut current, &desired) {
                return Ok(Ensured::Unchanged(current));
            }
            let updated = ctx.api.replace(&namespace, &current).await?;
            ctx.metrics.inc_child_write(&kind, "update");
            tracing::info!(target: "reconcile", %kind, %namespace, %name, "updated drifted fields");
            Ok(Ensured::Updated(updated))
        }
    }
}

/// Makes sure `desired` exists, never modifying it once it does.
pub async fn ensure_exists<C, K>(ctx: &Context<C>, desired: K) -> Result<Ensured<K>, ReconcileError>
where
    C: ClusterApi,
    K: ManagedObject,
{
    ensure(ctx, desired, |_, _| false).await
}
