// Path: crates/controller/src/bootstrap.rs
//! The one-shot tasks the reconciler schedules as Jobs.
//!
//! `bootstrap` writes one key secret per bootnode and validator slot and the
//! genesis config map; `cleanup` deletes them again. Both are idempotent and
//! may be retried by the Job controller at any point.

use crate::graph::network::{genesis_config_map, key_secret};
use crate::keys::{slot_sources, validate_supplied, KeySource};
use besu_api::cluster::{ClusterApi, ObjectRef};
use besu_consensus::GenesisBuilder;
use besu_crypto::{format_address, NodeKeyPair};
use besu_types::crd::{BesuNetwork, NodeRole};
use besu_types::error::ReconcileError;
use besu_types::keys::{
    genesis_config_map_name, key_secret_name, key_secret_selector, node_group_name,
    PUBLIC_KEY_FIELD,
};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use rand::{CryptoRng, RngCore};

/// What a bootstrap run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Key secrets written by this run.
    pub created_secrets: Vec<String>,
    /// Key secrets that already existed and were kept.
    pub skipped_secrets: Vec<String>,
    /// Whether this run wrote the genesis config map.
    pub genesis_created: bool,
    /// Validator addresses in extraData order.
    pub validators: Vec<String>,
}

/// What a cleanup run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Key secrets deleted.
    pub deleted_secrets: Vec<String>,
    /// Whether the genesis config map was deleted.
    pub genesis_deleted: bool,
}

async fn load_network<C: ClusterApi>(
    api: &C,
    namespace: &str,
    name: &str,
) -> Result<BesuNetwork, ReconcileError> {
    api.get::<BesuNetwork>(namespace, name)
        .await?
        .ok_or_else(|| ObjectRef::new::<BesuNetwork>(namespace, name).not_found().into())
}

/// The `public.key` field of a key secret.
pub fn stored_public_key(secret: &Secret) -> Result<String, ReconcileError> {
    let object = secret.metadata.name.clone().unwrap_or_default();
    let corrupt = |reason: &str| ReconcileError::CorruptData {
        object: object.clone(),
        reason: reason.to_string(),
    };
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(PUBLIC_KEY_FIELD))
        .ok_or_else(|| corrupt("missing public.key"))?;
    String::from_utf8(bytes.0.clone()).map_err(|_| corrupt("public.key is not UTF-8"))
}

/// Writes the key secret of one slot unless it exists, returning the slot's
/// public key and whether a secret was created.
async fn provision_slot<C, R>(
    api: &C,
    network: &BesuNetwork,
    namespace: &str,
    group: &str,
    source: KeySource<'_>,
    rng: &mut R,
) -> Result<(String, bool), ReconcileError>
where
    C: ClusterApi,
    R: RngCore + CryptoRng + Send,
{
    let secret_name = key_secret_name(group);
    if let Some(existing) = api.get::<Secret>(namespace, &secret_name).await? {
        return Ok((stored_public_key(&existing)?, false));
    }
    let pair = match source {
        KeySource::Supplied(pair) => NodeKeyPair::from_supplied(&pair.public_key, &pair.private_key)?,
        KeySource::Generated => NodeKeyPair::generate_with(rng),
    };
    match api.create(namespace, &key_secret(network, group, &pair)?).await {
        Ok(_) => Ok((pair.public_key_hex(), true)),
        // A previous attempt of this task raced us; its secret wins.
        Err(e) if e.is_conflict() => {
            let existing = api
                .get::<Secret>(namespace, &secret_name)
                .await?
                .ok_or_else(|| ObjectRef::new::<Secret>(namespace, &secret_name).not_found())?;
            Ok((stored_public_key(&existing)?, false))
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds the genesis config map with the given validator public keys, in
/// slot order.
pub fn build_genesis_config_map(
    network: &BesuNetwork,
    validator_public_keys: &[String],
) -> Result<(ConfigMap, Vec<String>), ReconcileError> {
    let mut builder = GenesisBuilder::from_params(&network.spec.genesis);
    builder.validator_keys(validator_public_keys.iter().map(String::as_str))?;
    let validators = builder.validators().iter().map(format_address).collect();
    let genesis = builder.build()?;
    let config_map = genesis_config_map(network, genesis.document.to_json()?)?;
    Ok((config_map, validators))
}

/// Reads the public keys of the first `count` validator slots back from their
/// secrets.
pub async fn validator_public_keys<C: ClusterApi>(
    api: &C,
    namespace: &str,
    network: &str,
    count: u32,
) -> Result<Vec<String>, ReconcileError> {
    let mut keys = Vec::new();
    for i in 1..=count {
        let secret_name = key_secret_name(&node_group_name(network, NodeRole::Validator, i));
        let secret = api
            .get::<Secret>(namespace, &secret_name)
            .await?
            .ok_or_else(|| ReconcileError::CorruptData {
                object: secret_name.clone(),
                reason: "validator key secret is missing".to_string(),
            })?;
        keys.push(stored_public_key(&secret)?);
    }
    Ok(keys)
}

/// Provisions key secrets and the genesis config map for one network.
pub async fn run_bootstrap<C, R>(
    api: &C,
    namespace: &str,
    name: &str,
    rng: &mut R,
) -> Result<BootstrapReport, ReconcileError>
where
    C: ClusterApi,
    R: RngCore + CryptoRng + Send,
{
    let network = load_network(api, namespace, name).await?;
    let spec = &network.spec;
    validate_supplied(spec)?;
    // Reject bad chain parameters before any secret is written.
    GenesisBuilder::from_params(&spec.genesis).build()?;

    let mut report = BootstrapReport::default();
    let mut validator_keys = Vec::new();
    let roles = [
        (NodeRole::Bootnode, &spec.bootnode_keys, spec.bootnodes_count),
        (NodeRole::Validator, &spec.validator_keys, spec.validators_count),
    ];
    for (role, supplied, count) in roles {
        for (index, source) in (1u32..).zip(slot_sources(supplied, count)) {
            let group = node_group_name(name, role, index);
            let (public_key, created) =
                provision_slot(api, &network, namespace, &group, source, rng).await?;
            let secret_name = key_secret_name(&group);
            tracing::info!(
                target: "bootstrap",
                %namespace,
                secret = %secret_name,
                created,
                generated = matches!(source, KeySource::Generated),
                "key slot provisioned"
            );
            if created {
                report.created_secrets.push(secret_name);
            } else {
                report.skipped_secrets.push(secret_name);
            }
            if role == NodeRole::Validator {
                validator_keys.push(public_key);
            }
        }
    }

    let (config_map, validators) = build_genesis_config_map(&network, &validator_keys)?;
    report.validators = validators;
    let cm_name = genesis_config_map_name(name);
    if api.get::<ConfigMap>(namespace, &cm_name).await?.is_none() {
        match api.create(namespace, &config_map).await {
            Ok(_) => report.genesis_created = true,
            Err(e) if e.is_conflict() => {}
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(
        target: "bootstrap",
        %namespace,
        network = %name,
        created = report.created_secrets.len(),
        skipped = report.skipped_secrets.len(),
        genesis_created = report.genesis_created,
        "bootstrap finished"
    );
    Ok(report)
}

/// Deletes every key secret of a network and its genesis config map.
///
/// The network object itself may already be gone; secrets are found by label.
pub async fn run_cleanup<C: ClusterApi>(
    api: &C,
    namespace: &str,
    name: &str,
) -> Result<CleanupReport, ReconcileError> {
    let mut report = CleanupReport::default();
    let secrets = api
        .list::<Secret>(namespace, &key_secret_selector(name))
        .await?;
    for secret_name in secrets.into_iter().filter_map(|s| s.metadata.name) {
        api.delete::<Secret>(namespace, &secret_name).await?;
        report.deleted_secrets.push(secret_name);
    }
    let cm_name = genesis_config_map_name(name);
    if api.get::<ConfigMap>(namespace, &cm_name).await?.is_some() {
        api.delete::<ConfigMap>(namespace, &cm_name).await?;
        report.genesis_deleted = true;
    }
    tracing::info!(
        target: "bootstrap",
        %namespace,
        network = %name,
        deleted = report.deleted_secrets.len(),
        genesis_deleted = report.genesis_deleted,
        "cleanup finished"
    );
    Ok(report)
}
