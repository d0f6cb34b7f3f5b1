// Path: crates/consensus/src/genesis.rs
//! Canonical IBFT2 genesis document.
//!
//! User parameters are merged field by field over [`ChainParams::default`]:
//! only scalars the user left unset are taken from the template. The `alloc`
//! map is attached after the scalar document is built. Every hex field is
//! validated, never silently defaulted.

use crate::ibft2::extra_data_hex;
use besu_crypto::address::{decode_hex, format_address, parse_address};
use besu_crypto::{address_from_public_key, Address};
use besu_types::crd::{AllocEntry, GenesisParams};
use besu_types::error::GenesisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIX_HASH_LEN: usize = 32;
const ADDRESS_LEN: usize = 20;

/// Fully resolved chain parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    /// Chain id.
    pub chain_id: u64,
    /// Constantinople fix fork block.
    pub constantinople_fix_block: u64,
    /// Target seconds between blocks.
    pub block_period_seconds: u64,
    /// Blocks per epoch.
    pub epoch_length: u64,
    /// Round change timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Hex quantity.
    pub nonce: String,
    /// Hex quantity.
    pub timestamp: String,
    /// Hex quantity.
    pub gas_limit: String,
    /// Hex quantity.
    pub difficulty: String,
    /// 32-byte hex.
    pub mix_hash: String,
    /// 20-byte hex.
    pub coinbase: String,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            chain_id: 2018,
            constantinople_fix_block: 0,
            block_period_seconds: 2,
            epoch_length: 30000,
            request_timeout_seconds: 10,
            nonce: "0x0".to_string(),
            timestamp: "0x58ee40ba".to_string(),
            gas_limit: "0x47b760".to_string(),
            difficulty: "0x1".to_string(),
            mix_hash: "0x63746963616c2062797a616e74696e65206661756c7420746f6c6572616e6365"
                .to_string(),
            coinbase: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

impl ChainParams {
    /// Takes every field set in `params` and falls back to `self` for the rest.
    pub fn merged_with(&self, params: &GenesisParams) -> Self {
        let ibft2 = params.ibft2.clone().unwrap_or_default();
        Self {
            chain_id: params.chain_id.unwrap_or(self.chain_id),
            constantinople_fix_block: params
                .constantinople_fix_block
                .unwrap_or(self.constantinople_fix_block),
            block_period_seconds: ibft2
                .block_period_seconds
                .unwrap_or(self.block_period_seconds),
            epoch_length: ibft2.epoch_length.unwrap_or(self.epoch_length),
            request_timeout_seconds: ibft2
                .request_timeout_seconds
                .unwrap_or(self.request_timeout_seconds),
            nonce: params.nonce.clone().unwrap_or_else(|| self.nonce.clone()),
            timestamp: params
                .timestamp
                .clone()
                .unwrap_or_else(|| self.timestamp.clone()),
            gas_limit: params
                .gas_limit
                .clone()
                .unwrap_or_else(|| self.gas_limit.clone()),
            difficulty: params
                .difficulty
                .clone()
                .unwrap_or_else(|| self.difficulty.clone()),
            mix_hash: params
                .mix_hash
                .clone()
                .unwrap_or_else(|| self.mix_hash.clone()),
            coinbase: params
                .coinbase
                .clone()
                .unwrap_or_else(|| self.coinbase.clone()),
        }
    }

    fn validate(&self) -> Result<(), GenesisError> {
        check_quantity("nonce", &self.nonce)?;
        check_quantity("timestamp", &self.timestamp)?;
        check_quantity("gasLimit", &self.gas_limit)?;
        check_quantity("difficulty", &self.difficulty)?;
        check_fixed("mixHash", &self.mix_hash, MIX_HASH_LEN)?;
        check_fixed("coinbase", &self.coinbase, ADDRESS_LEN)?;
        Ok(())
    }
}

fn check_quantity(field: &'static str, value: &str) -> Result<(), GenesisError> {
    let digits = value.strip_prefix("0x").unwrap_or_default();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GenesisError::InvalidQuantity {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_balance(address: &str, value: &str) -> Result<(), GenesisError> {
    let decimal = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if decimal {
        return Ok(());
    }
    check_quantity("balance", value).map_err(|_| GenesisError::InvalidQuantity {
        field: "balance",
        value: format!("{address}: {value}"),
    })
}

fn check_fixed(field: &str, value: &str, expected: usize) -> Result<(), GenesisError> {
    let bytes = decode_hex(value).map_err(|_| GenesisError::InvalidHex {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    if bytes.len() != expected {
        return Err(GenesisError::InvalidLength {
            field: field.to_string(),
            expected,
            got: bytes.len(),
        });
    }
    Ok(())
}

/// `config` section of `genesis.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    /// Chain id.
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    /// Constantinople fix fork block.
    #[serde(rename = "constantinoplefixblock")]
    pub constantinople_fix_block: u64,
    /// IBFT2 parameters.
    pub ibft2: Ibft2Config,
}

/// `config.ibft2` section of `genesis.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ibft2Config {
    /// Target seconds between blocks.
    #[serde(rename = "blockperiodseconds")]
    pub block_period_seconds: u64,
    /// Blocks per epoch.
    #[serde(rename = "epochlength")]
    pub epoch_length: u64,
    /// Round change timeout in seconds.
    #[serde(rename = "requesttimeoutseconds")]
    pub request_timeout_seconds: u64,
}

/// The document Besu reads from `--genesis-file`. Field order is fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenesisDocument {
    /// Chain configuration.
    pub config: ChainConfig,
    /// Hex quantity.
    pub nonce: String,
    /// Hex quantity.
    pub timestamp: String,
    /// Hex quantity.
    pub gas_limit: String,
    /// Hex quantity.
    pub difficulty: String,
    /// 32-byte hex.
    pub mix_hash: String,
    /// 20-byte hex.
    pub coinbase: String,
    /// Prefunded accounts keyed by lower-case `0x` address.
    pub alloc: BTreeMap<String, AllocEntry>,
    /// IBFT2 extraData.
    pub extra_data: String,
}

impl GenesisDocument {
    /// Pretty-printed JSON, as stored under `genesis.json`.
    pub fn to_json(&self) -> Result<String, GenesisError> {
        serde_json::to_string_pretty(self).map_err(|e| GenesisError::Serialization(e.to_string()))
    }

    /// Parses a stored document.
    pub fn from_json(s: &str) -> Result<Self, GenesisError> {
        serde_json::from_str(s).map_err(|e| GenesisError::Serialization(e.to_string()))
    }
}

/// A finalized genesis and its raw extraData bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genesis {
    /// The document.
    pub document: GenesisDocument,
    /// The bytes behind `document.extra_data`.
    pub extra_data: Vec<u8>,
}

/// A builder for the genesis document of one network.
#[derive(Debug, Clone, Default)]
pub struct GenesisBuilder {
    params: ChainParams,
    alloc: BTreeMap<String, AllocEntry>,
    validators: Vec<Address>,
}

impl GenesisBuilder {
    /// Starts from the template defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the template defaults overlaid with the user parameters,
    /// including their `alloc` entries.
    pub fn from_params(params: &GenesisParams) -> Self {
        let mut builder = Self {
            params: ChainParams::default().merged_with(params),
            ..Self::default()
        };
        for (address, entry) in &params.alloc {
            builder.fund(address, &entry.balance);
        }
        builder
    }

    /// Replaces the chain parameters.
    pub fn params(&mut self, params: ChainParams) -> &mut Self {
        self.params = params;
        self
    }

    /// Adds a prefunded account. A later call with the identical key replaces
    /// the earlier one; keys that differ only in case or `0x` prefix are
    /// rejected by [`GenesisBuilder::build`].
    pub fn fund(&mut self, address: &str, balance: &str) -> &mut Self {
        self.alloc.insert(
            address.to_string(),
            AllocEntry {
                balance: balance.to_string(),
            },
        );
        self
    }

    /// Appends a validator address. Order is preserved in extraData.
    pub fn validator(&mut self, address: Address) -> &mut Self {
        self.validators.push(address);
        self
    }

    /// Appends the address of each public key, in order.
    pub fn validator_keys<'a, I>(&mut self, public_keys: I) -> Result<&mut Self, GenesisError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for key in public_keys {
            let address = address_from_public_key(key)?;
            self.validators.push(address);
        }
        Ok(self)
    }

    /// The validators added so far.
    pub fn validators(&self) -> &[Address] {
        &self.validators
    }

    /// Validates the parameters and assembles the document.
    pub fn build(&self) -> Result<Genesis, GenesisError> {
        self.params.validate()?;
        let p = &self.params;
        let extra_data = crate::ibft2::encode_extra_data(&self.validators);

        let mut document = GenesisDocument {
            config: ChainConfig {
                chain_id: p.chain_id,
                constantinople_fix_block: p.constantinople_fix_block,
                ibft2: Ibft2Config {
                    block_period_seconds: p.block_period_seconds,
                    epoch_length: p.epoch_length,
                    request_timeout_seconds: p.request_timeout_seconds,
                },
            },
            nonce: p.nonce.clone(),
            timestamp: p.timestamp.clone(),
            gas_limit: p.gas_limit.clone(),
            difficulty: p.difficulty.clone(),
            mix_hash: p.mix_hash.clone(),
            coinbase: p.coinbase.clone(),
            alloc: BTreeMap::new(),
            extra_data: extra_data_hex(&self.validators),
        };

        for (address, entry) in &self.alloc {
            let field = format!("alloc[{address}]");
            check_fixed(&field, address, ADDRESS_LEN)?;
            let parsed = parse_address(address).map_err(|_| GenesisError::InvalidHex {
                field,
                value: address.clone(),
            })?;
            check_balance(address, &entry.balance)?;
            let normalized = format_address(&parsed);
            if document.alloc.contains_key(&normalized) {
                return Err(GenesisError::DuplicateAlloc {
                    address: normalized,
                });
            }
            document.alloc.insert(normalized, entry.clone());
        }

        tracing::debug!(
            target: "genesis",
            chain_id = p.chain_id,
            validators = self.validators.len(),
            accounts = document.alloc.len(),
            "built genesis document"
        );
        Ok(Genesis {
            document,
            extra_data,
        })
    }
}
