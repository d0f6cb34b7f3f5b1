// Path: crates/types/src/error/mod.rs
//! Core error types for the Besu operator.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors returned by the cluster API seam.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The requested object does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// The kind of the missing object.
        kind: String,
        /// The name of the missing object.
        name: String,
    },
    /// A write lost an optimistic concurrency race or the object already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The API server rejected the request.
    #[error("Request rejected ({code}): {message}")]
    Rejected {
        /// The HTTP status code returned by the API server.
        code: u16,
        /// The server-provided message.
        message: String,
    },
    /// The request never reached the API server or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),
    /// An object could not be converted to or from its wire form.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Returns `true` if this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this error is an optimistic concurrency or already-exists conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl ErrorCode for ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "API_NOT_FOUND",
            Self::Conflict(_) => "API_CONFLICT",
            Self::Rejected { .. } => "API_REJECTED",
            Self::Transport(_) => "API_TRANSPORT",
            Self::Serialization(_) => "API_SERIALIZATION",
        }
    }
}

/// Errors related to key material handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The input was not valid hexadecimal.
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
    /// The decoded key had an unexpected length.
    #[error("Invalid key length. Expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        got: usize,
    },
    /// The bytes do not describe a point on secp256k1.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    /// The bytes do not describe a valid secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    /// A supplied private key does not derive the supplied public key.
    #[error("Private key does not match public key {public_key}")]
    KeyMismatch {
        /// The public key that was supplied alongside the private key.
        public_key: String,
    },
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidHex(_) => "CRYPTO_INVALID_HEX",
            Self::InvalidLength { .. } => "CRYPTO_INVALID_LENGTH",
            Self::InvalidPublicKey(_) => "CRYPTO_INVALID_PUBLIC_KEY",
            Self::InvalidPrivateKey(_) => "CRYPTO_INVALID_PRIVATE_KEY",
            Self::KeyMismatch { .. } => "CRYPTO_KEY_MISMATCH",
        }
    }
}

/// Errors raised while assembling a genesis document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    /// A quantity field is not a `0x`-prefixed hex string.
    #[error("Field '{field}' is not a valid hex quantity: '{value}'")]
    InvalidQuantity {
        /// The genesis field name.
        field: &'static str,
        /// The offending value.
        value: String,
    },
    /// A fixed-width field decoded to the wrong number of bytes.
    #[error("Field '{field}' must be {expected} bytes, got {got}")]
    InvalidLength {
        /// The genesis field name (or alloc address).
        field: String,
        /// The required length in bytes.
        expected: usize,
        /// The decoded length in bytes.
        got: usize,
    },
    /// A fixed-width field is not valid hex.
    #[error("Field '{field}' is not valid hex: '{value}'")]
    InvalidHex {
        /// The genesis field name (or alloc address).
        field: String,
        /// The offending value.
        value: String,
    },
    /// Two alloc keys name the same account once normalized.
    #[error("Account {address} is funded more than once in alloc")]
    DuplicateAlloc {
        /// The normalized, lower-cased address.
        address: String,
    },
    /// A validator public key could not be turned into an address.
    #[error("Validator key error: {0}")]
    ValidatorKey(#[from] CryptoError),
    /// The extraData tuple could not be encoded.
    #[error("Failed to encode extraData: {0}")]
    Encoding(String),
    /// The document could not be serialized to or parsed from JSON.
    #[error("Genesis serialization error: {0}")]
    Serialization(String),
}

impl ErrorCode for GenesisError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "GENESIS_INVALID_QUANTITY",
            Self::InvalidLength { .. } => "GENESIS_INVALID_LENGTH",
            Self::InvalidHex { .. } => "GENESIS_INVALID_HEX",
            Self::DuplicateAlloc { .. } => "GENESIS_DUPLICATE_ALLOC",
            Self::ValidatorKey(_) => "GENESIS_VALIDATOR_KEY",
            Self::Encoding(_) => "GENESIS_ENCODING",
            Self::Serialization(_) => "GENESIS_SERIALIZATION",
        }
    }
}

/// Errors related to loading operator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// The path that was being read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for `OperatorConfig`.
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO",
            Self::Parse(_) => "CONFIG_PARSE",
        }
    }
}

/// Top-level error returned by a reconcile pass or a one-shot task.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A cluster API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    /// The genesis document could not be built.
    #[error("Genesis error: {0}")]
    Genesis(#[from] GenesisError),
    /// Key material was malformed.
    #[error("Key error: {0}")]
    Crypto(#[from] CryptoError),
    /// The object lacks metadata the reconciler depends on (name, namespace, or uid).
    #[error("Object is missing required metadata: {0}")]
    MissingMetadata(&'static str),
    /// The desired state cannot be realized as written.
    #[error("Invalid spec: {0}")]
    InvalidSpec(String),
    /// Stored data written by a previous task is unreadable.
    #[error("Corrupt stored data in '{object}': {reason}")]
    CorruptData {
        /// The name of the object holding the data.
        object: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ReconcileError {
    /// Classifies the error for the error metrics sink.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api(_) => "api",
            Self::Genesis(_) => "genesis",
            Self::Crypto(_) => "crypto",
            Self::MissingMetadata(_) => "metadata",
            Self::InvalidSpec(_) => "spec",
            Self::CorruptData { .. } => "data",
        }
    }
}

impl ErrorCode for ReconcileError {
    fn code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.code(),
            Self::Genesis(e) => e.code(),
            Self::Crypto(e) => e.code(),
            Self::MissingMetadata(_) => "RECONCILE_MISSING_METADATA",
            Self::InvalidSpec(_) => "RECONCILE_INVALID_SPEC",
            Self::CorruptData { .. } => "RECONCILE_CORRUPT_DATA",
        }
    }
}
