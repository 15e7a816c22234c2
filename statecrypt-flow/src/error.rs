//! Flow error types.

use crate::info::ENCRYPTION_TOP_LEVEL_KEY;
use statecrypt_config::{ConfigError, Key};
use statecrypt_crypto::CryptoError;
use thiserror::Error;

/// Result type for flow, registry and cache operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while building flows or transforming payloads.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("failed to merge {what} ({source})")]
    Merge {
        what: &'static str,
        source: ConfigError,
    },

    #[error("registration rejected: {0}")]
    Registration(String),

    #[error("encryption marker in payload has invalid structure: {0}")]
    InvalidInfo(String),

    #[error("unsupported encryption version {0}")]
    UnsupportedVersion(u32),

    #[error(
        "encryption internal error, reserved key '{reserved}' is not empty in encrypted document produced by method '{method}' - this is a bug in the encryption method",
        reserved = ENCRYPTION_TOP_LEVEL_KEY
    )]
    ReservedKeyCollision { method: String },

    #[error(
        "payload handed to encryption already contains the reserved key '{reserved}' - refusing to encrypt it twice",
        reserved = ENCRYPTION_TOP_LEVEL_KEY
    )]
    ReservedKeyInPayload,

    #[error("encryption method can only be used on json documents - not suitable for plans")]
    MethodJsonOnly,

    #[error(
        "failed to decrypt encrypted state or plan - completely missing configuration, maybe forgot to set environment variables"
    )]
    MissingConfiguration,

    #[error("encryption is enforced but no encryption configuration is present")]
    EncryptionEnforced,

    #[error("payload was encrypted with method {found}, but the configuration uses method {configured}")]
    MethodMismatch { found: String, configured: String },

    #[error(
        "payload was encrypted with key provider {found}, but the configuration uses key provider {configured}"
    )]
    KeyProviderMismatch { found: String, configured: String },

    #[error("state or plan corrupt for method {method} - {reason}")]
    Corrupt { method: String, reason: String },

    #[error("state or plan corrupt for key provider {provider} - {reason}")]
    KeyProviderCorrupt { provider: String, reason: String },

    #[error("failed to {operation} with method {method}: {source}")]
    Method {
        method: String,
        operation: &'static str,
        source: CryptoError,
    },

    #[error("key provider {provider} failed: {source}")]
    KeyProvider {
        provider: String,
        source: CryptoError,
    },

    #[error("{0}")]
    Structure(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    pub(crate) fn encrypt_failed(method: &str, source: CryptoError) -> Self {
        Self::Method {
            method: method.to_string(),
            operation: "encrypt",
            source,
        }
    }

    pub(crate) fn decrypt_failed(method: &str, source: CryptoError) -> Self {
        Self::Method {
            method: method.to_string(),
            operation: "decrypt",
            source,
        }
    }

    pub(crate) fn corrupt(method: &str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

/// One failing key found by [`Encryption::validate`](crate::Encryption::validate).
#[derive(Debug, Error)]
#[error("Invalid state encryption configuration for configuration key {key}: {error}")]
pub struct KeyValidationError {
    pub key: Key,
    #[source]
    pub error: FlowError,
}
