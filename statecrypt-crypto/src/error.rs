//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the AEAD, marker and key derivation primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("{0}")]
    Encryption(String),

    /// Authentication failed: wrong key, wrong salt or tampered data.
    #[error("{0}")]
    Decryption(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("failed to obtain random bytes: {0}")]
    Random(String),

    #[error("encrypted string did not have prefix - not produced with this method")]
    MissingMarker,

    #[error("encrypted payload too short, not even enough for the nonce")]
    PayloadTooShort,

    #[error("encoding error: {0}")]
    Encoding(String),
}
