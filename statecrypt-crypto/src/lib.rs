//! Cryptographic primitives for state and plan encryption.
//!
//! Provides:
//! - PBKDF2-HMAC-SHA-512 key derivation from passphrases
//! - AES-256-GCM authenticated encryption with caller-supplied AAD
//! - The `ENC[...]` base64 marker used for every encrypted string
//! - Key material that zeroizes on drop
//!
//! # Wire format
//!
//! Every encrypted value is rendered as `ENC[` + base64(`nonce || ciphertext || tag`) + `]`.
//! The nonce is the 12-byte GCM standard nonce, drawn fresh for every seal.
//! Salts are not secret: they travel hex-encoded in the plaintext envelope and
//! are fed back in as AAD or PBKDF2 salt when decrypting.

mod cipher;
mod error;
mod key;
mod marker;

pub use cipher::{NONCE_SIZE, TAG_SIZE, open, seal};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    DerivedKey, KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, Salt, derive_key, fill_random,
};
pub use marker::{MARKER_PREFIX, MARKER_SUFFIX, decode_marked, encode_marked, is_marked};
