//! AES-256-GCM sealing.
//!
//! Sealed output is `nonce || ciphertext || tag`. A fresh random nonce is
//! drawn for every call, so the same plaintext never seals to the same bytes.
//! The caller supplies additional authenticated data (the envelope salt), which
//! must be identical on both sides.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, fill_random};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

/// Size of the GCM standard nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

fn cipher(key: &DerivedKey) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: crate::KEY_SIZE,
        actual: key.as_bytes().len(),
    })
}

/// Encrypts `plaintext` and prefixes the nonce.
pub fn seal(key: &DerivedKey, aad: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher(key)?;

    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Encryption(format!("aes-gcm seal failed: {e}")))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverses [`seal`]. Fails on anything that does not authenticate.
pub fn open(key: &DerivedKey, aad: &[u8], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < NONCE_SIZE {
        return Err(CryptoError::PayloadTooShort);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    cipher(key)?
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| {
            CryptoError::Decryption(
                "message authentication failed (wrong key or tampered data)".to_string(),
            )
        })
}
