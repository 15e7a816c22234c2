//! Key material, salts and PBKDF2 key derivation.

use crate::error::{CryptoError, CryptoResult};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the salts recorded in the encryption envelope.
pub const SALT_SIZE: usize = 16;

/// PBKDF2 iteration count. Changing it invalidates every passphrase-encrypted payload.
pub const PBKDF2_ITERATIONS: u32 = 4096;

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copies a key out of a slice, rejecting anything that is not exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Parses a key from its 64-character hex form.
    pub fn from_hex(value: &str) -> CryptoResult<Self> {
        let mut bytes = hex::decode(value).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Non-secret salt, stored hex-encoded next to the ciphertext.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh salt from the OS CSPRNG.
    pub fn random() -> CryptoResult<Self> {
        let mut bytes = [0u8; SALT_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex salt. Undersized, oversized and non-hex input are all rejected.
    pub fn from_hex(value: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(value).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let array: [u8; SALT_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::Encoding(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

/// Fills `buf` from the OS CSPRNG.
///
/// A failing random source is reported, never replaced by a weaker one.
pub fn fill_random(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Random(e.to_string()))
}

/// Derives a key from a passphrase with PBKDF2-HMAC-SHA-512.
pub fn derive_key(passphrase: &str, salt: &Salt) -> CryptoResult<DerivedKey> {
    if passphrase.is_empty() {
        return Err(CryptoError::KeyDerivation("passphrase is empty".to_string()));
    }

    let mut bytes = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha512>(
        passphrase.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut bytes,
    );
    let key = DerivedKey::from_bytes(bytes);
    bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let salt = Salt::from_bytes([7u8; SALT_SIZE]);
        let a = derive_key("foobarbaz", &salt).unwrap();
        let b = derive_key("foobarbaz", &salt).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salt_changes_the_key() {
        let a = derive_key("foobarbaz", &Salt::from_bytes([1u8; SALT_SIZE])).unwrap();
        let b = derive_key("foobarbaz", &Salt::from_bytes([2u8; SALT_SIZE])).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_passphrase_rejected() {
        let err = derive_key("", &Salt::from_bytes([0u8; SALT_SIZE])).unwrap_err();
        assert!(matches!(err, CryptoError::KeyDerivation(_)));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = DerivedKey::from_bytes([0xAB; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("ab"), "got {rendered}");
        assert!(!rendered.contains("171"), "got {rendered}");
    }

    #[test]
    fn random_salts_differ() {
        assert_ne!(Salt::random().unwrap(), Salt::random().unwrap());
    }
}
