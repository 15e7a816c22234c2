//! Passphrase key provider: PBKDF2-HMAC-SHA-512 with a fresh salt per encryption.

use super::KeyProvider;
use crate::error::{FlowError, FlowResult};
use crate::info::{EncryptionInfo, KeyProviderInfo};
use statecrypt_config::{KeyProviderConfig, Settings};
use statecrypt_crypto::{DerivedKey, Salt, derive_key};
use tracing::trace;

pub const NAME: &str = "passphrase";

const PASSPHRASE_FIELD: &str = "passphrase";
const SALT_FIELD: &str = "salt";

const MISSING_PASSPHRASE: &str = "passphrase missing or empty";
const UNEXPECTED_FIELDS: &str =
    "unexpected additional configuration fields, only 'passphrase' is allowed for this key provider";

pub(crate) fn construct() -> Box<dyn KeyProvider> {
    Box::new(PassphraseKeyProvider)
}

pub(crate) fn validate(config: &KeyProviderConfig) -> Result<(), String> {
    if !matches!(config.config.get(PASSPHRASE_FIELD), Some(passphrase) if !passphrase.is_empty()) {
        return Err(MISSING_PASSPHRASE.to_string());
    }
    if config.config.len() > 1 {
        return Err(UNEXPECTED_FIELDS.to_string());
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PassphraseKeyProvider;

impl KeyProvider for PassphraseKeyProvider {
    fn provide_encryption_key(
        &self,
        info: &mut EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey> {
        let passphrase = passphrase(config)?;
        let salt = Salt::random().map_err(provider_failed)?;

        info.key_provider = Some(KeyProviderInfo {
            name: NAME.to_string(),
            config: Settings::from([(SALT_FIELD.to_string(), salt.to_hex())]),
        });

        trace!("derived encryption key from passphrase with fresh salt");
        derive_key(passphrase, &salt).map_err(provider_failed)
    }

    fn provide_decryption_key(
        &self,
        info: &EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey> {
        let passphrase = passphrase(config)?;

        let recorded = info
            .key_provider
            .as_ref()
            .ok_or_else(|| corrupt("missing key provider information"))?;
        if recorded.name != NAME {
            return Err(FlowError::KeyProviderMismatch {
                found: recorded.name.clone(),
                configured: NAME.to_string(),
            });
        }
        let salt = recorded
            .config
            .get(SALT_FIELD)
            .ok_or_else(|| corrupt("missing salt"))?;
        let salt = Salt::from_hex(salt).map_err(|_| corrupt("failed to decode salt"))?;

        derive_key(passphrase, &salt).map_err(provider_failed)
    }
}

fn passphrase(config: &KeyProviderConfig) -> FlowResult<&str> {
    match config.config.get(PASSPHRASE_FIELD) {
        Some(passphrase) if !passphrase.is_empty() => Ok(passphrase.as_str()),
        _ => Err(statecrypt_config::ConfigError::InvalidKeyProvider {
            name: NAME.to_string(),
            reason: MISSING_PASSPHRASE.to_string(),
        }
        .into()),
    }
}

fn corrupt(reason: &str) -> FlowError {
    FlowError::KeyProviderCorrupt {
        provider: NAME.to_string(),
        reason: reason.to_string(),
    }
}

fn provider_failed(source: statecrypt_crypto::CryptoError) -> FlowError {
    FlowError::KeyProvider {
        provider: NAME.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_requires_passphrase() {
        let err = validate(&KeyProviderConfig::new(NAME)).unwrap_err();
        assert_eq!(err, MISSING_PASSPHRASE);

        let err = validate(&KeyProviderConfig::new(NAME).with(PASSPHRASE_FIELD, "")).unwrap_err();
        assert_eq!(err, MISSING_PASSPHRASE);
    }

    #[test]
    fn validator_rejects_extra_fields() {
        let config = KeyProviderConfig::new(NAME)
            .with(PASSPHRASE_FIELD, "secret")
            .with("salt", "00");
        assert_eq!(validate(&config).unwrap_err(), UNEXPECTED_FIELDS);
    }

    #[test]
    fn same_salt_same_key() {
        let config = KeyProviderConfig::new(NAME).with(PASSPHRASE_FIELD, "a very secret passphrase");
        let mut info = EncryptionInfo::new("full");

        let encryption_key = PassphraseKeyProvider
            .provide_encryption_key(&mut info, &config)
            .unwrap();
        let decryption_key = PassphraseKeyProvider
            .provide_decryption_key(&info, &config)
            .unwrap();

        assert_eq!(encryption_key.as_bytes(), decryption_key.as_bytes());
        assert_eq!(info.key_provider.unwrap().name, NAME);
    }
}
