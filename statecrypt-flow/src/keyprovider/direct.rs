//! Direct key provider: the configured hex string is the key.

use super::KeyProvider;
use crate::error::FlowResult;
use crate::info::{EncryptionInfo, KeyProviderInfo};
use statecrypt_config::{ConfigError, KeyProviderConfig};
use statecrypt_crypto::DerivedKey;

pub const NAME: &str = "direct";

const KEY_FIELD: &str = "key";

const MISSING_KEY: &str = "field 'key' missing or empty";
const MALFORMED_KEY: &str = "field 'key' is not a hex string representing 32 bytes";
const UNEXPECTED_FIELDS: &str =
    "unexpected additional configuration fields, only 'key' is allowed for this key provider";

pub(crate) fn construct() -> Box<dyn KeyProvider> {
    Box::new(DirectKeyProvider)
}

pub(crate) fn validate(config: &KeyProviderConfig) -> Result<(), String> {
    let key = match config.config.get(KEY_FIELD) {
        Some(key) if !key.is_empty() => key,
        _ => return Err(MISSING_KEY.to_string()),
    };
    if DerivedKey::from_hex(key).is_err() {
        return Err(MALFORMED_KEY.to_string());
    }
    if config.config.len() > 1 {
        return Err(UNEXPECTED_FIELDS.to_string());
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DirectKeyProvider;

impl DirectKeyProvider {
    fn key(config: &KeyProviderConfig) -> FlowResult<DerivedKey> {
        let invalid = |reason: &str| ConfigError::InvalidKeyProvider {
            name: NAME.to_string(),
            reason: reason.to_string(),
        };
        let key = config
            .config
            .get(KEY_FIELD)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| invalid(MISSING_KEY))?;
        Ok(DerivedKey::from_hex(key).map_err(|_| invalid(MALFORMED_KEY))?)
    }
}

impl KeyProvider for DirectKeyProvider {
    fn provide_encryption_key(
        &self,
        info: &mut EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey> {
        let key = Self::key(config)?;
        info.key_provider = Some(KeyProviderInfo {
            name: NAME.to_string(),
            ..KeyProviderInfo::default()
        });
        Ok(key)
    }

    fn provide_decryption_key(
        &self,
        _info: &EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey> {
        Self::key(config)
    }
}
