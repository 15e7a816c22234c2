//! Encryption methods turn a payload into an [`EncryptedDocument`] and back.

pub mod full;
mod layout;
pub mod partial;

use crate::error::{FlowError, FlowResult};
use crate::info::{EncryptedDocument, EncryptionInfo};
use crate::keyprovider::KeyProvider;
use crate::registry::MethodRegistration;
use statecrypt_config::{Config, MethodConfig};
use statecrypt_crypto::Salt;

pub use full::FullMethod;
pub use partial::PartialMethod;

/// Setting written to `info.method.config`, used as AAD for every seal.
pub(crate) const SALT_FIELD: &str = "salt";

pub(crate) const UNEXPECTED_FIELDS: &str = "unexpected fields, this method needs no configuration";

/// Encrypts and decrypts payloads with a key obtained from a [`KeyProvider`].
///
/// The returned document must not contain the reserved `encryption` key; the
/// flow writes the envelope there.
pub trait Method: Send + Sync {
    fn encrypt(
        &self,
        payload: &[u8],
        info: &mut EncryptionInfo,
        config: &Config,
        key_provider: &dyn KeyProvider,
    ) -> FlowResult<EncryptedDocument>;

    fn decrypt(
        &self,
        document: &EncryptedDocument,
        info: &EncryptionInfo,
        config: &Config,
        key_provider: &dyn KeyProvider,
    ) -> FlowResult<Vec<u8>>;
}

pub(crate) fn builtins() -> [(String, MethodRegistration); 2] {
    [
        (
            full::NAME.to_string(),
            MethodRegistration {
                constructor: full::construct,
                validator: no_configuration,
                json_only: false,
            },
        ),
        (
            partial::NAME.to_string(),
            MethodRegistration {
                constructor: partial::construct,
                validator: no_configuration,
                json_only: true,
            },
        ),
    ]
}

/// Validator shared by methods that take no settings.
pub fn no_configuration(config: &MethodConfig) -> Result<(), String> {
    if config.config.is_empty() {
        Ok(())
    } else {
        Err(UNEXPECTED_FIELDS.to_string())
    }
}

/// Draws a fresh salt and records it in the method's envelope settings.
pub(crate) fn record_fresh_salt(info: &mut EncryptionInfo) -> FlowResult<Salt> {
    let salt = Salt::random()?;
    info.method.config.insert(SALT_FIELD.to_string(), salt.to_hex());
    Ok(salt)
}

pub(crate) fn recorded_salt(info: &EncryptionInfo, method: &str) -> FlowResult<Salt> {
    let salt = info
        .method
        .config
        .get(SALT_FIELD)
        .ok_or_else(|| FlowError::corrupt(method, "missing salt"))?;
    Salt::from_hex(salt).map_err(|_| FlowError::corrupt(method, "failed to decode salt"))
}
