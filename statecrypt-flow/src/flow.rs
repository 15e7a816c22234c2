//! Encrypt and decrypt one consumer's payloads with a primary and fallback configuration.

use crate::error::{FlowError, FlowResult};
use crate::info::{ENCRYPTION_TOP_LEVEL_KEY, ENCRYPTION_VERSION, EncryptedDocument, EncryptionInfo};
use crate::registry::Registry;
use serde::de::IgnoredAny;
use statecrypt_config::{Config, Key};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Encrypts and decrypts state documents.
pub trait StateFlow: Send + Sync {
    fn encrypt_state(&self, state: &[u8]) -> FlowResult<Vec<u8>>;
    fn decrypt_state(&self, state: &[u8]) -> FlowResult<Vec<u8>>;
}

/// Encrypts and decrypts plan files, which need not be JSON.
///
/// Plan decryption never consults the fallback configuration.
pub trait PlanFlow: Send + Sync {
    fn encrypt_plan(&self, plan: &[u8]) -> FlowResult<Vec<u8>>;
    fn decrypt_plan(&self, plan: &[u8]) -> FlowResult<Vec<u8>>;
}

/// The merged primary and fallback configuration for one [`Key`].
///
/// Either configuration may be absent. With no primary, encryption passes
/// payloads through unchanged; with neither, so does decryption.
pub struct Flow {
    key: Key,
    encryption: Option<Config>,
    fallback: Option<Config>,
    registry: Arc<Registry>,
}

impl Flow {
    pub fn new(
        key: Key,
        encryption: Option<Config>,
        fallback: Option<Config>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            key,
            encryption,
            fallback,
            registry,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn encryption_config(&self) -> Option<&Config> {
        self.encryption.as_ref()
    }

    pub fn fallback_config(&self) -> Option<&Config> {
        self.fallback.as_ref()
    }

    fn encrypt(&self, payload: &[u8], is_plan: bool) -> FlowResult<Vec<u8>> {
        let Some(config) = &self.encryption else {
            if self.fallback.as_ref().is_some_and(|fallback| fallback.enforced) {
                return Err(FlowError::EncryptionEnforced);
            }
            trace!(key = %self.key, "no encryption configuration, passing through");
            return Ok(payload.to_vec());
        };

        if is_plan && self.registry.is_json_only(&config.method.name) {
            return Err(FlowError::MethodJsonOnly);
        }
        if !is_plan && has_reserved_key(payload) {
            return Err(FlowError::ReservedKeyInPayload);
        }

        let method = self.registry.method(&config.method.name)?;
        let key_provider = self.registry.key_provider(&config.key_provider.name)?;

        let mut info = EncryptionInfo::new(&config.method.name);
        let document = method.encrypt(payload, &mut info, config, key_provider.as_ref())?;
        debug!(
            key = %self.key,
            method = %config.method.name,
            key_provider = %config.key_provider.name,
            "encrypted payload"
        );
        marshal(document, &info)
    }

    /// Only state decryption may use the fallback configuration.
    fn decrypt(&self, payload: &[u8], allow_fallback: bool) -> FlowResult<Vec<u8>> {
        let Some((document, info)) = self.unmarshal(payload)? else {
            return Ok(payload.to_vec());
        };

        let fallback = self.fallback.as_ref().filter(|_| allow_fallback);
        match (&self.encryption, fallback) {
            (None, None) => Err(FlowError::MissingConfiguration),
            (Some(primary), None) => self.decrypt_with(&document, &info, primary),
            (None, Some(fallback)) => self.decrypt_with(&document, &info, fallback),
            (Some(primary), Some(fallback)) => {
                let primary_err = match self.decrypt_with(&document, &info, primary) {
                    Ok(plaintext) => return Ok(plaintext),
                    Err(err) => err,
                };
                warn!(
                    key = %self.key,
                    error = %primary_err,
                    "failed to decrypt with encryption configuration, trying fallback configuration"
                );
                self.decrypt_with(&document, &info, fallback).map_err(|fallback_err| {
                    error!(
                        key = %self.key,
                        error = %fallback_err,
                        "failed to decrypt with fallback configuration as well"
                    );
                    primary_err
                })
            }
        }
    }

    fn decrypt_with(
        &self,
        document: &EncryptedDocument,
        info: &EncryptionInfo,
        config: &Config,
    ) -> FlowResult<Vec<u8>> {
        if info.method.name != config.method.name {
            return Err(FlowError::MethodMismatch {
                found: info.method.name.clone(),
                configured: config.method.name.clone(),
            });
        }
        if let Some(recorded) = &info.key_provider {
            if recorded.name != config.key_provider.name {
                return Err(FlowError::KeyProviderMismatch {
                    found: recorded.name.clone(),
                    configured: config.key_provider.name.clone(),
                });
            }
        }

        let method = self.registry.method(&config.method.name)?;
        let key_provider = self.registry.key_provider(&config.key_provider.name)?;
        let plaintext = method.decrypt(document, info, config, key_provider.as_ref())?;
        debug!(key = %self.key, method = %config.method.name, "decrypted payload");
        Ok(plaintext)
    }

    /// Splits an encrypted payload into the method output and its envelope.
    ///
    /// `Ok(None)` means the payload is not encrypted.
    fn unmarshal(&self, payload: &[u8]) -> FlowResult<Option<(EncryptedDocument, EncryptionInfo)>> {
        let Ok(mut document) = serde_json::from_slice::<EncryptedDocument>(payload) else {
            trace!(key = %self.key, "payload is not a json object, passing through");
            return Ok(None);
        };
        let Some(envelope) = document.shift_remove(ENCRYPTION_TOP_LEVEL_KEY) else {
            info!(
                key = %self.key,
                "found unencrypted payload, passing through (possibly initial encryption)"
            );
            return Ok(None);
        };

        let info: EncryptionInfo =
            serde_json::from_value(envelope).map_err(|err| FlowError::InvalidInfo(err.to_string()))?;
        if info.version != ENCRYPTION_VERSION {
            return Err(FlowError::UnsupportedVersion(info.version));
        }
        Ok(Some((document, info)))
    }
}

impl StateFlow for Flow {
    fn encrypt_state(&self, state: &[u8]) -> FlowResult<Vec<u8>> {
        self.encrypt(state, false)
    }

    fn decrypt_state(&self, state: &[u8]) -> FlowResult<Vec<u8>> {
        self.decrypt(state, true)
    }
}

impl PlanFlow for Flow {
    fn encrypt_plan(&self, plan: &[u8]) -> FlowResult<Vec<u8>> {
        self.encrypt(plan, true)
    }

    fn decrypt_plan(&self, plan: &[u8]) -> FlowResult<Vec<u8>> {
        self.decrypt(plan, false)
    }
}

impl std::fmt::Debug for Flow {
    // Configurations carry passphrases and keys.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("key", &self.key)
            .field("encryption", &self.encryption.as_ref().map(|c| &c.method.name))
            .field("fallback", &self.fallback.as_ref().map(|c| &c.method.name))
            .finish_non_exhaustive()
    }
}

/// Places the envelope first and renders the result as indented JSON.
fn marshal(document: EncryptedDocument, info: &EncryptionInfo) -> FlowResult<Vec<u8>> {
    if document.contains_key(ENCRYPTION_TOP_LEVEL_KEY) {
        return Err(FlowError::ReservedKeyCollision {
            method: info.method.name.clone(),
        });
    }

    let mut encrypted = EncryptedDocument::with_capacity(document.len() + 1);
    encrypted.insert(ENCRYPTION_TOP_LEVEL_KEY.to_string(), serde_json::to_value(info)?);
    encrypted.extend(document);
    Ok(serde_json::to_vec_pretty(&encrypted)?)
}

fn has_reserved_key(payload: &[u8]) -> bool {
    serde_json::from_slice::<HashMap<String, IgnoredAny>>(payload)
        .is_ok_and(|fields| fields.contains_key(ENCRYPTION_TOP_LEVEL_KEY))
}
