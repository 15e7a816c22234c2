//! Full method: the whole payload becomes one sealed string.
//!
//! ```json
//! { "payload": "ENC[...]" }
//! ```
//!
//! Works on any byte sequence, so it is suitable for plans.

use super::{Method, record_fresh_salt, recorded_salt};
use crate::error::{FlowError, FlowResult};
use crate::info::{EncryptedDocument, EncryptionInfo};
use crate::keyprovider::KeyProvider;
use serde_json::Value;
use statecrypt_config::Config;
use statecrypt_crypto::{CryptoError, decode_marked, encode_marked, open, seal};
use tracing::trace;

pub const NAME: &str = "full";

const PAYLOAD_FIELD: &str = "payload";

pub(crate) fn construct() -> Box<dyn Method> {
    Box::new(FullMethod)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FullMethod;

impl Method for FullMethod {
    fn encrypt(
        &self,
        payload: &[u8],
        info: &mut EncryptionInfo,
        config: &Config,
        key_provider: &dyn KeyProvider,
    ) -> FlowResult<EncryptedDocument> {
        if payload.is_empty() {
            return Err(FlowError::encrypt_failed(
                NAME,
                CryptoError::Encryption("plaintext is empty".to_string()),
            ));
        }

        let salt = record_fresh_salt(info)?;
        let key = key_provider.provide_encryption_key(info, &config.key_provider)?;

        let sealed = seal(&key, salt.as_bytes(), payload)
            .map_err(|err| FlowError::encrypt_failed(NAME, err))?;
        trace!(bytes = payload.len(), "sealed full payload");

        let mut document = EncryptedDocument::new();
        document.insert(PAYLOAD_FIELD.to_string(), Value::String(encode_marked(&sealed)));
        Ok(document)
    }

    fn decrypt(
        &self,
        document: &EncryptedDocument,
        info: &EncryptionInfo,
        config: &Config,
        key_provider: &dyn KeyProvider,
    ) -> FlowResult<Vec<u8>> {
        let salt = recorded_salt(info, NAME)?;

        let marked = match document.get(PAYLOAD_FIELD) {
            Some(Value::String(marked)) => marked,
            Some(_) => {
                return Err(FlowError::Structure(
                    "field 'payload' in encrypted data is not a string".to_string(),
                ));
            }
            None => {
                return Err(FlowError::Structure(
                    "no field 'payload' in encrypted data".to_string(),
                ));
            }
        };
        let sealed = decode_marked(marked)?;

        let key = key_provider.provide_decryption_key(info, &config.key_provider)?;
        open(&key, salt.as_bytes(), &sealed).map_err(|err| FlowError::decrypt_failed(NAME, err))
    }
}
