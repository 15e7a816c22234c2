//! Partial method: every string value is sealed in place.
//!
//! Structure, keys, numbers, booleans and nulls stay readable. Requires a
//! JSON object at the top level, so it cannot be used for plans. Each string
//! is sealed as its escaped token contents, and the text's formatting is
//! recorded next to the salt, so decryption returns the original bytes.

use super::layout::{self, Layout};
use super::{Method, record_fresh_salt, recorded_salt};
use crate::error::{FlowError, FlowResult};
use crate::info::{EncryptedDocument, EncryptionInfo};
use crate::keyprovider::KeyProvider;
use serde_json::Value;
use statecrypt_config::Config;
use statecrypt_crypto::{DerivedKey, Salt, decode_marked, encode_marked, open, seal};

pub const NAME: &str = "partial";

pub(crate) fn construct() -> Box<dyn Method> {
    Box::new(PartialMethod)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PartialMethod;

impl Method for PartialMethod {
    fn encrypt(
        &self,
        payload: &[u8],
        info: &mut EncryptionInfo,
        config: &Config,
        key_provider: &dyn KeyProvider,
    ) -> FlowResult<EncryptedDocument> {
        let not_an_object = || {
            FlowError::Structure(
                "partial encryption requires a JSON object at the top level".to_string(),
            )
        };
        let text = std::str::from_utf8(payload).map_err(|_| not_an_object())?;
        let mut document: EncryptedDocument =
            serde_json::from_str(text).map_err(|_| not_an_object())?;

        let scan = layout::scan(text)?;
        let escaped = scan.value_strings();
        let (keys, strings) = count_keys_and_strings(&document);
        if keys != scan.key_count() || strings != escaped.len() {
            return Err(FlowError::Structure(
                "partial encryption requires an object without duplicate keys".to_string(),
            ));
        }

        let salt = record_fresh_salt(info)?;
        scan.layout()?.record(&mut info.method.config)?;
        let key = key_provider.provide_encryption_key(info, &config.key_provider)?;

        let mut escaped = escaped.into_iter();
        for value in document.values_mut() {
            seal_leaves(value, &mut escaped, &key, &salt)?;
        }
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
        let layout = Layout::recorded(&info.method.config)
            .ok_or_else(|| FlowError::corrupt(NAME, "failed to decode layout"))?;
        let key = key_provider.provide_decryption_key(info, &config.key_provider)?;

        let mut document = document.clone();
        for value in document.values_mut() {
            open_leaves(value, &key, &salt)?;
        }
        layout.render(&document)
    }
}

fn count_keys_and_strings(document: &EncryptedDocument) -> (usize, usize) {
    fn walk(value: &Value, keys: &mut usize, strings: &mut usize) {
        match value {
            Value::String(_) => *strings += 1,
            Value::Array(items) => items.iter().for_each(|item| walk(item, keys, strings)),
            Value::Object(fields) => {
                *keys += fields.len();
                fields.values().for_each(|field| walk(field, keys, strings));
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    let (mut keys, mut strings) = (document.len(), 0);
    for value in document.values() {
        walk(value, &mut keys, &mut strings);
    }
    (keys, strings)
}

/// Replaces string values with sealed copies of their escaped text, taken in document order.
fn seal_leaves<'a>(
    value: &mut Value,
    escaped: &mut impl Iterator<Item = &'a str>,
    key: &DerivedKey,
    salt: &Salt,
) -> FlowResult<()> {
    match value {
        Value::String(plain) => {
            let text = escaped.next().ok_or_else(|| {
                FlowError::Structure("string values out of step with the JSON text".to_string())
            })?;
            let sealed = seal(key, salt.as_bytes(), text.as_bytes())
                .map_err(|err| FlowError::encrypt_failed(NAME, err))?;
            *plain = encode_marked(&sealed);
        }
        Value::Array(items) => {
            for item in items {
                seal_leaves(item, escaped, key, salt)?;
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                seal_leaves(field, escaped, key, salt)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

/// Replaces sealed values with their escaped text, ready for [`Layout::render`].
fn open_leaves(value: &mut Value, key: &DerivedKey, salt: &Salt) -> FlowResult<()> {
    match value {
        Value::String(marked) => {
            let sealed = decode_marked(marked)?;
            let plain = open(key, salt.as_bytes(), &sealed)
                .map_err(|err| FlowError::decrypt_failed(NAME, err))?;
            *marked = String::from_utf8(plain).map_err(|_| {
                FlowError::corrupt(NAME, "decrypted string value is not valid UTF-8")
            })?;
        }
        Value::Array(items) => {
            for item in items {
                open_leaves(item, key, salt)?;
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                open_leaves(field, key, salt)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
