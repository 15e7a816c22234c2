//! The plaintext envelope stored next to encrypted content.

use serde::{Deserialize, Serialize};
use statecrypt_config::Settings;
use std::collections::BTreeMap;

/// Top-level JSON key marking a state or plan as encrypted.
///
/// Changing this invalidates all existing encrypted state. Unencrypted state
/// must never use it, so it cannot collide with any top-level state field.
pub const ENCRYPTION_TOP_LEVEL_KEY: &str = "encryption";

/// Current envelope format version.
pub const ENCRYPTION_VERSION: u32 = 1;

/// Everything in an encrypted payload except the envelope: the method's output.
pub type EncryptedDocument = serde_json::Map<String, serde_json::Value>;

/// Bookkeeping needed to rebuild the key and undo the method.
///
/// Never holds key material, only names and non-secret parameters such as salts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionInfo {
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_provider: Option<KeyProviderInfo>,

    pub method: MethodInfo,
}

impl EncryptionInfo {
    /// A fresh envelope for encrypting with `method`.
    pub fn new(method: &str) -> Self {
        Self {
            version: ENCRYPTION_VERSION,
            key_provider: None,
            method: MethodInfo {
                name: method.to_string(),
                config: Settings::new(),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyProviderInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: Settings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: Settings,
}
