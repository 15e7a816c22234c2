//! Encryption configuration values.

use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key provider injected when a merged configuration names none.
pub const DEFAULT_KEY_PROVIDER: &str = "passphrase";

/// Encryption method injected when a merged configuration names none.
pub const DEFAULT_METHOD: &str = "full";

/// Flat provider or method settings.
pub type Settings = BTreeMap<String, String>;

/// Selects a key provider and configures it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyProviderConfig {
    #[serde(default)]
    pub name: String,

    /// Provider-specific settings, e.g. `passphrase` or `key`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: Settings,
}

impl KeyProviderConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Settings::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(field.into(), value.into());
        self
    }

    fn merge_from(&mut self, higher: &KeyProviderConfig) {
        if !higher.name.is_empty() {
            self.name = higher.name.clone();
        }
        merge_settings(&mut self.config, &higher.config);
    }
}

/// Selects an encryption method and configures it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: Settings,
}

impl MethodConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Settings::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(field.into(), value.into());
        self
    }

    fn merge_from(&mut self, higher: &MethodConfig) {
        if !higher.name.is_empty() {
            self.name = higher.name.clone();
        }
        merge_settings(&mut self.config, &higher.config);
    }
}

fn merge_settings(lower: &mut Settings, higher: &Settings) {
    for (field, value) in higher {
        if !value.is_empty() {
            lower.insert(field.clone(), value.clone());
        }
    }
}

/// Transparent client-side encryption configuration for one consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub key_provider: KeyProviderConfig,

    #[serde(default)]
    pub method: MethodConfig,

    /// A usable configuration must exist; encryption never silently passes through.
    #[serde(default, alias = "required")]
    pub enforced: bool,
}

impl Config {
    pub fn new(key_provider: KeyProviderConfig, method: MethodConfig) -> Self {
        Self {
            key_provider,
            method,
            enforced: false,
        }
    }

    pub fn enforced(mut self) -> Self {
        self.enforced = true;
        self
    }

    /// Deep-merges a higher priority fragment into `self`.
    ///
    /// Empty names and empty setting values inherit; anything else overrides.
    /// Settings merge entry by entry. `enforced` is sticky.
    pub fn merge_from(&mut self, higher: &Config) {
        self.key_provider.merge_from(&higher.key_provider);
        self.method.merge_from(&higher.method);
        self.enforced |= higher.enforced;
    }

    /// Fills in [`DEFAULT_KEY_PROVIDER`] and [`DEFAULT_METHOD`] where no name is set.
    pub fn apply_defaults(&mut self) {
        if self.key_provider.name.is_empty() {
            self.key_provider.name = DEFAULT_KEY_PROVIDER.to_string();
        }
        if self.method.name.is_empty() {
            self.method.name = DEFAULT_METHOD.to_string();
        }
    }

    pub fn validate(&self, validator: &dyn ConfigValidator) -> ConfigResult<()> {
        validator.validate_key_provider(&self.key_provider)?;
        validator.validate_method(&self.method)
    }
}

/// Checks provider and method configuration against whatever is registered.
///
/// Implementations report unknown names as
/// [`ConfigError::UnknownKeyProvider`](crate::ConfigError::UnknownKeyProvider) /
/// [`ConfigError::UnknownMethod`](crate::ConfigError::UnknownMethod) and
/// rejected settings as the corresponding `Invalid*` variants.
pub trait ConfigValidator: Send + Sync {
    fn validate_key_provider(&self, config: &KeyProviderConfig) -> ConfigResult<()>;
    fn validate_method(&self, config: &MethodConfig) -> ConfigResult<()>;
}
