//! Settings for the [`Encryption`](crate::Encryption) instance.

use statecrypt_config::env::{ENCRYPTION_ENV_VAR, FALLBACK_ENV_VAR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionSettings {
    /// Variable holding the primary JSON configurations.
    pub encryption_env_var: String,
    /// Variable holding the fallback JSON configurations.
    pub fallback_env_var: String,
    /// Reuse a built flow for every later request with the same key.
    pub cache_flows: bool,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            encryption_env_var: ENCRYPTION_ENV_VAR.to_string(),
            fallback_env_var: FALLBACK_ENV_VAR.to_string(),
            cache_flows: true,
        }
    }
}

impl EncryptionSettings {
    /// Rebuild flows on every request; later configuration changes take effect.
    pub fn without_cache(mut self) -> Self {
        self.cache_flows = false;
        self
    }

    pub fn with_env_vars(
        mut self,
        encryption_env_var: impl Into<String>,
        fallback_env_var: impl Into<String>,
    ) -> Self {
        self.encryption_env_var = encryption_env_var.into();
        self.fallback_env_var = fallback_env_var.into();
        self
    }
}
