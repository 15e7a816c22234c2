//! Catalog of key providers and encryption methods, looked up by name.
//!
//! Registrations are plain function pointers, so a registration without a
//! constructor or validator cannot be expressed. Reads vastly outnumber
//! writes: lookups take a shared lock, registration an exclusive one.

use crate::error::{FlowError, FlowResult};
use crate::keyprovider::{self, KeyProvider};
use crate::method::{self, Method};
use statecrypt_config::{ConfigError, ConfigResult, ConfigValidator, KeyProviderConfig, MethodConfig};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub type KeyProviderConstructor = fn() -> Box<dyn KeyProvider>;
pub type KeyProviderValidator = fn(&KeyProviderConfig) -> Result<(), String>;
pub type MethodConstructor = fn() -> Box<dyn Method>;
pub type MethodValidator = fn(&MethodConfig) -> Result<(), String>;

#[derive(Clone, Copy)]
pub struct KeyProviderRegistration {
    pub constructor: KeyProviderConstructor,
    /// Returns a human-readable reason when the settings are unusable.
    pub validator: KeyProviderValidator,
}

#[derive(Clone, Copy)]
pub struct MethodRegistration {
    pub constructor: MethodConstructor,
    pub validator: MethodValidator,
    /// The method needs a JSON object and must not be used for plans.
    pub json_only: bool,
}

/// Name-indexed key providers and methods.
pub struct Registry {
    key_providers: RwLock<HashMap<String, KeyProviderRegistration>>,
    methods: RwLock<HashMap<String, MethodRegistration>>,
}

impl Default for Registry {
    /// Same as [`Registry::with_builtins`].
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            key_providers: RwLock::new(HashMap::new()),
            methods: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding `passphrase`, `direct`, `full` and `partial`.
    pub fn with_builtins() -> Self {
        Self {
            key_providers: RwLock::new(keyprovider::builtins().into_iter().collect()),
            methods: RwLock::new(method::builtins().into_iter().collect()),
        }
    }

    pub fn register_key_provider(
        &self,
        name: &str,
        registration: KeyProviderRegistration,
    ) -> FlowResult<()> {
        check_name(name)?;
        let mut key_providers = write(&self.key_providers);
        if key_providers.contains_key(name) {
            return Err(FlowError::Registration(format!(
                "duplicate registration for key provider {name}"
            )));
        }
        key_providers.insert(name.to_string(), registration);
        debug!(key_provider = name, "registered key provider");
        Ok(())
    }

    pub fn register_method(&self, name: &str, registration: MethodRegistration) -> FlowResult<()> {
        check_name(name)?;
        let mut methods = write(&self.methods);
        if methods.contains_key(name) {
            return Err(FlowError::Registration(format!(
                "duplicate registration for encryption method {name}"
            )));
        }
        methods.insert(name.to_string(), registration);
        debug!(method = name, "registered encryption method");
        Ok(())
    }

    /// Constructs a fresh instance of the named key provider.
    pub fn key_provider(&self, name: &str) -> FlowResult<Box<dyn KeyProvider>> {
        let registration = read(&self.key_providers)
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownKeyProvider(name.to_string()))?;
        Ok((registration.constructor)())
    }

    /// Constructs a fresh instance of the named method.
    pub fn method(&self, name: &str) -> FlowResult<Box<dyn Method>> {
        let registration = read(&self.methods)
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMethod(name.to_string()))?;
        Ok((registration.constructor)())
    }

    /// Whether the named method refuses non-JSON payloads. Unknown names are not.
    pub fn is_json_only(&self, name: &str) -> bool {
        read(&self.methods)
            .get(name)
            .is_some_and(|registration| registration.json_only)
    }

    /// Sorted names of all registered key providers.
    pub fn key_provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.key_providers).keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted names of all registered methods.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.methods).keys().cloned().collect();
        names.sort();
        names
    }
}

impl ConfigValidator for Registry {
    fn validate_key_provider(&self, config: &KeyProviderConfig) -> ConfigResult<()> {
        let registration = read(&self.key_providers)
            .get(&config.name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownKeyProvider(config.name.clone()))?;
        (registration.validator)(config).map_err(|reason| ConfigError::InvalidKeyProvider {
            name: config.name.clone(),
            reason,
        })
    }

    fn validate_method(&self, config: &MethodConfig) -> ConfigResult<()> {
        let registration = read(&self.methods)
            .get(&config.name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMethod(config.name.clone()))?;
        (registration.validator)(config).map_err(|reason| ConfigError::InvalidMethod {
            name: config.name.clone(),
            reason,
        })
    }
}

fn check_name(name: &str) -> FlowResult<()> {
    if name.trim().is_empty() {
        return Err(FlowError::Registration("name must not be empty".to_string()));
    }
    Ok(())
}

// Catalog entries are plain data; a panic mid-insert cannot leave them torn.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
