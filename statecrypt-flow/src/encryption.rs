//! Per-instance store of configuration fragments and built flows.
//!
//! Fragments are applied from the configuration language and from the
//! environment; flows are built from them on first request for a key. With
//! caching on, the first build is reused and later fragments for that key
//! have no effect.
//!
//! Lock order is `flows` then `configs`. Applying fragments takes `configs`
//! alone and checks `flows` only after releasing it.

use crate::error::{FlowError, FlowResult, KeyValidationError};
use crate::flow::Flow;
use crate::registry::Registry;
use crate::settings::EncryptionSettings;
use statecrypt_config::env::configurations_from_env;
use statecrypt_config::{Config, ConfigMap, EnvConfigurations, Key, Meta, Source};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Default)]
struct Fragments {
    encryption: ConfigMap,
    fallback: ConfigMap,
}

/// Configuration and flow cache for one orchestrator instance.
pub struct Encryption {
    registry: Arc<Registry>,
    configs: Mutex<Fragments>,
    flows: Mutex<HashMap<Key, Arc<Flow>>>,
    cache_flows: bool,
}

impl Encryption {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_settings(registry, &EncryptionSettings::default())
    }

    pub fn with_settings(registry: Arc<Registry>, settings: &EncryptionSettings) -> Self {
        Self {
            registry,
            configs: Mutex::new(Fragments::default()),
            flows: Mutex::new(HashMap::new()),
            cache_flows: settings.cache_flows,
        }
    }

    /// Creates an instance seeded from the variables named in `settings`.
    ///
    /// Unset or blank variables contribute nothing.
    pub fn from_env(registry: Arc<Registry>, settings: &EncryptionSettings) -> FlowResult<Self> {
        let encryption = configurations_from_env(&settings.encryption_env_var, "encryption configuration")?;
        let fallback = configurations_from_env(&settings.fallback_env_var, "fallback configuration")?;

        let instance = Self::with_settings(registry, settings);
        instance.apply_env_configurations(encryption.unwrap_or_default(), fallback.unwrap_or_default())?;
        Ok(instance)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Stores a primary configuration fragment.
    ///
    /// `default` is rejected unless it comes from [`Source::Environment`].
    pub fn apply_configuration(&self, source: Source, key: Key, config: Config) -> FlowResult<()> {
        let meta = Meta::new(source, key.clone());
        meta.validate()?;
        lock(&self.configs).encryption.insert(meta, config);
        self.warn_if_cached(&key);
        Ok(())
    }

    /// Stores a fallback (decrypt-only) configuration fragment.
    pub fn apply_fallback_configuration(&self, source: Source, key: Key, config: Config) -> FlowResult<()> {
        let meta = Meta::new(source, key.clone());
        meta.validate()?;
        lock(&self.configs).fallback.insert(meta, config);
        self.warn_if_cached(&key);
        Ok(())
    }

    /// Stores parsed environment configurations as [`Source::Environment`] fragments.
    ///
    /// Nothing is stored if any key is invalid.
    pub fn apply_env_configurations(
        &self,
        encryption: EnvConfigurations,
        fallback: EnvConfigurations,
    ) -> FlowResult<()> {
        for key in encryption.keys().chain(fallback.keys()) {
            key.validate()?;
        }

        let mut touched = Vec::with_capacity(encryption.len() + fallback.len());
        {
            let mut configs = lock(&self.configs);
            for (key, config) in encryption {
                configs.encryption.insert(Meta::new(Source::Environment, key.clone()), config);
                touched.push(key);
            }
            for (key, config) in fallback {
                configs.fallback.insert(Meta::new(Source::Environment, key.clone()), config);
                touched.push(key);
            }
        }
        for key in &touched {
            self.warn_if_cached(key);
        }
        Ok(())
    }

    /// Flow for the backend that stores the main state.
    pub fn remote_state(&self) -> FlowResult<Arc<Flow>> {
        self.flow(&Key::backend())
    }

    /// Flow for local state files.
    pub fn state_file(&self) -> FlowResult<Arc<Flow>> {
        self.flow(&Key::state_file())
    }

    /// Flow for plan files.
    pub fn plan_file(&self) -> FlowResult<Arc<Flow>> {
        self.flow(&Key::plan_file())
    }

    /// Flow for a remote state data source.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not a remote data source key (see
    /// [`Key::remote_state_data_source`]); passing anything else is a
    /// programming error in the caller.
    pub fn remote_state_data_source(&self, key: &Key) -> FlowResult<Arc<Flow>> {
        assert!(
            key.is_remote_data_source(),
            "remote state data source flow requested with non data source key '{key}'"
        );
        self.flow(key)
    }

    /// Builds, or with caching on returns the cached, flow for `key`.
    pub fn flow(&self, key: &Key) -> FlowResult<Arc<Flow>> {
        if !self.cache_flows {
            return self.build(key).map(Arc::new);
        }

        let mut flows = lock(&self.flows);
        if let Some(flow) = flows.get(key) {
            return Ok(Arc::clone(flow));
        }
        let flow = Arc::new(self.build(key)?);
        flows.insert(key.clone(), Arc::clone(&flow));
        debug!(key = %key, "cached encryption flow");
        Ok(flow)
    }

    /// Tries to build a flow for every configured key and collects the failures.
    ///
    /// Nothing is cached. Fragments stored under `default` are checked as
    /// `backend`. Results are sorted by key.
    pub fn validate(&self) -> Vec<KeyValidationError> {
        let keys: BTreeSet<Key> = {
            let configs = lock(&self.configs);
            configs
                .encryption
                .keys()
                .chain(configs.fallback.keys())
                .map(|key| {
                    if *key == Key::default_remote() {
                        Key::backend()
                    } else {
                        key.clone()
                    }
                })
                .collect()
        };

        keys.into_iter()
            .filter_map(|key| match self.build(&key) {
                Ok(_) => None,
                Err(error) => Some(KeyValidationError { key, error }),
            })
            .collect()
    }

    fn build(&self, key: &Key) -> FlowResult<Flow> {
        let registry = self.registry.as_ref();
        let (encryption, fallback) = {
            let configs = lock(&self.configs);
            let encryption = configs
                .encryption
                .merge(key, registry)
                .map_err(|source| FlowError::Merge {
                    what: "encryption configuration",
                    source,
                })?;
            let fallback = configs
                .fallback
                .merge(key, registry)
                .map_err(|source| FlowError::Merge {
                    what: "fallback configuration",
                    source,
                })?;
            (encryption, fallback)
        };

        debug!(
            key = %key,
            encryption = encryption.is_some(),
            fallback = fallback.is_some(),
            "built encryption flow"
        );
        Ok(Flow::new(key.clone(), encryption, fallback, Arc::clone(&self.registry)))
    }

    fn warn_if_cached(&self, key: &Key) {
        if self.cache_flows && lock(&self.flows).contains_key(key) {
            warn!(
                key = %key,
                "encryption flow already built for this key, new configuration has no effect"
            );
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
