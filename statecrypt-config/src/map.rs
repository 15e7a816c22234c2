//! Fragment storage and the precedence merge.

use crate::config::{Config, ConfigValidator};
use crate::error::ConfigResult;
use crate::key::{Key, Meta, Source};
use std::collections::BTreeMap;
use tracing::trace;

/// Configuration fragments keyed by `(Source, Key)`.
///
/// Storing a fragment under an existing [`Meta`] replaces it. Fragments that
/// differ in source or key coexist until [`ConfigMap::merge`] resolves them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigMap {
    fragments: BTreeMap<Meta, Config>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fragment, returning the one it replaced.
    pub fn insert(&mut self, meta: Meta, config: Config) -> Option<Config> {
        self.fragments.insert(meta, config)
    }

    pub fn get(&self, source: Source, key: &Key) -> Option<&Config> {
        self.fragments.get(&Meta::new(source, key.clone()))
    }

    /// Every key that has at least one fragment, without duplicates.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        let mut keys: Vec<&Key> = self.fragments.keys().map(|meta| &meta.key).collect();
        keys.sort();
        keys.dedup();
        keys.into_iter()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Resolves the configuration that applies to `key`.
    ///
    /// Candidates, lowest priority first:
    /// 1. the environment fragment stored under `default`, only for
    ///    [default-eligible](Key::is_default_eligible) keys;
    /// 2. the configuration language fragment stored under `key`;
    /// 3. the environment fragment stored under `key`.
    ///
    /// Returns `Ok(None)` when none exist, which means pass-through. Otherwise
    /// the merged result gets default names injected and is validated.
    pub fn merge(&self, key: &Key, validator: &dyn ConfigValidator) -> ConfigResult<Option<Config>> {
        let default_remote = Key::default_remote();

        let mut candidates = Vec::with_capacity(3);
        if key.is_default_eligible() {
            candidates.extend(self.get(Source::Environment, &default_remote));
        }
        candidates.extend(self.get(Source::Language, key));
        candidates.extend(self.get(Source::Environment, key));

        let mut candidates = candidates.into_iter();
        let Some(lowest) = candidates.next() else {
            trace!(key = %key, "no configuration fragments, passing through");
            return Ok(None);
        };

        let mut merged = lowest.clone();
        for higher in candidates {
            merged.merge_from(higher);
        }
        merged.apply_defaults();
        merged.validate(validator)?;

        trace!(
            key = %key,
            key_provider = %merged.key_provider.name,
            method = %merged.method.name,
            enforced = merged.enforced,
            "merged configuration"
        );
        Ok(Some(merged))
    }
}

impl FromIterator<(Meta, Config)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (Meta, Config)>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}
