//! Configuration keys, sources and the `(Source, Key)` identity of a fragment.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator marking a key as a named remote state reference.
pub const KEY_SEPARATOR: char = '.';

/// Resource type prefix used for remote state data source keys.
pub const REMOTE_STATE_PREFIX: &str = "terraform_remote_state";

/// Identifies which state or plan consumer a configuration applies to.
///
/// The predefined keys are `default` (environment-only default for every
/// remote state), `backend`, `statefile` and `planfile`. Anything else names a
/// remote state data source and must contain a `.`, for example
/// `terraform_remote_state.foo`, `terraform_remote_state.foo[17]` or
/// `terraform_remote_state.foo[key]` (no quotes around the for_each key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub const DEFAULT_REMOTE: &'static str = "default";
    pub const BACKEND: &'static str = "backend";
    pub const STATE_FILE: &'static str = "statefile";
    pub const PLAN_FILE: &'static str = "planfile";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn default_remote() -> Self {
        Self::new(Self::DEFAULT_REMOTE)
    }

    pub fn backend() -> Self {
        Self::new(Self::BACKEND)
    }

    pub fn state_file() -> Self {
        Self::new(Self::STATE_FILE)
    }

    pub fn plan_file() -> Self {
        Self::new(Self::PLAN_FILE)
    }

    /// Builds the key for `data "terraform_remote_state" "<name>"`, optionally indexed.
    pub fn remote_state_data_source(name: &str, index: Option<&str>) -> Self {
        match index {
            Some(index) => Self(format!("{REMOTE_STATE_PREFIX}.{name}[{index}]")),
            None => Self(format!("{REMOTE_STATE_PREFIX}.{name}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_predefined(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::DEFAULT_REMOTE | Self::BACKEND | Self::STATE_FILE | Self::PLAN_FILE
        )
    }

    pub fn is_remote_data_source(&self) -> bool {
        self.0.contains(KEY_SEPARATOR)
    }

    /// Whether the environment `default` configuration applies to this key.
    ///
    /// Only remote states (the backend and remote state data sources) inherit
    /// the default. Local state and plan files never do.
    pub fn is_default_eligible(&self) -> bool {
        self.0 == Self::BACKEND || self.is_remote_data_source()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.is_predefined() || self.is_remote_data_source() {
            Ok(())
        } else {
            Err(ConfigError::InvalidKey(self.0.clone()))
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a configuration fragment came from. Only used for precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// Blocks in the orchestrator's configuration language.
    Language,
    /// Process environment variables. Overrides [`Source::Language`].
    Environment,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Language => "language",
            Source::Environment => "environment",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "language" | "hcl" => Ok(Source::Language),
            "environment" | "env" => Ok(Source::Environment),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

/// Identity under which a fragment is stored before merging.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Meta {
    pub source: Source,
    pub key: Key,
}

impl Meta {
    pub fn new(source: Source, key: Key) -> Self {
        Self { source, key }
    }

    /// Checks the key, and that `default` is only ever set from the environment.
    pub fn validate(&self) -> ConfigResult<()> {
        self.key.validate()?;
        if self.source == Source::Language && self.key.as_str() == Key::DEFAULT_REMOTE {
            return Err(ConfigError::EnvironmentOnlyKey(self.key.to_string()));
        }
        Ok(())
    }
}
