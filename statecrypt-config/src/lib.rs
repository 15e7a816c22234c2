//! Encryption configuration model for state and plan encryption.
//!
//! Configuration arrives in fragments: from the orchestrator's configuration
//! language (one per block) and from environment variables. Each fragment is
//! stored in a [`ConfigMap`] under its `(Source, Key)` identity and resolved
//! lazily with [`ConfigMap::merge`], which applies the precedence rules and
//! validates the result against whatever key providers and methods are
//! registered (see [`ConfigValidator`]).

mod config;
pub mod env;
mod error;
mod key;
mod map;

pub use config::{
    Config, ConfigValidator, DEFAULT_KEY_PROVIDER, DEFAULT_METHOD, KeyProviderConfig,
    MethodConfig, Settings,
};
pub use env::EnvConfigurations;
pub use error::{ConfigError, ConfigResult, PARSE_ERROR_MESSAGE};
pub use key::{KEY_SEPARATOR, Key, Meta, REMOTE_STATE_PREFIX, Source};
pub use map::ConfigMap;
