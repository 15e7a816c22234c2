//! Parsing of configuration supplied through environment variables.
//!
//! Both variables hold a JSON object mapping configuration keys to
//! [`Config`] objects:
//!
//! ```json
//! {"backend": {"key_provider": {"name": "passphrase", "config": {"passphrase": "..."}},
//!              "method": {"name": "full"}}}
//! ```
//!
//! An unset or empty variable means "no configuration". Unknown fields are
//! rejected, and parse errors never echo the input.

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::key::Key;
use std::collections::BTreeMap;
use tracing::trace;

/// Variable holding the primary encryption configuration.
pub const ENCRYPTION_ENV_VAR: &str = "TF_STATE_ENCRYPTION";

/// Variable holding configuration tried only when decrypting with the primary
/// configuration fails. Put the old key here during rotation, or leave
/// [`ENCRYPTION_ENV_VAR`] unset and set only this one to decrypt state on its
/// next write.
pub const FALLBACK_ENV_VAR: &str = "TF_STATE_DECRYPTION_FALLBACK";

/// Named configurations as parsed from one environment variable.
pub type EnvConfigurations = BTreeMap<Key, Config>;

/// Parses a JSON configuration structure.
///
/// Keys are not validated here; they may still need to be merged with
/// configuration-language fragments first.
pub fn parse_configurations(json: &str) -> ConfigResult<EnvConfigurations> {
    serde_json::from_str(json).map_err(|e| {
        // line/column only: the message itself may quote secret values
        trace!(line = e.line(), column = e.column(), "json parse error");
        ConfigError::Parse
    })
}

/// Parses the value of an environment variable, if it is set and non-empty.
pub fn parse_env_value(
    variable: &str,
    what: &str,
    value: Option<&str>,
) -> ConfigResult<Option<EnvConfigurations>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };

    parse_configurations(value)
        .map(Some)
        .map_err(|_| ConfigError::EnvParse {
            what: what.to_string(),
            variable: variable.to_string(),
        })
}

/// Reads and parses `variable` from the process environment.
pub fn configurations_from_env(variable: &str, what: &str) -> ConfigResult<Option<EnvConfigurations>> {
    let value = std::env::var(variable).ok();
    parse_env_value(variable, what, value.as_deref())
}

/// Primary encryption configuration from [`ENCRYPTION_ENV_VAR`].
pub fn encryption_configurations_from_env() -> ConfigResult<Option<EnvConfigurations>> {
    configurations_from_env(ENCRYPTION_ENV_VAR, "encryption configuration")
}

/// Fallback decryption configuration from [`FALLBACK_ENV_VAR`].
pub fn fallback_configurations_from_env() -> ConfigResult<Option<EnvConfigurations>> {
    configurations_from_env(FALLBACK_ENV_VAR, "fallback decryption configuration")
}
