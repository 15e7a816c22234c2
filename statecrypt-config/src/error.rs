//! Configuration error types.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Message used for every JSON parse failure. Details are withheld because the
/// rejected input may carry passphrases or keys.
pub const PARSE_ERROR_MESSAGE: &str = "json parse error, wrong structure, or unknown fields - details omitted for security reasons (may contain key related settings)";

/// Errors raised while parsing, merging or validating encryption configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{message}", message = PARSE_ERROR_MESSAGE)]
    Parse,

    #[error(
        "error parsing {what} from environment variable {variable}: {message}",
        message = PARSE_ERROR_MESSAGE
    )]
    EnvParse { what: String, variable: String },

    #[error(
        "error in configuration for key provider {0}: no registered key provider with this name"
    )]
    UnknownKeyProvider(String),

    #[error(
        "error in configuration for encryption method {0}: no registered encryption method with this name"
    )]
    UnknownMethod(String),

    #[error("error in configuration for key provider {name}: {reason}")]
    InvalidKeyProvider { name: String, reason: String },

    #[error("error in configuration for encryption method {name}: {reason}")]
    InvalidMethod { name: String, reason: String },

    #[error(
        "invalid configuration key '{0}': must be one of default, backend, statefile, planfile, or contain a '.' (e.g. terraform_remote_state.foo)"
    )]
    InvalidKey(String),

    #[error(
        "invalid configuration key '{0}': can only be set from the environment, not from the configuration language"
    )]
    EnvironmentOnlyKey(String),

    #[error("unknown configuration source '{0}'")]
    UnknownSource(String),
}
