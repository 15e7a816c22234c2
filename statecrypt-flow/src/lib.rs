//! Transparent client-side encryption for state and plan files.
//!
//! An [`Encryption`] instance collects configuration fragments and hands out
//! one [`Flow`] per consumer key. A flow encrypts with its primary
//! configuration and decrypts with the primary, then the fallback, which
//! makes key and method rotation possible:
//!
//! ```no_run
//! use statecrypt_config::{Config, Key, KeyProviderConfig, MethodConfig, Source};
//! use statecrypt_flow::{Encryption, Registry, StateFlow};
//! use std::sync::Arc;
//!
//! # fn main() -> statecrypt_flow::FlowResult<()> {
//! let encryption = Encryption::new(Arc::new(Registry::with_builtins()));
//! encryption.apply_configuration(
//!     Source::Language,
//!     Key::backend(),
//!     Config::new(
//!         KeyProviderConfig::new("passphrase").with("passphrase", "a very long passphrase"),
//!         MethodConfig::new("full"),
//!     ),
//! )?;
//!
//! let flow = encryption.remote_state()?;
//! let encrypted = flow.encrypt_state(br#"{"serial":1}"#)?;
//! assert_eq!(flow.decrypt_state(&encrypted)?, br#"{"serial":1}"#);
//! # Ok(())
//! # }
//! ```
//!
//! Payloads without an `encryption` envelope always decrypt to themselves,
//! so existing unencrypted state can be picked up and encrypted on the next write.

mod encryption;
mod error;
mod flow;
mod info;
pub mod keyprovider;
pub mod method;
mod registry;
mod settings;

pub use encryption::Encryption;
pub use error::{FlowError, FlowResult, KeyValidationError};
pub use flow::{Flow, PlanFlow, StateFlow};
pub use info::{
    ENCRYPTION_TOP_LEVEL_KEY, ENCRYPTION_VERSION, EncryptedDocument, EncryptionInfo,
    KeyProviderInfo, MethodInfo,
};
pub use keyprovider::KeyProvider;
pub use method::Method;
pub use registry::{
    KeyProviderConstructor, KeyProviderRegistration, KeyProviderValidator, MethodConstructor,
    MethodRegistration, MethodValidator, Registry,
};
pub use settings::EncryptionSettings;
