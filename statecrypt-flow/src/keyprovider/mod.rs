//! Key providers turn configuration into a 32-byte key.
//!
//! A provider records whatever it needs to rebuild the key (never the key
//! itself) in the [`EncryptionInfo`] during encryption, and reads it back
//! during decryption.

pub mod direct;
pub mod passphrase;

use crate::error::FlowResult;
use crate::info::EncryptionInfo;
use crate::registry::KeyProviderRegistration;
use statecrypt_config::KeyProviderConfig;
use statecrypt_crypto::DerivedKey;

pub use direct::DirectKeyProvider;
pub use passphrase::PassphraseKeyProvider;

/// Produces keys for one encryption method invocation.
pub trait KeyProvider: Send + Sync {
    /// Supplies a key for a new encryption and records what is needed to
    /// rebuild it in `info.key_provider`.
    fn provide_encryption_key(
        &self,
        info: &mut EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey>;

    /// Rebuilds the key recorded in `info`.
    fn provide_decryption_key(
        &self,
        info: &EncryptionInfo,
        config: &KeyProviderConfig,
    ) -> FlowResult<DerivedKey>;
}

pub(crate) fn builtins() -> [(String, KeyProviderRegistration); 2] {
    [
        (
            passphrase::NAME.to_string(),
            KeyProviderRegistration {
                constructor: passphrase::construct,
                validator: passphrase::validate,
            },
        ),
        (
            direct::NAME.to_string(),
            KeyProviderRegistration {
                constructor: direct::construct,
                validator: direct::validate,
            },
        ),
    ]
}
