//! Shared fixtures for flow integration tests.
#![allow(dead_code)]

use serde_json::Value;
use statecrypt_config::{Config, Key, KeyProviderConfig, MethodConfig};
use statecrypt_flow::{EncryptedDocument, Flow, Registry};
use std::sync::{Arc, Once};

pub const DIRECT_KEY: &str = "a0a1a2a3a4a5a6a7a8a9b0b1b2b3b4b5b6b7b8b9c0c1c2c3c4c5c6c7c8c9d0d1";
pub const OTHER_DIRECT_KEY: &str =
    "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

/// Honors `RUST_LOG`, e.g. `RUST_LOG=statecrypt_flow=trace`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn registry() -> Arc<Registry> {
    Arc::new(Registry::with_builtins())
}

pub fn passphrase_config(passphrase: &str, method: &str) -> Config {
    Config::new(
        KeyProviderConfig::new("passphrase").with("passphrase", passphrase),
        MethodConfig::new(method),
    )
}

pub fn direct_config(key: &str, method: &str) -> Config {
    Config::new(
        KeyProviderConfig::new("direct").with("key", key),
        MethodConfig::new(method),
    )
}

/// A backend flow over the built-in registry.
pub fn flow(encryption: Option<Config>, fallback: Option<Config>) -> Flow {
    init_tracing();
    Flow::new(Key::backend(), encryption, fallback, registry())
}

pub fn parse_document(bytes: &[u8]) -> EncryptedDocument {
    serde_json::from_slice(bytes).expect("encrypted output must be a JSON object")
}

pub fn is_ciphertext(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with("ENC[") && s.ends_with(']'))
}
