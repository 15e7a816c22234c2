//! Built-in key providers and their validators.

mod support;

use pretty_assertions::assert_eq;
use statecrypt_config::{ConfigValidator, KeyProviderConfig};
use statecrypt_flow::keyprovider::{DirectKeyProvider, PassphraseKeyProvider};
use statecrypt_flow::{EncryptionInfo, FlowError, KeyProvider, KeyProviderInfo, Registry};
use support::DIRECT_KEY;

fn passphrase(value: &str) -> KeyProviderConfig {
    KeyProviderConfig::new("passphrase").with("passphrase", value)
}

fn direct(value: &str) -> KeyProviderConfig {
    KeyProviderConfig::new("direct").with("key", value)
}

fn validation_error(config: &KeyProviderConfig) -> String {
    Registry::with_builtins()
        .validate_key_provider(config)
        .unwrap_err()
        .to_string()
}

// ── passphrase ───────────────────────────────────────────────────

#[test]
fn passphrase_validation_messages() {
    Registry::with_builtins()
        .validate_key_provider(&passphrase("foobarbaz"))
        .unwrap();

    assert_eq!(
        validation_error(&KeyProviderConfig::new("passphrase")),
        "error in configuration for key provider passphrase: passphrase missing or empty"
    );
    assert_eq!(
        validation_error(&passphrase("foobarbaz").with("iterations", "10")),
        "error in configuration for key provider passphrase: unexpected additional configuration fields, only 'passphrase' is allowed for this key provider"
    );
}

#[test]
fn passphrase_records_fresh_salt_per_encryption() {
    let config = passphrase("foobarbaz");
    let mut first = EncryptionInfo::new("full");
    let mut second = EncryptionInfo::new("full");

    let first_key = PassphraseKeyProvider
        .provide_encryption_key(&mut first, &config)
        .unwrap();
    let second_key = PassphraseKeyProvider
        .provide_encryption_key(&mut second, &config)
        .unwrap();

    let first_salt = &first.key_provider.as_ref().unwrap().config["salt"];
    let second_salt = &second.key_provider.as_ref().unwrap().config["salt"];
    assert_eq!(first_salt.len(), 32);
    assert_ne!(first_salt, second_salt);
    assert_ne!(first_key.as_bytes(), second_key.as_bytes());
}

#[test]
fn passphrase_rebuilds_key_from_recorded_salt() {
    let config = passphrase("foobarbaz");
    let mut info = EncryptionInfo::new("full");
    let encryption_key = PassphraseKeyProvider
        .provide_encryption_key(&mut info, &config)
        .unwrap();

    let decryption_key = PassphraseKeyProvider
        .provide_decryption_key(&info, &config)
        .unwrap();
    assert_eq!(encryption_key.as_bytes(), decryption_key.as_bytes());

    let other = PassphraseKeyProvider
        .provide_decryption_key(&info, &passphrase("something else"))
        .unwrap();
    assert_ne!(encryption_key.as_bytes(), other.as_bytes());
}

#[test]
fn passphrase_salt_problems_are_corruption() {
    let config = passphrase("foobarbaz");
    let cases = [
        (None, "missing key provider information"),
        (
            Some(KeyProviderInfo {
                name: "passphrase".into(),
                ..Default::default()
            }),
            "missing salt",
        ),
        (
            Some(KeyProviderInfo {
                name: "passphrase".into(),
                config: [("salt".to_string(), "0011".to_string())].into(),
            }),
            "failed to decode salt",
        ),
        (
            Some(KeyProviderInfo {
                name: "passphrase".into(),
                config: [("salt".to_string(), "zz".repeat(16))].into(),
            }),
            "failed to decode salt",
        ),
    ];

    for (recorded, reason) in cases {
        let mut info = EncryptionInfo::new("full");
        info.key_provider = recorded;
        let err = PassphraseKeyProvider
            .provide_decryption_key(&info, &config)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("state or plan corrupt for key provider passphrase - {reason}")
        );
    }
}

#[test]
fn passphrase_rejects_foreign_key_provider_info() {
    let mut info = EncryptionInfo::new("full");
    info.key_provider = Some(KeyProviderInfo {
        name: "direct".into(),
        ..Default::default()
    });

    let err = PassphraseKeyProvider
        .provide_decryption_key(&info, &passphrase("foobarbaz"))
        .unwrap_err();
    assert!(matches!(err, FlowError::KeyProviderMismatch { .. }), "got: {err:?}");
}

// ── direct ───────────────────────────────────────────────────────

#[test]
fn direct_validation_messages() {
    Registry::with_builtins()
        .validate_key_provider(&direct(DIRECT_KEY))
        .unwrap();

    let prefix = "error in configuration for key provider direct: ";
    assert_eq!(
        validation_error(&KeyProviderConfig::new("direct")),
        format!("{prefix}field 'key' missing or empty")
    );
    assert_eq!(
        validation_error(&direct("")),
        format!("{prefix}field 'key' missing or empty")
    );
    assert_eq!(
        validation_error(&direct("a0a1")),
        format!("{prefix}field 'key' is not a hex string representing 32 bytes")
    );
    assert_eq!(
        validation_error(&direct(&"zz".repeat(32))),
        format!("{prefix}field 'key' is not a hex string representing 32 bytes")
    );
    assert_eq!(
        validation_error(&direct(DIRECT_KEY).with("passphrase", "x")),
        format!("{prefix}unexpected additional configuration fields, only 'key' is allowed for this key provider")
    );
}

#[test]
fn direct_returns_configured_key_and_records_only_its_name() {
    let mut info = EncryptionInfo::new("full");
    let key = DirectKeyProvider
        .provide_encryption_key(&mut info, &direct(DIRECT_KEY))
        .unwrap();

    assert_eq!(hex_of(key.as_bytes()), DIRECT_KEY);
    assert_eq!(
        info.key_provider,
        Some(KeyProviderInfo {
            name: "direct".into(),
            ..Default::default()
        })
    );

    let rebuilt = DirectKeyProvider
        .provide_decryption_key(&info, &direct(DIRECT_KEY))
        .unwrap();
    assert_eq!(rebuilt.as_bytes(), key.as_bytes());
}

#[test]
fn direct_envelope_serializes_without_config() {
    let mut info = EncryptionInfo::new("full");
    DirectKeyProvider
        .provide_encryption_key(&mut info, &direct(DIRECT_KEY))
        .unwrap();

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["key_provider"], serde_json::json!({"name": "direct"}));
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
