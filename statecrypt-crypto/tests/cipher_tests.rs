use pretty_assertions::assert_eq;
use statecrypt_crypto::{
    CryptoError, DerivedKey, KEY_SIZE, NONCE_SIZE, SALT_SIZE, Salt, TAG_SIZE, decode_marked,
    derive_key, encode_marked, open, seal,
};

fn key(byte: u8) -> DerivedKey {
    DerivedKey::from_bytes([byte; KEY_SIZE])
}

const AAD: &[u8] = b"0123456789abcdef";

#[test]
fn seal_open_roundtrip() {
    let key = key(1);
    let plaintext = br#"{"cats":["cheetah","serval","snow leopard"]}"#;

    let sealed = seal(&key, AAD, plaintext).unwrap();
    let recovered = open(&key, AAD, &sealed).unwrap();

    assert_eq!(recovered, plaintext);
}

#[test]
fn sealed_layout_is_nonce_ciphertext_tag() {
    let sealed = seal(&key(1), AAD, b"hello").unwrap();
    assert_eq!(sealed.len(), NONCE_SIZE + 5 + TAG_SIZE);
}

#[test]
fn each_seal_produces_different_ciphertext() {
    let key = key(1);
    let a = seal(&key, AAD, b"same plaintext").unwrap();
    let b = seal(&key, AAD, b"same plaintext").unwrap();

    // Different nonces
    assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    assert_ne!(a, b);

    assert_eq!(open(&key, AAD, &a).unwrap(), b"same plaintext");
    assert_eq!(open(&key, AAD, &b).unwrap(), b"same plaintext");
}

#[test]
fn wrong_key_fails_to_open() {
    let sealed = seal(&key(1), AAD, b"secret").unwrap();
    let err = open(&key(2), AAD, &sealed).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)), "got {err:?}");
}

#[test]
fn wrong_aad_fails_to_open() {
    let sealed = seal(&key(1), AAD, b"secret").unwrap();
    let err = open(&key(1), b"fedcba9876543210", &sealed).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn tampered_ciphertext_fails() {
    let key = key(1);
    let mut sealed = seal(&key, AAD, b"secret").unwrap();
    if let Some(byte) = sealed.last_mut() {
        *byte ^= 0xFF;
    }
    assert!(open(&key, AAD, &sealed).is_err());
}

#[test]
fn tampered_nonce_fails() {
    let key = key(1);
    let mut sealed = seal(&key, AAD, b"secret").unwrap();
    sealed[0] ^= 0xFF;
    assert!(open(&key, AAD, &sealed).is_err());
}

#[test]
fn too_short_for_nonce_rejected() {
    let err = open(&key(1), AAD, &[0u8; NONCE_SIZE - 1]).unwrap_err();
    assert_eq!(err, CryptoError::PayloadTooShort);
    assert_eq!(
        err.to_string(),
        "encrypted payload too short, not even enough for the nonce"
    );
}

#[test]
fn nonce_only_fails_authentication() {
    let err = open(&key(1), AAD, &[0u8; NONCE_SIZE]).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn empty_plaintext_seals() {
    let key = key(1);
    let sealed = seal(&key, AAD, b"").unwrap();
    assert_eq!(open(&key, AAD, &sealed).unwrap(), b"");
}

#[test]
fn marker_wraps_sealed_bytes() {
    let key = key(3);
    let sealed = seal(&key, AAD, b"grey").unwrap();
    let marked = encode_marked(&sealed);

    assert!(marked.starts_with("ENC[") && marked.ends_with(']'));
    assert_eq!(decode_marked(&marked).unwrap(), sealed);
}

#[test]
fn passphrase_key_roundtrip() {
    let salt = Salt::random().unwrap();
    let encrypt_key = derive_key("foobarbaz", &salt).unwrap();
    let decrypt_key = derive_key("foobarbaz", &Salt::from_hex(&salt.to_hex()).unwrap()).unwrap();

    let sealed = seal(&encrypt_key, salt.as_bytes(), b"payload").unwrap();
    assert_eq!(open(&decrypt_key, salt.as_bytes(), &sealed).unwrap(), b"payload");
}

#[test]
fn wrong_passphrase_fails() {
    let salt = Salt::random().unwrap();
    let right = derive_key("right", &salt).unwrap();
    let wrong = derive_key("wrong", &salt).unwrap();

    let sealed = seal(&right, salt.as_bytes(), b"payload").unwrap();
    assert!(open(&wrong, salt.as_bytes(), &sealed).is_err());
}

#[test]
fn salt_hex_validation() {
    assert!(Salt::from_hex("000102030405060708090a0b0c0d0e0f").is_ok());
    // undersized
    assert!(matches!(
        Salt::from_hex("ffeeddccbbaa"),
        Err(CryptoError::Encoding(_))
    ));
    // oversized
    assert!(Salt::from_hex(&"00".repeat(SALT_SIZE + 1)).is_err());
    // malformed
    assert!(Salt::from_hex("zz0102030405060708090a0b0c0d0e0f").is_err());
}

#[test]
fn key_hex_validation() {
    let valid = "a0a1a2a3a4a5a6a7a8a9b0b1b2b3b4b5b6b7b8b9c0c1c2c3c4c5c6c7c8c9d0d1";
    let key = DerivedKey::from_hex(valid).unwrap();
    assert_eq!(key.as_bytes()[0], 0xa0);
    assert_eq!(key.as_bytes()[31], 0xd1);

    assert_eq!(
        DerivedKey::from_hex(&valid[..60]).unwrap_err(),
        CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: 30
        }
    );
    assert!(matches!(
        DerivedKey::from_hex(&format!("{valid}d2d3")),
        Err(CryptoError::InvalidKeyLength { .. })
    ));
    assert!(matches!(
        DerivedKey::from_hex(&format!("something{}", &valid[9..])),
        Err(CryptoError::Encoding(_))
    ));
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn seal_open_always_roundtrips(
            plaintext in proptest::collection::vec(any::<u8>(), 0..512),
            aad in proptest::collection::vec(any::<u8>(), 0..32),
            byte in any::<u8>(),
        ) {
            let key = DerivedKey::from_bytes([byte; KEY_SIZE]);
            let sealed = seal(&key, &aad, &plaintext).unwrap();
            let recovered = open(&key, &aad, &sealed).unwrap();
            prop_assert_eq!(recovered, plaintext);
        }

        #[test]
        fn marker_always_roundtrips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(decode_marked(&encode_marked(&bytes)).unwrap(), bytes);
        }
    }
}
