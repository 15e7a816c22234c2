//! The `ENC[...]` string marker wrapping base64 ciphertext.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const MARKER_PREFIX: &str = "ENC[";
pub const MARKER_SUFFIX: &str = "]";

/// Wraps raw bytes as `ENC[<base64>]`.
pub fn encode_marked(bytes: &[u8]) -> String {
    format!("{MARKER_PREFIX}{}{MARKER_SUFFIX}", STANDARD.encode(bytes))
}

/// Whether `value` looks like a marked ciphertext.
pub fn is_marked(value: &str) -> bool {
    value.len() >= MARKER_PREFIX.len() + MARKER_SUFFIX.len()
        && value.starts_with(MARKER_PREFIX)
        && value.ends_with(MARKER_SUFFIX)
}

/// Strips the marker and decodes the base64 body.
pub fn decode_marked(value: &str) -> CryptoResult<Vec<u8>> {
    if !is_marked(value) {
        return Err(CryptoError::MissingMarker);
    }
    let body = &value[MARKER_PREFIX.len()..value.len() - MARKER_SUFFIX.len()];
    STANDARD
        .decode(body)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64 in encrypted string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_decodes_to_nothing() {
        assert_eq!(decode_marked("ENC[]").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn unmarked_string_rejected() {
        assert_eq!(
            decode_marked("not starting with ENC["),
            Err(CryptoError::MissingMarker)
        );
        assert_eq!(decode_marked("ENC["), Err(CryptoError::MissingMarker));
    }

    #[test]
    fn bad_base64_rejected() {
        assert!(matches!(
            decode_marked("ENC[%%%]"),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn encodes_with_standard_alphabet() {
        assert_eq!(encode_marked(&[0xfb, 0xff]), "ENC[+/8=]");
    }
}
