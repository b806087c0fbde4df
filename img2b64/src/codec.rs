//! Lossless conversion between raw bytes and standard, padded Base64 text.

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

use crate::format::ImageFormat;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not canonical standard Base64 (bad character, length or padding)
    #[error("Invalid Base64 data: {reason}")]
    InvalidEncoding { reason: String },
}

impl From<base64::DecodeError> for CodecError {
    fn from(err: base64::DecodeError) -> Self {
        CodecError::InvalidEncoding { reason: err.to_string() }
    }
}

/// Encode bytes as standard Base64 with `=` padding.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard, padded Base64.
///
/// Rejects characters outside the alphabet, lengths that are not a multiple of 4, and
/// non-canonical padding.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    if text.len() % 4 != 0 {
        return Err(CodecError::InvalidEncoding {
            reason: format!("length {} is not a multiple of 4", text.len()),
        });
    }
    Ok(STANDARD.decode(text)?)
}

/// Build a `data:` URI for an encoded image.
pub fn to_data_uri(format: ImageFormat, base64: &str) -> String {
    format!("data:{};base64,{}", format.mime_type(), base64)
}

/// Return the Base64 payload of a `data:...;base64,` URI, or the trimmed input when it is not one.
pub fn strip_data_uri(text: &str) -> &str {
    let text = text.trim();
    match text.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, payload)) if header.ends_with(";base64") => payload,
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

    /// Deterministic pseudo-random bytes (xorshift)
    fn sample_bytes(len: usize, mut seed: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                (seed >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_encode_known_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
        assert_eq!(encode(&[0xFB, 0xFF]), "+/8=");
    }

    #[test]
    fn test_round_trip_across_sizes() {
        for len in [0, 1, 2, 3, 4, 5, 63, 64, 65, 1000, 4096, 1 << 20] {
            let bytes = sample_bytes(len, len as u64 + 1);
            let text = encode(&bytes);
            assert_eq!(decode(&text).unwrap(), bytes, "round trip failed for {len} bytes");
        }
    }

    #[test]
    fn test_every_byte_value_round_trips() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_encoded_length_and_alphabet() {
        for len in 0..50 {
            let text = encode(&sample_bytes(len, 42));
            assert_eq!(text.len(), len.div_ceil(3) * 4);
            assert_eq!(text.len() % 4, 0);
            assert!(text.chars().all(|c| ALPHABET.contains(c)), "unexpected character in {text}");
        }
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        for input in ["A", "AB", "ABC", "ABCDE", "Zm9vYmF"] {
            assert!(
                matches!(decode(input), Err(CodecError::InvalidEncoding { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_rejects_bad_characters() {
        for input in ["Zm9*", "Zm9v YmFy", "Zm9v\nYmFy", "Zm9-", "Zm_v", "Zm9!"] {
            assert!(decode(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_decode_rejects_misplaced_padding() {
        assert!(decode("=Zm9").is_err());
        assert!(decode("Z===").is_err());
        assert!(decode("Zg==Zg==").is_err());
        // Non-zero trailing bits are not canonical
        assert!(decode("Zh==").is_err());
    }

    #[test]
    fn test_encode_of_decode_is_identity_for_canonical_text() {
        for text in ["", "Zg==", "Zm8=", "Zm9vYmFy", "iVBORw0KGgo="] {
            assert_eq!(encode(&decode(text).unwrap()), text);
        }
    }

    #[test]
    fn test_data_uri_helpers() {
        let uri = to_data_uri(ImageFormat::Png, "iVBORw0KGgo=");
        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(strip_data_uri(&uri), "iVBORw0KGgo=");

        assert_eq!(to_data_uri(ImageFormat::Svg, "PHN2ZyB"), "data:image/svg+xml;base64,PHN2ZyB");

        // Plain Base64 passes through, minus surrounding whitespace
        assert_eq!(strip_data_uri("  Zm9v \n"), "Zm9v");
        // Non-base64 data URIs are left alone
        assert_eq!(strip_data_uri("data:text/plain,hello"), "data:text/plain,hello");
    }
}
