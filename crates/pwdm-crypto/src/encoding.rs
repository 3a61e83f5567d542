//! Byte-level conversions shared by the envelope and RSA code.
//!
//! Everything here is a pure transform over byte slices: base64 with the
//! standard alphabet, PEM body extraction and fixed-length segment handling.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Length of an uncompressed SEC1 P-256 point: `0x04 || X(32) || Y(32)`.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// SEC1 tag byte for an uncompressed point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("expected at least {expected} bytes, got {got}")]
    TooShort { expected: usize, got: usize },
}

/// Encode bytes as standard, padded base64.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64, ignoring any ASCII whitespace (PEM bodies wrap at 64 columns).
pub fn from_base64(text: &str) -> Result<Vec<u8>, EncodingError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| EncodingError::Base64(e.to_string()))
}

/// Return the base64 body of the first PEM block in `text`, or `None` if
/// `text` carries no `-----BEGIN` armor.
pub fn pem_body(text: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    lines.find(|l| l.starts_with("-----BEGIN "))?;

    let mut body = String::new();
    for line in lines {
        if line.starts_with("-----END ") {
            return Some(body);
        }
        // Encapsulated headers (Proc-Type etc.) are not part of the body.
        if line.contains(':') {
            continue;
        }
        body.push_str(line);
    }
    None
}

/// Take exactly the trailing uncompressed point out of a key container.
///
/// SubjectPublicKeyInfo wraps the point in an ASN.1 envelope; the point is
/// always the last 65 bytes. A container shorter than that cannot hold one.
pub fn trailing_point(container: &[u8]) -> Result<&[u8], EncodingError> {
    if container.len() < UNCOMPRESSED_POINT_LEN {
        return Err(EncodingError::TooShort {
            expected: UNCOMPRESSED_POINT_LEN,
            got: container.len(),
        });
    }
    Ok(&container[container.len() - UNCOMPRESSED_POINT_LEN..])
}

/// Concatenate segments into one buffer.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Split `bytes` at `at`, failing if there are not enough bytes.
pub fn split_at_checked(bytes: &[u8], at: usize) -> Result<(&[u8], &[u8]), EncodingError> {
    if bytes.len() < at {
        return Err(EncodingError::TooShort {
            expected: at,
            got: bytes.len(),
        });
    }
    Ok(bytes.split_at(at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_matches_known_vector() {
        assert_eq!(to_base64(b"pwdm"), "cHdkbQ==");
        assert_eq!(from_base64("cHdkbQ==").unwrap(), b"pwdm");
    }

    #[test]
    fn test_from_base64_ignores_line_breaks() {
        let wrapped = "cHdk\nbQ==\r\n";
        assert_eq!(from_base64(wrapped).unwrap(), b"pwdm");
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        assert!(matches!(from_base64("not*base64"), Err(EncodingError::Base64(_))));
    }

    #[test]
    fn test_pem_body_extracts_block() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\nBBBB\n-----END PUBLIC KEY-----\n";
        assert_eq!(pem_body(pem).as_deref(), Some("AAAABBBB"));
    }

    #[test]
    fn test_pem_body_none_without_armor() {
        assert_eq!(pem_body("AAAABBBB"), None);
        // Unterminated block is not a body either.
        assert_eq!(pem_body("-----BEGIN X-----\nAAAA\n"), None);
    }

    #[test]
    fn test_trailing_point_takes_last_65() {
        let mut container = vec![0xAAu8; 26];
        container.push(UNCOMPRESSED_POINT_TAG);
        container.extend_from_slice(&[7u8; 64]);

        let point = trailing_point(&container).unwrap();
        assert_eq!(point.len(), UNCOMPRESSED_POINT_LEN);
        assert_eq!(point[0], UNCOMPRESSED_POINT_TAG);
        assert!(point[1..].iter().all(|b| *b == 7));
    }

    #[test]
    fn test_trailing_point_exact_length_passthrough() {
        let raw = [1u8; UNCOMPRESSED_POINT_LEN];
        assert_eq!(trailing_point(&raw).unwrap(), &raw[..]);
    }

    #[test]
    fn test_trailing_point_too_short() {
        assert_eq!(
            trailing_point(&[0u8; 33]),
            Err(EncodingError::TooShort { expected: 65, got: 33 })
        );
    }

    #[test]
    fn test_concat_and_split() {
        let joined = concat(&[b"ab", b"", b"cde"]);
        assert_eq!(joined, b"abcde");

        let (head, tail) = split_at_checked(&joined, 2).unwrap();
        assert_eq!(head, b"ab");
        assert_eq!(tail, b"cde");
        assert!(split_at_checked(&joined, 6).is_err());
    }
}
