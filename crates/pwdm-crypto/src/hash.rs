use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

/// AES-128 key length used by the password envelope.
pub const AES_KEY_LEN: usize = 16;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut h = Sha512::new();
    h.update(data);
    let out = h.finalize();
    let mut arr = [0u8; 64];
    arr.copy_from_slice(&out);
    arr
}

/// Envelope key derivation: first 16 bytes of SHA-256(shared_secret).
///
/// `shared_secret` is the 32-byte big-endian ECDH x-coordinate. The receiver
/// re-derives the same key from its own side of the agreement.
pub fn derive_aes_key(shared_secret: &[u8]) -> Zeroizing<[u8; AES_KEY_LEN]> {
    let digest = Zeroizing::new(sha256(shared_secret));
    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    key.copy_from_slice(&digest[..AES_KEY_LEN]);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty_vector() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha512_abc_prefix() {
        assert!(hex::encode(sha512(b"abc")).starts_with("ddaf35a193617aba"));
    }

    #[test]
    fn test_derive_aes_key_is_truncated_digest() {
        let secret = [0x42u8; 32];
        let key = derive_aes_key(&secret);
        assert_eq!(&key[..], &sha256(&secret)[..16]);
    }

    #[test]
    fn test_derive_aes_key_determinism() {
        let secret = [9u8; 32];
        assert_eq!(*derive_aes_key(&secret), *derive_aes_key(&secret));
        assert_ne!(*derive_aes_key(&secret), *derive_aes_key(&[8u8; 32]));
    }
}
