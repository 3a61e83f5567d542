//! RSA helpers matching the server's Java configuration.
//!
//! - Encryption: `RSA/ECB/OAEPWithSHA-512AndMGF1Padding` (SHA-512 main and MGF1 hash).
//! - Signatures: `SHA512withRSA` (PKCS#1 v1.5).
//!
//! Keys are PEM text. Private keys may be PKCS#8 (`PRIVATE KEY`) or PKCS#1
//! (`RSA PRIVATE KEY`); public keys SubjectPublicKeyInfo (`PUBLIC KEY`) or
//! PKCS#1 (`RSA PUBLIC KEY`).

use ::rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ::rsa::traits::PublicKeyParts;
use ::rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use rand_core::OsRng;
use sha2::Sha512;
use tracing::debug;
use zeroize::Zeroizing;

use crate::encoding::{from_base64, to_base64};
use crate::hash::sha512;
use crate::FailureKind;

/// Smallest modulus `generate_key_pair` will produce. OAEP with SHA-512
/// needs at least 130 bytes of overhead, so 1024-bit keys cannot carry it.
pub const MIN_KEY_BITS: usize = 2048;
pub const MAX_KEY_BITS: usize = 4096;
pub const DEFAULT_KEY_BITS: usize = 2048;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RsaError {
    #[error("malformed key: {0}")]
    MalformedKey(String),
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("key size {0} is outside {MIN_KEY_BITS}..={MAX_KEY_BITS} bits")]
    InvalidKeySize(usize),
    #[error("crypto operation failed: {0}")]
    CryptoFailure(String),
}

impl RsaError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RsaError::MalformedKey(_) | RsaError::InvalidKeySize(_) => FailureKind::MalformedKey,
            RsaError::InvalidEncoding(_) | RsaError::CryptoFailure(_) => {
                FailureKind::CryptoOperationFailure
            }
        }
    }
}

fn oaep() -> Oaep {
    Oaep::new::<Sha512>()
}

fn pkcs1v15_sha512() -> Pkcs1v15Sign {
    Pkcs1v15Sign::new::<Sha512>()
}

/// Parse an RSA private key and confirm it really is one.
///
/// Being PEM-shaped is not enough: the modulus and public exponent must be
/// present and the CRT components must be consistent.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, RsaError> {
    let trimmed = pem.trim();
    if trimmed.is_empty() {
        return Err(RsaError::MalformedKey("empty key".to_string()));
    }

    let key = RsaPrivateKey::from_pkcs8_pem(trimmed)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(trimmed))
        .map_err(|e| RsaError::MalformedKey(e.to_string()))?;

    if key.n().bits() == 0 || key.e().bits() == 0 {
        return Err(RsaError::MalformedKey(
            "missing modulus or public exponent".to_string(),
        ));
    }
    key.validate()
        .map_err(|e| RsaError::MalformedKey(e.to_string()))?;
    Ok(key)
}

pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, RsaError> {
    let trimmed = pem.trim();
    if trimmed.is_empty() {
        return Err(RsaError::MalformedKey("empty key".to_string()));
    }
    RsaPublicKey::from_public_key_pem(trimmed)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed))
        .map_err(|e| RsaError::MalformedKey(e.to_string()))
}

/// Format check only: true if `pem` parses as a usable RSA private key.
pub fn is_private_key_valid(pem: &str) -> bool {
    match parse_private_key(pem) {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "private key failed validation");
            false
        }
    }
}

/// RSA-OAEP encrypt `plaintext` (UTF-8) to `public_pem`; returns base64.
pub fn encrypt(plaintext: &str, public_pem: &str) -> Result<String, RsaError> {
    let key = parse_public_key(public_pem)?;
    encrypt_with_key(&key, plaintext.as_bytes()).map(|ct| to_base64(&ct))
}

pub fn encrypt_with_key(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, RsaError> {
    key.encrypt(&mut OsRng, oaep(), plaintext)
        .map_err(|e| RsaError::CryptoFailure(e.to_string()))
}

/// Inverse of [`encrypt`].
pub fn decrypt(ciphertext_b64: &str, private_pem: &str) -> Result<String, RsaError> {
    let key = parse_private_key(private_pem)?;
    decrypt_with_key(&key, ciphertext_b64)
}

pub fn decrypt_with_key(key: &RsaPrivateKey, ciphertext_b64: &str) -> Result<String, RsaError> {
    let ciphertext =
        from_base64(ciphertext_b64).map_err(|e| RsaError::InvalidEncoding(e.to_string()))?;
    let plaintext = Zeroizing::new(
        key.decrypt(oaep(), &ciphertext)
            .map_err(|e| RsaError::CryptoFailure(e.to_string()))?,
    );
    String::from_utf8(plaintext.to_vec())
        .map_err(|_| RsaError::InvalidEncoding("plaintext is not UTF-8".to_string()))
}

/// SHA512withRSA signature over the UTF-8 bytes of `data`; returns base64.
pub fn sign(data: &str, private_pem: &str) -> Result<String, RsaError> {
    let key = parse_private_key(private_pem)?;
    sign_with_key(&key, data).map(|sig| to_base64(&sig))
}

pub fn sign_with_key(key: &RsaPrivateKey, data: &str) -> Result<Vec<u8>, RsaError> {
    let digest = sha512(data.as_bytes());
    key.sign(pkcs1v15_sha512(), &digest)
        .map_err(|e| RsaError::CryptoFailure(e.to_string()))
}

/// Check a SHA512withRSA signature. Any failure, including unparseable
/// input, is reported as `false`.
pub fn verify(data: &str, signature_b64: &str, public_pem: &str) -> bool {
    let key = match parse_public_key(public_pem) {
        Ok(key) => key,
        Err(e) => {
            debug!(error = %e, "verify: bad public key");
            return false;
        }
    };
    match from_base64(signature_b64) {
        Ok(signature) => verify_with_key(&key, data, &signature),
        Err(e) => {
            debug!(error = %e, "verify: bad signature encoding");
            false
        }
    }
}

pub fn verify_with_key(key: &RsaPublicKey, data: &str, signature: &[u8]) -> bool {
    let digest = sha512(data.as_bytes());
    key.verify(pkcs1v15_sha512(), &digest, signature).is_ok()
}

/// Freshly generated key pair, PEM encoded.
pub struct GeneratedKeyPair {
    /// PKCS#8 `PRIVATE KEY`.
    pub private_pem: Zeroizing<String>,
    /// SubjectPublicKeyInfo `PUBLIC KEY`.
    pub public_pem: String,
}

impl std::fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("private_pem", &"[REDACTED]")
            .field("public_pem", &self.public_pem)
            .finish()
    }
}

pub fn generate_key_pair(bits: usize) -> Result<GeneratedKeyPair, RsaError> {
    if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        return Err(RsaError::InvalidKeySize(bits));
    }
    let private = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| RsaError::CryptoFailure(e.to_string()))?;
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| RsaError::CryptoFailure(e.to_string()))?;
    let public_pem = public_pem_for(&private)?;
    debug!(bits, "generated RSA key pair");
    Ok(GeneratedKeyPair {
        private_pem,
        public_pem,
    })
}

/// SubjectPublicKeyInfo PEM of the public half of `private`.
pub fn public_pem_for(private: &RsaPrivateKey) -> Result<String, RsaError> {
    RsaPublicKey::from(private)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| RsaError::CryptoFailure(e.to_string()))
}
