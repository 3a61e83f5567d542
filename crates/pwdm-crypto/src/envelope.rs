//! Password envelope: ECIES-style sealing to the server's P-256 key.
//!
//! Wire layout, base64-encoded as a whole:
//!
//! ```text
//! ephemeral point (65, uncompressed) || iv (16) || AES-128-CBC/PKCS#7 ciphertext (16n)
//! ```
//!
//! The AES key is the first 16 bytes of SHA-256 over the 32-byte ECDH
//! x-coordinate. A fresh ephemeral key and IV are drawn for every call, so two
//! envelopes of the same plaintext never match.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use p256::ecdh::{diffie_hellman, EphemeralSecret};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePublicKey;
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use tracing::debug;

use crate::encoding::{
    concat, from_base64, pem_body, split_at_checked, to_base64, trailing_point,
    UNCOMPRESSED_POINT_LEN, UNCOMPRESSED_POINT_TAG,
};
use crate::hash::derive_aes_key;
use crate::FailureKind;

/// IV length for AES-CBC.
pub const IV_LEN: usize = 16;

/// AES block length; ciphertext is always a non-zero multiple of it.
pub const BLOCK_LEN: usize = 16;

/// Fixed bytes in front of the ciphertext.
pub const HEADER_LEN: usize = UNCOMPRESSED_POINT_LEN + IV_LEN;

/// The server's P-256 public key (SubjectPublicKeyInfo, base64).
pub const DEFAULT_SERVER_PUBLIC_KEY: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE1GuXw8p0TQZLozc94tIHuzYq/eBISMnP/J+DZghbTkQSbkqS7CNzbSxREP98eeiaomDRNk1bdXzCZcSkkJx5vg==";

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("malformed recipient key: {0}")]
    MalformedKey(String),
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("crypto operation failed: {0}")]
    CryptoFailure(&'static str),
}

impl EnvelopeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EnvelopeError::MalformedKey(_) => FailureKind::MalformedKey,
            EnvelopeError::MalformedEnvelope(_) | EnvelopeError::CryptoFailure(_) => {
                FailureKind::CryptoOperationFailure
            }
        }
    }
}

/// A recipient's P-256 public key, reduced to its curve point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipientPublicKey {
    point: PublicKey,
}

impl RecipientPublicKey {
    /// Parse a key given as a PEM `PUBLIC KEY` block or as base64 of a
    /// container (SubjectPublicKeyInfo DER or a bare SEC1 point).
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let body = pem_body(text).unwrap_or_else(|| text.to_string());
        let bytes = from_base64(&body).map_err(|e| EnvelopeError::MalformedKey(e.to_string()))?;
        Self::from_container_bytes(&bytes)
    }

    /// The key every login password is sealed to.
    pub fn default_server() -> Result<Self, EnvelopeError> {
        Self::parse(DEFAULT_SERVER_PUBLIC_KEY)
    }

    /// Extract the trailing 65-byte uncompressed point from `container`.
    pub fn from_container_bytes(container: &[u8]) -> Result<Self, EnvelopeError> {
        let raw = trailing_point(container).map_err(|e| EnvelopeError::MalformedKey(e.to_string()))?;
        if raw[0] != UNCOMPRESSED_POINT_TAG {
            return Err(EnvelopeError::MalformedKey(format!(
                "expected uncompressed point tag 0x04, got {:#04x}",
                raw[0]
            )));
        }
        let point = PublicKey::from_sec1_bytes(raw)
            .map_err(|_| EnvelopeError::MalformedKey("point is not on P-256".to_string()))?;
        Ok(Self { point })
    }

    /// Uncompressed SEC1 encoding (`0x04 || X || Y`).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let encoded = self.point.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// SubjectPublicKeyInfo DER, base64: the form the server hands out.
    pub fn to_base64_spki(&self) -> Result<String, EnvelopeError> {
        let der = self
            .point
            .to_public_key_der()
            .map_err(|_| EnvelopeError::CryptoFailure("spki encoding"))?;
        Ok(to_base64(der.as_bytes()))
    }
}

/// Seal `plaintext` to `recipient`, returning the base64 envelope.
pub fn encrypt(plaintext: &str, recipient: &RecipientPublicKey) -> Result<String, EnvelopeError> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_point = ephemeral.public_key().to_encoded_point(false);

    let shared = ephemeral.diffie_hellman(&recipient.point);
    let key = derive_aes_key(shared.raw_secret_bytes().as_slice());
    drop(shared);
    drop(ephemeral);

    let mut iv = [0u8; IV_LEN];
    getrandom::getrandom(&mut iv).map_err(|_| EnvelopeError::CryptoFailure("iv generation"))?;

    let ciphertext = Aes128CbcEnc::new_from_slices(key.as_slice(), &iv)
        .map_err(|_| EnvelopeError::CryptoFailure("cipher init"))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let envelope = concat(&[ephemeral_point.as_bytes(), &iv, &ciphertext]);
    debug!(
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "sealed envelope"
    );
    Ok(to_base64(&envelope))
}

/// Seal a password to the built-in server key.
pub fn encrypt_password(password: &str) -> Result<String, EnvelopeError> {
    encrypt(password, &RecipientPublicKey::default_server()?)
}

/// The three segments of an envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeParts {
    pub ephemeral_point: [u8; UNCOMPRESSED_POINT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// Split a base64 envelope into point, IV and ciphertext.
///
/// Lengths are fixed except for the ciphertext, which is whatever remains and
/// must be a non-empty multiple of the block size.
pub fn split_envelope(envelope_b64: &str) -> Result<EnvelopeParts, EnvelopeError> {
    let bytes =
        from_base64(envelope_b64).map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;
    if bytes.len() < HEADER_LEN + BLOCK_LEN {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "envelope is {} bytes, need at least {}",
            bytes.len(),
            HEADER_LEN + BLOCK_LEN
        )));
    }

    let (point, rest) = split_at_checked(&bytes, UNCOMPRESSED_POINT_LEN)
        .map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;
    let (iv, ciphertext) =
        split_at_checked(rest, IV_LEN).map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;

    if point[0] != UNCOMPRESSED_POINT_TAG {
        return Err(EnvelopeError::MalformedEnvelope(
            "ephemeral point is not uncompressed".to_string(),
        ));
    }
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "ciphertext length {} is not a multiple of {}",
            ciphertext.len(),
            BLOCK_LEN
        )));
    }

    let mut parts = EnvelopeParts {
        ephemeral_point: [0u8; UNCOMPRESSED_POINT_LEN],
        iv: [0u8; IV_LEN],
        ciphertext: ciphertext.to_vec(),
    };
    parts.ephemeral_point.copy_from_slice(point);
    parts.iv.copy_from_slice(iv);
    Ok(parts)
}

/// Expected decoded envelope length for a plaintext of `plaintext_len` bytes.
pub fn envelope_len(plaintext_len: usize) -> usize {
    HEADER_LEN + (plaintext_len / BLOCK_LEN + 1) * BLOCK_LEN
}

/// Holder of a recipient private key: the server side of the envelope.
///
/// The client never decrypts envelopes in production; this is the decryptor
/// tests and server tooling use to check the byte layout end to end.
pub struct EnvelopeRecipient {
    secret: SecretKey,
}

impl EnvelopeRecipient {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, EnvelopeError> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|_| EnvelopeError::MalformedKey("scalar out of range".to_string()))?;
        Ok(Self { secret })
    }

    pub fn public_key(&self) -> RecipientPublicKey {
        RecipientPublicKey {
            point: self.secret.public_key(),
        }
    }

    /// Base64 SubjectPublicKeyInfo DER, the form clients are configured with.
    pub fn public_key_base64(&self) -> Result<String, EnvelopeError> {
        self.public_key().to_base64_spki()
    }

    /// Open an envelope produced by [`encrypt`] for this recipient.
    pub fn decrypt(&self, envelope_b64: &str) -> Result<String, EnvelopeError> {
        let parts = split_envelope(envelope_b64)?;
        let ephemeral = PublicKey::from_sec1_bytes(&parts.ephemeral_point).map_err(|_| {
            EnvelopeError::MalformedEnvelope("ephemeral point is not on P-256".to_string())
        })?;

        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), ephemeral.as_affine());
        let key = derive_aes_key(shared.raw_secret_bytes().as_slice());

        let plaintext = Aes128CbcDec::new_from_slices(key.as_slice(), &parts.iv)
            .map_err(|_| EnvelopeError::CryptoFailure("cipher init"))?
            .decrypt_padded_vec_mut::<Pkcs7>(&parts.ciphertext)
            .map_err(|_| EnvelopeError::MalformedEnvelope("bad padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| EnvelopeError::MalformedEnvelope("plaintext is not UTF-8".to_string()))
    }
}

impl std::fmt::Debug for EnvelopeRecipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeRecipient")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
