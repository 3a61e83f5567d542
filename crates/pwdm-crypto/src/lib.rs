#![forbid(unsafe_code)]

pub mod encoding;
pub mod hash;

pub mod envelope;
pub mod rsa;
pub mod guardian;

use serde::Serialize;

/// Caller-visible failure classes shared by every error in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unparseable key material or the wrong key type.
    MalformedKey,
    /// An underlying primitive failed; not recoverable for that call.
    CryptoOperationFailure,
    /// A well-formed private key that does not pair with the known public key.
    KeyMismatch,
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod proptests;
