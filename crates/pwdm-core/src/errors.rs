//! Error types for pwdm core.

use pwdm_crypto::envelope::EnvelopeError;
use pwdm_crypto::guardian::GuardianError;
use pwdm_crypto::rsa::RsaError;
use thiserror::Error;

/// Failures at the request-layer boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server rejected the session (HTTP 401 in the real client).
    #[error("session expired or not authorized")]
    Unauthorized,

    /// The server answered with a non-success business code.
    #[error("server error {code}: {msg}")]
    Api { code: i64, msg: String },

    /// Network or timeout failure below the API layer.
    #[error("request failed: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Guardian(#[from] GuardianError),

    #[error(transparent)]
    Rsa(#[from] RsaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no active session")]
    NoSession,

    /// Writes need a private key proven against the session's public key.
    #[error("no private key matching the account public key is loaded")]
    KeyNotMatched,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// True when the caller should send the user back to login.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Transport(TransportError::Unauthorized) | CoreError::NoSession)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        assert!(CoreError::from(TransportError::Unauthorized).is_unauthorized());
        assert!(CoreError::NoSession.is_unauthorized());
        assert!(!CoreError::KeyNotMatched.is_unauthorized());
        assert!(!CoreError::from(TransportError::Api {
            code: 500,
            msg: "boom".into()
        })
        .is_unauthorized());
    }

    #[test]
    fn test_guardian_messages_pass_through() {
        let err = CoreError::from(GuardianError::KeyMismatch);
        assert_eq!(err.to_string(), GuardianError::KeyMismatch.to_string());
    }
}
