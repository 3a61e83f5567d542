//! pwdm - command-line front end for the pwdm client crypto layer
//!
//! This crate provides a command-line interface for:
//! - Sealing passwords into server envelopes
//! - Generating RSA key pairs
//! - Checking that a private key pairs with a public key
//! - RSA signing, verification, sealing and opening

pub mod cli;
pub mod config;
pub mod keys;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

use pwdm_crypto::FailureKind;

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error, including failed crypto operations
/// - 2: Verification failed - key mismatch or bad signature
/// - 5: Invalid input - bad arguments, key files or encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Key mismatch or signature rejected (exit code 2)
    VerificationFailed = 2,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<FailureKind> for ExitCode {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::MalformedKey => ExitCode::InvalidInput,
            FailureKind::KeyMismatch => ExitCode::VerificationFailed,
            FailureKind::CryptoOperationFailure => ExitCode::GeneralError,
        }
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::VerificationFailed => "VERIFICATION_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::VerificationFailed => "Key pair mismatch or signature verification failed",
            ExitCode::InvalidInput => "Invalid arguments, key material or encoding",
        }
    }
}
