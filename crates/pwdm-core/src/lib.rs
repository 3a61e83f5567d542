//! pwdm core - session context and server-facing services.
//!
//! This crate implements:
//! - The session context (current user plus the key-pair guardian)
//! - The request-layer boundary (`Transport`) and a thin API client
//! - Authentication (password login, logout, captcha)
//! - Account credential writes, signed and sealed with the user's key pair

#![forbid(unsafe_code)]

// State
pub mod session;

// Request layer
pub mod transport;

// Services
pub mod auth;
pub mod account;

// Supporting modules
pub mod errors;
pub mod types;

#[cfg(test)]
mod proptests;
