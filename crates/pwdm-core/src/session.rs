//! Session context: the logged-in user and the key-pair guardian.
//!
//! One `Session` is shared (behind an `Arc`) by the API client and the
//! services, replacing ambient global state. Beginning a session loads the
//! user's RSA public key into the guardian; ending it forgets the user and
//! wipes any private key.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use pwdm_crypto::guardian::{KeyPairGuardian, SharedGuardian};
use tracing::info;

use crate::errors::{CoreError, CoreResult};
use crate::types::User;

#[derive(Debug, Clone)]
struct ActiveUser {
    user: User,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Session {
    active: RwLock<Option<ActiveUser>>,
    guardian: SharedGuardian,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guardian(guardian: SharedGuardian) -> Self {
        Self {
            active: RwLock::new(None),
            guardian,
        }
    }

    /// Start a session for `user`.
    ///
    /// A private key already held by the guardian survives only if it pairs
    /// with the new user's public key. The user slot stays write-locked until
    /// the guardian holds the new public key, so readers never see one
    /// without the other.
    pub fn begin(&self, user: User) {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        self.guardian.set_public_key(user.rsa_public_key.clone());
        info!(uid = %user.uid, username = %user.username, "session started");
        *slot = Some(ActiveUser {
            user,
            started_at: Utc::now(),
        });
    }

    /// End the session. Idempotent.
    pub fn end(&self) {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let previous = slot.take();
        self.guardian.with(|guardian| {
            guardian.clear_private_key();
            guardian.set_public_key(String::new());
        });
        drop(slot);

        if let Some(previous) = previous {
            info!(uid = %previous.user.uid, "session ended");
        }
    }

    /// Run `f` with the current user and the guardian locked together.
    ///
    /// Neither can change while `f` runs. Lock order is user slot, then
    /// guardian, matching `begin` and `end`.
    pub fn with_user<R>(
        &self,
        f: impl FnOnce(&User, &mut KeyPairGuardian) -> R,
    ) -> CoreResult<R> {
        let slot = self.active.read().unwrap_or_else(PoisonError::into_inner);
        let active = slot.as_ref().ok_or(CoreError::NoSession)?;
        Ok(self.guardian.with(|guardian| f(&active.user, guardian)))
    }

    pub fn user(&self) -> Option<User> {
        self.read().map(|active| active.user)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.read().map(|active| active.started_at)
    }

    pub fn is_active(&self) -> bool {
        self.read().is_some()
    }

    /// The current user, or [`CoreError::NoSession`].
    pub fn require_user(&self) -> CoreResult<User> {
        self.user().ok_or(CoreError::NoSession)
    }

    pub fn guardian(&self) -> &SharedGuardian {
        &self.guardian
    }

    fn read(&self) -> Option<ActiveUser> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
