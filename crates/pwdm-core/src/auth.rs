//! Password login, logout and captcha.

use std::sync::Arc;

use pwdm_crypto::envelope::{self, RecipientPublicKey};
use serde_json::Value;
use tracing::info;

use crate::errors::{CoreError, CoreResult};
use crate::transport::{ApiClient, Method, Transport};
use crate::types::{CaptchaImg, LoginDto, User};

pub const LOGIN_PATH: &str = "auth/login/password";
pub const LOGOUT_PATH: &str = "auth/logout";
pub const CAPTCHA_PATH: &str = "auth/captcha-img";

pub struct AuthService<T: Transport> {
    client: Arc<ApiClient<T>>,
    recipient: RecipientPublicKey,
}

impl<T: Transport> AuthService<T> {
    /// Passwords are sealed to `recipient`, normally
    /// [`RecipientPublicKey::default_server`].
    pub fn new(client: Arc<ApiClient<T>>, recipient: RecipientPublicKey) -> Self {
        Self { client, recipient }
    }

    /// Log in with a password. The password leaves this function only as an
    /// envelope; on success the returned user becomes the session user.
    pub async fn login_by_password(
        &self,
        username: &str,
        password: &str,
        captcha_uuid: &str,
        captcha_code: &str,
    ) -> CoreResult<User> {
        if username.trim().is_empty() {
            return Err(CoreError::InvalidInput("username is empty".into()));
        }
        if password.is_empty() {
            return Err(CoreError::InvalidInput("password is empty".into()));
        }

        let dto = LoginDto {
            username: username.trim().to_string(),
            password: envelope::encrypt(password, &self.recipient)?,
            captcha_uuid: captcha_uuid.to_string(),
            captcha_code: captcha_code.to_string(),
        };
        let user: User = self
            .client
            .request_data(Method::Post, LOGIN_PATH, Some(&dto))
            .await?;

        self.client.session().begin(user.clone());
        info!(uid = %user.uid, "logged in");
        Ok(user)
    }

    /// Tell the server to drop the session. The local session ends even when
    /// the request fails.
    pub async fn logout(&self) -> CoreResult<()> {
        let result = self
            .client
            .request::<Value, Value>(Method::Get, LOGOUT_PATH, None)
            .await;
        self.client.session().end();
        result.map(|_| ()).map_err(CoreError::from)
    }

    pub async fn captcha(&self) -> CoreResult<CaptchaImg> {
        Ok(self
            .client
            .request_data::<CaptchaImg, Value>(Method::Get, CAPTCHA_PATH, None)
            .await?)
    }
}
