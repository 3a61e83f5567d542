//! Wire types exchanged with the password-manager server.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Envelope every server response arrives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Business success code.
    pub const SUCCESS: i64 = 0;

    pub fn ok(data: T) -> Self {
        Self {
            code: Self::SUCCESS,
            msg: String::new(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Public user identifier; the data signed to authorize account writes.
    pub uid: String,
    pub username: String,
    /// SPKI PEM issued by the server at registration.
    pub rsa_public_key: String,
    /// `admin` or `user`.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub create_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    pub username: String,
    /// Envelope-encrypted password, never the plaintext.
    pub password: String,
    pub captcha_uuid: String,
    pub captcha_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaImg {
    pub uuid: String,
    /// Image data, base64.
    pub base64: String,
    pub expired: String,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasePage<T> {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub records: Vec<T>,
}

/// Filters for `account/page`. Unset filters are left off the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_access_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sec_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time_end: Option<String>,
}

/// A stored account as the server returns it. Secret fields hold RSA-OAEP
/// ciphertext (base64) sealed under the owner's public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountVo {
    pub id: i64,
    pub website: String,
    pub url: String,
    pub official_access_url: String,
    pub username: String,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub sec_email: String,
    pub phone: String,
    pub owner: String,
    pub notes: String,
    pub mfa_provider: String,
    pub recovery_codes: String,
    pub security_question1: String,
    pub security_answer1: String,
    pub security_question2: String,
    pub security_answer2: String,
    pub security_question3: String,
    pub security_answer3: String,
    pub create_time: String,
    pub update_time: String,
}

/// Plaintext account fields as the user enters them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountDraft {
    pub website: String,
    pub url: String,
    pub official_access_url: Option<String>,
    pub username: String,
    pub nickname: Option<String>,
    pub password: String,
    pub email: Option<String>,
    pub sec_email: Option<String>,
    pub phone: Option<String>,
    pub owner: Option<String>,
    pub notes: String,
    pub mfa_provider: Option<String>,
    pub recovery_codes: Option<String>,
    /// Up to three (question, answer) pairs.
    pub security_questions: Vec<(String, String)>,
}

impl std::fmt::Debug for AccountDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDraft")
            .field("website", &self.website)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_questions", &self.security_questions.len())
            .finish_non_exhaustive()
    }
}

/// Body of `POST account` / `PUT account`: a draft with its secrets sealed
/// and the owner's signature attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub website: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_access_url: Option<String>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sec_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_question1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_answer1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_question2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_answer2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_question3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_answer3: Option<String>,
    /// Base64 SHA512withRSA signature over the owner's `uid`.
    pub signature: String,
}
