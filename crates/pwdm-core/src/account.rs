//! Account credential services.
//!
//! Writes carry two proofs of key ownership: every secret field is sealed with
//! RSA-OAEP under the user's public key, and the payload is signed over the
//! user's `uid` with the matched private key. Without a matched key nothing is
//! sent.

use std::sync::Arc;

use pwdm_crypto::guardian::{GuardianError, KeyPairGuardian};
use pwdm_crypto::rsa;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{CoreError, CoreResult};
use crate::transport::{ApiClient, Method, Transport};
use crate::types::{AccountDraft, AccountPageQuery, AccountPayload, AccountVo, BasePage, User};

pub const ACCOUNT_PATH: &str = "account";
pub const ACCOUNT_PAGE_PATH: &str = "account/page";

/// Security question slots on an account record.
pub const MAX_SECURITY_QUESTIONS: usize = 3;

pub struct AccountService<T: Transport> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> AccountService<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    pub async fn page(&self, query: &AccountPageQuery) -> CoreResult<BasePage<AccountVo>> {
        Ok(self
            .client
            .request_data::<BasePage<AccountVo>, _>(Method::Get, ACCOUNT_PAGE_PATH, Some(query))
            .await?)
    }

    pub async fn add(&self, draft: &AccountDraft) -> CoreResult<()> {
        let payload = self.seal_and_sign(None, draft)?;
        self.client
            .request::<Value, _>(Method::Post, ACCOUNT_PATH, Some(&payload))
            .await?;
        info!(website = %draft.website, "account added");
        Ok(())
    }

    pub async fn update(&self, id: i64, draft: &AccountDraft) -> CoreResult<()> {
        let payload = self.seal_and_sign(Some(id), draft)?;
        self.client
            .request::<Value, _>(Method::Put, ACCOUNT_PATH, Some(&payload))
            .await?;
        info!(id, "account updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> CoreResult<()> {
        let path = format!("{ACCOUNT_PATH}/{id}");
        self.client
            .request::<Value, Value>(Method::Delete, &path, None)
            .await?;
        info!(id, "account deleted");
        Ok(())
    }

    pub async fn delete_batch(&self, ids: &[i64]) -> CoreResult<()> {
        if ids.is_empty() {
            return Err(CoreError::InvalidInput("no account ids given".into()));
        }
        self.client
            .request::<Value, _>(Method::Delete, ACCOUNT_PATH, Some(ids))
            .await?;
        info!(count = ids.len(), "accounts deleted");
        Ok(())
    }

    /// Decrypt a stored account's password with the matched private key.
    pub fn reveal_password(&self, account: &AccountVo) -> CoreResult<String> {
        self.reveal(&account.password)
    }

    /// Decrypt any sealed field of a stored account. Empty fields stay empty.
    pub fn reveal(&self, sealed: &str) -> CoreResult<String> {
        if sealed.is_empty() {
            return Ok(String::new());
        }
        self.client
            .session()
            .guardian()
            .decrypt(sealed)
            .map_err(not_matched_or)
    }

    fn seal_and_sign(&self, id: Option<i64>, draft: &AccountDraft) -> CoreResult<AccountPayload> {
        validate_draft(draft)?;
        // Seal and sign against one consistent user/key pair.
        self.client
            .session()
            .with_user(|user, guardian| build_payload(id, draft, user, guardian))?
    }
}

fn build_payload(
    id: Option<i64>,
    draft: &AccountDraft,
    user: &User,
    guardian: &KeyPairGuardian,
) -> CoreResult<AccountPayload> {
    if !guardian.is_matched() {
        return Err(CoreError::KeyNotMatched);
    }

    let sealer = Sealer { user };
    let mut questions = draft.security_questions.iter();
    let mut next_question = || -> CoreResult<(Option<String>, Option<String>)> {
        match questions.next() {
            Some((question, answer)) => {
                Ok((sealer.seal_opt(Some(question))?, sealer.seal_opt(Some(answer))?))
            }
            None => Ok((None, None)),
        }
    };
    let (security_question1, security_answer1) = next_question()?;
    let (security_question2, security_answer2) = next_question()?;
    let (security_question3, security_answer3) = next_question()?;

    let signature = guardian.sign(&user.uid).map_err(not_matched_or)?;
    debug!(uid = %user.uid, "account payload signed");

    Ok(AccountPayload {
        id,
        website: draft.website.trim().to_string(),
        url: draft.url.trim().to_string(),
        official_access_url: draft.official_access_url.clone(),
        username: draft.username.clone(),
        nickname: draft.nickname.clone(),
        password: sealer.seal(&draft.password)?,
        email: draft.email.clone(),
        sec_email: draft.sec_email.clone(),
        phone: draft.phone.clone(),
        owner: draft.owner.clone(),
        notes: draft.notes.clone(),
        mfa_provider: draft.mfa_provider.clone(),
        recovery_codes: sealer.seal_opt(draft.recovery_codes.as_ref())?,
        security_question1,
        security_answer1,
        security_question2,
        security_answer2,
        security_question3,
        security_answer3,
        signature,
    })
}

struct Sealer<'a> {
    user: &'a User,
}

impl Sealer<'_> {
    fn seal(&self, plaintext: &str) -> CoreResult<String> {
        Ok(rsa::encrypt(plaintext, &self.user.rsa_public_key)?)
    }

    fn seal_opt(&self, plaintext: Option<&String>) -> CoreResult<Option<String>> {
        plaintext
            .filter(|p| !p.is_empty())
            .map(|p| self.seal(p))
            .transpose()
    }
}

fn not_matched_or(e: GuardianError) -> CoreError {
    match e {
        GuardianError::NotMatched => CoreError::KeyNotMatched,
        other => CoreError::Guardian(other),
    }
}

fn validate_draft(draft: &AccountDraft) -> CoreResult<()> {
    if draft.website.trim().is_empty() {
        return Err(CoreError::InvalidInput("website is required".into()));
    }
    if draft.username.trim().is_empty() {
        return Err(CoreError::InvalidInput("username is required".into()));
    }
    if draft.password.is_empty() {
        return Err(CoreError::InvalidInput("password is required".into()));
    }
    if draft.security_questions.len() > MAX_SECURITY_QUESTIONS {
        return Err(CoreError::InvalidInput(format!(
            "at most {MAX_SECURITY_QUESTIONS} security questions are supported"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AccountDraft {
        AccountDraft {
            website: "example".into(),
            url: "https://example.com".into(),
            username: "alice".into(),
            password: "hunter2".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimal_draft() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        for broken in [
            AccountDraft { website: " ".into(), ..draft() },
            AccountDraft { username: String::new(), ..draft() },
            AccountDraft { password: String::new(), ..draft() },
        ] {
            assert!(matches!(validate_draft(&broken), Err(CoreError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_validate_limits_security_questions() {
        let too_many = AccountDraft {
            security_questions: vec![("q".into(), "a".into()); 4],
            ..draft()
        };
        assert!(validate_draft(&too_many).is_err());
    }

    fn owner(public_pem: &str) -> User {
        User {
            uid: "uid-7".into(),
            username: "alice".into(),
            rsa_public_key: public_pem.into(),
            role: "user".into(),
            create_time: String::new(),
        }
    }

    #[test]
    fn test_payload_seals_questions_and_answers() {
        let keys = rsa::generate_key_pair(rsa::DEFAULT_KEY_BITS).unwrap();
        let user = owner(&keys.public_pem);
        let mut guardian = KeyPairGuardian::with_public_key(keys.public_pem.clone());

        let with_questions = AccountDraft {
            security_questions: vec![
                ("first pet".into(), "rex".into()),
                ("home town".into(), String::new()),
            ],
            ..draft()
        };
        assert!(matches!(
            build_payload(None, &with_questions, &user, &guardian),
            Err(CoreError::KeyNotMatched)
        ));

        guardian.set_private_key(&keys.private_pem).unwrap();
        let payload = build_payload(Some(9), &with_questions, &user, &guardian).unwrap();

        let open = |sealed: &Option<String>| {
            rsa::decrypt(sealed.as_deref().unwrap(), &keys.private_pem).unwrap()
        };
        assert_ne!(payload.security_question1.as_deref(), Some("first pet"));
        assert_eq!(open(&payload.security_question1), "first pet");
        assert_eq!(open(&payload.security_answer1), "rex");
        assert_eq!(open(&payload.security_question2), "home town");
        assert!(payload.security_answer2.is_none());
        assert!(payload.security_question3.is_none());
        assert_eq!(rsa::decrypt(&payload.password, &keys.private_pem).unwrap(), "hunter2");
        assert!(rsa::verify("uid-7", &payload.signature, &keys.public_pem));
        assert_eq!(payload.id, Some(9));
    }

    #[test]
    fn test_not_matched_maps_to_key_not_matched() {
        assert!(matches!(not_matched_or(GuardianError::NotMatched), CoreError::KeyNotMatched));
        assert!(matches!(
            not_matched_or(GuardianError::CryptoFailure("x".into())),
            CoreError::Guardian(_)
        ));
    }
}
