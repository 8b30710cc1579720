//! Account use-case service: sign-in flows, profile edits, deletion.
//!
//! # Responsibility
//! - Pair identity provider calls with the profile document writes the
//!   client keeps next to them.
//! - Purge a user's data before deleting the identity.
//!
//! # Invariants
//! - Display name and profile nickname are written together on sign-up and
//!   on nickname edits.
//! - Account deletion is ordered: memos and profile in one batch, then the
//!   identity. A failing identity step leaves the data already purged.

use crate::auth::identity::{AuthError, FederatedCredential, IdentityProvider};
use crate::model::memo::SortOrder;
use crate::model::user::{email_local_part, PartitionKey, UserIdentity, UserProfile};
use crate::remote::RemoteError;
use crate::repo::batch::{BatchWriter, WriteBatch};
use crate::repo::memo_repo::MemoRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::validation::{validate_email, InputRules, ValidationError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountError {
    Validation(ValidationError),
    Auth(AuthError),
    Remote(RemoteError),
}

impl AccountError {
    /// Identity provider error code, when the failure came from it.
    pub fn auth_code(&self) -> Option<&'static str> {
        match self {
            Self::Auth(err) => Some(err.code()),
            _ => None,
        }
    }

    pub fn requires_recent_login(&self) -> bool {
        matches!(self, Self::Auth(AuthError::RequiresRecentLogin))
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<ValidationError> for AccountError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthError> for AccountError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<RemoteError> for AccountError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Account service facade over the identity provider and profile store.
pub struct AccountService<P, Q, R>
where
    P: IdentityProvider,
    Q: ProfileRepository,
    R: MemoRepository,
{
    identity: Arc<P>,
    profiles: Q,
    memos: R,
    batch: Arc<dyn BatchWriter>,
    rules: InputRules,
}

impl<P, Q, R> AccountService<P, Q, R>
where
    P: IdentityProvider,
    Q: ProfileRepository,
    R: MemoRepository,
{
    pub fn new(
        identity: Arc<P>,
        profiles: Q,
        memos: R,
        batch: Arc<dyn BatchWriter>,
        rules: InputRules,
    ) -> Self {
        Self {
            identity,
            profiles,
            memos,
            batch,
            rules,
        }
    }

    pub fn identity(&self) -> &Arc<P> {
        &self.identity
    }

    pub fn rules(&self) -> &InputRules {
        &self.rules
    }

    /// Validates the credentials and signs in with e-mail and password.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AccountError> {
        let email = email.trim();
        validate_email(email)?;
        self.rules.validate_password(password)?;

        let user = self.identity.sign_in_with_password(email, password)?;
        info!("event=account_sign_in module=service status=ok provider=password");
        Ok(user)
    }

    /// Creates an account, sets its display name and writes the profile.
    ///
    /// An empty nickname falls back to the e-mail local part.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        nickname: &str,
    ) -> Result<UserIdentity, AccountError> {
        let email = email.trim();
        validate_email(email)?;
        self.rules.validate_password(password)?;
        let nickname = if nickname.trim().is_empty() {
            email_local_part(email).to_string()
        } else {
            self.rules.validate_nickname(nickname)?.to_string()
        };

        let mut user = self.identity.sign_up_with_password(email, password)?;
        self.identity.update_display_name(&user.uid, &nickname)?;
        self.profiles
            .create_profile(&user.uid, &user.email, &nickname)?;
        user.display_name = Some(nickname);

        info!("event=account_sign_up module=service status=ok");
        Ok(user)
    }

    /// Federated sign-in followed by a profile merge stamping `last_login`.
    pub fn sign_in_with_google(
        &self,
        credential: &FederatedCredential,
    ) -> Result<UserIdentity, AccountError> {
        let user = self.identity.sign_in_with_google(credential)?;
        let nickname = user
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.email_local_part().to_string());
        self.profiles
            .merge_federated_login(&user.uid, &user.email, &nickname)?;

        info!("event=account_sign_in module=service status=ok provider=google");
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), AccountError> {
        self.identity.sign_out()?;
        info!("event=account_sign_out module=service status=ok");
        Ok(())
    }

    pub fn load_profile(&self, user: &UserIdentity) -> Result<Option<UserProfile>, AccountError> {
        Ok(self.profiles.get_profile(&user.email)?)
    }

    /// Writes a new nickname to the identity and the profile document.
    /// Returns the trimmed nickname.
    pub fn update_nickname(
        &self,
        user: &UserIdentity,
        nickname: &str,
    ) -> Result<String, AccountError> {
        let nickname = self.rules.validate_nickname(nickname)?.to_string();
        self.identity.update_display_name(&user.uid, &nickname)?;
        self.profiles.update_nickname(&user.email, &nickname)?;
        info!("event=account_update module=service status=ok field=nickname");
        Ok(nickname)
    }

    pub fn update_password(
        &self,
        user: &UserIdentity,
        new_password: &str,
    ) -> Result<(), AccountError> {
        self.rules.validate_password(new_password)?;
        self.identity.update_password(&user.uid, new_password)?;
        info!("event=account_update module=service status=ok field=password");
        Ok(())
    }

    /// Deletes every memo and the profile document, then the identity.
    pub fn delete_account(&self, user: &UserIdentity) -> Result<(), AccountError> {
        let partition = PartitionKey::for_user(user);
        let memos = self.memos.list_memos(&partition, SortOrder::NewestFirst)?;

        let mut batch = WriteBatch::new();
        for memo in &memos {
            batch.delete_memo(&partition, &memo.id);
        }
        batch.delete_profile(&user.email);
        self.batch.commit_batch(batch)?;
        info!(
            "event=account_purge module=service status=ok partition={} memos={}",
            partition,
            memos.len()
        );

        if let Err(err) = self.identity.delete_user(&user.uid) {
            warn!(
                "event=account_delete module=service status=error error_code={}",
                err.code()
            );
            return Err(err.into());
        }
        info!("event=account_delete module=service status=ok");
        Ok(())
    }
}
