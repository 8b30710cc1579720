//! Identity provider backed by the local SQLite backend.
//!
//! # Responsibility
//! - Store accounts with salted password digests.
//! - Hold the single signed-in session and notify session listeners.
//! - Reject sensitive operations on stale sessions with
//!   `auth/requires-recent-login`.
//!
//! # Invariants
//! - Listeners run after the session lock is released.
//! - E-mail lookups are case-insensitive; the stored spelling is kept.

use super::identity::{
    AuthError, AuthListener, AuthResult, FederatedCredential, IdentityProvider,
};
use super::password;
use crate::config::AppConfig;
use crate::model::user::{email_local_part, SignInProvider, UserIdentity};
use crate::remote::listeners::{ListenerHandle, ListenerSet};
use crate::remote::{LocalBackend, RemoteError, RemoteResult};
use crate::util::lock;
use log::{info, warn};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Session {
    user: UserIdentity,
    signed_in_at: i64,
}

struct AccountRow {
    identity: UserIdentity,
    password_salt: Option<String>,
    password_digest: Option<String>,
}

/// Local identity provider.
pub struct LocalIdentityProvider {
    backend: LocalBackend,
    session: Mutex<Option<Session>>,
    listeners: ListenerSet<(), Option<UserIdentity>>,
    min_password_length: usize,
    recent_login_window_millis: i64,
}

impl LocalIdentityProvider {
    pub fn new(backend: LocalBackend, config: &AppConfig) -> Self {
        Self {
            backend,
            session: Mutex::new(None),
            listeners: ListenerSet::new(),
            min_password_length: config.min_password_length,
            recent_login_window_millis: config.recent_login_window_millis(),
        }
    }

    fn start_session(&self, user: UserIdentity) -> UserIdentity {
        let signed_in_at = self.backend.server_now();
        *lock(&self.session) = Some(Session {
            user: user.clone(),
            signed_in_at,
        });
        info!(
            "event=auth_session module=auth status=ok action=sign_in provider={}",
            user.provider.as_str()
        );
        self.listeners.emit(&Some(user.clone()));
        user
    }

    fn end_session(&self, action: &'static str) {
        let previous = lock(&self.session).take();
        if previous.is_some() {
            info!("event=auth_session module=auth status=ok action={action}");
            self.listeners.emit(&None);
        }
    }

    /// Returns the session user when it matches `uid`.
    fn require_session(&self, uid: &str) -> AuthResult<Session> {
        match lock(&self.session).as_ref() {
            Some(session) if session.user.uid == uid => Ok(session.clone()),
            _ => Err(AuthError::NoCurrentUser),
        }
    }

    fn require_recent_session(&self, uid: &str) -> AuthResult<Session> {
        let session = self.require_session(uid)?;
        if self.backend.server_now() - session.signed_in_at > self.recent_login_window_millis {
            warn!("event=auth_reauth_required module=auth status=error");
            return Err(AuthError::RequiresRecentLogin);
        }
        Ok(session)
    }

    fn ensure_password_strength(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.min_password_length,
            });
        }
        Ok(())
    }

    fn find_account(&self, email: &str) -> RemoteResult<Option<AccountRow>> {
        self.backend.call(|conn| {
            let row = conn
                .query_row(
                    "SELECT uid, email, password_salt, password_digest, display_name, photo_url, provider
                     FROM accounts
                     WHERE email = ?1 COLLATE NOCASE;",
                    [email],
                    |row| Ok(parse_account_row(row)),
                )
                .optional()?;
            row.transpose()
        })
    }

    fn insert_account(
        &self,
        identity: &UserIdentity,
        digest: Option<&password::PasswordDigest>,
    ) -> RemoteResult<()> {
        let created_at = self.backend.server_now();
        self.backend.call(|conn| {
            conn.execute(
                "INSERT INTO accounts (
                    uid, email, password_salt, password_digest, display_name, photo_url, provider, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    identity.uid.as_str(),
                    identity.email.as_str(),
                    digest.map(|value| value.salt.as_str()),
                    digest.map(|value| value.digest.as_str()),
                    identity.display_name.as_deref(),
                    identity.photo_url.as_deref(),
                    identity.provider.as_str(),
                    created_at,
                ],
            )?;
            Ok(())
        })
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<UserIdentity> {
        let account = self
            .find_account(email.trim())?
            .ok_or(AuthError::UserNotFound)?;

        let (Some(salt), Some(digest)) = (
            account.password_salt.as_deref(),
            account.password_digest.as_deref(),
        ) else {
            return Err(AuthError::InvalidCredential);
        };
        if !password::verify(salt, digest, password) {
            warn!("event=auth_sign_in module=auth status=error error_code=auth/wrong-password");
            return Err(AuthError::WrongPassword);
        }

        Ok(self.start_session(account.identity))
    }

    fn sign_up_with_password(&self, email: &str, password: &str) -> AuthResult<UserIdentity> {
        let email = email.trim();
        self.ensure_password_strength(password)?;
        if self.find_account(email)?.is_some() {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let identity = UserIdentity {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
            provider: SignInProvider::Password,
        };
        let digest = password::derive(password);
        self.insert_account(&identity, Some(&digest))?;
        info!("event=auth_sign_up module=auth status=ok");

        Ok(self.start_session(identity))
    }

    fn sign_in_with_google(&self, credential: &FederatedCredential) -> AuthResult<UserIdentity> {
        let email = credential.email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let identity = match self.find_account(email)? {
            Some(account) => account.identity,
            None => {
                let identity = UserIdentity {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: email.to_string(),
                    display_name: credential
                        .display_name
                        .clone()
                        .or_else(|| Some(email_local_part(email).to_string())),
                    photo_url: credential.photo_url.clone(),
                    provider: SignInProvider::Google,
                };
                self.insert_account(&identity, None)?;
                identity
            }
        };

        Ok(self.start_session(identity))
    }

    fn sign_out(&self) -> AuthResult<()> {
        self.end_session("sign_out");
        Ok(())
    }

    fn current_user(&self) -> Option<UserIdentity> {
        lock(&self.session)
            .as_ref()
            .map(|session| session.user.clone())
    }

    fn update_display_name(&self, uid: &str, display_name: &str) -> AuthResult<()> {
        self.require_session(uid)?;
        self.backend.call(|conn| {
            conn.execute(
                "UPDATE accounts SET display_name = ?2 WHERE uid = ?1;",
                params![uid, display_name],
            )?;
            Ok(())
        })?;

        if let Some(session) = lock(&self.session).as_mut() {
            if session.user.uid == uid {
                session.user.display_name = Some(display_name.to_string());
            }
        }
        info!("event=auth_profile_update module=auth status=ok field=display_name");
        Ok(())
    }

    fn update_password(&self, uid: &str, new_password: &str) -> AuthResult<()> {
        self.require_recent_session(uid)?;
        self.ensure_password_strength(new_password)?;

        let digest = password::derive(new_password);
        self.backend.call(|conn| {
            conn.execute(
                "UPDATE accounts SET password_salt = ?2, password_digest = ?3 WHERE uid = ?1;",
                params![uid, digest.salt.as_str(), digest.digest.as_str()],
            )?;
            Ok(())
        })?;
        info!("event=auth_profile_update module=auth status=ok field=password");
        Ok(())
    }

    fn delete_user(&self, uid: &str) -> AuthResult<()> {
        self.require_recent_session(uid)?;
        self.backend.call(|conn| {
            conn.execute("DELETE FROM accounts WHERE uid = ?1;", [uid])?;
            Ok(())
        })?;
        info!("event=auth_delete_user module=auth status=ok");
        self.end_session("delete_user");
        Ok(())
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> ListenerHandle {
        let handle = self.listeners.register((), listener.clone());
        listener(&self.current_user());
        handle
    }
}

fn parse_account_row(row: &Row<'_>) -> RemoteResult<AccountRow> {
    let provider_text: String = row.get("provider")?;
    let provider = SignInProvider::parse(&provider_text).ok_or_else(|| {
        RemoteError::InvalidData(format!("unknown sign-in provider `{provider_text}`"))
    })?;

    Ok(AccountRow {
        identity: UserIdentity {
            uid: row.get("uid")?,
            email: row.get("email")?,
            display_name: row.get("display_name")?,
            photo_url: row.get("photo_url")?,
            provider,
        },
        password_salt: row.get("password_salt")?,
        password_digest: row.get("password_digest")?,
    })
}
