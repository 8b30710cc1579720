//! Identity provider contract and error codes.

use crate::model::user::UserIdentity;
use crate::remote::listeners::{Listener, ListenerHandle};
use crate::remote::RemoteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Receives the current identity (or `None`) on every session change.
pub type AuthListener = Listener<Option<UserIdentity>>;

/// Identity returned by a federated (Google) sign-in popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Failure reported by the identity provider.
#[derive(Debug)]
pub enum AuthError {
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    EmailAlreadyInUse,
    WeakPassword { min: usize },
    /// Sensitive operation on a session that is too old.
    RequiresRecentLogin,
    NoCurrentUser,
    NetworkRequestFailed,
    Remote(RemoteError),
}

impl AuthError {
    /// Provider error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword { .. } => "auth/weak-password",
            Self::RequiresRecentLogin => "auth/requires-recent-login",
            Self::NoCurrentUser => "auth/no-current-user",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::Remote(_) => "auth/internal-error",
        }
    }

    /// Whether the caller supplied wrong credentials for an existing account.
    pub fn is_credential_mismatch(&self) -> bool {
        matches!(self, Self::WrongPassword | Self::InvalidCredential)
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeakPassword { min } => {
                write!(f, "{}: password shorter than {min} characters", self.code())
            }
            Self::Remote(err) => write!(f, "{}: {err}", self.code()),
            other => f.write_str(other.code()),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for AuthError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::Unavailable => Self::NetworkRequestFailed,
            other => Self::Remote(other),
        }
    }
}

/// Remote identity provider operations.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<UserIdentity>;
    /// Creates an account and signs it in.
    fn sign_up_with_password(&self, email: &str, password: &str) -> AuthResult<UserIdentity>;
    fn sign_in_with_google(&self, credential: &FederatedCredential) -> AuthResult<UserIdentity>;
    fn sign_out(&self) -> AuthResult<()>;
    /// The provider's cached session user.
    fn current_user(&self) -> Option<UserIdentity>;
    /// Updates the display name without emitting a session change.
    fn update_display_name(&self, uid: &str, display_name: &str) -> AuthResult<()>;
    fn update_password(&self, uid: &str, new_password: &str) -> AuthResult<()>;
    fn delete_user(&self, uid: &str) -> AuthResult<()>;
    /// Registers a session listener; it fires immediately with the current
    /// session.
    fn on_auth_state_changed(&self, listener: AuthListener) -> ListenerHandle;
}
