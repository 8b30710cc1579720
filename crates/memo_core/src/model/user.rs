//! Identity mirror, profile document and per-user partition key.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How the current identity authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInProvider {
    Password,
    Google,
}

impl SignInProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Google => "google",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "password" => Some(Self::Password),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

/// Locally mirrored view of the identity provider's user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: SignInProvider,
}

impl UserIdentity {
    /// The part of the e-mail before `@`, used as fallback nickname.
    pub fn email_local_part(&self) -> &str {
        email_local_part(&self.email)
    }

    pub fn is_password_user(&self) -> bool {
        self.provider == SignInProvider::Password
    }
}

pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Denormalized profile document kept next to the identity provider's own
/// profile fields. Timestamps are assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub nickname: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub last_login: Option<i64>,
}

/// Opaque per-user namespace under which memos are stored.
///
/// The remote service keys partitions by e-mail address; callers must treat
/// the value as opaque and log only `fingerprint()`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn for_user(user: &UserIdentity) -> Self {
        Self(user.email.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable digest safe to put in log lines.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::hash(self.0.as_bytes());
        digest.to_hex()[..12].to_string()
    }
}

impl std::fmt::Debug for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PartitionKey({})", self.fingerprint())
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fingerprint())
    }
}
