//! Profile document contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the denormalized profile record (nickname, e-mail, uid) kept
//!   next to the identity provider's display name.
//!
//! # Invariants
//! - `created_at`, `updated_at` and `last_login` are server timestamps.
//! - Federated logins merge into an existing document and never clear
//!   `created_at`.

use crate::model::user::UserProfile;
use crate::remote::{LocalBackend, RemoteError, RemoteResult};
use log::info;
use rusqlite::{params, OptionalExtension, Row};

pub(crate) const PROFILE_COLLECTION: &str = "users";

/// Profile document operations keyed by e-mail.
pub trait ProfileRepository: Send + Sync {
    /// Writes (or overwrites) the profile created at sign-up.
    fn create_profile(&self, uid: &str, email: &str, nickname: &str) -> RemoteResult<()>;
    /// Upserts the profile after a federated sign-in and stamps `last_login`.
    fn merge_federated_login(&self, uid: &str, email: &str, nickname: &str) -> RemoteResult<()>;
    fn get_profile(&self, email: &str) -> RemoteResult<Option<UserProfile>>;
    /// Updates the nickname of an existing profile.
    fn update_nickname(&self, email: &str, nickname: &str) -> RemoteResult<()>;
}

/// Profile repository backed by the local SQLite backend.
#[derive(Clone)]
pub struct SqliteProfileRepository {
    backend: LocalBackend,
}

impl SqliteProfileRepository {
    pub fn new(backend: LocalBackend) -> Self {
        Self { backend }
    }
}

impl ProfileRepository for SqliteProfileRepository {
    fn create_profile(&self, uid: &str, email: &str, nickname: &str) -> RemoteResult<()> {
        let now = self.backend.server_now();
        self.backend.call(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO profiles (email, uid, nickname, created_at, updated_at, last_login)
                 VALUES (?1, ?2, ?3, ?4, NULL, NULL);",
                params![email, uid, nickname, now],
            )?;
            Ok(())
        })?;
        info!("event=profile_create module=repo status=ok");
        Ok(())
    }

    fn merge_federated_login(&self, uid: &str, email: &str, nickname: &str) -> RemoteResult<()> {
        let now = self.backend.server_now();
        self.backend.call(|conn| {
            conn.execute(
                "INSERT INTO profiles (email, uid, nickname, created_at, updated_at, last_login)
                 VALUES (?1, ?2, ?3, NULL, NULL, ?4)
                 ON CONFLICT(email) DO UPDATE SET
                    uid = excluded.uid,
                    nickname = excluded.nickname,
                    last_login = excluded.last_login;",
                params![email, uid, nickname, now],
            )?;
            Ok(())
        })?;
        info!("event=profile_merge module=repo status=ok");
        Ok(())
    }

    fn get_profile(&self, email: &str) -> RemoteResult<Option<UserProfile>> {
        self.backend.call(|conn| {
            let profile = conn
                .query_row(
                    "SELECT uid, email, nickname, created_at, updated_at, last_login
                     FROM profiles
                     WHERE email = ?1;",
                    [email],
                    parse_profile_row,
                )
                .optional()?;
            Ok(profile)
        })
    }

    fn update_nickname(&self, email: &str, nickname: &str) -> RemoteResult<()> {
        let now = self.backend.server_now();
        let changed = self.backend.call(|conn| {
            Ok(conn.execute(
                "UPDATE profiles SET nickname = ?2, updated_at = ?3 WHERE email = ?1;",
                params![email, nickname, now],
            )?)
        })?;
        if changed == 0 {
            return Err(RemoteError::NotFound {
                collection: PROFILE_COLLECTION,
                id: "profile".to_string(),
            });
        }
        info!("event=profile_update module=repo status=ok field=nickname");
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        uid: row.get("uid")?,
        email: row.get("email")?,
        nickname: row.get("nickname")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_login: row.get("last_login")?,
    })
}
