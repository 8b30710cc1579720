//! Client configuration.
//!
//! # Responsibility
//! - Hold the input limits and timing knobs shared by validation, dialogs
//!   and the local identity provider.
//! - Load overrides from JSON; unspecified fields keep their defaults.
//!
//! # Invariants
//! - Every limit is strictly positive after `validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_MEMO_LENGTH: usize = 10_000;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_MAX_NICKNAME_LENGTH: usize = 50;
pub const DEFAULT_AUTO_CLOSE_COUNTDOWN_SECONDS: u32 = 3;
pub const DEFAULT_RECENT_LOGIN_WINDOW_SECS: u64 = 5 * 60;

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Application-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upper bound for trimmed memo content, in characters.
    pub max_memo_length: usize,
    /// Lower bound for passwords, in characters.
    pub min_password_length: usize,
    /// Upper bound for trimmed nicknames, in characters.
    pub max_nickname_length: usize,
    /// Countdown used by auto-closing error dialogs.
    pub auto_close_countdown_seconds: u32,
    /// Sessions older than this must sign in again before sensitive
    /// account operations.
    pub recent_login_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_memo_length: DEFAULT_MAX_MEMO_LENGTH,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            max_nickname_length: DEFAULT_MAX_NICKNAME_LENGTH,
            auto_close_countdown_seconds: DEFAULT_AUTO_CLOSE_COUNTDOWN_SECONDS,
            recent_login_window_secs: DEFAULT_RECENT_LOGIN_WINDOW_SECS,
        }
    }
}

impl AppConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_memo_length", self.max_memo_length),
            ("min_password_length", self.min_password_length),
            ("max_nickname_length", self.max_nickname_length),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.recent_login_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "recent_login_window_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn recent_login_window_millis(&self) -> i64 {
        i64::try_from(self.recent_login_window_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}
