//! Form input validation.
//!
//! # Responsibility
//! - Reject malformed e-mail, short passwords, empty/over-length memos and
//!   nicknames before any remote call is made.
//!
//! # Invariants
//! - Lengths are measured in characters after trimming (passwords are not
//!   trimmed).
//! - Validation never touches the network or storage.

use crate::config::AppConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Inline validation failure. `Display` yields the message shown next to
/// the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidEmail,
    PasswordTooShort { min: usize },
    EmptyMemo,
    MemoTooLong { max: usize, actual: usize },
    EmptyNickname,
    NicknameTooLong { max: usize, actual: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Please enter a valid e-mail address."),
            Self::PasswordTooShort { min } => {
                write!(f, "Password must be at least {min} characters.")
            }
            Self::EmptyMemo => write!(f, "Memo cannot be empty."),
            Self::MemoTooLong { max, actual } => {
                write!(f, "Memo is too long ({actual}/{max} characters).")
            }
            Self::EmptyNickname => write!(f, "Nickname cannot be empty."),
            Self::NicknameTooLong { max, actual } => {
                write!(f, "Nickname is too long ({actual}/{max} characters).")
            }
        }
    }
}

impl Error for ValidationError {}

/// Returns whether the trimmed value looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Length rules derived from `AppConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRules {
    pub min_password_length: usize,
    pub max_memo_length: usize,
    pub max_nickname_length: usize,
}

impl Default for InputRules {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl InputRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_password_length: config.min_password_length,
            max_memo_length: config.max_memo_length,
            max_nickname_length: config.max_nickname_length,
        }
    }

    pub fn validate_password(&self, password: &str) -> Result<(), ValidationError> {
        if password.chars().count() >= self.min_password_length {
            Ok(())
        } else {
            Err(ValidationError::PasswordTooShort {
                min: self.min_password_length,
            })
        }
    }

    /// Validates memo content and returns the trimmed text to persist.
    pub fn validate_memo_content<'a>(&self, content: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = content.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            return Err(ValidationError::EmptyMemo);
        }
        if length > self.max_memo_length {
            return Err(ValidationError::MemoTooLong {
                max: self.max_memo_length,
                actual: length,
            });
        }
        Ok(trimmed)
    }

    /// Validates a nickname and returns its trimmed form.
    pub fn validate_nickname<'a>(&self, nickname: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = nickname.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            return Err(ValidationError::EmptyNickname);
        }
        if length > self.max_nickname_length {
            return Err(ValidationError::NicknameTooLong {
                max: self.max_nickname_length,
                actual: length,
            });
        }
        Ok(trimmed)
    }
}
