//! Memo records and list ordering.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque memo identifier assigned by the remote service on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoId(String);

impl MemoId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MemoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Memo document as stored under one user partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: MemoId,
    /// Trimmed, non-empty text.
    pub content: String,
    /// Client-assigned epoch milliseconds at write time.
    pub created_at: i64,
    /// Identity provider uid of the author.
    pub user_id: String,
    /// Epoch milliseconds of the last edit, if any.
    pub updated_at: Option<i64>,
}

/// Write model for memo creation; the id is assigned remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemo {
    pub content: String,
    pub created_at: i64,
    pub user_id: String,
}

/// Creation-time ordering applied by the remote query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::NewestFirst => Self::OldestFirst,
            Self::OldestFirst => Self::NewestFirst,
        }
    }

    /// Stable label used in logs and query keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewestFirst => "newest",
            Self::OldestFirst => "oldest",
        }
    }
}
