//! Client-side query cache.
//!
//! # Responsibility
//! - Keep the latest result of each keyed query in memory.
//! - Mark results stale on mutation so the next read refetches.
//!
//! # Invariants
//! - Writes win by arrival order, not by timestamp.
//! - Entries fed by a live subscription are never marked stale; the
//!   subscription is the source of truth for them.

pub mod query_cache;

pub use query_cache::{CachedQuery, QueryCache, QueryKey, MEMOS_SCOPE};
