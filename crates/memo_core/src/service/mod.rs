//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and identity calls into use-case level APIs.
//! - Keep page controllers decoupled from storage details.
//!
//! # Invariants
//! - Input validation runs before any remote call.
//! - Every successful memo mutation invalidates the partition's cached
//!   queries.

pub mod account_service;
pub mod memo_service;

pub use account_service::{AccountError, AccountService};
pub use memo_service::{MemoScope, MemoService, MemoServiceError, MemoWatch};
