//! Identity provider contract and its local implementation.
//!
//! # Responsibility
//! - Model the remote identity provider: e-mail/password and Google
//!   sign-in, profile and password updates, account deletion and session
//!   change notifications.
//! - Expose provider failure codes the client maps to guided dialogs.
//!
//! # Invariants
//! - Session listeners fire on registration and on every sign-in,
//!   sign-out and deletion; profile edits do not notify.

pub mod identity;
pub mod local_provider;
mod password;
