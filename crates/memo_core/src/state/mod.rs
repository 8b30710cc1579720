//! Application state stores shared by page controllers.
//!
//! # Responsibility
//! - Mirror the identity provider's session (`AuthStore`).
//! - Hold the single modal dialog slot and its auto-close countdown
//!   (`ModalStore`).
//!
//! # Invariants
//! - At most one dialog is configured and at most one countdown runs.
//! - Store listeners are invoked without store locks held.

pub mod auth_store;
pub mod countdown;
pub mod modal_store;

pub use auth_store::{AuthSnapshot, AuthStore};
pub use countdown::CountdownTask;
pub use modal_store::{ModalAction, ModalError, ModalKind, ModalRequest, ModalStore, ModalView};
