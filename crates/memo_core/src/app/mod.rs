//! Application shell: context, routing, dialog texts and page controllers.
//!
//! # Responsibility
//! - Wire the backend, services and stores into one `AppContext`.
//! - Map service failures to dialogs the way each page presents them.
//!
//! # Invariants
//! - Validation failures stay inline; remote failures open a dialog.
//! - No retries happen without a new user action.

pub mod context;
pub mod format;
pub mod messages;
pub mod pages;
pub mod routes;

pub use context::{AppAccountService, AppContext, AppError};
pub use format::{format_memo_timestamp, format_memo_timestamp_in};
pub use routes::{resolve_route, Navigator, Route, RouteResolution};
