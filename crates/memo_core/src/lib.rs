//! Headless core of the memo client.
//! This crate is the single source of truth for client invariants: data
//! model, validation, the local emulation of the remote data service, memo
//! sync, session and dialog state, and the page controllers on top.

pub mod app;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod service;
pub mod state;
pub mod validation;

mod util;

pub use app::{AppContext, AppError, Route, RouteResolution};
pub use auth::identity::{AuthError, AuthResult, FederatedCredential, IdentityProvider};
pub use auth::local_provider::LocalIdentityProvider;
pub use cache::{QueryCache, QueryKey};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::memo::{Memo, MemoId, NewMemo, SortOrder};
pub use model::user::{PartitionKey, SignInProvider, UserIdentity, UserProfile};
pub use remote::listeners::{Listener, ListenerHandle, ListenerSet};
pub use remote::{LocalBackend, RemoteError, RemoteResult};
pub use repo::batch::{BatchWriter, WriteBatch};
pub use repo::memo_repo::{MemoRepository, SqliteMemoRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use service::{
    AccountError, AccountService, MemoScope, MemoService, MemoServiceError, MemoWatch,
};
pub use state::{AuthSnapshot, AuthStore, ModalKind, ModalRequest, ModalStore, ModalView};
pub use validation::{InputRules, ValidationError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
