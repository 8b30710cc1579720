//! Application context wiring stores, services and the backend.
//!
//! # Responsibility
//! - Build every long-lived component once, at startup.
//! - Hand page controllers one shared handle instead of globals.
//!
//! # Invariants
//! - Callbacks stored in the modal slot hold `Weak` references to the
//!   context, never strong ones.

use crate::app::routes::{Navigator, Route, RouteResolution};
use crate::auth::local_provider::LocalIdentityProvider;
use crate::clock::{system_clock, SharedClock};
use crate::config::{AppConfig, ConfigError};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::remote::LocalBackend;
use crate::repo::batch::BatchWriter;
use crate::repo::memo_repo::SqliteMemoRepository;
use crate::repo::profile_repo::SqliteProfileRepository;
use crate::service::account_service::AccountService;
use crate::service::memo_service::{MemoScope, MemoService};
use crate::state::auth_store::AuthStore;
use crate::state::modal_store::ModalStore;
use crate::validation::InputRules;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

pub type AppAccountService =
    AccountService<LocalIdentityProvider, SqliteProfileRepository, SqliteMemoRepository>;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Db(DbError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

pub struct AppContext {
    config: AppConfig,
    clock: SharedClock,
    backend: LocalBackend,
    memos: MemoService<SqliteMemoRepository>,
    accounts: AppAccountService,
    auth: AuthStore,
    modal: ModalStore,
    navigator: Navigator,
}

impl AppContext {
    /// Builds the context over a file-backed database.
    pub fn open(config: AppConfig, db_path: impl AsRef<Path>) -> Result<Arc<Self>, AppError> {
        config.validate()?;
        let clock = system_clock();
        let backend = LocalBackend::from_connection(open_db(db_path)?, clock.clone());
        Ok(Self::new(config, backend, clock))
    }

    /// Builds the context over an ephemeral in-memory database.
    pub fn open_in_memory(config: AppConfig) -> Result<Arc<Self>, AppError> {
        Self::open_in_memory_with_clock(config, system_clock())
    }

    /// Same as [`AppContext::open_in_memory`], with an explicit clock for
    /// both server and client timestamps.
    pub fn open_in_memory_with_clock(
        config: AppConfig,
        clock: SharedClock,
    ) -> Result<Arc<Self>, AppError> {
        config.validate()?;
        let backend = LocalBackend::from_connection(open_db_in_memory()?, clock.clone());
        Ok(Self::new(config, backend, clock))
    }

    /// Wires every component over `backend`. Does not subscribe to the
    /// identity provider yet; see [`AppContext::start`].
    pub fn new(config: AppConfig, backend: LocalBackend, clock: SharedClock) -> Arc<Self> {
        let rules = InputRules::from_config(&config);
        let identity = Arc::new(backend.identity_provider(&config));
        let batch: Arc<dyn BatchWriter> = Arc::new(backend.clone());

        let memos = MemoService::new(backend.memo_repository(), clock.clone(), rules);
        let accounts = AccountService::new(
            Arc::clone(&identity),
            backend.profile_repository(),
            backend.memo_repository(),
            batch,
            rules,
        );
        let auth = AuthStore::new(identity);

        Arc::new(Self {
            config,
            clock,
            backend,
            memos,
            accounts,
            auth,
            modal: ModalStore::new(),
            navigator: Navigator::new(),
        })
    }

    /// Starts mirroring the identity provider's session.
    pub fn start(&self) {
        self.auth.init();
        info!("event=app_start module=app status=ok");
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn backend(&self) -> &LocalBackend {
        &self.backend
    }

    pub fn memos(&self) -> &MemoService<SqliteMemoRepository> {
        &self.memos
    }

    pub fn accounts(&self) -> &AppAccountService {
        &self.accounts
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn modal(&self) -> &ModalStore {
        &self.modal
    }

    pub fn current_route(&self) -> Route {
        self.navigator.current()
    }

    /// Navigates to `route` through the auth guards.
    pub fn navigate(&self, route: Route) -> RouteResolution {
        self.navigator.navigate(route, &self.auth.snapshot())
    }

    /// Memo scope of the signed-in user, if any.
    pub fn current_scope(&self) -> Option<MemoScope> {
        self.auth
            .current_user()
            .map(|user| MemoScope::for_user(&user))
    }
}
