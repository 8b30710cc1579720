//! Session mirror fed by the identity provider.
//!
//! # Invariants
//! - `loading` is true until the provider's first notification.
//! - The store subscribes to the provider at most once.
//! - Observers may call back into the store during the first notification.
//! - `refresh()` always publishes a new `Arc`, so observers comparing by
//!   pointer see a change even when the fields are equal.

use crate::auth::identity::{AuthListener, IdentityProvider};
use crate::model::user::UserIdentity;
use crate::remote::listeners::{Listener, ListenerHandle, ListenerSet};
use crate::util::lock;
use log::{debug, info};
use std::sync::{Arc, Mutex};

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<Arc<UserIdentity>>,
    pub loading: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl AuthSnapshot {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

pub struct AuthStore {
    provider: Arc<dyn IdentityProvider>,
    snapshot: Arc<Mutex<AuthSnapshot>>,
    listeners: ListenerSet<(), AuthSnapshot>,
    subscription: Mutex<Option<ListenerHandle>>,
}

impl AuthStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            snapshot: Arc::new(Mutex::new(AuthSnapshot::default())),
            listeners: ListenerSet::new(),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribes to provider session changes. Later calls are no-ops.
    pub fn init(&self) {
        if lock(&self.subscription).is_some() {
            return;
        }

        let snapshot = Arc::clone(&self.snapshot);
        let listeners = self.listeners.clone();
        let listener: AuthListener = Arc::new(move |user: &Option<UserIdentity>| {
            let next = AuthSnapshot {
                user: user.clone().map(Arc::new),
                loading: false,
            };
            *lock(&snapshot) = next.clone();
            debug!(
                "event=auth_state module=state status=ok signed_in={}",
                next.is_signed_in()
            );
            listeners.emit(&next);
        });
        // The provider notifies during registration, so no lock is held here.
        let handle = self.provider.on_auth_state_changed(listener);
        let mut subscription = lock(&self.subscription);
        if subscription.is_some() {
            // Lost a race with another `init`; unregister outside the lock.
            drop(subscription);
            drop(handle);
            return;
        }
        *subscription = Some(handle);
        drop(subscription);
        info!("event=auth_store_init module=state status=ok");
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        lock(&self.snapshot).clone()
    }

    pub fn current_user(&self) -> Option<Arc<UserIdentity>> {
        lock(&self.snapshot).user.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.snapshot).loading
    }

    /// Re-reads the provider's session user after a profile edit.
    pub fn refresh(&self) {
        let Some(user) = self.provider.current_user() else {
            return;
        };
        let next = {
            let mut snapshot = lock(&self.snapshot);
            snapshot.user = Some(Arc::new(user));
            snapshot.clone()
        };
        self.listeners.emit(&next);
    }

    /// Registers an observer of session changes.
    pub fn on_change(&self, listener: Listener<AuthSnapshot>) -> ListenerHandle {
        self.listeners.register((), listener)
    }

    /// Ends the provider subscription; the last snapshot is kept.
    pub fn detach(&self) {
        let handle = lock(&self.subscription).take();
        drop(handle);
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.subscription).is_some()
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.detach();
    }
}
