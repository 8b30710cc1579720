//! Keyed listener registry used for realtime snapshots and session changes.
//!
//! # Invariants
//! - Listeners are invoked by callers after the registry lock is released.
//! - A `ListenerHandle` unregisters exactly once, on `unsubscribe()` or drop.

use crate::util::lock;
use std::sync::{Arc, Mutex, Weak};

/// Callback receiving one pushed value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<K, T> {
    id: u64,
    key: K,
    listener: Listener<T>,
}

struct Registry<K, T> {
    next_id: u64,
    entries: Vec<Entry<K, T>>,
}

/// Registry of listeners filtered by a key (`()` when unkeyed).
pub struct ListenerSet<K, T> {
    registry: Arc<Mutex<Registry<K, T>>>,
}

impl<K, T> Clone for ListenerSet<K, T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, T> Default for ListenerSet<K, T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }
}

impl<K, T> ListenerSet<K, T>
where
    K: Clone + Send + 'static,
    T: 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener under `key`.
    pub fn register(&self, key: K, listener: Listener<T>) -> ListenerHandle {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry { id, key, listener });
            id
        };

        let weak: Weak<Mutex<Registry<K, T>>> = Arc::downgrade(&self.registry);
        ListenerHandle::new(move || {
            if let Some(registry) = weak.upgrade() {
                lock(&registry).entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Returns a copy of the listeners whose key matches.
    pub fn matching(&self, predicate: impl Fn(&K) -> bool) -> Vec<(K, Listener<T>)> {
        lock(&self.registry)
            .entries
            .iter()
            .filter(|entry| predicate(&entry.key))
            .map(|entry| (entry.key.clone(), Arc::clone(&entry.listener)))
            .collect()
    }

    /// Invokes every listener with `value`.
    pub fn emit(&self, value: &T) {
        for (_, listener) in self.matching(|_| true) {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration handle; dropping it unsubscribes.
pub struct ListenerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerHandle {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops delivery. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("active", &self.is_active())
            .finish()
    }
}
