//! Keyed in-memory cache of query results.

use crate::model::memo::SortOrder;
use crate::model::user::PartitionKey;
use crate::util::lock;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Scope label of the memo list query.
pub const MEMOS_SCOPE: &str = "memos";

/// Identifies one cached query: `[scope, partition, order]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub scope: &'static str,
    pub partition: PartitionKey,
    pub order: SortOrder,
}

impl QueryKey {
    pub fn memos(partition: &PartitionKey, order: SortOrder) -> Self {
        Self {
            scope: MEMOS_SCOPE,
            partition: partition.clone(),
            order,
        }
    }
}

/// Snapshot of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedQuery<V> {
    pub data: V,
    pub stale: bool,
    /// Monotonic write counter across the whole cache.
    pub revision: u64,
}

#[derive(Debug)]
struct Entry<V> {
    data: Option<V>,
    stale: bool,
    live_subscriptions: usize,
    revision: u64,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            stale: true,
            live_subscriptions: 0,
            revision: 0,
        }
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: BTreeMap<QueryKey, Entry<V>>,
    revision: u64,
}

/// Thread-safe query cache shared by services and views.
#[derive(Debug)]
pub struct QueryCache<V> {
    state: Mutex<CacheState<V>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: BTreeMap::new(),
                revision: 0,
            }),
        }
    }
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached data for `key`, if any has arrived.
    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery<V>> {
        let state = lock(&self.state);
        let entry = state.entries.get(key)?;
        entry.data.as_ref().map(|data| CachedQuery {
            data: data.clone(),
            stale: entry.stale,
            revision: entry.revision,
        })
    }

    /// Stores `data` as the fresh result of `key`.
    pub fn set_query_data(&self, key: QueryKey, data: V) {
        let mut state = lock(&self.state);
        state.revision += 1;
        let revision = state.revision;
        let entry = state.entries.entry(key).or_default();
        entry.data = Some(data);
        entry.stale = false;
        entry.revision = revision;
    }

    /// Marks every non-live entry of `partition` stale. Returns how many
    /// entries were marked.
    pub fn invalidate_partition(&self, scope: &str, partition: &PartitionKey) -> usize {
        let mut state = lock(&self.state);
        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.scope == scope
                && &key.partition == partition
                && entry.live_subscriptions == 0
                && !entry.stale
            {
                entry.stale = true;
                marked += 1;
            }
        }
        debug!(
            "event=cache_invalidate module=cache status=ok scope={scope} partition={partition} marked={marked}"
        );
        marked
    }

    /// Serves a fresh entry, or runs `fetcher` and stores its result.
    ///
    /// The fetcher runs without the cache lock held.
    pub fn fetch_with<E>(
        &self,
        key: &QueryKey,
        fetcher: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(cached) = self.get(key) {
            if !cached.stale {
                return Ok(cached.data);
            }
        }

        let data = fetcher()?;
        self.set_query_data(key.clone(), data.clone());
        Ok(data)
    }

    /// Marks `key` stale even while a live subscription feeds it.
    pub fn mark_stale(&self, key: &QueryKey) {
        if let Some(entry) = lock(&self.state).entries.get_mut(key) {
            entry.stale = true;
        }
    }

    /// Records a live subscription feeding `key`.
    pub fn mark_live(&self, key: &QueryKey) {
        let mut state = lock(&self.state);
        state.entries.entry(key.clone()).or_default().live_subscriptions += 1;
    }

    /// Releases one live subscription of `key`; the data is kept but marked
    /// stale once no subscription feeds it anymore.
    pub fn release_live(&self, key: &QueryKey) {
        let mut state = lock(&self.state);
        if let Some(entry) = state.entries.get_mut(key) {
            entry.live_subscriptions = entry.live_subscriptions.saturating_sub(1);
            if entry.live_subscriptions == 0 {
                entry.stale = true;
            }
        }
    }

    pub fn is_live(&self, key: &QueryKey) -> bool {
        lock(&self.state)
            .entries
            .get(key)
            .is_some_and(|entry| entry.live_subscriptions > 0)
    }

    /// Drops every entry of `partition` (sign-out, account deletion).
    pub fn remove_partition(&self, partition: &PartitionKey) {
        lock(&self.state)
            .entries
            .retain(|key, _| &key.partition != partition);
    }

    pub fn clear(&self) {
        lock(&self.state).entries.clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.state)
            .entries
            .values()
            .filter(|entry| entry.data.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryCache, QueryKey, MEMOS_SCOPE};
    use crate::model::memo::SortOrder;
    use crate::model::user::{PartitionKey, SignInProvider, UserIdentity};
    use std::cell::Cell;

    fn partition(email: &str) -> PartitionKey {
        PartitionKey::for_user(&UserIdentity {
            uid: "uid".to_string(),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
            provider: SignInProvider::Password,
        })
    }

    #[test]
    fn fetch_with_reuses_fresh_entries_and_refetches_after_invalidation() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        let key = QueryKey::memos(&partition("a@example.com"), SortOrder::NewestFirst);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(vec![calls.get()])
        };

        assert_eq!(cache.fetch_with(&key, fetch).unwrap(), vec![1]);
        assert_eq!(cache.fetch_with(&key, fetch).unwrap(), vec![1]);
        assert_eq!(cache.invalidate_partition(MEMOS_SCOPE, &key.partition), 1);
        assert_eq!(cache.fetch_with(&key, fetch).unwrap(), vec![2]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn invalidation_is_scoped_to_one_partition_and_skips_live_entries() {
        let cache: QueryCache<u8> = QueryCache::new();
        let own = partition("a@example.com");
        let other = partition("b@example.com");
        let live_key = QueryKey::memos(&own, SortOrder::NewestFirst);
        let plain_key = QueryKey::memos(&own, SortOrder::OldestFirst);
        let other_key = QueryKey::memos(&other, SortOrder::NewestFirst);

        cache.mark_live(&live_key);
        cache.set_query_data(live_key.clone(), 1);
        cache.set_query_data(plain_key.clone(), 2);
        cache.set_query_data(other_key.clone(), 3);

        assert_eq!(cache.invalidate_partition(MEMOS_SCOPE, &own), 1);
        assert!(!cache.get(&live_key).unwrap().stale);
        assert!(cache.get(&plain_key).unwrap().stale);
        assert!(!cache.get(&other_key).unwrap().stale);

        cache.release_live(&live_key);
        assert!(!cache.is_live(&live_key));
        assert!(cache.get(&live_key).unwrap().stale);
    }

    #[test]
    fn later_arrival_overwrites_earlier_result() {
        let cache: QueryCache<&'static str> = QueryCache::new();
        let key = QueryKey::memos(&partition("a@example.com"), SortOrder::NewestFirst);
        cache.set_query_data(key.clone(), "one-shot");
        let first = cache.get(&key).unwrap().revision;
        cache.set_query_data(key.clone(), "snapshot");
        let second = cache.get(&key).unwrap();
        assert_eq!(second.data, "snapshot");
        assert!(second.revision > first);

        cache.remove_partition(&key.partition);
        assert!(cache.is_empty());
    }
}
