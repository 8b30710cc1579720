//! Local emulation of the remote data service.
//!
//! # Responsibility
//! - Own the single backend connection shared by the memo store, profile
//!   store and identity provider.
//! - Push ordered memo snapshots to realtime listeners after every
//!   committed change.
//! - Simulate outages so callers can exercise their error paths.
//!
//! # Invariants
//! - Listeners are never invoked while the connection lock is held.
//! - A listener never sees a snapshot read before one it already received.
//! - Server timestamps come from the backend clock, never from callers.

pub mod listeners;

use crate::auth::local_provider::LocalIdentityProvider;
use crate::clock::{system_clock, SharedClock};
use crate::config::AppConfig;
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::memo::{Memo, SortOrder};
use crate::model::user::PartitionKey;
use crate::repo::memo_repo::{query_memos, SnapshotListener, SqliteMemoRepository};
use crate::repo::profile_repo::SqliteProfileRepository;
use crate::util::lock;
use listeners::{Listener, ListenerSet};
use log::warn;
use rusqlite::Connection;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure reported by the remote data service.
#[derive(Debug)]
pub enum RemoteError {
    Db(DbError),
    NotFound {
        collection: &'static str,
        id: String,
    },
    InvalidData(String),
    /// The service cannot be reached.
    Unavailable,
}

impl RemoteError {
    /// Service error code, in the remote service's vocabulary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "internal",
            Self::NotFound { .. } => "not-found",
            Self::InvalidData(_) => "data-loss",
            Self::Unavailable => "unavailable",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "document not found in `{collection}`: {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Unavailable => write!(f, "remote service unavailable"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RemoteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key of one realtime memo query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoQuery {
    pub(crate) partition: PartitionKey,
    pub(crate) order: SortOrder,
}

/// One read of an ordered memo query. `seq` follows the order in which
/// reads took the connection lock.
pub(crate) struct MemoSnapshot {
    pub(crate) seq: u64,
    pub(crate) memos: RemoteResult<Vec<Memo>>,
}

/// Wraps `listener` so that snapshots older than the last delivered one are
/// dropped.
pub(crate) fn sequenced(listener: SnapshotListener) -> Listener<MemoSnapshot> {
    let delivered = AtomicU64::new(0);
    Arc::new(move |snapshot: &MemoSnapshot| {
        if delivered.fetch_max(snapshot.seq, Ordering::SeqCst) < snapshot.seq {
            listener(&snapshot.memos);
        }
    })
}

struct BackendInner {
    conn: Mutex<Connection>,
    clock: SharedClock,
    offline: AtomicBool,
    snapshot_seq: AtomicU64,
    memo_listeners: ListenerSet<MemoQuery, MemoSnapshot>,
}

/// Handle to the local backend; clones share the same connection.
#[derive(Clone)]
pub struct LocalBackend {
    inner: Arc<BackendInner>,
}

impl LocalBackend {
    /// Opens a file-backed backend using the system clock.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?, system_clock()))
    }

    /// Opens an ephemeral backend using the system clock.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, system_clock()))
    }

    /// Wraps a migrated connection; `clock` stamps server timestamps.
    pub fn from_connection(conn: Connection, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(BackendInner {
                conn: Mutex::new(conn),
                clock,
                offline: AtomicBool::new(false),
                snapshot_seq: AtomicU64::new(0),
                memo_listeners: ListenerSet::new(),
            }),
        }
    }

    /// Toggles the simulated outage; every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.inner.offline.load(Ordering::SeqCst)
    }

    /// Current server time in epoch milliseconds.
    pub fn server_now(&self) -> i64 {
        self.inner.clock.now_millis()
    }

    pub fn memo_repository(&self) -> SqliteMemoRepository {
        SqliteMemoRepository::new(self.clone())
    }

    pub fn profile_repository(&self) -> SqliteProfileRepository {
        SqliteProfileRepository::new(self.clone())
    }

    pub fn identity_provider(&self, config: &AppConfig) -> LocalIdentityProvider {
        LocalIdentityProvider::new(self.clone(), config)
    }

    /// Runs one backend operation against the shared connection.
    pub(crate) fn call<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        if self.is_offline() {
            return Err(RemoteError::Unavailable);
        }
        let mut conn = lock(&self.inner.conn);
        op(&mut conn)
    }

    pub(crate) fn memo_listeners(&self) -> &ListenerSet<MemoQuery, MemoSnapshot> {
        &self.inner.memo_listeners
    }

    fn next_snapshot_seq(&self) -> u64 {
        self.inner.snapshot_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reads one ordered memo list and stamps it while the connection lock
    /// is held.
    pub(crate) fn read_snapshot(&self, partition: &PartitionKey, order: SortOrder) -> MemoSnapshot {
        let mut stamped = None;
        let memos = self.call(|conn| {
            stamped = Some(self.next_snapshot_seq());
            query_memos(conn, partition, order)
        });
        MemoSnapshot {
            seq: stamped.unwrap_or_else(|| self.next_snapshot_seq()),
            memos,
        }
    }

    /// Pushes fresh ordered snapshots to every listener of `partition`.
    /// A failed read is delivered too, so subscribers can drop stale data.
    pub(crate) fn publish_memos(&self, partition: &PartitionKey) {
        let listeners = self
            .inner
            .memo_listeners
            .matching(|query| &query.partition == partition);
        if listeners.is_empty() {
            return;
        }

        let mut snapshots: HashMap<SortOrder, MemoSnapshot> = HashMap::new();
        for (query, listener) in listeners {
            let snapshot = match snapshots.entry(query.order) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let snapshot = self.read_snapshot(partition, query.order);
                    if let Err(err) = &snapshot.memos {
                        warn!(
                            "event=memo_snapshot module=remote status=error partition={} order={} error_code={}",
                            partition,
                            query.order.as_str(),
                            err.code()
                        );
                    }
                    slot.insert(snapshot)
                }
            };
            listener(&*snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{sequenced, MemoSnapshot};
    use crate::model::memo::{Memo, MemoId};
    use crate::remote::RemoteResult;
    use std::sync::{Arc, Mutex};

    fn snapshot(seq: u64, contents: &[&str]) -> MemoSnapshot {
        let memos = contents
            .iter()
            .enumerate()
            .map(|(index, content)| Memo {
                id: MemoId::new(format!("m{index}")),
                content: content.to_string(),
                created_at: 1_000,
                user_id: "uid-1".to_string(),
                updated_at: None,
            })
            .collect();
        MemoSnapshot {
            seq,
            memos: Ok(memos),
        }
    }

    #[test]
    fn sequenced_listener_drops_snapshots_older_than_the_last_delivered() {
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = sequenced(Arc::new(move |memos: &RemoteResult<Vec<Memo>>| {
            sink.lock()
                .unwrap()
                .push(memos.as_ref().map_or(0, Vec::len));
        }));

        // A publish read after the initial query overtakes its delivery.
        listener(&snapshot(2, &["new", "old"]));
        listener(&snapshot(1, &["old"]));
        listener(&snapshot(2, &["new", "old"]));
        listener(&snapshot(3, &[]));

        assert_eq!(seen.lock().unwrap().as_slice(), [2, 0]);
    }
}
