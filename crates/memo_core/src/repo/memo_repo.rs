//! Memo collection contract and SQLite implementation.
//!
//! # Responsibility
//! - Read/write the memo sub-collection of one user partition.
//! - Serve realtime subscriptions that receive the full ordered snapshot.
//!
//! # Invariants
//! - Ordering is applied by the store: `created_at`, ties broken by id in
//!   the same direction.
//! - Deleting a missing memo succeeds without notifying listeners.
//! - A subscription receives its first snapshot during registration, and
//!   never a snapshot older than one it already received.

use crate::model::memo::{Memo, MemoId, NewMemo, SortOrder};
use crate::model::user::PartitionKey;
use crate::remote::listeners::{Listener, ListenerHandle};
use crate::remote::{sequenced, LocalBackend, MemoQuery, MemoSnapshot, RemoteError, RemoteResult};
use log::{debug, info};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub(crate) const MEMO_COLLECTION: &str = "memo";

/// Receives the full ordered memo list of one partition, or the error that
/// prevented reading it after a change.
pub type SnapshotListener = Listener<RemoteResult<Vec<Memo>>>;

/// Memo collection operations scoped to one partition.
pub trait MemoRepository: Send + Sync {
    /// One-shot ordered fetch of every memo in the partition.
    fn list_memos(&self, partition: &PartitionKey, order: SortOrder) -> RemoteResult<Vec<Memo>>;
    /// Writes a new memo and returns the id assigned by the store.
    fn add_memo(&self, partition: &PartitionKey, memo: &NewMemo) -> RemoteResult<MemoId>;
    /// Rewrites content and modified timestamp of an existing memo.
    fn update_memo(
        &self,
        partition: &PartitionKey,
        id: &MemoId,
        content: &str,
        updated_at: i64,
    ) -> RemoteResult<()>;
    /// Removes a memo; missing ids are not an error.
    fn delete_memo(&self, partition: &PartitionKey, id: &MemoId) -> RemoteResult<()>;
    /// Registers a realtime listener for the ordered partition snapshot.
    /// Listeners receive `Err` when a snapshot cannot be read after a change.
    fn subscribe_memos(
        &self,
        partition: &PartitionKey,
        order: SortOrder,
        listener: SnapshotListener,
    ) -> RemoteResult<ListenerHandle>;
}

/// Memo repository backed by the local SQLite backend.
#[derive(Clone)]
pub struct SqliteMemoRepository {
    backend: LocalBackend,
}

impl SqliteMemoRepository {
    pub fn new(backend: LocalBackend) -> Self {
        Self { backend }
    }
}

impl MemoRepository for SqliteMemoRepository {
    fn list_memos(&self, partition: &PartitionKey, order: SortOrder) -> RemoteResult<Vec<Memo>> {
        let memos = self
            .backend
            .call(|conn| query_memos(conn, partition, order))?;
        debug!(
            "event=memo_list module=repo status=ok partition={} order={} count={}",
            partition,
            order.as_str(),
            memos.len()
        );
        Ok(memos)
    }

    fn add_memo(&self, partition: &PartitionKey, memo: &NewMemo) -> RemoteResult<MemoId> {
        let id = MemoId::new(Uuid::new_v4().simple().to_string());
        self.backend.call(|conn| {
            conn.execute(
                "INSERT INTO memos (partition, id, content, created_at, user_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL);",
                params![
                    partition.as_str(),
                    id.as_str(),
                    memo.content.as_str(),
                    memo.created_at,
                    memo.user_id.as_str(),
                ],
            )?;
            Ok(())
        })?;

        info!(
            "event=memo_add module=repo status=ok partition={} content_chars={}",
            partition,
            memo.content.chars().count()
        );
        self.backend.publish_memos(partition);
        Ok(id)
    }

    fn update_memo(
        &self,
        partition: &PartitionKey,
        id: &MemoId,
        content: &str,
        updated_at: i64,
    ) -> RemoteResult<()> {
        let changed = self.backend.call(|conn| {
            Ok(conn.execute(
                "UPDATE memos
                 SET content = ?3, updated_at = ?4
                 WHERE partition = ?1 AND id = ?2;",
                params![partition.as_str(), id.as_str(), content, updated_at],
            )?)
        })?;

        if changed == 0 {
            return Err(RemoteError::NotFound {
                collection: MEMO_COLLECTION,
                id: id.to_string(),
            });
        }

        info!(
            "event=memo_update module=repo status=ok partition={}",
            partition
        );
        self.backend.publish_memos(partition);
        Ok(())
    }

    fn delete_memo(&self, partition: &PartitionKey, id: &MemoId) -> RemoteResult<()> {
        let changed = self.backend.call(|conn| {
            Ok(conn.execute(
                "DELETE FROM memos WHERE partition = ?1 AND id = ?2;",
                params![partition.as_str(), id.as_str()],
            )?)
        })?;

        info!(
            "event=memo_delete module=repo status=ok partition={} existed={}",
            partition,
            changed > 0
        );
        if changed > 0 {
            self.backend.publish_memos(partition);
        }
        Ok(())
    }

    fn subscribe_memos(
        &self,
        partition: &PartitionKey,
        order: SortOrder,
        listener: SnapshotListener,
    ) -> RemoteResult<ListenerHandle> {
        let listener = sequenced(listener);
        let handle = self.backend.memo_listeners().register(
            MemoQuery {
                partition: partition.clone(),
                order,
            },
            listener.clone(),
        );

        // Dropping `handle` on the error path unregisters the listener.
        let MemoSnapshot { seq, memos } = self.backend.read_snapshot(partition, order);
        let initial = MemoSnapshot {
            seq,
            memos: Ok(memos?),
        };
        info!(
            "event=memo_subscribe module=repo status=ok partition={} order={}",
            partition,
            order.as_str()
        );
        // Skipped when a publish read after this one was already delivered.
        listener(&initial);
        Ok(handle)
    }
}

/// Reads the ordered memo list of one partition.
pub(crate) fn query_memos(
    conn: &Connection,
    partition: &PartitionKey,
    order: SortOrder,
) -> RemoteResult<Vec<Memo>> {
    let sql = match order {
        SortOrder::NewestFirst => {
            "SELECT id, content, created_at, user_id, updated_at
             FROM memos
             WHERE partition = ?1
             ORDER BY created_at DESC, id DESC;"
        }
        SortOrder::OldestFirst => {
            "SELECT id, content, created_at, user_id, updated_at
             FROM memos
             WHERE partition = ?1
             ORDER BY created_at ASC, id ASC;"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([partition.as_str()])?;
    let mut memos = Vec::new();
    while let Some(row) = rows.next()? {
        memos.push(parse_memo_row(row)?);
    }
    Ok(memos)
}

fn parse_memo_row(row: &Row<'_>) -> RemoteResult<Memo> {
    let content: String = row.get("content")?;
    if content.is_empty() {
        let id: String = row.get("id")?;
        return Err(RemoteError::InvalidData(format!("memo `{id}` has empty content")));
    }
    Ok(Memo {
        id: MemoId::new(row.get::<_, String>("id")?),
        content,
        created_at: row.get("created_at")?,
        user_id: row.get("user_id")?,
        updated_at: row.get("updated_at")?,
    })
}
