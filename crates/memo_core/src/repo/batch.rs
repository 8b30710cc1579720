//! Atomic multi-document deletes.
//!
//! Used by account deletion: every memo of the partition and the profile
//! document go away together, or nothing changes.

use crate::model::memo::MemoId;
use crate::model::user::PartitionKey;
use crate::remote::{LocalBackend, RemoteResult};
use log::info;
use rusqlite::params;
use std::collections::BTreeSet;

/// One queued write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    DeleteMemo { partition: PartitionKey, id: MemoId },
    DeleteProfile { email: String },
}

/// Ordered list of writes committed in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete_memo(&mut self, partition: &PartitionKey, id: &MemoId) -> &mut Self {
        self.writes.push(BatchWrite::DeleteMemo {
            partition: partition.clone(),
            id: id.clone(),
        });
        self
    }

    pub fn delete_profile(&mut self, email: &str) -> &mut Self {
        self.writes.push(BatchWrite::DeleteProfile {
            email: email.to_string(),
        });
        self
    }

    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Commits write batches atomically.
pub trait BatchWriter: Send + Sync {
    fn commit_batch(&self, batch: WriteBatch) -> RemoteResult<()>;
}

impl BatchWriter for LocalBackend {
    fn commit_batch(&self, batch: WriteBatch) -> RemoteResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut touched = BTreeSet::new();
        self.call(|conn| {
            let tx = conn.transaction()?;
            for write in batch.writes() {
                match write {
                    BatchWrite::DeleteMemo { partition, id } => {
                        tx.execute(
                            "DELETE FROM memos WHERE partition = ?1 AND id = ?2;",
                            params![partition.as_str(), id.as_str()],
                        )?;
                        touched.insert(partition.clone());
                    }
                    BatchWrite::DeleteProfile { email } => {
                        tx.execute("DELETE FROM profiles WHERE email = ?1;", [email.as_str()])?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        info!(
            "event=batch_commit module=repo status=ok writes={} partitions={}",
            batch.len(),
            touched.len()
        );
        for partition in &touched {
            self.publish_memos(partition);
        }
        Ok(())
    }
}
