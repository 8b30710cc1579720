//! Memo use-case service.
//!
//! # Responsibility
//! - Provide list/watch/create/update/delete over one user partition.
//! - Keep the query cache consistent with realtime snapshots and mutations.
//!
//! # Invariants
//! - Content is trimmed before it is written and must be non-empty and
//!   within the configured length.
//! - `created_at` and `updated_at` come from the client clock.
//! - A partition is only addressable through a `MemoScope` built from the
//!   authenticated identity.

use crate::cache::{QueryCache, QueryKey, MEMOS_SCOPE};
use crate::clock::SharedClock;
use crate::model::memo::{Memo, MemoId, NewMemo, SortOrder};
use crate::model::user::{PartitionKey, UserIdentity};
use crate::remote::listeners::ListenerHandle;
use crate::remote::{RemoteError, RemoteResult};
use crate::repo::memo_repo::{MemoRepository, SnapshotListener};
use crate::validation::{InputRules, ValidationError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service error for memo use-cases.
#[derive(Debug)]
pub enum MemoServiceError {
    /// Input rejected before any remote call.
    Validation(ValidationError),
    /// Target memo does not exist in the partition.
    MemoNotFound(MemoId),
    /// Remote service failure.
    Remote(RemoteError),
}

impl Display for MemoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MemoNotFound(id) => write!(f, "memo not found: {id}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::MemoNotFound(_) => None,
        }
    }
}

impl From<ValidationError> for MemoServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for MemoServiceError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Partition and owner of the signed-in user's memos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoScope {
    partition: PartitionKey,
    owner_uid: String,
}

impl MemoScope {
    pub fn for_user(user: &UserIdentity) -> Self {
        Self {
            partition: PartitionKey::for_user(user),
            owner_uid: user.uid.clone(),
        }
    }

    pub fn partition(&self) -> &PartitionKey {
        &self.partition
    }

    pub fn owner_uid(&self) -> &str {
        &self.owner_uid
    }
}

/// Live memo subscription. Dropping it unsubscribes.
pub struct MemoWatch {
    handle: ListenerHandle,
    cache: Arc<QueryCache<Vec<Memo>>>,
    key: QueryKey,
}

impl MemoWatch {
    pub fn order(&self) -> SortOrder {
        self.key.order
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

impl Drop for MemoWatch {
    fn drop(&mut self) {
        self.handle.unsubscribe();
        self.cache.release_live(&self.key);
    }
}

impl std::fmt::Debug for MemoWatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoWatch")
            .field("key", &self.key)
            .field("active", &self.handle.is_active())
            .finish()
    }
}

/// Memo service facade over a repository implementation.
pub struct MemoService<R: MemoRepository> {
    repo: R,
    cache: Arc<QueryCache<Vec<Memo>>>,
    clock: SharedClock,
    rules: InputRules,
}

impl<R: MemoRepository> MemoService<R> {
    pub fn new(repo: R, clock: SharedClock, rules: InputRules) -> Self {
        Self {
            repo,
            cache: Arc::new(QueryCache::new()),
            clock,
            rules,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache<Vec<Memo>>> {
        &self.cache
    }

    pub fn rules(&self) -> &InputRules {
        &self.rules
    }

    /// Returns the ordered memo list, served from cache when fresh.
    pub fn list(&self, scope: &MemoScope, order: SortOrder) -> Result<Vec<Memo>, MemoServiceError> {
        let key = QueryKey::memos(scope.partition(), order);
        let memos = self
            .cache
            .fetch_with(&key, || self.repo.list_memos(scope.partition(), order))?;
        Ok(memos)
    }

    /// Subscribes to the ordered memo list.
    ///
    /// Every snapshot is written into the cache before `observer` sees it.
    /// A snapshot that fails to load marks the cached list stale instead.
    /// The first snapshot is delivered before this returns.
    pub fn watch(
        &self,
        scope: &MemoScope,
        order: SortOrder,
        observer: impl Fn(&[Memo]) + Send + Sync + 'static,
    ) -> Result<MemoWatch, MemoServiceError> {
        let key = QueryKey::memos(scope.partition(), order);
        self.cache.mark_live(&key);

        let cache = Arc::clone(&self.cache);
        let snapshot_key = key.clone();
        let listener: SnapshotListener =
            Arc::new(move |snapshot: &RemoteResult<Vec<Memo>>| match snapshot {
                Ok(memos) => {
                    cache.set_query_data(snapshot_key.clone(), memos.clone());
                    observer(memos.as_slice());
                }
                Err(err) => {
                    // The write landed but the push did not: refetch on next read.
                    cache.mark_stale(&snapshot_key);
                    warn!(
                        "event=memo_watch module=service status=error partition={} error_code={}",
                        snapshot_key.partition,
                        err.code()
                    );
                }
            });

        match self.repo.subscribe_memos(scope.partition(), order, listener) {
            Ok(handle) => Ok(MemoWatch {
                handle,
                cache: Arc::clone(&self.cache),
                key,
            }),
            Err(err) => {
                self.cache.release_live(&key);
                warn!(
                    "event=memo_watch module=service status=error partition={} error_code={}",
                    scope.partition(),
                    err.code()
                );
                Err(err.into())
            }
        }
    }

    /// Creates a memo from trimmed `content` and returns its id.
    pub fn create(&self, scope: &MemoScope, content: &str) -> Result<MemoId, MemoServiceError> {
        let content = self.rules.validate_memo_content(content)?;
        let memo = NewMemo {
            content: content.to_string(),
            created_at: self.clock.now_millis(),
            user_id: scope.owner_uid().to_string(),
        };

        let id = self.repo.add_memo(scope.partition(), &memo)?;
        self.cache.invalidate_partition(MEMOS_SCOPE, scope.partition());
        info!(
            "event=memo_create module=service status=ok partition={}",
            scope.partition()
        );
        Ok(id)
    }

    /// Replaces the content of an existing memo.
    pub fn update(
        &self,
        scope: &MemoScope,
        id: &MemoId,
        content: &str,
    ) -> Result<(), MemoServiceError> {
        let content = self.rules.validate_memo_content(content)?;
        let updated_at = self.clock.now_millis();

        self.repo
            .update_memo(scope.partition(), id, content, updated_at)
            .map_err(|err| match err {
                RemoteError::NotFound { .. } => MemoServiceError::MemoNotFound(id.clone()),
                other => MemoServiceError::Remote(other),
            })?;
        self.cache.invalidate_partition(MEMOS_SCOPE, scope.partition());
        Ok(())
    }

    /// Deletes a memo. Deleting an already-deleted memo succeeds.
    pub fn delete(&self, scope: &MemoScope, id: &MemoId) -> Result<(), MemoServiceError> {
        self.repo.delete_memo(scope.partition(), id)?;
        self.cache.invalidate_partition(MEMOS_SCOPE, scope.partition());
        Ok(())
    }

    /// Drops every cached query of the scope's partition.
    pub fn forget(&self, scope: &MemoScope) {
        self.cache.remove_partition(scope.partition());
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoScope, MemoService, MemoServiceError};
    use crate::clock::{ManualClock, SharedClock};
    use crate::db::open_db_in_memory;
    use crate::model::memo::{MemoId, SortOrder};
    use crate::model::user::{SignInProvider, UserIdentity};
    use crate::remote::LocalBackend;
    use crate::repo::memo_repo::SqliteMemoRepository;
    use crate::validation::{InputRules, ValidationError};
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, MemoService<SqliteMemoRepository>, MemoScope) {
        let clock = Arc::new(ManualClock::new(1_000));
        let shared: SharedClock = clock.clone();
        let backend = LocalBackend::from_connection(
            open_db_in_memory().expect("open in-memory db"),
            shared.clone(),
        );
        let service = MemoService::new(backend.memo_repository(), shared, InputRules::default());
        let scope = MemoScope::for_user(&UserIdentity {
            uid: "uid-1".to_string(),
            email: "writer@example.com".to_string(),
            display_name: None,
            photo_url: None,
            provider: SignInProvider::Password,
        });
        (clock, service, scope)
    }

    #[test]
    fn create_trims_content_and_stamps_owner_and_clock() {
        let (_clock, service, scope) = setup();
        service.create(&scope, "  hello  ").expect("create memo");

        let memos = service.list(&scope, SortOrder::NewestFirst).expect("list");
        assert_eq!(memos.len(), 1);
        assert_eq!(memos[0].content, "hello");
        assert_eq!(memos[0].user_id, "uid-1");
        assert_eq!(memos[0].created_at, 1_000);
        assert_eq!(memos[0].updated_at, None);
    }

    #[test]
    fn create_rejects_blank_content_before_any_write() {
        let (_clock, service, scope) = setup();
        let err = service.create(&scope, "   ").expect_err("blank memo");
        assert!(matches!(
            err,
            MemoServiceError::Validation(ValidationError::EmptyMemo)
        ));
        assert!(service
            .list(&scope, SortOrder::NewestFirst)
            .expect("list")
            .is_empty());
    }

    #[test]
    fn update_of_missing_memo_reports_not_found() {
        let (_clock, service, scope) = setup();
        let missing = MemoId::new("missing");
        let err = service
            .update(&scope, &missing, "content")
            .expect_err("missing memo");
        assert!(matches!(err, MemoServiceError::MemoNotFound(id) if id == missing));
    }

    #[test]
    fn list_refetches_after_mutation_invalidates_cache() {
        let (clock, service, scope) = setup();
        assert!(service
            .list(&scope, SortOrder::NewestFirst)
            .expect("list")
            .is_empty());

        clock.advance(10);
        let id = service.create(&scope, "first").expect("create");
        let listed = service.list(&scope, SortOrder::NewestFirst).expect("list");
        assert_eq!(listed.len(), 1);

        clock.advance(10);
        service.update(&scope, &id, " edited ").expect("update");
        let listed = service.list(&scope, SortOrder::NewestFirst).expect("list");
        assert_eq!(listed[0].content, "edited");
        assert_eq!(listed[0].updated_at, Some(1_020));
    }
}
