use memo_core::db::{open_db, open_db_in_memory};
use memo_core::{
    InputRules, LocalBackend, ManualClock, Memo, MemoScope, MemoService, MemoServiceError,
    QueryKey, SharedClock, SignInProvider, SortOrder, SqliteMemoRepository, UserIdentity,
    ValidationError,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn user(uid: &str, email: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        email: email.to_string(),
        display_name: None,
        photo_url: None,
        provider: SignInProvider::Password,
    }
}

fn setup() -> (
    Arc<ManualClock>,
    LocalBackend,
    MemoService<SqliteMemoRepository>,
) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let shared: SharedClock = clock.clone();
    let backend = LocalBackend::from_connection(open_db_in_memory().unwrap(), shared.clone());
    let service = MemoService::new(backend.memo_repository(), shared, InputRules::default());
    (clock, backend, service)
}

fn contents(memos: &[Memo]) -> Vec<String> {
    memos.iter().map(|memo| memo.content.clone()).collect()
}

#[test]
fn created_memo_is_listed_trimmed_with_author() {
    let (_clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));

    let id = service.create(&scope, "  buy milk \n").unwrap();
    let memos = service.list(&scope, SortOrder::NewestFirst).unwrap();

    assert_eq!(memos.len(), 1);
    assert_eq!(memos[0].id, id);
    assert_eq!(memos[0].content, "buy milk");
    assert_eq!(memos[0].user_id, "u1");
    assert_eq!(memos[0].created_at, 1_700_000_000_000);
}

#[test]
fn over_long_memo_is_rejected_and_nothing_is_written() {
    let (_clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    let too_long = "x".repeat(10_001);

    let err = service.create(&scope, &too_long).unwrap_err();
    assert!(matches!(
        err,
        MemoServiceError::Validation(ValidationError::MemoTooLong { .. })
    ));
    assert!(service.list(&scope, SortOrder::NewestFirst).unwrap().is_empty());

    service.create(&scope, &"x".repeat(10_000)).unwrap();
    assert_eq!(service.list(&scope, SortOrder::NewestFirst).unwrap().len(), 1);
}

#[test]
fn toggled_order_reverses_the_list() {
    let (clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    for text in ["first", "second", "third"] {
        service.create(&scope, text).unwrap();
        clock.advance(1_000);
    }

    let newest = service.list(&scope, SortOrder::NewestFirst).unwrap();
    let oldest = service
        .list(&scope, SortOrder::NewestFirst.toggled())
        .unwrap();

    assert_eq!(contents(&newest), ["third", "second", "first"]);
    let mut reversed = contents(&oldest);
    reversed.reverse();
    assert_eq!(reversed, contents(&newest));
}

#[test]
fn update_replaces_content_and_stamps_updated_at() {
    let (clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    let id = service.create(&scope, "draft").unwrap();

    clock.advance(5_000);
    service.update(&scope, &id, "  final ").unwrap();

    let memos = service.list(&scope, SortOrder::NewestFirst).unwrap();
    assert_eq!(memos[0].content, "final");
    assert_eq!(memos[0].created_at, 1_700_000_000_000);
    assert_eq!(memos[0].updated_at, Some(1_700_000_005_000));
}

#[test]
fn delete_is_idempotent() {
    let (_clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    let id = service.create(&scope, "gone soon").unwrap();

    service.delete(&scope, &id).unwrap();
    service.delete(&scope, &id).unwrap();

    assert!(service.list(&scope, SortOrder::NewestFirst).unwrap().is_empty());
}

#[test]
fn partitions_do_not_see_each_other() {
    let (_clock, _backend, service) = setup();
    let ann = MemoScope::for_user(&user("u1", "ann@example.com"));
    let bob = MemoScope::for_user(&user("u2", "bob@example.com"));

    service.create(&ann, "ann's memo").unwrap();

    assert!(service.list(&bob, SortOrder::NewestFirst).unwrap().is_empty());
    assert_eq!(service.list(&ann, SortOrder::NewestFirst).unwrap().len(), 1);
}

#[test]
fn watch_delivers_initial_snapshot_then_every_change() {
    let (clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    service.create(&scope, "existing").unwrap();

    let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let watch = service
        .watch(&scope, SortOrder::NewestFirst, move |memos| {
            sink.lock().unwrap().push(contents(memos));
        })
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), [vec!["existing".to_string()]]);

    clock.advance(1_000);
    let id = service.create(&scope, "fresh").unwrap();
    service.delete(&scope, &id).unwrap();

    let snapshots = seen.lock().unwrap().clone();
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[1], ["fresh", "existing"]);
    assert_eq!(snapshots[2], ["existing"]);
    assert!(watch.is_active());
}

#[test]
fn dropped_watch_receives_nothing_more() {
    let (_clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));

    let count = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&count);
    let watch = service
        .watch(&scope, SortOrder::OldestFirst, move |_| {
            *counter.lock().unwrap() += 1;
        })
        .unwrap();
    assert_eq!(*count.lock().unwrap(), 1);

    drop(watch);
    service.create(&scope, "unseen").unwrap();

    assert_eq!(*count.lock().unwrap(), 1);
    let key = QueryKey::memos(scope.partition(), SortOrder::OldestFirst);
    assert!(!service.cache().is_live(&key));
}

#[test]
fn live_entry_keeps_serving_pushed_snapshots() {
    let (_clock, _backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    let _watch = service
        .watch(&scope, SortOrder::NewestFirst, |_| {})
        .unwrap();

    service.create(&scope, "pushed").unwrap();

    let key = QueryKey::memos(scope.partition(), SortOrder::NewestFirst);
    let cached = service.cache().get(&key).unwrap();
    assert!(!cached.stale);
    assert_eq!(contents(&cached.data), ["pushed"]);
    assert_eq!(
        contents(&service.list(&scope, SortOrder::NewestFirst).unwrap()),
        ["pushed"]
    );
}

#[test]
fn offline_backend_fails_writes_and_watch_setup() {
    let (_clock, backend, service) = setup();
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));
    backend.set_offline(true);

    let err = service.create(&scope, "lost").unwrap_err();
    assert!(matches!(err, MemoServiceError::Remote(_)));
    assert!(service
        .watch(&scope, SortOrder::NewestFirst, |_| {})
        .is_err());

    let key = QueryKey::memos(scope.partition(), SortOrder::NewestFirst);
    assert!(!service.cache().is_live(&key));

    backend.set_offline(false);
    assert!(service.list(&scope, SortOrder::NewestFirst).unwrap().is_empty());
}

#[test]
fn forget_drops_cached_queries_of_one_partition() {
    let (_clock, _backend, service) = setup();
    let ann = MemoScope::for_user(&user("u1", "ann@example.com"));
    let bob = MemoScope::for_user(&user("u2", "bob@example.com"));
    service.list(&ann, SortOrder::NewestFirst).unwrap();
    service.list(&bob, SortOrder::NewestFirst).unwrap();
    assert_eq!(service.cache().len(), 2);

    service.forget(&ann);

    assert_eq!(service.cache().len(), 1);
    assert!(service
        .cache()
        .get(&QueryKey::memos(ann.partition(), SortOrder::NewestFirst))
        .is_none());
}

#[test]
fn unreadable_push_marks_live_entry_stale_until_a_read_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memos.sqlite3");
    let clock: SharedClock = Arc::new(ManualClock::new(1_700_000_000_000));
    let backend = LocalBackend::from_connection(open_db(&path).unwrap(), clock.clone());
    let service = MemoService::new(backend.memo_repository(), clock, InputRules::default());
    let scope = MemoScope::for_user(&user("u1", "ann@example.com"));

    let seen = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&seen);
    let _watch = service
        .watch(&scope, SortOrder::NewestFirst, move |_| {
            *counter.lock().unwrap() += 1;
        })
        .unwrap();
    let key = QueryKey::memos(scope.partition(), SortOrder::NewestFirst);
    assert!(!service.cache().get(&key).unwrap().stale);

    let raw = Connection::open(&path).unwrap();
    raw.execute(
        "INSERT INTO memos (partition, id, content, created_at, user_id)
         VALUES (?1, 'broken', '', 0, 'u1');",
        [scope.partition().as_str()],
    )
    .unwrap();

    service.create(&scope, "written").unwrap();

    assert_eq!(*seen.lock().unwrap(), 1);
    assert!(service.cache().is_live(&key));
    assert!(service.cache().get(&key).unwrap().stale);
    assert!(matches!(
        service.list(&scope, SortOrder::NewestFirst).unwrap_err(),
        MemoServiceError::Remote(_)
    ));

    raw.execute("DELETE FROM memos WHERE id = 'broken';", [])
        .unwrap();
    assert_eq!(
        contents(&service.list(&scope, SortOrder::NewestFirst).unwrap()),
        ["written"]
    );
    assert!(!service.cache().get(&key).unwrap().stale);
}
