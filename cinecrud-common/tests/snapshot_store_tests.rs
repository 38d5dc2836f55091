//! Integration tests for the local snapshot store
//!
//! Tests cover:
//! - reset/get round trip (order preserving)
//! - create: fresh id, prepend semantics
//! - update: only matching records change; unknown id is a no-op
//! - delete: only matching records removed; idempotent
//! - restore_init after arbitrary edits
//! - storage failures propagate
//! - file-backed persistence layout

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use cinecrud_common::{Error, FileStore, KeyValueStore, MemoryStore, Movie, Patch, SnapshotStore};
use serde_json::json;
use tempfile::TempDir;

const CATALOG: &str = "catalog";

/// Test helper: store over a fresh in-memory backend
fn memory_store() -> SnapshotStore<Movie> {
    SnapshotStore::new(Arc::new(MemoryStore::new()))
}

/// Test helper: store whose ids count up from `start`
fn counting_store(start: i64) -> SnapshotStore<Movie> {
    let counter = Arc::new(AtomicI64::new(start));
    memory_store().with_id_generator(move || counter.fetch_add(1, Ordering::SeqCst))
}

fn patch(value: serde_json::Value) -> Patch {
    value.as_object().cloned().expect("patch must be an object")
}

fn seed() -> Vec<Movie> {
    vec![
        Movie::new("A").with_id(1).with_year("2000"),
        Movie::new("B").with_id(2).with_year("2001"),
        Movie::new("C").with_id(3).with_year("2002"),
    ]
}

// =============================================================================
// Reset / get
// =============================================================================

#[test]
fn test_reset_then_get_returns_same_list_in_order() {
    let store = memory_store();
    let records = seed();

    store.reset_from_source(CATALOG, records.clone()).unwrap();

    assert_eq!(store.get_init(CATALOG).unwrap(), records);
    assert_eq!(store.get_work(CATALOG).unwrap(), records);
}

#[test]
fn test_reset_overwrites_previous_edits_and_snapshot() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();
    store.delete(CATALOG, 1).unwrap();

    let fresh = vec![Movie::new("Z").with_id(26)];
    store.reset_from_source(CATALOG, fresh.clone()).unwrap();

    assert_eq!(store.get_init(CATALOG).unwrap(), fresh);
    assert_eq!(store.get_work(CATALOG).unwrap(), fresh);
}

#[test]
fn test_save_work_leaves_init_untouched() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();

    store.save_work(CATALOG, &[]).unwrap();

    assert!(store.get_work(CATALOG).unwrap().is_empty());
    assert_eq!(store.get_init(CATALOG).unwrap(), seed());
}

#[test]
fn test_collections_are_independent() {
    let store = memory_store();
    store.reset_from_source("one", seed()).unwrap();

    assert!(store.get_work("two").unwrap().is_empty());
    store.delete("two", 1).unwrap();
    assert_eq!(store.get_work("one").unwrap().len(), 3);
}

// =============================================================================
// Create
// =============================================================================

#[test]
fn test_create_assigns_fresh_id_and_prepends() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();
    let prior_ids: Vec<i64> = seed().iter().filter_map(|m| m.id).collect();

    let work = store
        .create(CATALOG, Movie::new("New").with_year("2010"))
        .unwrap();

    let created = &work[0];
    let id = created.id.expect("id assigned");
    assert!(!prior_ids.contains(&id));
    assert_eq!(created.title, "New");
    assert_eq!(work.len(), 4);
    assert_eq!(store.get_work(CATALOG).unwrap(), work);
}

#[test]
fn test_create_into_empty_collection() {
    let store = counting_store(100);
    let work = store.create(CATALOG, Movie::new("First")).unwrap();
    assert_eq!(work, vec![Movie::new("First").with_id(100)]);
}

#[test]
fn test_create_does_not_touch_init() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();
    store.create(CATALOG, Movie::new("New")).unwrap();
    assert_eq!(store.get_init(CATALOG).unwrap(), seed());
}

#[test]
fn test_same_millisecond_ids_collide() {
    // Known limitation of timestamp ids: nothing deduplicates them
    let store = memory_store().with_id_generator(|| 42);
    store.create(CATALOG, Movie::new("One")).unwrap();
    let work = store.create(CATALOG, Movie::new("Two")).unwrap();
    assert_eq!(work[0].id, work[1].id);
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_changes_only_matching_record() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();

    let work = store
        .update(CATALOG, 2, &patch(json!({"title": "B2"})))
        .unwrap();

    assert_eq!(work[0], seed()[0]);
    assert_eq!(work[1], Movie::new("B2").with_id(2).with_year("2001"));
    assert_eq!(work[2], seed()[2]);
}

#[test]
fn test_update_unknown_id_is_noop() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();

    let work = store
        .update(CATALOG, 404, &patch(json!({"title": "nope"})))
        .unwrap();

    assert_eq!(work, seed());
    assert_eq!(store.get_work(CATALOG).unwrap(), seed());
}

#[test]
fn test_update_with_full_patch_clears_absent_fields() {
    let store = memory_store();
    let mut original = Movie::new("A").with_id(1).with_year("2000");
    original.original_language = Some("en".to_string());
    original.poster_path = Some("/a.jpg".to_string());
    store.reset_from_source(CATALOG, vec![original]).unwrap();

    let edited = Movie::new("A edited")
        .with_id(1)
        .with_year("2000")
        .with_poster("https://img/a.png");
    let work = store.update(CATALOG, 1, &edited.to_patch()).unwrap();

    assert_eq!(work, vec![edited]);
}

#[test]
fn test_update_preserves_record_bytes_of_others() {
    let kv = Arc::new(MemoryStore::new());
    let store: SnapshotStore<Movie> = SnapshotStore::new(kv.clone());
    store.reset_from_source(CATALOG, seed()).unwrap();

    store
        .update(CATALOG, 1, &patch(json!({"overview": "x"})))
        .unwrap();

    let raw = kv.get("crud_work_catalog").unwrap().unwrap();
    assert!(raw.contains(r#"{"id":2,"title":"B","year":"2001"}"#));
    assert!(raw.contains(r#"{"id":3,"title":"C","year":"2002"}"#));
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_removes_matching_records() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();

    let work = store.delete(CATALOG, 2).unwrap();

    assert_eq!(work, vec![seed()[0].clone(), seed()[2].clone()]);
}

#[test]
fn test_delete_removes_every_duplicate() {
    let store = memory_store().with_id_generator(|| 7);
    store.create(CATALOG, Movie::new("One")).unwrap();
    store.create(CATALOG, Movie::new("Two")).unwrap();

    assert!(store.delete(CATALOG, 7).unwrap().is_empty());
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();
    assert_eq!(store.delete(CATALOG, 99).unwrap(), seed());
}

#[test]
fn test_delete_is_idempotent() {
    let store = memory_store();
    store.reset_from_source(CATALOG, seed()).unwrap();

    let once = store.delete(CATALOG, 1).unwrap();
    let twice = store.delete(CATALOG, 1).unwrap();

    assert_eq!(once, twice);
}

// =============================================================================
// Restore
// =============================================================================

#[test]
fn test_restore_init_after_mixed_edits() {
    let store = counting_store(1_000);
    store.reset_from_source(CATALOG, seed()).unwrap();

    store.create(CATALOG, Movie::new("New")).unwrap();
    store
        .update(CATALOG, 3, &patch(json!({"title": "C2"})))
        .unwrap();
    store.delete(CATALOG, 1).unwrap();

    let restored = store.restore_init(CATALOG).unwrap();

    assert_eq!(restored, seed());
    assert_eq!(store.get_work(CATALOG).unwrap(), seed());
}

#[test]
fn test_restore_unseeded_collection_empties_work() {
    let store = memory_store();
    store.create(CATALOG, Movie::new("Orphan")).unwrap();
    assert!(store.restore_init(CATALOG).unwrap().is_empty());
    assert!(store.get_work(CATALOG).unwrap().is_empty());
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_create_prepends_with_assigned_id() {
    let store = memory_store();
    store
        .reset_from_source(CATALOG, vec![Movie::new("A").with_id(1).with_year("2000")])
        .unwrap();

    let work = store
        .create(
            CATALOG,
            Movie::new("B").with_year("2001").with_poster("https://x/y.png"),
        )
        .unwrap();

    assert_eq!(work.len(), 2);
    assert_eq!(work[0].title, "B");
    assert!(work[0].id.is_some());
    assert_eq!(work[1].id, Some(1));
}

#[test]
fn test_scenario_update_title_only() {
    let store = memory_store();
    let mut a = Movie::new("A").with_id(1).with_year("2000");
    a.overview = Some("first".to_string());
    store.reset_from_source(CATALOG, vec![a.clone()]).unwrap();

    let work = store
        .update(CATALOG, 1, &patch(json!({"title": "A2"})))
        .unwrap();

    assert_eq!(work.len(), 1);
    assert_eq!(work[0].title, "A2");
    assert_eq!(work[0].year, a.year);
    assert_eq!(work[0].overview, a.overview);
}

#[test]
fn test_scenario_delete_then_restore() {
    let store = memory_store();
    let one = Movie::new("One").with_id(1);
    let two = Movie::new("Two").with_id(2);
    store
        .reset_from_source(CATALOG, vec![one.clone(), two.clone()])
        .unwrap();

    assert_eq!(store.delete(CATALOG, 1).unwrap(), vec![two.clone()]);
    assert_eq!(store.restore_init(CATALOG).unwrap(), vec![one, two]);
}

// =============================================================================
// Failures and backends
// =============================================================================

#[test]
fn test_quota_failure_propagates_and_keeps_previous_work() {
    let store: SnapshotStore<Movie> = SnapshotStore::new(Arc::new(MemoryStore::with_quota(200)));
    store
        .reset_from_source(CATALOG, vec![Movie::new("A").with_id(1)])
        .unwrap();

    let big = Movie::new("B").with_overview("x".repeat(500));
    let err = store.create(CATALOG, big).unwrap_err();

    assert!(matches!(err, Error::QuotaExceeded { .. }));
    assert_eq!(store.get_work(CATALOG).unwrap(), vec![Movie::new("A").with_id(1)]);
}

#[test]
fn test_corrupt_work_set_surfaces_serialization_error() {
    let kv = Arc::new(MemoryStore::new());
    kv.set("crud_work_catalog", "{not json").unwrap();
    let store: SnapshotStore<Movie> = SnapshotStore::new(kv);

    assert!(matches!(
        store.get_work(CATALOG),
        Err(Error::Serialization(_))
    ));
}

#[test]
fn test_file_backend_uses_prefixed_keys() {
    let tmp = TempDir::new().unwrap();
    let kv = Arc::new(FileStore::new(tmp.path()).unwrap());
    let store: SnapshotStore<Movie> = SnapshotStore::with_prefix(kv, "crud");

    store.reset_from_source("tmdb_movies", seed()).unwrap();

    assert!(tmp.path().join("crud_init_tmdb_movies.json").exists());
    assert!(tmp.path().join("crud_work_tmdb_movies.json").exists());

    let reopened: SnapshotStore<Movie> =
        SnapshotStore::new(Arc::new(FileStore::new(tmp.path()).unwrap()));
    assert_eq!(reopened.get_work("tmdb_movies").unwrap(), seed());
}
