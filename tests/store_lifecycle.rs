//! End-to-end behaviour of the store: conversation log, document cache,
//! backup and restore.

use archivist::document::content_hash;
use archivist::source::{self, MemorySource};
use archivist::{BackupManager, SqliteStore, UpsertOutcome};
use tempfile::TempDir;

fn temp_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("memory.db")).unwrap();
    (dir, store)
}

fn populate(store: &SqliteStore) {
    store.append_message("system", "KNOWLEDGE BASE:\n...").unwrap();
    store.append_message("user", "hello").unwrap();
    store.append_message("agent", "hi there").unwrap();
    store.set_fact("name", "Ada").unwrap();
    store.set_fact("team", "platform").unwrap();
    store.upsert_document("4151280097", "API 101", "<p>APIs</p>").unwrap();
    store.upsert_document("4359651961", "Incident Management", "<p>On-call</p>").unwrap();
}

#[test]
fn conversation_round_trip() {
    let (_dir, store) = temp_store();
    store.append_message("user", "hello").unwrap();
    store.append_message("agent", "hi there").unwrap();

    let history: Vec<_> = store
        .get_recent_history(10)
        .unwrap()
        .into_iter()
        .map(|m| (m.role, m.text))
        .collect();
    assert_eq!(
        history,
        vec![
            ("user".to_string(), "hello".to_string()),
            ("agent".to_string(), "hi there".to_string()),
        ]
    );
}

#[test]
fn large_message_bodies_are_kept_whole() {
    let (_dir, store) = temp_store();
    let blob = "x".repeat(2 * 1024 * 1024);
    store.append_message("system", &blob).unwrap();

    let history = store.get_recent_history(1).unwrap();
    assert_eq!(history[0].text.len(), blob.len());
}

#[test]
fn document_change_detection_scenario() {
    let (_dir, store) = temp_store();

    assert_eq!(store.upsert_document("P1", "Doc", "abc").unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_document("P1", "Doc", "abc").unwrap(), UpsertOutcome::Unchanged);
    assert_eq!(store.upsert_document("P1", "Doc", "xyz").unwrap(), UpsertOutcome::Updated);

    let doc = store.get_document("P1").unwrap().unwrap();
    assert_eq!(doc.content, "xyz");
    assert_eq!(doc.content_hash, content_hash("xyz"));
    assert_eq!(store.list_documents().unwrap().len(), 1);
}

#[test]
fn concurrent_upserts_keep_one_row_per_id() {
    let (_dir, store) = temp_store();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                for round in 0..10 {
                    let body = format!("body {} from {}", round % 3, i);
                    store.upsert_document("shared", "Shared", &body).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count_documents().unwrap(), 1);
    let doc = store.get_document("shared").unwrap().unwrap();
    assert!(doc.is_consistent());
}

#[test]
fn backup_then_restore_into_fresh_target() {
    let (dir, store) = temp_store();
    populate(&store);
    let before = store.stats().unwrap();
    let hashes_before: Vec<_> = ["4151280097", "4359651961"]
        .iter()
        .map(|id| store.get_document(id).unwrap().unwrap().content_hash)
        .collect();

    let backup = BackupManager::for_store(&store).backup(None).unwrap();
    assert!(backup.starts_with(dir.path().join("backups")));
    assert!(backup.file_name().unwrap().to_string_lossy().starts_with("backup_"));

    let target_path = dir.path().join("restored").join("memory.db");
    BackupManager::new(&target_path, dir.path().join("backups"))
        .restore(&backup)
        .unwrap();
    let restored = SqliteStore::open(&target_path).unwrap();

    let after = restored.stats().unwrap();
    assert_eq!(after.messages, before.messages);
    assert_eq!(after.facts, before.facts);
    assert_eq!(after.documents, before.documents);

    let hashes_after: Vec<_> = ["4151280097", "4359651961"]
        .iter()
        .map(|id| restored.get_document(id).unwrap().unwrap().content_hash)
        .collect();
    assert_eq!(hashes_after, hashes_before);
    assert_eq!(restored.get_fact("name").unwrap().as_deref(), Some("Ada"));
}

#[test]
fn restore_rolls_back_later_writes() {
    let (_dir, store) = temp_store();
    populate(&store);
    let manager = BackupManager::for_store(&store);
    let backup = manager.backup(Some("before-clear.db")).unwrap();

    store.clear().unwrap();
    store.append_message("user", "after backup").unwrap();

    manager.restore(&backup).unwrap();
    let history = store.get_recent_history(10).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].text, "hi there");
    assert_eq!(store.count_facts().unwrap(), 2);
}

#[test]
fn restore_from_missing_path_leaves_store_alone() {
    let (dir, store) = temp_store();
    populate(&store);

    let err = BackupManager::for_store(&store)
        .restore(&dir.path().join("backups").join("missing.db"))
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(store.count_messages().unwrap(), 3);
    assert_eq!(store.count_documents().unwrap(), 2);
}

#[test]
fn ingest_then_search() {
    let (_dir, store) = temp_store();
    let mut remote = MemorySource::new();
    remote.insert("A", "Exposing your API", "Register the API in the gateway");
    remote.insert("B", "Connecting to internal APIs", "Request API keys first");

    assert_eq!(source::ingest(&store, &remote, "A").unwrap(), UpsertOutcome::Inserted);
    assert_eq!(source::ingest(&store, &remote, "B").unwrap(), UpsertOutcome::Inserted);

    let hits = store.search_documents("API keys", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].external_id, "B");

    let hits = store.search_documents("api", 5).unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.external_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A"]);
}
