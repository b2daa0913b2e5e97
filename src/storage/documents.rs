//! Document cache operations
//!
//! Documents are keyed by the source system's identifier. An upsert
//! compares content hashes to decide between insert, update and touch,
//! and runs as one immediate transaction so no other writer can slip in
//! between the lookup and the write.

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info};

use super::clock::{format_timestamp, parse_timestamp};
use super::sqlite::SqliteStore;
use crate::Result;
use crate::document::{Document, DocumentSummary, SearchHit, UpsertOutcome, content_hash};

/// Default number of search hits
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

impl SqliteStore {
    /// Insert, update or touch a document depending on what is already stored
    pub fn upsert_document(&self, external_id: &str, title: &str, content: &str) -> Result<UpsertOutcome> {
        let new_hash = content_hash(content);

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = format_timestamp(&self.clock.now());

        let existing: Option<String> = tx
            .query_row(
                "SELECT content_hash FROM documents WHERE external_id = ?1",
                [external_id],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    r#"
                    INSERT INTO documents (external_id, title, content, content_hash, created_at, timestamp, last_accessed)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)
                    "#,
                    params![external_id, title, content, new_hash, now],
                )?;
                UpsertOutcome::Inserted
            }
            Some(stored_hash) if stored_hash == new_hash => {
                tx.execute(
                    "UPDATE documents SET last_accessed = ?1 WHERE external_id = ?2",
                    params![now, external_id],
                )?;
                UpsertOutcome::Unchanged
            }
            Some(_) => {
                tx.execute(
                    r#"
                    UPDATE documents
                    SET title = ?1, content = ?2, content_hash = ?3, timestamp = ?4, last_accessed = ?4
                    WHERE external_id = ?5
                    "#,
                    params![title, content, new_hash, now, external_id],
                )?;
                UpsertOutcome::Updated
            }
        };
        tx.commit()?;

        match outcome {
            UpsertOutcome::Unchanged => debug!("Document {} unchanged, access time refreshed", external_id),
            _ => info!("Document {} ('{}') {}", external_id, title, outcome),
        }
        Ok(outcome)
    }

    /// Get a document by external id, refreshing its access time on a hit
    pub fn get_document(&self, external_id: &str) -> Result<Option<Document>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let found = tx
            .query_row(
                r#"
                SELECT external_id, title, content, content_hash, created_at, timestamp, last_accessed
                FROM documents WHERE external_id = ?1
                "#,
                [external_id],
                Self::row_to_document,
            )
            .optional()?;

        let Some(mut document) = found else {
            return Ok(None);
        };

        let now = self.clock.now();
        tx.execute(
            "UPDATE documents SET last_accessed = ?1 WHERE external_id = ?2",
            params![format_timestamp(&now), external_id],
        )?;
        tx.commit()?;

        document.last_accessed_at = now;
        Ok(Some(document))
    }

    /// Substring search over title and content, most recently accessed first.
    ///
    /// The query is matched literally: `%` and `_` carry no wildcard meaning.
    /// Matching follows SQLite `LIKE`, so it ignores ASCII case.
    pub fn search_documents(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(query));
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT external_id, title, content
            FROM documents
            WHERE title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\'
            ORDER BY last_accessed DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let hits = stmt
            .query_map(params![pattern, limit], |row| {
                Ok(SearchHit {
                    external_id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }

    /// Metadata of every cached document, most recently accessed first
    pub fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT external_id, title, created_at, timestamp, last_accessed
            FROM documents
            ORDER BY last_accessed DESC, id DESC
            "#,
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(DocumentSummary {
                    external_id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: timestamp_column(row, 2)?,
                    updated_at: timestamp_column(row, 3)?,
                    last_accessed_at: timestamp_column(row, 4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Remove one document. Returns whether it existed.
    pub fn delete_document(&self, external_id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM documents WHERE external_id = ?1", [external_id])?;
        if removed > 0 {
            info!("Deleted document {}", external_id);
        }
        Ok(removed > 0)
    }

    /// Remove every cached document
    pub fn clear_documents(&self) -> Result<()> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM documents", [])?;
        info!("Cleared {} documents", removed);
        Ok(())
    }

    /// Count cached documents
    pub fn count_documents(&self) -> Result<usize> {
        self.count("documents")
    }

    /// Helper to convert a row to a Document
    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
        Ok(Document {
            external_id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            content_hash: row.get(3)?,
            created_at: timestamp_column(row, 4)?,
            updated_at: timestamp_column(row, 5)?,
            last_accessed_at: timestamp_column(row, 6)?,
        })
    }
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Escape `LIKE` wildcards so the query matches as a plain substring
pub(super) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("memory.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_unchanged_updated() {
        let (_dir, store) = temp_store();

        assert_eq!(store.upsert_document("P1", "Doc", "abc").unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert_document("P1", "Doc", "abc").unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(store.upsert_document("P1", "Doc", "xyz").unwrap(), UpsertOutcome::Updated);

        let doc = store.get_document("P1").unwrap().unwrap();
        assert_eq!(doc.content, "xyz");
        assert_eq!(doc.content_hash, content_hash("xyz"));
        assert_eq!(store.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_unchanged_only_touches_access_time() {
        let (_dir, store) = temp_store();
        store.upsert_document("P1", "Doc", "abc").unwrap();
        let before = store.list_documents().unwrap().remove(0);

        // A different title with the same body still counts as unchanged
        store.upsert_document("P1", "Renamed", "abc").unwrap();
        let after = store.list_documents().unwrap().remove(0);

        assert_eq!(after.title, "Doc");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.updated_at, before.updated_at);
        assert!(after.last_accessed_at > before.last_accessed_at);

        let doc = store.get_document("P1").unwrap().unwrap();
        assert_eq!(doc.content, "abc");
        assert_eq!(doc.content_hash, content_hash("abc"));
        assert_eq!(doc.title, "Doc");
    }

    #[test]
    fn test_update_preserves_creation_time() {
        let (_dir, store) = temp_store();
        store.upsert_document("P1", "Doc", "abc").unwrap();
        let before = store.list_documents().unwrap().remove(0);

        store.upsert_document("P1", "Doc v2", "xyz").unwrap();
        let after = store.list_documents().unwrap().remove(0);

        assert_eq!(after.title, "Doc v2");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.updated_at, after.last_accessed_at);
    }

    #[test]
    fn test_get_document_touches_on_hit_only() {
        let (_dir, store) = temp_store();
        store.upsert_document("P1", "Doc", "abc").unwrap();
        let before = store.list_documents().unwrap().remove(0);

        let doc = store.get_document("P1").unwrap().unwrap();
        assert!(doc.is_consistent());
        assert!(doc.last_accessed_at > before.last_accessed_at);

        let listed = store.list_documents().unwrap().remove(0);
        assert_eq!(listed.last_accessed_at, doc.last_accessed_at);

        assert!(store.get_document("missing").unwrap().is_none());
        assert_eq!(store.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_search_matches_title_or_content_by_recency() {
        let (_dir, store) = temp_store();
        store.upsert_document("A", "Incident Management", "how to page on-call").unwrap();
        store.upsert_document("B", "API 101", "understanding incident flows").unwrap();
        store.upsert_document("C", "Unrelated", "nothing here").unwrap();

        let hits = store.search_documents("incident", 5).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.external_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);

        // Touching A moves it to the front
        store.get_document("A").unwrap();
        let hits = store.search_documents("incident", 5).unwrap();
        assert_eq!(hits[0].external_id, "A");
    }

    #[test]
    fn test_search_limit() {
        let (_dir, store) = temp_store();
        for i in 0..10 {
            store.upsert_document(&format!("P{}", i), "Guide", &format!("body {}", i)).unwrap();
        }

        assert_eq!(store.search_documents("Guide", 3).unwrap().len(), 3);
        assert_eq!(store.search_documents("Guide", DEFAULT_SEARCH_LIMIT).unwrap().len(), 5);
        assert!(store.search_documents("Guide", 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (_dir, store) = temp_store();
        store.upsert_document("P1", "Discount", "save 50% today").unwrap();
        store.upsert_document("P2", "Other", "save 500 today").unwrap();
        store.upsert_document("P3", "snake", "my_var").unwrap();
        store.upsert_document("P4", "snake", "myXvar").unwrap();

        let hits = store.search_documents("50%", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, "P1");

        let hits = store.search_documents("my_var", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, "P3");
    }

    #[test]
    fn test_list_documents_by_recency() {
        let (_dir, store) = temp_store();
        store.upsert_document("A", "First", "a").unwrap();
        store.upsert_document("B", "Second", "b").unwrap();
        store.upsert_document("A", "First", "a").unwrap();

        let ids: Vec<_> = store.list_documents().unwrap().into_iter().map(|d| d.external_id).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_delete_and_clear_documents() {
        let (_dir, store) = temp_store();
        store.upsert_document("A", "First", "a").unwrap();
        store.upsert_document("B", "Second", "b").unwrap();

        assert!(store.delete_document("A").unwrap());
        assert!(!store.delete_document("A").unwrap());
        assert_eq!(store.count_documents().unwrap(), 1);

        store.clear_documents().unwrap();
        assert_eq!(store.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_\\"), "50\\%\\_\\\\");
    }
}
