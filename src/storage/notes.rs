//! Topic notes: free-form knowledge the agent saves and looks up by substring

use rusqlite::params;
use tracing::info;

use super::documents::escape_like;
use super::sqlite::SqliteStore;
use crate::Result;
use crate::note::Note;

impl SqliteStore {
    /// File `content` under `topic`. Returns the new note's id.
    pub fn save_note(&self, topic: &str, content: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO notes (topic, content) VALUES (?1, ?2)",
            params![topic, content],
        )?;
        let id = conn.last_insert_rowid();
        info!("Saved note {} under topic '{}'", id, topic);
        Ok(id)
    }

    /// Notes whose topic or content contains `query`, oldest first
    pub fn search_notes(&self, query: &str, limit: usize) -> Result<Vec<Note>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(query));
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, topic, content
            FROM notes
            WHERE topic LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\'
            ORDER BY id ASC
            LIMIT ?2
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let notes = stmt
            .query_map(params![pattern, limit], |row| {
                Ok(Note {
                    id: row.get(0)?,
                    topic: row.get(1)?,
                    content: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    pub fn count_notes(&self) -> Result<usize> {
        self.count("notes")
    }
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
    fn test_search_matches_topic_or_content() {
        let (_dir, store) = temp_store();
        store.save_note("deploys", "Friday deploys need a second reviewer").unwrap();
        store.save_note("oncall", "Pager rotation changes on Monday").unwrap();
        store.save_note("coffee", "The machine on floor 3 is broken").unwrap();

        let by_topic = store.search_notes("oncall", 5).unwrap();
        assert_eq!(by_topic.len(), 1);
        assert_eq!(by_topic[0].content, "Pager rotation changes on Monday");

        let by_content = store.search_notes("day", 5).unwrap();
        let topics: Vec<_> = by_content.iter().map(|n| n.topic.as_str()).collect();
        assert_eq!(topics, vec!["deploys", "oncall"]);

        assert!(store.search_notes("nothing like this", 5).unwrap().is_empty());
    }

    #[test]
    fn test_same_topic_keeps_every_entry() {
        let (_dir, store) = temp_store();
        let first = store.save_note("api", "v1 is deprecated").unwrap();
        let second = store.save_note("api", "v2 needs a token").unwrap();

        assert!(first < second);
        assert_eq!(store.count_notes().unwrap(), 2);
        assert_eq!(store.search_notes("api", 5).unwrap().len(), 2);
    }

    #[test]
    fn test_search_limit_and_wildcards() {
        let (_dir, store) = temp_store();
        for i in 0..8 {
            store.save_note("batch", &format!("entry {}", i)).unwrap();
        }
        store.save_note("discount", "100% off").unwrap();

        let limited = store.search_notes("batch", 5).unwrap();
        assert_eq!(limited.len(), 5);
        assert_eq!(limited[0].content, "entry 0");
        assert!(store.search_notes("batch", 0).unwrap().is_empty());

        let literal = store.search_notes("%", 5).unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].topic, "discount");
    }

    #[test]
    fn test_clear_keeps_notes() {
        let (_dir, store) = temp_store();
        store.save_note("keep", "survives clear").unwrap();
        store.append_message("user", "gone after clear").unwrap();

        store.clear().unwrap();
        assert_eq!(store.count_messages().unwrap(), 0);
        assert_eq!(store.count_notes().unwrap(), 1);
    }
}
