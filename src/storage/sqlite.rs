//! SQLite storage implementation
//!
//! The handle holds no open connection. Every operation opens its own,
//! does its work inside at most one transaction, commits and closes, so
//! several handles (or processes) can point at the same file and rely on
//! SQLite's WAL locking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info};

use super::clock::{Clock, format_timestamp, parse_timestamp};
use super::schema;
use crate::fact::Fact;
use crate::message::Message;
use crate::Result;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store for messages, facts and cached documents
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    pub(super) clock: Clock,
}

impl SqliteStore {
    /// Open a database file (creates it and its parent directory if needed)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path,
            clock: Clock::new(),
        };
        store.initialize_schema()?;
        info!("Store opened at {}", store.path.display());
        Ok(store)
    }

    /// Path of the primary store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a short-lived connection with the durability pragmas applied
    pub(super) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    /// Initialize the database schema and switch the file to WAL journaling
    fn initialize_schema(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode: {}", mode);

        let tx = conn.transaction()?;
        for stmt in schema::all_schema_statements() {
            tx.execute(stmt, [])?;
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Message Operations ==========

    /// Append a message to the log, stamped with the current time
    pub fn append_message(&self, role: &str, text: &str) -> Result<()> {
        let conn = self.connect()?;
        let timestamp = self.clock.now();
        conn.execute(
            "INSERT INTO messages (timestamp, role, message) VALUES (?1, ?2, ?3)",
            params![format_timestamp(&timestamp), role, text],
        )?;
        debug!("Appended {} message ({} bytes)", role, text.len());
        Ok(())
    }

    /// The `limit` most recent messages, oldest first.
    ///
    /// A zero limit returns nothing; a limit above the row count returns everything.
    pub fn get_recent_history(&self, limit: usize) -> Result<Vec<Message>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, role, message FROM messages ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut messages = stmt
            .query_map([limit], Self::row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Count all messages
    pub fn count_messages(&self) -> Result<usize> {
        self.count("messages")
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
        let timestamp_str: String = row.get(1)?;
        let timestamp = parse_timestamp(&timestamp_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Message {
            id: row.get(0)?,
            timestamp,
            role: row.get(2)?,
            text: row.get(3)?,
        })
    }

    // ========== Fact Operations ==========

    /// Insert or replace a fact
    pub fn set_fact(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO facts (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        debug!("Set fact {}", key);
        Ok(())
    }

    /// Get a fact's value; `None` when the key was never set
    pub fn get_fact(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        conn.query_row("SELECT value FROM facts WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    /// All facts as a key -> value map
    pub fn get_all_facts(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT key, value FROM facts")?;
        let facts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(facts)
    }

    /// All facts ordered by key
    pub fn list_facts(&self) -> Result<Vec<Fact>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT key, value FROM facts ORDER BY key")?;
        let facts = stmt
            .query_map([], |row| {
                Ok(Fact {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }

    /// Count all facts
    pub fn count_facts(&self) -> Result<usize> {
        self.count("facts")
    }

    // ========== Bulk Operations ==========

    /// Delete every message and every fact. Documents are left alone.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let messages = tx.execute("DELETE FROM messages", [])?;
        let facts = tx.execute("DELETE FROM facts", [])?;
        tx.commit()?;
        info!("Cleared {} messages and {} facts", messages, facts);
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            messages: self.count("messages")?,
            facts: self.count("facts")?,
            documents: self.count("documents")?,
            notes: self.count("notes")?,
            size_bytes: self.size_on_disk()?,
        })
    }

    /// Bytes used by the primary file plus any journal side files
    pub fn size_on_disk(&self) -> Result<u64> {
        let mut total = std::fs::metadata(&self.path)?.len();
        for side in super::side_files(&self.path) {
            if let Ok(meta) = std::fs::metadata(&side) {
                total += meta.len();
            }
        }
        Ok(total)
    }

    pub(super) fn count(&self, table: &str) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoreStats {
    pub messages: usize,
    pub facts: usize,
    pub documents: usize,
    pub notes: usize,
    pub size_bytes: u64,
}

impl StoreStats {
    /// On-disk size in mebibytes, rounded to two decimals
    pub fn size_mib(&self) -> f64 {
        let mib = self.size_bytes as f64 / (1024.0 * 1024.0);
        (mib * 100.0).round() / 100.0
    }
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Messages: {}", self.messages)?;
        writeln!(f, "  Facts: {}", self.facts)?;
        writeln!(f, "  Documents: {}", self.documents)?;
        writeln!(f, "  Notes: {}", self.notes)?;
        write!(f, "  Size: {:.2} MiB", self.size_mib())
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
    fn test_history_in_append_order() {
        let (_dir, store) = temp_store();
        store.append_message("user", "hello").unwrap();
        store.append_message("agent", "hi there").unwrap();

        let history = store.get_recent_history(10).unwrap();
        let pairs: Vec<_> = history.iter().map(|m| (m.role.as_str(), m.text.as_str())).collect();
        assert_eq!(pairs, vec![("user", "hello"), ("agent", "hi there")]);
    }

    #[test]
    fn test_history_limit_takes_latest() {
        let (_dir, store) = temp_store();
        for i in 0..20 {
            store.append_message("user", &format!("msg {}", i)).unwrap();
        }

        let history = store.get_recent_history(5).unwrap();
        let texts: Vec<_> = history.iter().map(|m| m.text.clone()).collect();
        assert_eq!(texts, vec!["msg 15", "msg 16", "msg 17", "msg 18", "msg 19"]);

        // ids and timestamps follow write order
        for pair in history.windows(2) {
            assert!(pair[0].id < pair[1].id);
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_history_limit_edges() {
        let (_dir, store) = temp_store();
        store.append_message("user", "only").unwrap();

        assert!(store.get_recent_history(0).unwrap().is_empty());
        assert_eq!(store.get_recent_history(1000).unwrap().len(), 1);
        assert_eq!(store.get_recent_history(usize::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_fact_upsert() {
        let (_dir, store) = temp_store();
        store.set_fact("name", "Ada").unwrap();
        store.set_fact("name", "Grace").unwrap();

        assert_eq!(store.get_fact("name").unwrap().as_deref(), Some("Grace"));
        let all = store.get_all_facts().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["name"], "Grace");
    }

    #[test]
    fn test_missing_fact_is_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get_fact("unknown").unwrap(), None);
    }

    #[test]
    fn test_list_facts_sorted() {
        let (_dir, store) = temp_store();
        store.set_fact("b", "2").unwrap();
        store.set_fact("a", "1").unwrap();

        let facts = store.list_facts().unwrap();
        assert_eq!(facts, vec![Fact::new("a", "1"), Fact::new("b", "2")]);
    }

    #[test]
    fn test_clear_keeps_documents() {
        let (_dir, store) = temp_store();
        store.append_message("user", "hello").unwrap();
        store.set_fact("k", "v").unwrap();
        store.upsert_document("P1", "Doc", "abc").unwrap();

        store.clear().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.messages, 0);
        assert_eq!(stats.facts, 0);
        assert_eq!(stats.documents, 1);
    }

    #[test]
    fn test_stats_counts_and_size() {
        let (_dir, store) = temp_store();
        store.append_message("user", "hello").unwrap();
        store.append_message("agent", "hi").unwrap();
        store.set_fact("k", "v").unwrap();
        store.save_note("topic", "body").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.facts, 1);
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.notes, 1);
        assert!(stats.size_bytes > 0);
        assert!(stats.to_string().contains("Messages: 2"));
    }

    #[test]
    fn test_size_mib_rounding() {
        let stats = StoreStats {
            messages: 0,
            facts: 0,
            documents: 0,
            notes: 0,
            size_bytes: 1024 * 1024 + 1024 * 1024 / 3,
        };
        assert_eq!(stats.size_mib(), 1.33);
    }

    #[test]
    fn test_two_handles_share_file() {
        let (dir, store) = temp_store();
        let other = SqliteStore::open(dir.path().join("memory.db")).unwrap();
        store.append_message("user", "from first").unwrap();
        other.append_message("agent", "from second").unwrap();

        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("memory.db");
        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }
}
