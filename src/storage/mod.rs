//! Storage Layer - SQLite-backed persistence
//!
//! System of record is one SQLite file in WAL mode with tables:
//! - messages(id, timestamp, role, message)
//! - facts(key, value)
//! - documents(external_id, title, content, content_hash, created_at, timestamp, last_accessed)
//! - notes(id, topic, content)
//!
//! Alongside the primary file SQLite keeps `-wal` and `-shm` side files,
//! which backups carry along.

pub mod backup;
pub mod clock;
pub mod documents;
pub mod notes;
pub mod schema;
pub mod sqlite;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use backup::BackupManager;
pub use documents::DEFAULT_SEARCH_LIMIT;
pub use sqlite::{SqliteStore, StoreStats};

/// Suffixes of the journal side files SQLite keeps next to a WAL-mode database
pub const SIDE_FILE_SUFFIXES: &[&str] = &["-wal", "-shm"];

/// `path` with `suffix` appended to the file name (`memory.db` -> `memory.db-wal`)
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// The side file paths belonging to a primary database path
pub fn side_files(path: &Path) -> Vec<PathBuf> {
    SIDE_FILE_SUFFIXES.iter().map(|s| with_suffix(path, s)).collect()
}
