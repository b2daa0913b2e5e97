//! # Archivist - Persistent memory for a personal assistant agent
//!
//! Archivist keeps everything an assistant needs to remember in a single
//! SQLite file:
//! - An append-only log of conversation messages
//! - A key/value fact table with upsert semantics
//! - A cache of documents fetched from a remote wiki, deduplicated by content hash
//! - Topic notes the agent saves and searches by substring
//! - Point-in-time backups of the whole store, WAL side files included
//!
//! The store handle is passed explicitly to whatever needs persistence;
//! there is no process-wide instance.

pub mod message;
pub mod fact;
pub mod document;
pub mod note;
pub mod storage;
pub mod source;
pub mod knowledge;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use message::Message;
pub use fact::Fact;
pub use document::{Document, DocumentSummary, UpsertOutcome};
pub use note::Note;
pub use storage::{BackupManager, SqliteStore, StoreStats};
pub use source::{DocumentSource, FetchedDocument};

/// Result type alias for Archivist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Archivist operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage engine could not open, read or write the store
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A document source failed to produce a document
    #[error("Source error: {0}")]
    Source(String),
}

impl Error {
    /// True for the `NotFound` condition (missing backup, missing source document)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
