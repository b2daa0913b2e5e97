//! Cached documents
//!
//! A document is an externally sourced resource (a wiki page) keyed by the
//! identifier the source system gave it. The stored `content_hash` is always
//! the digest of the stored `content`; a re-fetch is compared by hash to
//! decide between touching, updating and inserting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Digest of a document body, used for change detection.
///
/// BLAKE3, hex encoded.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// A cached document with its full body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier from the source system
    pub external_id: String,
    pub title: String,
    pub content: String,
    /// Digest of `content`
    pub content_hash: String,
    /// First time this id was stored; never changes afterwards
    pub created_at: DateTime<Utc>,
    /// Last time the content changed
    pub updated_at: DateTime<Utc>,
    /// Last read or write touching this document
    pub last_accessed_at: DateTime<Utc>,
}

impl Document {
    /// Check that the stored hash still describes the stored content
    pub fn is_consistent(&self) -> bool {
        self.content_hash == content_hash(&self.content)
    }
}

/// Document metadata without the body, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub external_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub external_id: String,
    pub title: String,
    pub content: String,
}

/// What an upsert did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// First time this id was seen
    Inserted,
    /// Same content as stored; only the access time moved
    Unchanged,
    /// Content differed and was replaced
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::Unchanged => "unchanged",
            UpsertOutcome::Updated => "updated",
        }
    }

    /// Whether downstream consumers need to reprocess the document
    pub fn content_changed(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
