//! Document sources
//!
//! A source fetches a document body by the identifier the remote wiki gave
//! it. The store never talks to a source directly; `ingest` fetches and
//! upserts, and `preload` does that for every configured page.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PageEntry;
use crate::document::UpsertOutcome;
use crate::storage::SqliteStore;
use crate::{Error, Result};

/// Title+body produced by a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub title: String,
    pub content: String,
}

/// Something that can produce a document by external id
pub trait DocumentSource {
    /// Fetch one document. A failure is reported as `Error::Source` or `Error::NotFound`.
    fn fetch(&self, external_id: &str) -> Result<FetchedDocument>;
}

/// Title used when the source has none for a page
pub fn fallback_title(external_id: &str) -> String {
    format!("Page {}", external_id)
}

/// Reads exported pages from a directory: `<dir>/<external_id>.<ext>`
pub struct DirectorySource {
    dir: PathBuf,
    titles: HashMap<String, String>,
}

impl DirectorySource {
    /// Extensions tried in order
    pub const EXTENSIONS: &'static [&'static str] = &["html", "md", "txt"];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            titles: HashMap::new(),
        }
    }

    /// Use the configured page titles instead of the fallback title
    pub fn with_titles(mut self, pages: &[PageEntry]) -> Self {
        for page in pages {
            self.titles.insert(page.external_id.clone(), page.title.clone());
        }
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn locate(&self, external_id: &str) -> Option<PathBuf> {
        Self::EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", external_id, ext)))
            .find(|p| p.is_file())
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, external_id: &str) -> Result<FetchedDocument> {
        if external_id.is_empty() || external_id.contains(['/', '\\']) || external_id.starts_with('.') {
            return Err(Error::Source(format!("invalid page id '{}'", external_id)));
        }

        let path = self.locate(external_id).ok_or_else(|| {
            Error::NotFound(format!("page {} in {}", external_id, self.dir.display()))
        })?;
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Source(format!("reading {}: {}", path.display(), e)))?;
        let title = self
            .titles
            .get(external_id)
            .cloned()
            .unwrap_or_else(|| fallback_title(external_id));

        Ok(FetchedDocument { title, content })
    }
}

/// In-memory source, keyed by external id
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, FetchedDocument>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, external_id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(
            external_id.into(),
            FetchedDocument {
                title: title.into(),
                content: content.into(),
            },
        );
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, external_id: &str) -> Result<FetchedDocument> {
        self.documents
            .get(external_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("page {}", external_id)))
    }
}

/// Fetch a document and cache it. A failed fetch leaves the store untouched.
pub fn ingest(store: &SqliteStore, source: &dyn DocumentSource, external_id: &str) -> Result<UpsertOutcome> {
    let fetched = source.fetch(external_id)?;
    store.upsert_document(external_id, &fetched.title, &fetched.content)
}

/// Result of ingesting one configured page
#[derive(Debug, Clone, Serialize)]
pub struct PreloadEntry {
    pub external_id: String,
    pub title: String,
    pub outcome: Option<UpsertOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreloadReport {
    pub entries: Vec<PreloadEntry>,
}

impl PreloadReport {
    pub fn count(&self, outcome: UpsertOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == Some(outcome)).count()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Ingest every configured page, carrying on past pages that fail to fetch.
///
/// `on_page` is called after each page, for progress reporting. Storage
/// faults still abort the whole run.
pub fn preload(
    store: &SqliteStore,
    source: &dyn DocumentSource,
    pages: &[PageEntry],
    mut on_page: impl FnMut(&PreloadEntry),
) -> Result<PreloadReport> {
    let mut report = PreloadReport::default();
    info!("Preloading {} pages", pages.len());

    for page in pages {
        let entry = match ingest(store, source, &page.external_id) {
            Ok(outcome) => PreloadEntry {
                external_id: page.external_id.clone(),
                title: page.title.clone(),
                outcome: Some(outcome),
                error: None,
            },
            Err(e @ (Error::Storage(_) | Error::InvalidData(_))) => return Err(e),
            Err(e) => {
                warn!("Failed to load page {}: {}", page.external_id, e);
                PreloadEntry {
                    external_id: page.external_id.clone(),
                    title: page.title.clone(),
                    outcome: None,
                    error: Some(e.to_string()),
                }
            }
        };
        on_page(&entry);
        report.entries.push(entry);
    }

    Ok(report)
}
