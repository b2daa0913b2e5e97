//! Backup and restore of the whole store
//!
//! A backup is a plain copy of the primary file plus whichever `-wal`/`-shm`
//! side files exist at the time. Restore copies them back. Neither pauses
//! writers: serialising administrative operations is the caller's job.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use super::{SIDE_FILE_SUFFIXES, SqliteStore, with_suffix};
use crate::{Error, Result};

/// Directory name used when no backup directory is configured
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Creates and restores snapshots of one store file
#[derive(Debug, Clone)]
pub struct BackupManager {
    db_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(db_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Manager for `store` with backups in `backups/` beside the store file
    pub fn for_store(store: &SqliteStore) -> Self {
        let db_path = store.path().to_path_buf();
        let backup_dir = default_backup_dir(&db_path);
        Self::new(db_path, backup_dir)
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Default backup file name: `backup_<YYYYMMDD>_<HHMMSS>.<ext>`
    pub fn default_name(&self) -> String {
        let ext = self
            .db_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("db");
        format!("backup_{}.{}", Local::now().format("%Y%m%d_%H%M%S"), ext)
    }

    /// Copy the store and its side files into the backup directory.
    ///
    /// `name` is used verbatim when given. Returns the primary backup path.
    /// Refuses a name that resolves to the live store file.
    pub fn backup(&self, name: Option<&str>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.backup_dir)?;

        let name = name.map(str::to_string).unwrap_or_else(|| self.default_name());
        let backup_path = self.backup_dir.join(name);
        ensure_distinct(&self.db_path, &backup_path)?;
        for suffix in SIDE_FILE_SUFFIXES {
            ensure_distinct(&with_suffix(&self.db_path, suffix), &with_suffix(&backup_path, suffix))?;
        }

        std::fs::copy(&self.db_path, &backup_path)?;
        for suffix in SIDE_FILE_SUFFIXES {
            let live = with_suffix(&self.db_path, suffix);
            if live.exists() {
                std::fs::copy(&live, with_suffix(&backup_path, suffix))?;
                debug!("Copied side file {}", live.display());
            }
        }

        info!("Store backed up to {}", backup_path.display());
        Ok(backup_path)
    }

    /// Overwrite the live store with a backup.
    ///
    /// Fails with `NotFound` before touching anything if `path` is missing,
    /// and with `InvalidData` if `path` is the live store itself. The backup
    /// files are first staged next to the store; the live store is only
    /// touched once every copy has succeeded. Live side files are removed
    /// before the primary file is swapped, so a stale WAL is never replayed
    /// onto the restored file.
    pub fn restore(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("backup file {}", path.display())));
        }
        ensure_distinct(path, &self.db_path)?;
        for suffix in SIDE_FILE_SUFFIXES {
            ensure_distinct(&with_suffix(path, suffix), &with_suffix(&self.db_path, suffix))?;
        }

        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let staged = match self.stage(path) {
            Ok(staged) => staged,
            Err(e) => {
                self.discard_staged();
                return Err(e);
            }
        };

        for suffix in SIDE_FILE_SUFFIXES {
            let live = with_suffix(&self.db_path, suffix);
            if live.exists() {
                std::fs::remove_file(&live)?;
                debug!("Removed live side file {}", live.display());
            }
        }

        std::fs::rename(staging_path(&self.db_path), &self.db_path)?;
        for suffix in staged {
            let live = with_suffix(&self.db_path, suffix);
            std::fs::rename(staging_path(&live), &live)?;
        }

        info!("Store restored from {}", path.display());
        Ok(())
    }

    /// Copy the backup and its side files to staging siblings of the store.
    ///
    /// Returns the suffixes of the side files that were staged.
    fn stage(&self, path: &Path) -> Result<Vec<&'static str>> {
        std::fs::copy(path, staging_path(&self.db_path))?;

        let mut staged = Vec::new();
        for suffix in SIDE_FILE_SUFFIXES {
            let saved = with_suffix(path, suffix);
            if saved.exists() {
                std::fs::copy(&saved, staging_path(&with_suffix(&self.db_path, suffix)))?;
                staged.push(*suffix);
            }
        }
        Ok(staged)
    }

    fn discard_staged(&self) {
        let primary = staging_path(&self.db_path);
        let sides = SIDE_FILE_SUFFIXES
            .iter()
            .map(|suffix| staging_path(&with_suffix(&self.db_path, suffix)));
        for staged in std::iter::once(primary).chain(sides) {
            if staged.exists() {
                if let Err(e) = std::fs::remove_file(&staged) {
                    warn!("Failed to remove staged file {}: {}", staged.display(), e);
                }
            }
        }
    }

    /// Primary backup files in the backup directory, newest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in std::fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || is_side_file(&path) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            backups.push((modified, path));
        }

        backups.sort_by(|a, b| b.cmp(a));
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }
}

/// `backups/` next to the store file
pub fn default_backup_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map(|p| p.join(DEFAULT_BACKUP_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR))
}

/// Sibling that holds a file being restored until it is renamed into place
fn staging_path(path: &Path) -> PathBuf {
    with_suffix(path, ".restoring")
}

/// Fail if `src` and `dst` name the same existing file
fn ensure_distinct(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() || !dst.exists() {
        return Ok(());
    }
    if std::fs::canonicalize(src)? == std::fs::canonicalize(dst)? {
        return Err(Error::InvalidData(format!(
            "{} and {} are the same file",
            src.display(),
            dst.display()
        )));
    }
    Ok(())
}

fn is_side_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    SIDE_FILE_SUFFIXES.iter().any(|s| name.ends_with(*s))
}
