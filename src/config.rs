use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::DEFAULT_SEARCH_LIMIT;

/// Messages of recent conversation included in a prompt
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArchivistConfig {
    pub database: Option<String>,
    pub backup_dir: Option<String>,
    pub pages_dir: Option<String>,
    pub history_limit: Option<usize>,
    pub search_limit: Option<usize>,
    /// Pages loaded by `preload`
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

/// A predefined page to fetch into the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageEntry {
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ArchivistConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(Path::new(".")))
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("archivist.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".archivist").join("memory.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ArchivistConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ArchivistConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ArchivistConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
