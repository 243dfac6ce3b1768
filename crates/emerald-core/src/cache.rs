//! On-disk snapshot of the reference learnset table
//!
//! The file is a single JSON object: species name -> list of `[level, move]`.

use crate::error::{Error, Result};
use crate::learnset::LearnsetTable;
use crate::reference::{load_reference, ReferenceConfig, ReferenceSource};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON cache of the reference table
#[derive(Debug, Clone)]
pub struct ReferenceCache {
    path: PathBuf,
}

impl ReferenceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. Missing or unreadable files are a cache miss.
    pub fn load(&self) -> Option<LearnsetTable> {
        if !self.path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error loading cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Error loading cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the snapshot with `table`
    pub fn store(&self, table: &LearnsetTable) -> Result<()> {
        let content = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, content).map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Get the reference table, from the cache unless `force_download` is set.
///
/// An empty cached table counts as a miss. After a fresh download the cache
/// is rewritten; failing to write it only costs the next run a download.
pub fn reference_learnsets(
    cache: &ReferenceCache,
    source: &dyn ReferenceSource,
    config: &ReferenceConfig,
    force_download: bool,
) -> Result<LearnsetTable> {
    if !force_download {
        if let Some(cached) = cache.load().filter(|t| !t.is_empty()) {
            info!("Using cached data ({} species)", cached.len());
            return Ok(cached);
        }
    }

    info!("Downloading learnset data from veekun/pokedex...");
    let table = load_reference(source, config)?;
    if table.is_empty() {
        return Err(Error::ReferenceUnavailable {
            resource: config.learnsets_url.clone(),
            message: format!("no level-up rows for version group {}", config.version_group),
        });
    }

    match cache.store(&table) {
        Ok(()) => info!("Saved to cache: {}", cache.path().display()),
        Err(e) => warn!("{}", e),
    }

    Ok(table)
}
