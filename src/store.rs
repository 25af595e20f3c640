//! Local key-value file store for persisted experiment state

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key for the serialized experiment list
pub const EXPERIMENTS_KEY: &str = "experiments_v1";

/// A small key-value store backed by one JSON file per key inside a
/// directory. Persistence through this store is best-effort: callers catch
/// and log failures instead of propagating them.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the value stored under `key`. A missing file or blank content
    /// means the key was never written.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store key '{}'", key))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(content))
    }

    /// Write `contents` under `key`, creating the store directory if needed.
    /// The write goes through a temp file and a rename so a crash mid-write
    /// cannot leave a truncated document behind.
    pub fn write(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory {}", self.dir.display()))?;

        let path = self.key_path(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write store key '{}'", key))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to commit store key '{}'", key))?;

        Ok(())
    }
}
