use crate::constants::CACHE_KEY_DELIMITER;
use crate::error::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted store of raw successful provider responses, keyed by
/// `<lowercased subject>|<provider>[|<country>]`. Entries are write-once:
/// an existing key is never replaced, and nothing ever expires. Only
/// successes land here; failures and not-found are re-attempted on the
/// next run.
pub struct ResponseCache {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

/// Read-only diagnostic derived from cache key decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub distinct_subjects: usize,
}

impl ResponseCache {
    /// Loads the cache from `path`. A missing file yields an empty cache;
    /// a file that exists but does not parse is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Stores a successful result and persists the cache to disk
    /// immediately. Returns false without touching disk when the key is
    /// already present.
    pub fn insert(&mut self, key: &str, value: Value) -> Result<bool> {
        if self.entries.contains_key(key) {
            debug!("cache entry for '{}' already present, keeping existing value", key);
            return Ok(false);
        }
        self.entries.insert(key.to_string(), value);
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> CacheStats {
        let subjects: HashSet<&str> = self
            .entries
            .keys()
            .map(|key| key.split(CACHE_KEY_DELIMITER).next().unwrap_or(key))
            .collect();
        CacheStats {
            total_entries: self.entries.len(),
            distinct_subjects: subjects.len(),
        }
    }
}
