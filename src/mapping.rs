use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A value stored against a subject in a mapping: a genre list for
/// artists, a state name for cities.
pub trait MappingValue:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Short rendering for progress lines and reports.
    fn summary(&self) -> String;
}

impl MappingValue for Vec<String> {
    fn summary(&self) -> String {
        self.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
    }
}

impl MappingValue for String {
    fn summary(&self) -> String {
        self.clone()
    }
}

/// The durable subject-to-value table. Subjects compare
/// case-insensitively, matching the lowercased cache key; the persisted
/// file keeps each subject's first-seen casing. Existing entries are
/// never overwritten by a merge.
pub struct Mapping<V> {
    path: PathBuf,
    entries: BTreeMap<String, V>,
    // lowercased subject -> stored key
    folded: HashMap<String, String>,
}

impl<V: MappingValue> Mapping<V> {
    /// Loads the mapping from `path`. A missing file is not an error and
    /// yields an empty mapping.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: BTreeMap<String, V> = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("mapping file {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        let folded = entries
            .keys()
            .map(|key| (key.to_lowercase(), key.clone()))
            .collect();
        Ok(Self { path, entries, folded })
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.folded.contains_key(&subject.to_lowercase())
    }

    pub fn get(&self, subject: &str) -> Option<&V> {
        self.entries.get(subject).or_else(|| {
            self.folded
                .get(&subject.to_lowercase())
                .and_then(|key| self.entries.get(key))
        })
    }

    /// Adds a new entry, keeping the subject's casing as given. Returns
    /// false when the subject (under case folding) is already mapped.
    pub fn insert(&mut self, subject: String, value: V) -> bool {
        let folded = subject.to_lowercase();
        if self.folded.contains_key(&folded) {
            return false;
        }
        self.folded.insert(folded, subject.clone());
        self.entries.insert(subject, value);
        true
    }

    /// Rewrites the mapping file wholesale: pretty-printed, keys sorted.
    pub fn save(&self) -> Result<()> {
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
}
