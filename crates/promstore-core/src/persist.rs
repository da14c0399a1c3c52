//! Persistence boundary: the JSON state document and the file holding it.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::MetricMeta;

/// Whole-store document. Keys are `KeyEncoder` strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateDocument {
    #[serde(default)]
    pub counters: BTreeMap<String, StoredEntry>,
    #[serde(default)]
    pub gauges: BTreeMap<String, StoredEntry>,
    #[serde(default)]
    pub histograms: BTreeMap<String, StoredEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredEntry {
    pub meta: MetricMeta,
    pub samples: BTreeMap<String, f64>,
}

/// What `InMemoryStore::open` does with an unreadable or corrupt state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStatePolicy {
    /// Refuse to start.
    #[default]
    Fail,
    /// Log a warning and start with an empty store.
    StartEmpty,
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
    on_corrupt: CorruptStatePolicy,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            on_corrupt: CorruptStatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, on_corrupt: CorruptStatePolicy) -> Self {
        self.on_corrupt = on_corrupt;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn on_corrupt(&self) -> CorruptStatePolicy {
        self.on_corrupt
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<StateDocument>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Persistence(format!(
                    "read {} failed: {e}",
                    self.path.display()
                )))
            }
        };
        let doc = serde_json::from_slice(&raw).map_err(|e| {
            StoreError::Persistence(format!("corrupt state file {}: {e}", self.path.display()))
        })?;
        Ok(Some(doc))
    }

    /// Writes a sibling temp file, then renames it over the target.
    pub fn save(&self, doc: &StateDocument) -> Result<()> {
        let raw = serde_json::to_vec(doc)
            .map_err(|e| StoreError::Persistence(format!("encode state failed: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, raw).map_err(|e| {
            StoreError::Persistence(format!("write {} failed: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Persistence(format!("rename to {} failed: {e}", self.path.display()))
        })
    }
}
