//! Persisted skill index.
//!
//! The index is the only state kept between runs. It is read once as the diff
//! baseline and replaced atomically when a run has something to sync.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::{Diagnostic, MergedSet, SkillCounts, SkillDocument};
use crate::error::{Result, SyncError};
use crate::utils::fs::read_optional;

/// Current on-disk format version.
pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillIndex {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub counts: SkillCounts,
    pub skills: BTreeMap<String, SkillDocument>,
}

impl Default for SkillIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl SkillIndex {
    /// Baseline used when no index exists yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: INDEX_VERSION,
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
            counts: SkillCounts::default(),
            skills: BTreeMap::new(),
        }
    }

    /// Snapshot of `merged`, carrying forward baseline entries for skills
    /// that are held because they failed to parse this run.
    #[must_use]
    pub fn from_merged(merged: &MergedSet, baseline: &Self, generated_at: DateTime<Utc>) -> Self {
        let mut skills: BTreeMap<String, SkillDocument> = merged
            .skills()
            .map(|doc| (doc.name.clone(), doc.clone()))
            .collect();
        for name in merged.held() {
            if let Some(previous) = baseline.skills.get(name) {
                skills.insert(name.clone(), previous.clone());
            }
        }

        Self {
            version: INDEX_VERSION,
            generated_at,
            counts: SkillCounts::tally(skills.values()),
            skills,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillDocument> {
        self.skills.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Reads and atomically replaces the index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the index. `Ok(None)` when no index has been written yet.
    pub fn load(&self) -> Result<Option<SkillIndex>> {
        let Some(raw) = read_optional(&self.path)? else {
            return Ok(None);
        };
        let index: SkillIndex = serde_json::from_str(&raw)?;
        if index.version > INDEX_VERSION {
            return Err(SyncError::UnsupportedIndexVersion {
                path: self.path.clone(),
                found: index.version,
                supported: INDEX_VERSION,
            });
        }
        Ok(Some(index))
    }

    /// Read the index as a diff baseline. An unreadable index degrades to an
    /// empty baseline plus a diagnostic.
    #[must_use]
    pub fn load_baseline(&self) -> (SkillIndex, Option<Diagnostic>) {
        match self.load() {
            Ok(Some(index)) => {
                tracing::debug!(path = %self.path.display(), skills = index.len(), "baseline loaded");
                (index, None)
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no previous index; starting fresh");
                (SkillIndex::empty(), None)
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "baseline unreadable");
                (
                    SkillIndex::empty(),
                    Some(Diagnostic::BaselineUnreadable {
                        path: self.path.clone(),
                        reason: err.to_string(),
                    }),
                )
            }
        }
    }

    /// Replace the index file. Either the whole new index lands or the old
    /// file is left untouched.
    pub fn save(&self, index: &SkillIndex) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        self.write_atomic(json.as_bytes())
            .map_err(|source| SyncError::WriteFailure {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!(path = %self.path.display(), skills = index.len(), "index written");
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(bytes)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}
