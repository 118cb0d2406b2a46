//! Skill sources.
//!
//! Each configured root is wrapped in a [`SkillProvider`]. The merge resolver
//! only sees the resulting [`SourceListing`]s, so adding a source kind does
//! not touch precedence logic.

pub mod loader;
pub mod parser;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{Diagnostic, SkillDocument, SkillSource};

pub use loader::{EntryLayout, SKILL_FILE, SkillEntry, enumerate};
pub use parser::{SkillParser, hash_body};

/// Something that can produce the skill documents of one source.
pub trait SkillProvider {
    fn kind(&self) -> SkillSource;

    fn root(&self) -> &Path;

    /// Read every skill of this source. Never fails as a whole: problems are
    /// returned as diagnostics inside the listing.
    fn list(&self) -> SourceListing;
}

/// Documents and problems produced by one provider in one run.
#[derive(Debug, Clone)]
pub struct SourceListing {
    pub kind: SkillSource,
    pub root: PathBuf,
    pub available: bool,
    /// Entries found under the root, parsed or not.
    pub entries: usize,
    pub documents: Vec<SkillDocument>,
    pub diagnostics: Vec<Diagnostic>,
    /// Entries that failed to parse.
    pub failed: Vec<FailedEntry>,
}

/// An entry whose document could not be turned into a skill this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    /// Directory name or file stem.
    pub name: String,
    /// The document that failed.
    pub path: PathBuf,
}

impl SourceListing {
    fn empty(kind: SkillSource, root: PathBuf) -> Self {
        Self {
            kind,
            root,
            available: false,
            entries: 0,
            documents: Vec::new(),
            diagnostics: Vec::new(),
            failed: Vec::new(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            kind: self.kind,
            root: self.root.clone(),
            available: self.available,
            entries: self.entries,
            skills: self.documents.len(),
        }
    }
}

/// Report header line for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub kind: SkillSource,
    pub root: PathBuf,
    pub available: bool,
    pub entries: usize,
    pub skills: usize,
}

/// Filesystem-backed provider: one skill per directory or Markdown file.
#[derive(Debug, Clone)]
pub struct FsSkillProvider {
    root: PathBuf,
    kind: SkillSource,
}

impl FsSkillProvider {
    pub fn new(root: impl Into<PathBuf>, kind: SkillSource) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }

    pub fn plugin(root: impl Into<PathBuf>) -> Self {
        Self::new(root, SkillSource::Plugin)
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(root, SkillSource::Local)
    }
}

impl SkillProvider for FsSkillProvider {
    fn kind(&self) -> SkillSource {
        self.kind
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn list(&self) -> SourceListing {
        let _span = tracing::debug_span!("list_source", source = %self.kind, root = %self.root.display())
            .entered();
        let mut listing = SourceListing::empty(self.kind, self.root.clone());

        let entries = match loader::enumerate(&self.root) {
            Ok(entries) => entries,
            Err(reason) => {
                tracing::warn!(source = %self.kind, root = %self.root.display(), %reason, "skill source unavailable");
                listing.diagnostics.push(Diagnostic::SourceUnavailable {
                    source: self.kind,
                    root: self.root.clone(),
                    reason,
                });
                return listing;
            }
        };
        listing.available = true;
        listing.entries = entries.len();

        let mut defined_by: HashMap<String, PathBuf> = HashMap::new();
        for entry in entries {
            match SkillParser::parse_path(&entry.document, self.kind) {
                Ok(doc) => {
                    if let Some(first) = defined_by.get(&doc.name) {
                        listing.diagnostics.push(Diagnostic::ParseError {
                            source: self.kind,
                            entry: entry.name.clone(),
                            path: entry.document.clone(),
                            message: format!(
                                "duplicate skill name `{}` (already defined by {})",
                                doc.name,
                                first.display()
                            ),
                        });
                        listing.failed.push(FailedEntry {
                            name: entry.name,
                            path: entry.document,
                        });
                        continue;
                    }
                    tracing::trace!(
                        skill = %doc.name,
                        layout = ?entry.layout,
                        sections = doc.sections.len(),
                        "parsed skill"
                    );
                    defined_by.insert(doc.name.clone(), entry.document.clone());
                    listing.documents.push(doc);
                }
                Err(err) => {
                    tracing::warn!(entry = %entry.name, %err, "skill parse failed");
                    listing.diagnostics.push(Diagnostic::ParseError {
                        source: self.kind,
                        entry: entry.name.clone(),
                        path: entry.document.clone(),
                        message: err.to_string(),
                    });
                    listing.failed.push(FailedEntry {
                        name: entry.name,
                        path: entry.document,
                    });
                }
            }
        }

        tracing::debug!(
            entries = listing.entries,
            skills = listing.documents.len(),
            failures = listing.failed.len(),
            "source listed"
        );
        listing
    }
}
