//! Merge resolver: one document per skill name across all sources.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::skill::{SkillDocument, SkillSource};
use crate::sources::{FailedEntry, SourceListing};

/// Source attribution counts of a merged set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCounts {
    pub plugin_count: usize,
    pub local_only_count: usize,
    pub override_count: usize,
    pub total: usize,
}

impl SkillCounts {
    pub fn tally<'a>(docs: impl IntoIterator<Item = &'a SkillDocument>) -> Self {
        let mut counts = Self::default();
        for doc in docs {
            match doc.source {
                SkillSource::Plugin => counts.plugin_count += 1,
                SkillSource::Local => counts.local_only_count += 1,
                SkillSource::LocalOverride => counts.override_count += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

/// The resolved skill set of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSet {
    skills: BTreeMap<String, SkillDocument>,
    /// Names that failed to parse and have no surviving document.
    held: BTreeSet<String>,
    /// Documents that failed to parse this run.
    failed_paths: BTreeSet<PathBuf>,
}

impl MergedSet {
    /// Build a merged set from already-resolved documents.
    pub fn from_documents(docs: impl IntoIterator<Item = SkillDocument>) -> Self {
        Self {
            skills: docs.into_iter().map(|d| (d.name.clone(), d)).collect(),
            held: BTreeSet::new(),
            failed_paths: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_held(mut self, names: impl IntoIterator<Item = String>) -> Self {
        for name in names {
            if !self.skills.contains_key(&name) {
                self.held.insert(name);
            }
        }
        self
    }

    /// Record failed entries. Entry names are held directly; paths are kept
    /// for [`Self::hold_baseline`].
    #[must_use]
    pub fn with_failed(mut self, failed: impl IntoIterator<Item = FailedEntry>) -> Self {
        let mut names = Vec::new();
        for entry in failed {
            self.failed_paths.insert(entry.path);
            names.push(entry.name);
        }
        self.with_held(names)
    }

    /// Hold baseline skills whose stored document path failed this run.
    ///
    /// Covers skills whose `name` differs from their directory or file stem,
    /// which the entry-name hold cannot match.
    #[must_use]
    pub fn hold_baseline<'a>(mut self, baseline: impl IntoIterator<Item = &'a SkillDocument>) -> Self {
        for previous in baseline {
            let failed = previous
                .path
                .as_ref()
                .is_some_and(|path| self.failed_paths.contains(path));
            if failed && !self.skills.contains_key(&previous.name) {
                tracing::debug!(skill = %previous.name, "holding snapshot by document path");
                self.held.insert(previous.name.clone());
            }
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillDocument> {
        self.skills.get(name)
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillDocument> {
        self.skills.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn held(&self) -> &BTreeSet<String> {
        &self.held
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> SkillCounts {
        SkillCounts::tally(self.skills.values())
    }
}

/// Combine the listings of every source.
///
/// The highest-precedence document replaces the others wholesale. A winner
/// that displaced a lower-precedence document is re-attributed via
/// [`SkillSource::overriding`].
#[must_use]
pub fn resolve(listings: &[SourceListing]) -> MergedSet {
    let mut groups: BTreeMap<&str, Vec<&SkillDocument>> = BTreeMap::new();
    for listing in listings {
        for doc in &listing.documents {
            groups.entry(doc.name.as_str()).or_default().push(doc);
        }
    }

    let mut resolved = Vec::with_capacity(groups.len());
    for (name, candidates) in groups {
        let Some(winner) = candidates
            .iter()
            .copied()
            .reduce(|best, doc| {
                if doc.source.precedence() > best.source.precedence() {
                    doc
                } else {
                    best
                }
            })
        else {
            continue;
        };

        let mut doc = winner.clone();
        let displaced = candidates
            .iter()
            .filter(|c| c.source.precedence() < winner.source.precedence())
            .count();
        if displaced > 0 {
            doc.source = winner.source.overriding();
            tracing::debug!(skill = name, from = %winner.source, to = %doc.source, displaced, "override applied");
        }
        resolved.push(doc);
    }

    let failed = listings
        .iter()
        .flat_map(|listing| listing.failed.iter().cloned());

    let merged = MergedSet::from_documents(resolved).with_failed(failed);
    tracing::debug!(skills = merged.len(), held = merged.held().len(), "merged skill set");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(kind: SkillSource, docs: Vec<SkillDocument>) -> SourceListing {
        SourceListing {
            kind,
            root: PathBuf::from(kind.as_str()),
            available: true,
            entries: docs.len(),
            documents: docs,
            diagnostics: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn failed(name: &str) -> FailedEntry {
        FailedEntry {
            name: name.to_string(),
            path: PathBuf::from(format!("local/{name}/SKILL.md")),
        }
    }

    fn doc(name: &str, source: SkillSource, sections: usize) -> SkillDocument {
        let mut doc = SkillDocument::new(name, source);
        for i in 0..sections {
            doc = doc.with_section(format!("S{i}"), format!("{}-{i}", source.as_str()));
        }
        doc
    }

    #[test]
    fn single_sources_keep_their_attribution() {
        let merged = resolve(&[
            listing(SkillSource::Plugin, vec![doc("p", SkillSource::Plugin, 1)]),
            listing(SkillSource::Local, vec![doc("l", SkillSource::Local, 1)]),
        ]);
        assert_eq!(merged.get("p").unwrap().source, SkillSource::Plugin);
        assert_eq!(merged.get("l").unwrap().source, SkillSource::Local);
        assert_eq!(
            merged.counts(),
            SkillCounts {
                plugin_count: 1,
                local_only_count: 1,
                override_count: 0,
                total: 2
            }
        );
    }

    #[test]
    fn local_replaces_plugin_entirely() {
        let plugin = doc("coding-principles", SkillSource::Plugin, 15).with_tag("plugin-only");
        let local = doc("coding-principles", SkillSource::Local, 16);
        let merged = resolve(&[
            listing(SkillSource::Plugin, vec![plugin]),
            listing(SkillSource::Local, vec![local.clone()]),
        ]);

        let winner = merged.get("coding-principles").unwrap();
        assert_eq!(winner.source, SkillSource::LocalOverride);
        assert_eq!(winner.sections, local.sections);
        assert!(winner.tags.is_empty());
        assert_eq!(merged.counts().override_count, 1);
        assert_eq!(merged.counts().plugin_count, 0);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn listing_order_does_not_change_the_winner() {
        let merged = resolve(&[
            listing(SkillSource::Local, vec![doc("x", SkillSource::Local, 2)]),
            listing(SkillSource::Plugin, vec![doc("x", SkillSource::Plugin, 5)]),
        ]);
        let winner = merged.get("x").unwrap();
        assert_eq!(winner.source, SkillSource::LocalOverride);
        assert_eq!(winner.sections.len(), 2);
    }

    #[test]
    fn failed_names_are_held_only_without_a_survivor() {
        let mut local = listing(SkillSource::Local, vec![]);
        local.failed = vec![failed("broken"), failed("shadowed")];
        let merged = resolve(&[
            listing(SkillSource::Plugin, vec![doc("shadowed", SkillSource::Plugin, 1)]),
            local,
        ]);
        assert!(merged.held().contains("broken"));
        assert!(!merged.held().contains("shadowed"));
        assert_eq!(merged.get("shadowed").unwrap().source, SkillSource::Plugin);
    }

    #[test]
    fn renamed_skill_is_held_by_document_path() {
        let mut local = listing(SkillSource::Local, vec![]);
        local.failed = vec![failed("ts-testing")];
        let mut previous = doc("typescript-testing", SkillSource::Local, 2);
        previous.path = Some(PathBuf::from("local/ts-testing/SKILL.md"));
        let unrelated = doc("other", SkillSource::Local, 1);

        let merged = resolve(&[local]).hold_baseline([&previous, &unrelated]);
        assert!(merged.held().contains("typescript-testing"));
        assert!(!merged.held().contains("other"));
    }

    #[test]
    fn names_are_sorted() {
        let merged = resolve(&[listing(
            SkillSource::Plugin,
            vec![doc("b", SkillSource::Plugin, 1), doc("a", SkillSource::Plugin, 1)],
        )]);
        assert_eq!(merged.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
