//! Diff engine: current merged set vs. the persisted baseline.
//!
//! Pure: takes values in, returns [`ChangeSet`]s. Nothing is read from or
//! written to disk here.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use super::merge::MergedSet;
use super::proposals::{ProposalRules, TagProposal, TypicalUseProposal};
use super::skill::{SkillDocument, SkillSource};
use crate::index::SkillIndex;

/// Whether a skill exists now, before, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// In both the baseline and the current set.
    Unchanged,
    /// New since the baseline.
    Added,
    /// In the baseline only.
    Removed,
    /// In the baseline, failed to parse this run; baseline entry kept.
    Held,
}

/// Section titles that differ from the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl SectionChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Everything observed about one skill in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub name: String,
    pub presence: Presence,
    /// Current attribution, or the baseline's for removed/held skills.
    pub source: SkillSource,
    /// Baseline attribution when it differs from `source`.
    pub previous_source: Option<SkillSource>,
    pub section_count: usize,
    pub section_changes: SectionChanges,
    pub tag_proposals: Vec<TagProposal>,
    pub typical_use_proposal: Option<TypicalUseProposal>,
}

/// Compare sections by title. Order is ignored.
#[must_use]
pub fn diff_sections(current: &SkillDocument, baseline: Option<&SkillDocument>) -> SectionChanges {
    let Some(baseline) = baseline else {
        return SectionChanges {
            added: current.section_titles().map(str::to_string).collect(),
            ..SectionChanges::default()
        };
    };

    let mut changes = SectionChanges::default();
    for section in &current.sections {
        match baseline.section(&section.title) {
            None => changes.added.push(section.title.clone()),
            Some(previous) if previous.body_hash != section.body_hash => {
                changes.modified.push(section.title.clone());
            }
            Some(_) => {}
        }
    }

    let current_titles: HashSet<&str> = current.section_titles().collect();
    changes.removed = baseline
        .section_titles()
        .filter(|title| !current_titles.contains(title))
        .map(str::to_string)
        .collect();

    changes
}

/// One change set per skill name in the current set or the baseline, sorted
/// by name.
#[must_use]
pub fn compute(current: &MergedSet, baseline: &SkillIndex, rules: &ProposalRules) -> Vec<ChangeSet> {
    let names: BTreeSet<&str> = current
        .names()
        .chain(baseline.skills.keys().map(String::as_str))
        .collect();

    let mut changes = Vec::with_capacity(names.len());
    for name in names {
        let previous = baseline.get(name);
        let change = match (current.get(name), previous) {
            (Some(doc), previous) => {
                let (tag_proposals, typical_use_proposal) = rules.evaluate(doc);
                ChangeSet {
                    name: name.to_string(),
                    presence: if previous.is_some() {
                        Presence::Unchanged
                    } else {
                        Presence::Added
                    },
                    source: doc.source,
                    previous_source: previous.map(|p| p.source).filter(|s| *s != doc.source),
                    section_count: doc.sections.len(),
                    section_changes: diff_sections(doc, previous),
                    tag_proposals,
                    typical_use_proposal,
                }
            }
            (None, Some(previous)) => ChangeSet {
                name: name.to_string(),
                presence: if current.held().contains(name) {
                    Presence::Held
                } else {
                    Presence::Removed
                },
                source: previous.source,
                previous_source: None,
                section_count: previous.sections.len(),
                section_changes: SectionChanges::default(),
                tag_proposals: Vec::new(),
                typical_use_proposal: None,
            },
            (None, None) => continue,
        };

        tracing::trace!(
            skill = name,
            presence = ?change.presence,
            added = change.section_changes.added.len(),
            removed = change.section_changes.removed.len(),
            modified = change.section_changes.modified.len(),
            "diffed skill"
        );
        changes.push(change);
    }
    changes
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::core::proposals::KeywordTagRule;

    fn doc(name: &str, sections: &[(&str, &str)]) -> SkillDocument {
        sections
            .iter()
            .fold(SkillDocument::new(name, SkillSource::Plugin), |d, (t, h)| {
                d.with_section(*t, *h)
            })
    }

    fn index_of(docs: Vec<SkillDocument>) -> SkillIndex {
        SkillIndex::from_merged(&MergedSet::from_documents(docs), &SkillIndex::empty(), Utc::now())
    }

    #[test]
    fn identical_sets_produce_empty_section_changes() {
        let skill = doc("a", &[("One", "1"), ("Two", "2")]);
        let baseline = index_of(vec![skill.clone()]);
        let changes = compute(
            &MergedSet::from_documents([skill]),
            &baseline,
            &ProposalRules::none(),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].presence, Presence::Unchanged);
        assert!(changes[0].section_changes.is_empty());
        assert!(changes[0].previous_source.is_none());
    }

    #[test]
    fn reordering_is_not_a_change() {
        let before = doc("a", &[("One", "1"), ("Two", "2")]);
        let after = doc("a", &[("Two", "2"), ("One", "1")]);
        assert!(diff_sections(&after, Some(&before)).is_empty());
    }

    #[test]
    fn added_removed_and_modified_by_title() {
        let before = doc("a", &[("Keep", "k"), ("Edit", "e1"), ("Drop", "d")]);
        let after = doc("a", &[("Keep", "k"), ("Edit", "e2"), ("New", "n")]);
        let changes = diff_sections(&after, Some(&before));
        assert_eq!(changes.added, vec!["New"]);
        assert_eq!(changes.removed, vec!["Drop"]);
        assert_eq!(changes.modified, vec!["Edit"]);
    }

    #[test]
    fn new_skill_lists_all_sections_as_added() {
        let skill = doc("fresh", &[("A", "1"), ("B", "2")]);
        let changes = compute(
            &MergedSet::from_documents([skill]),
            &SkillIndex::empty(),
            &ProposalRules::none(),
        );
        assert_eq!(changes[0].presence, Presence::Added);
        assert_eq!(changes[0].section_changes.added, vec!["A", "B"]);
        assert!(changes[0].section_changes.removed.is_empty());
    }

    #[test]
    fn missing_skill_is_removed_unless_held() {
        let baseline = index_of(vec![doc("gone", &[("A", "1")]), doc("broken", &[("A", "1")])]);
        let current = MergedSet::default().with_held(["broken".to_string()]);
        let changes = compute(&current, &baseline, &ProposalRules::none());
        let by_name = |n: &str| changes.iter().find(|c| c.name == n).unwrap();
        assert_eq!(by_name("gone").presence, Presence::Removed);
        assert_eq!(by_name("broken").presence, Presence::Held);
        assert!(by_name("broken").section_changes.is_empty());
    }

    #[test]
    fn source_change_is_recorded() {
        let baseline = index_of(vec![doc("x", &[("A", "1")])]);
        let mut now = doc("x", &[("A", "1")]);
        now.source = SkillSource::LocalOverride;
        let changes = compute(
            &MergedSet::from_documents([now]),
            &baseline,
            &ProposalRules::none(),
        );
        assert_eq!(changes[0].previous_source, Some(SkillSource::Plugin));
        assert_eq!(changes[0].source, SkillSource::LocalOverride);
    }

    #[test]
    fn proposals_never_touch_tags() {
        let skill = doc("fp", &[("Functional composition", "1")]);
        let baseline = index_of(vec![skill.clone()]);
        let current = MergedSet::from_documents([skill]);
        let rules = ProposalRules::new(vec![Box::new(KeywordTagRule::new(
            "functional",
            "functional-programming",
        ))]);
        let changes = compute(&current, &baseline, &rules);
        assert_eq!(changes[0].tag_proposals.len(), 1);
        assert!(current.get("fp").unwrap().tags.is_empty());
        assert!(changes[0].section_changes.is_empty());
    }
}
