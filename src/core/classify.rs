//! Change classifier: sync bucket vs. proposal bucket.
//!
//! The two buckets hold different types. A [`Proposal`] cannot be placed in
//! the sync bucket, so advisory changes never reach the index.

use std::fmt;

use serde::Serialize;

use super::diff::{ChangeSet, Presence};
use super::merge::SkillCounts;
use super::proposals::Proposal;
use super::skill::SkillSource;

/// A change that is applied to the index without approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncChange {
    SkillAdded { sections: usize },
    SkillRemoved,
    SourceChanged { from: SkillSource, to: SkillSource },
    SectionsAdded { titles: Vec<String> },
    SectionsRemoved { titles: Vec<String> },
    SectionsModified { titles: Vec<String> },
}

impl fmt::Display for SyncChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkillAdded { sections } => write!(f, "new skill added ({sections} sections)"),
            Self::SkillRemoved => write!(f, "skill removed"),
            Self::SourceChanged { from, to } => write!(f, "source: {from} -> {to}"),
            Self::SectionsAdded { titles } => write!(f, "{} added ({})", titles.len(), titles.join(", ")),
            Self::SectionsRemoved { titles } => {
                write!(f, "{} removed ({})", titles.len(), titles.join(", "))
            }
            Self::SectionsModified { titles } => {
                write!(f, "{} modified ({})", titles.len(), titles.join(", "))
            }
        }
    }
}

/// Both buckets for one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillClassification {
    pub name: String,
    pub source: SkillSource,
    pub presence: Presence,
    pub section_count: usize,
    pub sync: Vec<SyncChange>,
    pub proposals: Vec<Proposal>,
}

impl SkillClassification {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.sync.is_empty() && self.proposals.is_empty()
    }
}

/// Run-level attribution counts before and after this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountsChange {
    pub before: SkillCounts,
    pub after: SkillCounts,
}

impl CountsChange {
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub skills: Vec<SkillClassification>,
    pub counts: CountsChange,
}

impl Classification {
    /// Whether anything must be written to the index.
    #[must_use]
    pub fn has_sync(&self) -> bool {
        self.counts.is_changed() || self.skills.iter().any(|s| !s.sync.is_empty())
    }

    #[must_use]
    pub fn proposal_count(&self) -> usize {
        self.skills.iter().map(|s| s.proposals.len()).sum()
    }

    /// Skills with at least one sync change.
    #[must_use]
    pub fn updated_skills(&self) -> usize {
        self.skills.iter().filter(|s| !s.sync.is_empty()).count()
    }

    /// Nothing to sync and nothing to propose.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.has_sync() && self.proposal_count() == 0
    }
}

/// Sort every change set into its buckets.
#[must_use]
pub fn classify(changes: Vec<ChangeSet>, before: SkillCounts, after: SkillCounts) -> Classification {
    let skills = changes.into_iter().map(classify_one).collect();
    let classification = Classification {
        skills,
        counts: CountsChange { before, after },
    };
    tracing::debug!(
        updated = classification.updated_skills(),
        proposals = classification.proposal_count(),
        counts_changed = classification.counts.is_changed(),
        "classified changes"
    );
    classification
}

fn classify_one(change: ChangeSet) -> SkillClassification {
    let mut sync = Vec::new();
    match change.presence {
        Presence::Added => sync.push(SyncChange::SkillAdded {
            sections: change.section_count,
        }),
        Presence::Removed => sync.push(SyncChange::SkillRemoved),
        Presence::Held => {}
        Presence::Unchanged => {
            if let Some(from) = change.previous_source {
                sync.push(SyncChange::SourceChanged {
                    from,
                    to: change.source,
                });
            }
            let sections = change.section_changes;
            if !sections.added.is_empty() {
                sync.push(SyncChange::SectionsAdded {
                    titles: sections.added,
                });
            }
            if !sections.removed.is_empty() {
                sync.push(SyncChange::SectionsRemoved {
                    titles: sections.removed,
                });
            }
            if !sections.modified.is_empty() {
                sync.push(SyncChange::SectionsModified {
                    titles: sections.modified,
                });
            }
        }
    }

    let mut proposals: Vec<Proposal> = change.tag_proposals.into_iter().map(Proposal::Tag).collect();
    if let Some(typical_use) = change.typical_use_proposal {
        proposals.push(Proposal::TypicalUse(typical_use));
    }

    SkillClassification {
        name: change.name,
        source: change.source,
        presence: change.presence,
        section_count: change.section_count,
        sync,
        proposals,
    }
}
