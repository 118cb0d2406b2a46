//! Core skill types and sync logic

pub mod classify;
pub mod diagnostic;
pub mod diff;
pub mod merge;
pub mod proposals;
pub mod skill;

pub use classify::{
    Classification, CountsChange, SkillClassification, SyncChange, classify,
};
pub use diagnostic::{Diagnostic, Severity};
pub use diff::{ChangeSet, Presence, SectionChanges, diff_sections};
pub use merge::{MergedSet, SkillCounts, resolve};
pub use proposals::{
    KeywordTagRule, Proposal, ProposalRule, ProposalRules, RetiredTagRule, TagAction,
    TagProposal, TypicalUseProposal, TypicalUseRule,
};
pub use skill::{SkillDocument, SkillSection, SkillSource};
