//! Advisory heuristics for tags and typical-use text.
//!
//! Rules only ever produce [`Proposal`]s. Nothing here mutates a skill.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::skill::SkillDocument;
use crate::config::ProposalsConfig;
use crate::error::Result;

/// Words ignored when measuring how specific a typical-use text is.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "for", "to", "of", "in", "on", "with", "when", "this",
    "that", "use", "using", "it", "is", "be", "any", "all", "as", "by", "at",
];

/// How many section titles feed a suggested typical-use text.
const SUGGESTION_TITLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagProposal {
    pub action: TagAction,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypicalUseProposal {
    pub old_text: String,
    pub new_text: String,
}

/// A suggestion that needs operator approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Proposal {
    Tag(TagProposal),
    TypicalUse(TypicalUseProposal),
}

/// A replaceable heuristic.
pub trait ProposalRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn propose(&self, skill: &SkillDocument) -> Vec<Proposal>;
}

/// Suggest `tag` when `keyword` appears in the skill name or a section title.
#[derive(Debug, Clone)]
pub struct KeywordTagRule {
    keyword: String,
    tag: String,
}

impl KeywordTagRule {
    pub fn new(keyword: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_lowercase(),
            tag: tag.into(),
        }
    }

    fn matches(&self, skill: &SkillDocument) -> bool {
        skill.name.to_lowercase().contains(&self.keyword)
            || skill
                .section_titles()
                .any(|title| title.to_lowercase().contains(&self.keyword))
    }
}

impl ProposalRule for KeywordTagRule {
    fn name(&self) -> &'static str {
        "keyword-tag"
    }

    fn propose(&self, skill: &SkillDocument) -> Vec<Proposal> {
        if self.keyword.is_empty() || skill.tags.contains(&self.tag) || !self.matches(skill) {
            return Vec::new();
        }
        vec![Proposal::Tag(TagProposal {
            action: TagAction::Add,
            tag: self.tag.clone(),
        })]
    }
}

/// Suggest removing tags that are no longer in use.
#[derive(Debug, Clone, Default)]
pub struct RetiredTagRule {
    tags: BTreeSet<String>,
}

impl RetiredTagRule {
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProposalRule for RetiredTagRule {
    fn name(&self) -> &'static str {
        "retired-tag"
    }

    fn propose(&self, skill: &SkillDocument) -> Vec<Proposal> {
        skill
            .tags
            .intersection(&self.tags)
            .map(|tag| {
                Proposal::Tag(TagProposal {
                    action: TagAction::Remove,
                    tag: tag.clone(),
                })
            })
            .collect()
    }
}

/// Flag vague typical-use text and suggest one built from the skill's
/// section titles.
#[derive(Debug, Clone)]
pub struct TypicalUseRule {
    min_words: usize,
    generic: Vec<Regex>,
}

impl TypicalUseRule {
    pub fn new(min_words: usize, patterns: &[String]) -> Result<Self> {
        let generic = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { min_words, generic })
    }

    fn is_vague(&self, text: &str) -> bool {
        distinct_words(text) < self.min_words || self.generic.iter().any(|re| re.is_match(text))
    }

    fn suggestion(skill: &SkillDocument) -> String {
        let titles: Vec<String> = skill
            .section_titles()
            .take(SUGGESTION_TITLES)
            .map(str::to_lowercase)
            .collect();
        let subject = skill.name.replace(['-', '_'], " ");
        if titles.is_empty() {
            format!("Use when working on {subject}")
        } else {
            format!("Use when working on {subject}: {}", titles.join(", "))
        }
    }
}

impl ProposalRule for TypicalUseRule {
    fn name(&self) -> &'static str {
        "typical-use"
    }

    fn propose(&self, skill: &SkillDocument) -> Vec<Proposal> {
        if !self.is_vague(&skill.typical_use) {
            return Vec::new();
        }
        let new_text = Self::suggestion(skill);
        if new_text == skill.typical_use {
            return Vec::new();
        }
        vec![Proposal::TypicalUse(TypicalUseProposal {
            old_text: skill.typical_use.clone(),
            new_text,
        })]
    }
}

/// Number of distinct, non-stopword words in `text`.
#[must_use]
pub fn distinct_words(text: &str) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect::<BTreeSet<_>>()
        .len()
}

/// The active rule set.
#[derive(Debug, Default)]
pub struct ProposalRules {
    rules: Vec<Box<dyn ProposalRule>>,
}

impl ProposalRules {
    /// A rule set that never proposes anything.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(rules: Vec<Box<dyn ProposalRule>>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ProposalsConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::none());
        }

        let mut rules: Vec<Box<dyn ProposalRule>> = config
            .tag_rules
            .iter()
            .map(|rule| {
                Box::new(KeywordTagRule::new(&rule.keyword, &rule.tag)) as Box<dyn ProposalRule>
            })
            .collect();
        if !config.retired_tags.is_empty() {
            rules.push(Box::new(RetiredTagRule::new(config.retired_tags.iter().cloned())));
        }
        rules.push(Box::new(TypicalUseRule::new(
            config.min_typical_use_words,
            &config.generic_patterns,
        )?));
        Ok(Self { rules })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against `skill`. Tag proposals are deduplicated and
    /// sorted; only the first typical-use proposal is kept.
    #[must_use]
    pub fn evaluate(&self, skill: &SkillDocument) -> (Vec<TagProposal>, Option<TypicalUseProposal>) {
        let mut tags = BTreeSet::new();
        let mut typical_use = None;
        for rule in &self.rules {
            for proposal in rule.propose(skill) {
                match proposal {
                    Proposal::Tag(tag) => {
                        tags.insert(tag);
                    }
                    Proposal::TypicalUse(text) => {
                        if typical_use.is_none() {
                            typical_use = Some(text);
                        }
                    }
                }
            }
        }
        (tags.into_iter().collect(), typical_use)
    }
}
