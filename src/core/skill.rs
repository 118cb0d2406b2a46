//! Structural skill model.
//!
//! A [`SkillDocument`] is what survives parsing: section titles with content
//! hashes plus the metadata fields. Raw prose is never kept.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a skill document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    /// Shipped by the installed plugin.
    Plugin,
    /// Project-local skill with no plugin counterpart.
    Local,
    /// Project-local skill that replaced a plugin skill of the same name.
    LocalOverride,
}

impl SkillSource {
    /// Rank used by the merge resolver. Higher wins.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Plugin => 0,
            Self::Local | Self::LocalOverride => 1,
        }
    }

    /// Attribution for a document that won over lower-precedence documents.
    #[must_use]
    pub const fn overriding(self) -> Self {
        match self {
            Self::Plugin => Self::Plugin,
            Self::Local | Self::LocalOverride => Self::LocalOverride,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Local => "local",
            Self::LocalOverride => "local-override",
        }
    }
}

impl fmt::Display for SkillSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `## Heading` section of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSection {
    pub title: String,
    pub body_hash: String,
}

impl SkillSection {
    pub fn new(title: impl Into<String>, body_hash: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body_hash: body_hash.into(),
        }
    }
}

/// A parsed skill definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDocument {
    pub name: String,
    pub source: SkillSource,
    pub sections: Vec<SkillSection>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub typical_use: String,
    #[serde(default)]
    pub references: Vec<String>,
    /// File the document was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SkillDocument {
    pub fn new(name: impl Into<String>, source: SkillSource) -> Self {
        Self {
            name: name.into(),
            source,
            sections: Vec::new(),
            tags: BTreeSet::new(),
            typical_use: String::new(),
            references: Vec::new(),
            path: None,
        }
    }

    #[must_use]
    pub fn with_section(mut self, title: impl Into<String>, body_hash: impl Into<String>) -> Self {
        self.sections.push(SkillSection::new(title, body_hash));
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_typical_use(mut self, text: impl Into<String>) -> Self {
        self.typical_use = text.into();
        self
    }

    #[must_use]
    pub fn section(&self, title: &str) -> Option<&SkillSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn section_titles(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.title.as_str())
    }
}
