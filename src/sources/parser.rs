//! Skill document parser.
//!
//! A skill file is Markdown with optional YAML frontmatter:
//!
//! ```text
//! ---
//! name: coding-principles
//! tags: [style, review]
//! typical_use: Reviewing pull requests for naming and structure issues
//! references: [naming.md]
//! ---
//! # Coding Principles
//!
//! ## Naming
//! ...
//! ```
//!
//! Level-2 headings delimit sections. Only titles and body hashes survive
//! parsing.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::core::{SkillDocument, SkillSection, SkillSource};
use crate::error::{Result, SyncError};

static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").expect("valid section heading pattern")
});

static TITLE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").expect("valid title heading pattern")
});

#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Option<StringList>,
    #[serde(default, alias = "typical-use", alias = "typicalUse")]
    typical_use: Option<String>,
    #[serde(default)]
    references: Option<StringList>,
}

/// Accepts both `tags: [a, b]` and `tags: "a, b"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Csv(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        let raw = match self {
            Self::List(items) => items,
            Self::Csv(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

pub struct SkillParser;

impl SkillParser {
    /// Parse skill text read from `origin`.
    pub fn parse_str(content: &str, source: SkillSource, origin: &Path) -> Result<SkillDocument> {
        let (frontmatter, body) = split_frontmatter(content).map_err(|msg| {
            SyncError::InvalidSkill(format!("{}: {msg}", origin.display()))
        })?;

        let meta: Frontmatter = if frontmatter.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(frontmatter).map_err(|err| {
                SyncError::InvalidSkill(format!(
                    "{}: invalid frontmatter: {err}",
                    origin.display()
                ))
            })?
        };

        let (title, sections) = split_sections(body);

        let name = meta
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .or(title)
            .ok_or_else(|| {
                SyncError::InvalidSkill(format!(
                    "{}: no skill name (frontmatter `name` or `# Title`)",
                    origin.display()
                ))
            })?;

        if sections.is_empty() {
            return Err(SyncError::InvalidSkill(format!(
                "{}: skill `{name}` has no `## ` sections",
                origin.display()
            )));
        }

        let tags: BTreeSet<String> = meta
            .tags
            .map(StringList::into_vec)
            .unwrap_or_default()
            .into_iter()
            .collect();

        Ok(SkillDocument {
            name,
            source,
            sections,
            tags,
            typical_use: meta.typical_use.map(|t| t.trim().to_string()).unwrap_or_default(),
            references: meta.references.map(StringList::into_vec).unwrap_or_default(),
            path: Some(origin.to_path_buf()),
        })
    }

    pub fn parse_path(path: &Path, source: SkillSource) -> Result<SkillDocument> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            SyncError::InvalidSkill(format!("read skill {}: {err}", path.display()))
        })?;
        Self::parse_str(&content, source, path)
    }
}

/// Hash of a section body, insensitive to trailing whitespace and to blank
/// lines around the body.
#[must_use]
pub fn hash_body(lines: &[&str]) -> String {
    let trimmed: Vec<&str> = lines.iter().map(|l| l.trim_end()).collect();
    let start = trimmed.iter().position(|l| !l.is_empty());
    let end = trimmed.iter().rposition(|l| !l.is_empty());
    let normalized = match (start, end) {
        (Some(start), Some(end)) => trimmed[start..=end].join("\n"),
        _ => String::new(),
    };

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

fn split_frontmatter(content: &str) -> std::result::Result<(&str, &str), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(("", content));
    };
    if first.trim_end() != "---" {
        return Ok(("", content));
    }

    let fm_start = first.len();
    let mut offset = fm_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let frontmatter = &content[fm_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((frontmatter, body));
        }
        offset += line.len();
    }
    Err("unterminated frontmatter (missing closing `---`)".to_string())
}

/// Marker character and run length of a code fence line.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    (run >= 3).then_some((marker, run))
}

fn split_sections(body: &str) -> (Option<String>, Vec<SkillSection>) {
    let mut title = None;
    let mut sections = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    let mut fence: Option<(char, usize)> = None;

    for line in body.lines() {
        if let Some((marker, run)) = fence_marker(line) {
            match fence {
                None => fence = Some((marker, run)),
                Some((open, len))
                    if marker == open && run >= len && line.trim().chars().all(|c| c == open) =>
                {
                    fence = None;
                }
                Some(_) => {}
            }
        }

        if fence.is_none() {
            if let Some(heading) = heading_text(&SECTION_HEADING, line) {
                if let Some((previous, lines)) = current.take() {
                    push_section(&mut sections, &mut seen, previous, &lines);
                }
                current = Some((heading, Vec::new()));
                continue;
            }
            if title.is_none() && current.is_none() {
                if let Some(text) = heading_text(&TITLE_HEADING, line) {
                    title = Some(text);
                    continue;
                }
            }
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((heading, lines)) = current.take() {
        push_section(&mut sections, &mut seen, heading, &lines);
    }

    (title, sections)
}

fn push_section(
    sections: &mut Vec<SkillSection>,
    seen: &mut HashMap<String, usize>,
    heading: String,
    lines: &[&str],
) {
    let count = seen.entry(heading.clone()).or_insert(0);
    *count += 1;
    let title = if *count == 1 {
        heading
    } else {
        format!("{heading} ({count})")
    };
    sections.push(SkillSection::new(title, hash_body(lines)));
}

fn heading_text(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|text| !text.is_empty())
}
