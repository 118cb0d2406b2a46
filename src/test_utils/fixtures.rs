use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Builder for skill Markdown documents.
#[derive(Debug, Clone)]
pub struct SkillMarkdown {
    name: String,
    tags: Vec<String>,
    typical_use: Option<String>,
    sections: Vec<(String, String)>,
}

impl SkillMarkdown {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            typical_use: None,
            sections: Vec::new(),
        }
    }

    /// A document with `count` numbered sections and a specific typical use.
    pub fn numbered(name: impl Into<String>, count: usize) -> Self {
        let name = name.into();
        let typical_use = format!("Reviewing {name} changes before merging pull requests");
        (1..=count).fold(Self::new(name).typical_use(typical_use), |doc, i| {
            doc.section(format!("Section {i}"), format!("Guidance for section {i}."))
        })
    }

    #[must_use]
    pub fn section(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push((title.into(), body.into()));
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn typical_use(mut self, text: impl Into<String>) -> Self {
        self.typical_use = Some(text.into());
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("---\nname: {}\n", self.name);
        if !self.tags.is_empty() {
            out.push_str(&format!("tags: [{}]\n", self.tags.join(", ")));
        }
        if let Some(text) = &self.typical_use {
            out.push_str(&format!("typical_use: \"{text}\"\n"));
        }
        out.push_str(&format!("---\n\n# {}\n", self.name));
        for (title, body) in &self.sections {
            out.push_str(&format!("\n## {title}\n\n{body}\n"));
        }
        out
    }
}

/// Isolated project directory with plugin and local skill roots.
///
/// Layout matches the default configuration relative to the project root:
/// `plugin/skills`, `.claude/skills` and `.claude/skills-index.json`.
pub struct SkillTree {
    pub temp_dir: TempDir,
}

impl Default for SkillTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillTree {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        println!("[FIXTURE] Created temp directory: {:?}", temp_dir.path());
        Self { temp_dir }
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        self.temp_dir.path()
    }

    #[must_use]
    pub fn plugin_root(&self) -> PathBuf {
        self.project_root().join("plugin/skills")
    }

    #[must_use]
    pub fn local_root(&self) -> PathBuf {
        self.project_root().join(".claude/skills")
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.project_root().join(".claude/skills-index.json")
    }

    /// Create a file relative to the project root.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        write_file(&self.project_root().join(relative_path), content)
    }

    /// Write `<plugin root>/<dir>/SKILL.md`.
    pub fn write_plugin(&self, dir: &str, doc: &SkillMarkdown) -> PathBuf {
        write_file(&self.plugin_root().join(dir).join("SKILL.md"), &doc.render())
    }

    /// Write `<local root>/<dir>/SKILL.md`.
    pub fn write_local(&self, dir: &str, doc: &SkillMarkdown) -> PathBuf {
        write_file(&self.local_root().join(dir).join("SKILL.md"), &doc.render())
    }

    pub fn plugin_skill(&self, name: &str, sections: usize) -> PathBuf {
        self.write_plugin(name, &SkillMarkdown::numbered(name, sections))
    }

    pub fn local_skill(&self, name: &str, sections: usize) -> PathBuf {
        self.write_local(name, &SkillMarkdown::numbered(name, sections))
    }
}

impl Drop for SkillTree {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.temp_dir.path());
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(path, content).expect("Failed to write file");
    println!("[FIXTURE] Created file: {:?} ({} bytes)", path, content.len());
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SkillSource;
    use crate::sources::SkillParser;

    #[test]
    fn rendered_markdown_parses() {
        let doc = SkillMarkdown::numbered("alpha", 3).tag("style");
        let parsed =
            SkillParser::parse_str(&doc.render(), SkillSource::Plugin, Path::new("alpha.md")).unwrap();
        assert_eq!(parsed.name, "alpha");
        assert_eq!(parsed.sections.len(), 3);
        assert!(parsed.tags.contains("style"));
    }
}
