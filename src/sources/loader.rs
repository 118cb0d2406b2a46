//! Skill entry enumeration.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Document file inside a skill directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// How a skill is laid out under its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLayout {
    /// `<root>/<name>/SKILL.md`
    Directory,
    /// `<root>/<name>.md`
    File,
}

/// One candidate skill under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillEntry {
    /// Directory name or file stem.
    pub name: String,
    /// Path of the document to parse. May not exist.
    pub document: PathBuf,
    pub layout: EntryLayout,
}

/// List the immediate skill entries of `root` in file-name order.
///
/// Returns the reason as `Err` when the root itself cannot be read.
pub fn enumerate(root: &Path) -> Result<Vec<SkillEntry>, String> {
    if !root.exists() {
        return Err("directory does not exist".to_string());
    }
    if !root.is_dir() {
        return Err("not a directory".to_string());
    }
    std::fs::read_dir(root).map_err(|err| err.to_string())?;

    let mut entries = Vec::new();
    for item in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                // Keep the entry so the parse step reports it.
                if let Some(path) = err.path() {
                    if let Some(entry) = entry_for(path, path.is_dir()) {
                        tracing::debug!(path = %path.display(), %err, "unreadable skill entry");
                        entries.push(entry);
                        continue;
                    }
                }
                tracing::warn!(root = %root.display(), %err, "skipping unreadable entry");
                continue;
            }
        };

        if let Some(entry) = entry_for(item.path(), item.file_type().is_dir()) {
            entries.push(entry);
        }
    }

    tracing::debug!(root = %root.display(), count = entries.len(), "enumerated skill entries");
    Ok(entries)
}

fn entry_for(path: &Path, is_dir: bool) -> Option<SkillEntry> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.starts_with('.') {
        return None;
    }

    if is_dir {
        return Some(SkillEntry {
            name: file_name.to_string(),
            document: path.join(SKILL_FILE),
            layout: EntryLayout::Directory,
        });
    }

    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if !is_markdown || file_name.eq_ignore_ascii_case("README.md") {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    Some(SkillEntry {
        name: stem.to_string(),
        document: path.to_path_buf(),
        layout: EntryLayout::File,
    })
}
