//! skill-sync show - inspect the persisted index

use clap::Args;
use itertools::Itertools;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::core::SkillDocument;
use crate::error::{Result, SyncError};
use crate::index::{IndexStore, SkillIndex};

/// Characters of a section hash shown in human output.
const SHORT_HASH: usize = 12;

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Show one skill instead of the whole index
    #[arg(long, value_name = "NAME")]
    pub skill: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let store = IndexStore::new(ctx.config.index_path(&ctx.project_root));
    debug!(target: "show", path = %store.path().display(), "loading index");

    let Some(index) = store.load()? else {
        if ctx.robot_mode() {
            let mut response = robot_ok(serde_json::Value::Null);
            response
                .warnings
                .push(format!("no index at {}", store.path().display()));
            return emit_json(&response);
        }
        println!(
            "No index at {}. Run `skill-sync sync` first.",
            store.path().display()
        );
        return Ok(());
    };

    match &args.skill {
        Some(name) => {
            let skill = index
                .get(name)
                .ok_or_else(|| SyncError::InvalidSkill(format!("skill not found in index: {name}")))?;
            if ctx.robot_mode() {
                emit_json(&robot_ok(skill))
            } else {
                emit_human(skill_layout(skill));
                Ok(())
            }
        }
        None => {
            if ctx.robot_mode() {
                emit_json(&robot_ok(&index))
            } else {
                emit_human(index_layout(&index, store.path()));
                Ok(())
            }
        }
    }
}

fn index_layout(index: &SkillIndex, path: &std::path::Path) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Skill Index")
        .kv("Path", &path.display().to_string())
        .kv("Version", &index.version.to_string())
        .kv("Generated", &index.generated_at.to_rfc3339())
        .kv("Plugin", &index.counts.plugin_count.to_string())
        .kv("Local only", &index.counts.local_only_count.to_string())
        .kv("Overrides", &index.counts.override_count.to_string())
        .kv("Total", &index.counts.total.to_string())
        .blank()
        .section("Skills");
    for skill in index.skills.values() {
        layout.bullet(&format!(
            "{} ({}, {} sections)",
            skill.name,
            skill.source,
            skill.sections.len()
        ));
    }
    layout
}

fn skill_layout(skill: &SkillDocument) -> HumanLayout {
    let tags = if skill.tags.is_empty() {
        "-".to_string()
    } else {
        skill.tags.iter().join(", ")
    };
    let typical_use = if skill.typical_use.is_empty() {
        "-"
    } else {
        skill.typical_use.as_str()
    };

    let mut layout = HumanLayout::new();
    layout
        .title(&skill.name)
        .kv("Source", skill.source.as_str())
        .kv("Tags", &tags)
        .kv("Typical use", typical_use)
        .kv("References", &skill.references.len().to_string())
        .blank()
        .section("Sections");
    for section in &skill.sections {
        let short = section.body_hash.get(..SHORT_HASH).unwrap_or(&section.body_hash);
        layout.bullet(&format!("{} [{short}]", section.title));
    }
    layout
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::{MergedSet, SkillSource};

    #[test]
    fn index_layout_lists_skills() {
        let merged = MergedSet::from_documents([
            SkillDocument::new("alpha", SkillSource::Plugin).with_section("Intro", "abc"),
        ]);
        let index = SkillIndex::from_merged(&merged, &SkillIndex::empty(), chrono::Utc::now());
        let text = index_layout(&index, Path::new("/idx.json")).build();
        assert!(text.contains("alpha (plugin, 1 sections)"));
        assert!(text.contains("/idx.json"));
    }

    #[test]
    fn skill_layout_shortens_hashes() {
        let skill = SkillDocument::new("alpha", SkillSource::Local)
            .with_section("Intro", "0123456789abcdef0123")
            .with_section("Short", "abc");
        let text = skill_layout(&skill).build();
        assert!(text.contains("- Intro [0123456789ab]"));
        assert!(text.contains("- Short [abc]"));
    }
}
