//! skill-sync config - print the effective configuration

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::Config;
use crate::error::{Result, SyncError};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Show resolved source and index paths instead of the raw TOML
    #[arg(long)]
    pub paths: bool,
}

#[derive(Serialize)]
struct ResolvedPaths {
    project_root: String,
    plugin_root: String,
    local_root: String,
    index: String,
}

impl ResolvedPaths {
    fn new(ctx: &AppContext) -> Self {
        let root = &ctx.project_root;
        Self {
            project_root: root.display().to_string(),
            plugin_root: ctx.config.plugin_root(root).display().to_string(),
            local_root: ctx.config.local_root(root).display().to_string(),
            index: ctx.config.index_path(root).display().to_string(),
        }
    }
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    if args.paths {
        let paths = ResolvedPaths::new(ctx);
        if ctx.robot_mode() {
            return emit_json(&robot_ok(&paths));
        }
        let mut layout = HumanLayout::new();
        layout
            .title("Resolved Paths")
            .kv("Project root", &paths.project_root)
            .kv("Plugin root", &paths.plugin_root)
            .kv("Local root", &paths.local_root)
            .kv("Index", &paths.index);
        emit_human(layout);
        return Ok(());
    }

    if ctx.robot_mode() {
        return emit_json(&robot_ok(&ctx.config));
    }
    print!("{}", to_toml(&ctx.config)?);
    Ok(())
}

fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|err| SyncError::Config(format!("serialize config: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes_to_toml() {
        let text = to_toml(&Config::default()).unwrap();
        assert!(text.contains("[sources]"));
        assert!(text.contains("[[proposals.tag_rules]]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.index.path, Config::default().index.path);
    }
}
