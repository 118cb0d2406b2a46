//! skill-sync sync - reconcile sources into the index

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::config::Config;
use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::Result;
use crate::index::IndexStore;
use crate::report::{self, NO_UPDATES};

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Compute and report changes without writing the index
    #[arg(long)]
    pub dry_run: bool,

    /// Plugin skills root (overrides config)
    #[arg(long, value_name = "DIR")]
    pub plugin_root: Option<PathBuf>,

    /// Local skills root (overrides config)
    #[arg(long, value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Index file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,
}

#[derive(Serialize)]
struct SyncData<'a> {
    noop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(flatten)]
    outcome: &'a SyncOutcome,
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let config = with_overrides(&ctx.config, args)?;
    let engine = SyncEngine::from_config(&config, &ctx.project_root)?;
    let store = IndexStore::new(config.index_path(&ctx.project_root));

    let plan = engine.plan(&store);
    let diagnostics = plan.diagnostics.clone();
    let outcome = engine
        .apply(plan, &store, args.dry_run)
        .map_err(|err| err.with_diagnostics(diagnostics))?;

    if ctx.robot_mode() {
        let noop = outcome.is_noop();
        let mut response = robot_ok(SyncData {
            noop,
            message: noop.then_some(NO_UPDATES),
            outcome: &outcome,
        });
        response.warnings = outcome.diagnostics.iter().map(ToString::to_string).collect();
        emit_json(&response)
    } else {
        println!("{}", report::render(&outcome));
        Ok(())
    }
}

/// Apply command-line paths. They are relative to the working directory,
/// not the project root.
fn with_overrides(config: &Config, args: &SyncArgs) -> Result<Config> {
    let mut config = config.clone();
    if let Some(path) = &args.plugin_root {
        config.sources.plugin_root = absolute(path)?;
    }
    if let Some(path) = &args.local_root {
        config.sources.local_root = absolute(path)?;
    }
    if let Some(path) = &args.index {
        config.index.path = absolute(path)?;
    }
    Ok(config)
}

fn absolute(path: &Path) -> Result<String> {
    Ok(std::path::absolute(path)?.display().to_string())
}
