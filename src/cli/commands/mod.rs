//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod config;
pub mod show;
pub mod sync;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile plugin and local skills into the index
    Sync(sync::SyncArgs),

    /// Show the persisted index
    Show(show::ShowArgs),

    /// Print the effective configuration
    Config(config::ConfigArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Sync(args) => sync::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
    }
}
