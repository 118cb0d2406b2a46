//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

pub mod commands;
pub mod output;

pub use commands::Commands;
pub use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "skill-sync", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (skips global and project config)
    #[arg(long, global = true, env = "SKILL_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root (default: nearest directory with .skill-sync, else cwd)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true, env = "SKILL_SYNC_ROBOT")]
    pub robot: bool,

    /// Output format (overrides config)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Format requested on the command line, if any.
    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        if self.robot {
            Some(OutputFormat::Json)
        } else {
            self.format
        }
    }
}
