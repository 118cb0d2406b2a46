//! skill-sync - Skill metadata synchronization
//!
//! Merge plugin and local skills, diff against the last index, and report.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use skill_sync::app::AppContext;
use skill_sync::cli::Cli;
use skill_sync::cli::output::{emit_json, robot_error};
use skill_sync::report::render_diagnostics_only;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let (machine, result) = match AppContext::from_cli(&cli) {
        Ok(ctx) => (ctx.robot_mode(), skill_sync::cli::commands::run(&ctx, &cli.command)),
        // Config never loaded; only the command line can ask for JSON.
        Err(e) => (cli.output_format().is_some_and(|f| f.is_machine()), Err(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if machine {
                // Robot mode: JSON error output to stdout
                let mut response = robot_error(e.code(), e.to_string());
                response.warnings = e.diagnostics().iter().map(ToString::to_string).collect();
                let _ = emit_json(&response);
            } else {
                eprint!("{}", render_diagnostics_only(e.diagnostics()));
                eprintln!("{} {e}", "Error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,skill_sync=info",
        1 => "info,skill_sync=debug",
        2 => "debug,skill_sync=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
