use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::config::{Config, PROJECT_MARKER};
use crate::error::Result;

pub struct AppContext {
    /// Base for relative paths in the configuration.
    pub project_root: PathBuf,
    pub config: Config,
    pub output_format: OutputFormat,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let project_root = match &cli.project {
            Some(path) => path.clone(),
            None => Self::find_project_root()?,
        };
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        let output_format = cli
            .output_format()
            .unwrap_or_else(|| OutputFormat::from_config(&config.output.format));

        tracing::debug!(project_root = %project_root.display(), ?output_format, "context ready");

        Ok(Self {
            project_root,
            config,
            output_format,
        })
    }

    #[must_use]
    pub const fn robot_mode(&self) -> bool {
        self.output_format.is_machine()
    }

    fn find_project_root() -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(find_upwards(&cwd, PROJECT_MARKER).unwrap_or(cwd))
    }
}

/// Nearest ancestor of `start` (inclusive) containing a `name` directory.
fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(name).is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
