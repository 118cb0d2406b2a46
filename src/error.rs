//! Error types for skill-sync.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::Diagnostic;

/// Errors that terminate a command.
///
/// Problems that only affect a single source or skill (an unavailable root, a
/// malformed document) are not errors; they are reported as
/// [`Diagnostic`](crate::core::Diagnostic)s and the run continues.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("invalid skill: {0}")]
    InvalidSkill(String),

    #[error("index {} has unsupported version {found} (expected <= {supported})", path.display())]
    UnsupportedIndexVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("failed to write index {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A failure that ended a run after diagnostics were already collected.
    #[error("{source}")]
    WithDiagnostics {
        source: Box<SyncError>,
        diagnostics: Vec<Diagnostic>,
    },
}

impl SyncError {
    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Regex(_) => "invalid_pattern",
            Self::Config(_) => "config",
            Self::MissingConfig(_) => "missing_config",
            Self::InvalidSkill(_) => "invalid_skill",
            Self::UnsupportedIndexVersion { .. } => "index_version",
            Self::WriteFailure { .. } => "write_failure",
            Self::WithDiagnostics { source, .. } => source.code(),
        }
    }

    /// Attach the run's diagnostics so they are reported alongside the error.
    #[must_use]
    pub fn with_diagnostics(self, diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            return self;
        }
        Self::WithDiagnostics {
            source: Box::new(self),
            diagnostics,
        }
    }

    /// Diagnostics collected before the failure.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::WithDiagnostics { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
