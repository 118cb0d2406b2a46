//! Non-fatal problems surfaced in the run report.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::skill::SkillSource;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Run degraded but every reachable skill was processed
    Warning,
    /// A skill was excluded from this run
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A recoverable problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A configured root is missing or unreadable; it contributed no skills.
    SourceUnavailable {
        source: SkillSource,
        root: PathBuf,
        reason: String,
    },
    /// One skill entry could not be parsed and was excluded.
    ParseError {
        source: SkillSource,
        entry: String,
        path: PathBuf,
        message: String,
    },
    /// The previous index could not be read; it was treated as empty.
    BaselineUnreadable { path: PathBuf, reason: String },
}

impl Diagnostic {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::SourceUnavailable { .. } | Self::BaselineUnreadable { .. } => Severity::Warning,
            Self::ParseError { .. } => Severity::Error,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SourceUnavailable",
            Self::ParseError { .. } => "ParseError",
            Self::BaselineUnreadable { .. } => "BaselineUnreadable",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable {
                source,
                root,
                reason,
            } => write!(
                f,
                "{}: {source} root {} ({reason})",
                self.kind(),
                root.display()
            ),
            Self::ParseError {
                source,
                entry,
                path,
                message,
            } => write!(
                f,
                "{}: {source} skill `{entry}` ({}): {message}",
                self.kind(),
                path.display()
            ),
            Self::BaselineUnreadable { path, reason } => write!(
                f,
                "{}: {} ({reason}); regenerating from scratch",
                self.kind(),
                path.display()
            ),
        }
    }
}
