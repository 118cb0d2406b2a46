use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::utils::fs::read_optional;

/// Directory (under the config dir or the project) holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "skill-sync";
pub const PROJECT_MARKER: &str = ".skill-sync";

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env reference pattern")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub proposals: ProposalsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILL_SYNC_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        tracing::debug!(?config, "configuration loaded");

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let path = dirs::config_dir()
            .ok_or_else(|| SyncError::MissingConfig("config directory not found".to_string()))?
            .join(CONFIG_DIR_NAME)
            .join("config.toml");
        Self::load_patch(&path)
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        let path = project_root.join(PROJECT_MARKER).join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        let Some(raw) = read_optional(path)
            .map_err(|err| SyncError::Config(format!("read config {}: {err}", path.display())))?
        else {
            return Ok(None);
        };
        let patch = toml::from_str(&raw)
            .map_err(|err| SyncError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.sources {
            self.sources.merge(patch);
        }
        if let Some(patch) = patch.index {
            self.index.merge(patch);
        }
        if let Some(patch) = patch.proposals {
            self.proposals.merge(patch);
        }
        if let Some(patch) = patch.output {
            self.output.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if env_bool("SKILL_SYNC_ROBOT").unwrap_or(false) {
            self.output.format = "json".to_string();
        }

        if let Some(value) = env_string("SKILL_SYNC_PLUGIN_ROOT") {
            self.sources.plugin_root = value;
        }
        if let Some(value) = env_string("SKILL_SYNC_LOCAL_ROOT") {
            self.sources.local_root = value;
        }
        if let Some(value) = env_string("SKILL_SYNC_INDEX_PATH") {
            self.index.path = value;
        }

        if let Some(value) = env_bool("SKILL_SYNC_PROPOSALS_ENABLED") {
            self.proposals.enabled = value;
        }
        if let Some(value) = env_usize("SKILL_SYNC_MIN_TYPICAL_USE_WORDS")? {
            self.proposals.min_typical_use_words = value;
        }
        if let Some(values) = env_list("SKILL_SYNC_RETIRED_TAGS") {
            self.proposals.retired_tags = merge_unique(values, &self.proposals.retired_tags);
        }

        if let Some(value) = env_string("SKILL_SYNC_OUTPUT_FORMAT") {
            self.output.format = value;
        }

        Ok(())
    }

    /// Plugin skills root, resolved against `project_root`.
    #[must_use]
    pub fn plugin_root(&self, project_root: &Path) -> PathBuf {
        resolve_path(&self.sources.plugin_root, project_root)
    }

    #[must_use]
    pub fn local_root(&self, project_root: &Path) -> PathBuf {
        resolve_path(&self.sources.local_root, project_root)
    }

    #[must_use]
    pub fn index_path(&self, project_root: &Path) -> PathBuf {
        resolve_path(&self.index.path, project_root)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub plugin_root: String,
    #[serde(default)]
    pub local_root: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            plugin_root: "${CLAUDE_PLUGIN_ROOT}/skills".to_string(),
            local_root: ".claude/skills".to_string(),
        }
    }
}

impl SourcesConfig {
    fn merge(&mut self, patch: SourcesPatch) {
        if let Some(value) = patch.plugin_root {
            self.plugin_root = value;
        }
        if let Some(value) = patch.local_root {
            self.local_root = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub path: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: ".claude/skills-index.json".to_string(),
        }
    }
}

impl IndexConfig {
    fn merge(&mut self, patch: IndexPatch) {
        if let Some(value) = patch.path {
            self.path = value;
        }
    }
}

/// Keyword-to-tag association used by the tag heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRuleConfig {
    pub keyword: String,
    pub tag: String,
}

impl TagRuleConfig {
    fn new(keyword: &str, tag: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            tag: tag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_typical_use_words: usize,
    #[serde(default)]
    pub generic_patterns: Vec<String>,
    #[serde(default)]
    pub retired_tags: Vec<String>,
    #[serde(default)]
    pub tag_rules: Vec<TagRuleConfig>,
}

impl Default for ProposalsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_typical_use_words: 4,
            generic_patterns: vec![
                r"(?i)^\s*(general|misc(ellaneous)?|various|todo|tbd|n/?a)\b".to_string(),
                r"(?i)^\s*use (this|it)( skill)? (when|for|if) (needed|necessary|appropriate)".to_string(),
            ],
            retired_tags: vec![
                "deprecated".to_string(),
                "legacy".to_string(),
                "obsolete".to_string(),
            ],
            tag_rules: vec![
                TagRuleConfig::new("functional", "functional-programming"),
                TagRuleConfig::new("test", "testing"),
                TagRuleConfig::new("security", "security"),
                TagRuleConfig::new("performance", "performance"),
                TagRuleConfig::new("error handling", "error-handling"),
                TagRuleConfig::new("refactor", "refactoring"),
                TagRuleConfig::new("accessibility", "accessibility"),
            ],
        }
    }
}

impl ProposalsConfig {
    fn merge(&mut self, patch: ProposalsPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.min_typical_use_words {
            self.min_typical_use_words = value;
        }
        if let Some(values) = patch.generic_patterns {
            self.generic_patterns = values;
        }
        if let Some(values) = patch.retired_tags {
            self.retired_tags = merge_unique(values, &self.retired_tags);
        }
        if let Some(values) = patch.tag_rules {
            self.tag_rules = values;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
        }
    }
}

impl OutputConfig {
    fn merge(&mut self, patch: OutputPatch) {
        if let Some(value) = patch.format {
            self.format = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub sources: Option<SourcesPatch>,
    pub index: Option<IndexPatch>,
    pub proposals: Option<ProposalsPatch>,
    pub output: Option<OutputPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SourcesPatch {
    pub plugin_root: Option<String>,
    pub local_root: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexPatch {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProposalsPatch {
    pub enabled: Option<bool>,
    pub min_typical_use_words: Option<usize>,
    pub generic_patterns: Option<Vec<String>>,
    pub retired_tags: Option<Vec<String>>,
    pub tag_rules: Option<Vec<TagRuleConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputPatch {
    pub format: Option<String>,
}

/// Expand `~` and `${VAR}` and anchor relative paths at `base`.
///
/// Unset variables are left verbatim so the resulting path simply does not
/// exist and the source is reported unavailable.
#[must_use]
pub fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    let expanded = ENV_REF
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned();

    let path = match (expanded.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if expanded == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from("~")),
        _ => PathBuf::from(&expanded),
    };

    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| SyncError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_enable_proposals() {
        let config = Config::default();
        assert!(config.proposals.enabled);
        assert_eq!(config.proposals.min_typical_use_words, 4);
        assert!(config.proposals.retired_tags.contains(&"deprecated".to_string()));
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn explicit_file_patches_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[sources]
local_root = "skills"

[proposals]
min_typical_use_words = 2
retired_tags = ["old"]

[[proposals.tag_rules]]
keyword = "rust"
tag = "rust"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(config.sources.local_root, "skills");
        assert_eq!(config.sources.plugin_root, "${CLAUDE_PLUGIN_ROOT}/skills");
        assert_eq!(config.proposals.min_typical_use_words, 2);
        assert_eq!(config.proposals.retired_tags[0], "old");
        assert!(config.proposals.retired_tags.contains(&"legacy".to_string()));
        assert_eq!(
            config.proposals.tag_rules,
            vec![TagRuleConfig::new("rust", "rust")]
        );
        assert_eq!(config.local_root(dir.path()), dir.path().join("skills"));
    }

    #[test]
    fn missing_explicit_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml")), dir.path()).unwrap();
        assert_eq!(config.index.path, ".claude/skills-index.json");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources\nplugin_root = 1").unwrap();
        let err = Config::load(Some(&path), dir.path()).unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn resolve_path_anchors_relative_paths() {
        let base = Path::new("/project");
        assert_eq!(resolve_path("a/b", base), PathBuf::from("/project/a/b"));
        assert_eq!(resolve_path("/abs", base), PathBuf::from("/abs"));
    }

    #[test]
    fn resolve_path_keeps_unset_variables() {
        let base = Path::new("/project");
        let path = resolve_path("${SKILL_SYNC_SURELY_UNSET_VAR}/skills", base);
        assert_eq!(
            path,
            PathBuf::from("/project/${SKILL_SYNC_SURELY_UNSET_VAR}/skills")
        );
    }

    #[test]
    fn merge_unique_prefers_new_values_first() {
        let merged = merge_unique(
            vec!["b".into(), "a".into()],
            &["a".to_string(), "c".to_string()],
        );
        assert_eq!(merged, vec!["b", "a", "c"]);
    }
}
