use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::document::CanonicalSection;
use crate::error::{AuditError, Result};

pub const PROJECT_CONFIG_FILE: &str = ".skill-audit.toml";
pub const DEFAULT_AUTHOR: &str = "Skill Maintainers <maintainers@example.com>";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub fixer: FixerConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILL_AUDIT_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(AuditError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
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
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete config from TOML text, validating the result.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| AuditError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            debug!("no platform config directory; skipping global config");
            return Ok(None);
        };
        Self::load_patch(&dir.join("skill-audit/config.toml"))
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| AuditError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| AuditError::Config(format!("parse config {}: {err}", path.display())))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.rules {
            self.rules.merge(patch);
        }
        if let Some(patch) = patch.fixer {
            self.fixer.merge(patch);
        }
        if let Some(patch) = patch.batch {
            self.batch.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_usize("SKILL_AUDIT_MIN_SECTION_CHARS")? {
            self.rules.min_section_chars = value;
        }
        if let Some(values) = env_list("SKILL_AUDIT_SCOPABLE_TOOLS") {
            self.rules.scopable_tools = values;
        }
        if let Some(values) = env_list("SKILL_AUDIT_EXTRA_ACTION_VERBS") {
            self.rules.extra_action_verbs = merge_unique(values, &self.rules.extra_action_verbs);
        }
        if let Some(value) = env_bool("SKILL_AUDIT_EXTENDED_CHECKS") {
            self.rules.extended_checks = value;
        }

        if let Some(value) = env_string("SKILL_AUDIT_DEFAULT_AUTHOR") {
            self.fixer.default_author = value;
        }
        if let Some(value) = env_string("SKILL_AUDIT_DEFAULT_LICENSE") {
            self.fixer.default_license = value;
        }
        if let Some(value) = env_usize("SKILL_AUDIT_MAX_PASSES")? {
            self.fixer.max_passes = value;
        }

        if let Some(value) = env_usize("SKILL_AUDIT_JOBS")? {
            self.batch.jobs = value;
        }
        if let Some(values) = env_list("SKILL_AUDIT_EXCLUDE_DIRS") {
            self.batch.exclude_dirs = merge_unique(values, &self.batch.exclude_dirs);
        }
        if let Some(values) = env_list("SKILL_AUDIT_PRIORITY_CATEGORIES") {
            self.batch.priority_categories = values;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fixer.max_passes == 0 {
            return Err(AuditError::Config(
                "fixer.max_passes must be at least 1".to_string(),
            ));
        }
        if self.fixer.default_author.trim().is_empty() {
            return Err(AuditError::MissingConfig("fixer.default_author".to_string()));
        }
        if self.fixer.default_license.trim().is_empty() {
            return Err(AuditError::MissingConfig("fixer.default_license".to_string()));
        }
        for heading in self.rules.section_min_chars.keys() {
            if CanonicalSection::from_heading(heading).is_none() {
                return Err(AuditError::Config(format!(
                    "rules.section_min_chars: unknown section {heading:?} (expected one of {})",
                    CanonicalSection::ALL.map(CanonicalSection::heading).join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub min_section_chars: usize,
    /// Per-section overrides keyed by canonical heading.
    #[serde(default)]
    pub section_min_chars: BTreeMap<String, usize>,
    #[serde(default)]
    pub scopable_tools: Vec<String>,
    #[serde(default)]
    pub extra_action_verbs: Vec<String>,
    #[serde(default)]
    pub extended_checks: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_section_chars: 20,
            section_min_chars: BTreeMap::new(),
            scopable_tools: vec!["Bash".to_string()],
            extra_action_verbs: Vec::new(),
            extended_checks: false,
        }
    }
}

impl RulesConfig {
    fn merge(&mut self, patch: RulesPatch) {
        if let Some(value) = patch.min_section_chars {
            self.min_section_chars = value;
        }
        if let Some(values) = patch.section_min_chars {
            self.section_min_chars.extend(values);
        }
        if let Some(values) = patch.scopable_tools {
            self.scopable_tools = values;
        }
        if let Some(values) = patch.extra_action_verbs {
            self.extra_action_verbs = merge_unique(values, &self.extra_action_verbs);
        }
        if let Some(value) = patch.extended_checks {
            self.extended_checks = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixerConfig {
    #[serde(default)]
    pub default_author: String,
    #[serde(default)]
    pub default_license: String,
    /// Upper bound on fix/re-detect rounds per document.
    #[serde(default)]
    pub max_passes: usize,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            default_author: DEFAULT_AUTHOR.to_string(),
            default_license: "MIT".to_string(),
            max_passes: 3,
        }
    }
}

impl FixerConfig {
    fn merge(&mut self, patch: FixerPatch) {
        if let Some(value) = patch.default_author {
            self.default_author = value;
        }
        if let Some(value) = patch.default_license {
            self.default_license = value;
        }
        if let Some(value) = patch.max_passes {
            self.max_passes = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads; 0 means one per CPU.
    #[serde(default)]
    pub jobs: usize,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Categories whose documents are ranked one priority level higher.
    #[serde(default)]
    pub priority_categories: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            exclude_dirs: [
                "archive",
                "backups",
                "backup",
                ".git",
                "node_modules",
                "__pycache__",
                ".venv",
                "010-archive",
                "000-docs",
                "002-workspaces",
            ]
            .map(String::from)
            .to_vec(),
            priority_categories: vec!["saas-packs".to_string()],
        }
    }
}

impl BatchConfig {
    fn merge(&mut self, patch: BatchPatch) {
        if let Some(value) = patch.jobs {
            self.jobs = value;
        }
        if let Some(values) = patch.exclude_dirs {
            self.exclude_dirs = merge_unique(values, &self.exclude_dirs);
        }
        if let Some(values) = patch.priority_categories {
            self.priority_categories = values;
        }
    }

    /// Whether a directory name is skipped during discovery.
    #[must_use]
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        dir_name.starts_with("skills-backup-")
            || self.exclude_dirs.iter().any(|excluded| excluded == dir_name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    pub rules: Option<RulesPatch>,
    pub fixer: Option<FixerPatch>,
    pub batch: Option<BatchPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesPatch {
    pub min_section_chars: Option<usize>,
    pub section_min_chars: Option<BTreeMap<String, usize>>,
    pub scopable_tools: Option<Vec<String>>,
    pub extra_action_verbs: Option<Vec<String>>,
    pub extended_checks: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixerPatch {
    pub default_author: Option<String>,
    pub default_license: Option<String>,
    pub max_passes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchPatch {
    pub jobs: Option<usize>,
    pub exclude_dirs: Option<Vec<String>>,
    pub priority_categories: Option<Vec<String>>,
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
        .map(|value| parse_bool(&value))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse::<usize>().map(Some).map_err(|err| {
            AuditError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| split_list(&value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
