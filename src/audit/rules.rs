//! Rule Catalog and gap taxonomy.
//!
//! Gap codes are a closed set of tagged variants grouped by category. Their
//! string form (`frontmatter_missing:author`, `unscoped_tool:Bash`, ...) is
//! the stable identifier used in reports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::document::CanonicalSection;
use crate::config::RulesConfig;
use crate::error::{AuditError, Result};

/// Frontmatter fields every skill must declare, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrontmatterField {
    Name,
    Description,
    AllowedTools,
    Version,
    Author,
    License,
}

impl FrontmatterField {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Description,
        Self::AllowedTools,
        Self::Version,
        Self::Author,
        Self::License,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::AllowedTools => "allowed-tools",
            Self::Version => "version",
            Self::Author => "author",
            Self::License => "license",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrontmatterGap {
    Missing(FrontmatterField),
    AuthorMissingEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptionGap {
    TooShort,
    MissingUseWhen,
    MissingTriggerWith,
    MissingActionVerbs,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolScopeGap {
    Unscoped(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionGap {
    Missing(CanonicalSection),
    Empty(CanonicalSection),
    NotStepByStep,
}

/// A detected deviation from the compliance standard.
///
/// Ordering follows declaration order: frontmatter, description, tool
/// scoping, then sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gap {
    Frontmatter(FrontmatterGap),
    Description(DescriptionGap),
    ToolScope(ToolScopeGap),
    Section(SectionGap),
}

impl Gap {
    #[must_use]
    pub const fn missing_field(field: FrontmatterField) -> Self {
        Self::Frontmatter(FrontmatterGap::Missing(field))
    }

    #[must_use]
    pub fn unscoped_tool(tool: impl Into<String>) -> Self {
        Self::ToolScope(ToolScopeGap::Unscoped(tool.into()))
    }

    #[must_use]
    pub const fn missing_section(section: CanonicalSection) -> Self {
        Self::Section(SectionGap::Missing(section))
    }

    #[must_use]
    pub const fn empty_section(section: CanonicalSection) -> Self {
        Self::Section(SectionGap::Empty(section))
    }

    /// Fixed mapping from code to severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Frontmatter(FrontmatterGap::Missing(
                FrontmatterField::Author | FrontmatterField::License,
            ))
            | Self::Description(DescriptionGap::MissingUseWhen | DescriptionGap::MissingTriggerWith)
            | Self::ToolScope(ToolScopeGap::Unscoped(_)) => Severity::AutoFixable,
            _ => Severity::ManualReview,
        }
    }

    #[must_use]
    pub const fn is_auto_fixable(&self) -> bool {
        matches!(self.severity(), Severity::AutoFixable)
    }

    #[must_use]
    pub const fn category(&self) -> GapCategory {
        match self {
            Self::Frontmatter(_) => GapCategory::Frontmatter,
            Self::Description(_) => GapCategory::Description,
            Self::ToolScope(_) => GapCategory::ToolScope,
            Self::Section(_) => GapCategory::Section,
        }
    }

    /// Stable string identifier.
    #[must_use]
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frontmatter(FrontmatterGap::Missing(field)) => {
                write!(f, "frontmatter_missing:{}", field.key())
            }
            Self::Frontmatter(FrontmatterGap::AuthorMissingEmail) => f.write_str("author_missing:email"),
            Self::Description(DescriptionGap::TooShort) => f.write_str("description:too_short"),
            Self::Description(DescriptionGap::MissingUseWhen) => {
                f.write_str("description_missing:use_when")
            }
            Self::Description(DescriptionGap::MissingTriggerWith) => {
                f.write_str("description_missing:trigger_with")
            }
            Self::Description(DescriptionGap::MissingActionVerbs) => {
                f.write_str("description_missing:action_verbs")
            }
            Self::ToolScope(ToolScopeGap::Unscoped(tool)) => write!(f, "unscoped_tool:{tool}"),
            Self::Section(SectionGap::Missing(section)) => write!(f, "missing_section:{section}"),
            Self::Section(SectionGap::Empty(section)) => write!(f, "empty_section:{section}"),
            Self::Section(SectionGap::NotStepByStep) => {
                f.write_str("instructions:not_step_by_step")
            }
        }
    }
}

impl FromStr for Gap {
    type Err = AuditError;

    fn from_str(code: &str) -> Result<Self> {
        let unknown = || AuditError::ValidationFailed(format!("unknown gap code: {code}"));
        let (prefix, arg) = code.split_once(':').ok_or_else(unknown)?;
        let section = || CanonicalSection::from_heading(arg).ok_or_else(unknown);

        let gap = match (prefix, arg) {
            ("frontmatter_missing", key) => {
                Self::missing_field(FrontmatterField::from_key(key).ok_or_else(unknown)?)
            }
            ("author_missing", "email") => Self::Frontmatter(FrontmatterGap::AuthorMissingEmail),
            ("description", "too_short") => Self::Description(DescriptionGap::TooShort),
            ("description_missing", "use_when") => Self::Description(DescriptionGap::MissingUseWhen),
            ("description_missing", "trigger_with") => {
                Self::Description(DescriptionGap::MissingTriggerWith)
            }
            ("description_missing", "action_verbs") => {
                Self::Description(DescriptionGap::MissingActionVerbs)
            }
            ("unscoped_tool", tool) if !tool.is_empty() => Self::unscoped_tool(tool),
            ("missing_section", _) => Self::missing_section(section()?),
            ("empty_section", _) => Self::empty_section(section()?),
            ("instructions", "not_step_by_step") => Self::Section(SectionGap::NotStepByStep),
            _ => return Err(unknown()),
        };
        Ok(gap)
    }
}

impl From<Gap> for String {
    fn from(gap: Gap) -> Self {
        gap.to_string()
    }
}

impl TryFrom<String> for Gap {
    type Error = AuditError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    AutoFixable,
    ManualReview,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AutoFixable => "auto-fixable",
            Self::ManualReview => "manual-review",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCategory {
    Frontmatter,
    Description,
    ToolScope,
    Section,
}

impl fmt::Display for GapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Frontmatter => "frontmatter",
            Self::Description => "description",
            Self::ToolScope => "tool_scope",
            Self::Section => "section",
        })
    }
}

/// One detected gap with its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRecord {
    pub code: Gap,
    pub severity: Severity,
    pub detail: String,
}

impl GapRecord {
    #[must_use]
    pub fn new(code: Gap, detail: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub const fn is_auto_fixable(&self) -> bool {
        self.code.is_auto_fixable()
    }
}

/// Verbs that make a description read as an action.
pub const ACTION_VERBS: &[&str] = &[
    "analyze", "audit", "build", "compare", "configure", "convert", "create", "debug", "deploy",
    "detect", "extract", "fix", "forecast", "generate", "implement", "log", "manage", "migrate",
    "monitor", "optimize", "process", "review", "route", "scan", "set up", "setup", "test",
    "track", "transform", "validate",
];

/// Immutable rule table shared across every document in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCatalog {
    min_section_chars: usize,
    section_min_chars: BTreeMap<CanonicalSection, usize>,
    scopable_tools: Vec<String>,
    action_verbs: Vec<String>,
    extended_checks: bool,
}

static STANDARD: LazyLock<RuleCatalog> = LazyLock::new(|| {
    RuleCatalog::build(&RulesConfig::default(), BTreeMap::new())
});

impl Default for RuleCatalog {
    fn default() -> Self {
        STANDARD.clone()
    }
}

impl RuleCatalog {
    /// Catalog with no configuration applied.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let mut overrides = BTreeMap::new();
        for (heading, chars) in &config.section_min_chars {
            let section = CanonicalSection::from_heading(heading).ok_or_else(|| {
                AuditError::Config(format!("rules.section_min_chars: unknown section {heading:?}"))
            })?;
            overrides.insert(section, *chars);
        }
        Ok(Self::build(config, overrides))
    }

    fn build(config: &RulesConfig, section_min_chars: BTreeMap<CanonicalSection, usize>) -> Self {
        let mut action_verbs: Vec<String> = ACTION_VERBS.iter().map(|v| (*v).to_string()).collect();
        for verb in &config.extra_action_verbs {
            let verb = verb.trim().to_lowercase();
            if !verb.is_empty() && !action_verbs.contains(&verb) {
                action_verbs.push(verb);
            }
        }
        Self {
            min_section_chars: config.min_section_chars,
            section_min_chars,
            scopable_tools: config.scopable_tools.clone(),
            action_verbs,
            extended_checks: config.extended_checks,
        }
    }

    /// Minimum trimmed character count for `section` to count as non-empty.
    #[must_use]
    pub fn min_chars_for(&self, section: CanonicalSection) -> usize {
        self.section_min_chars
            .get(&section)
            .copied()
            .unwrap_or(self.min_section_chars)
    }

    #[must_use]
    pub fn scopable_tools(&self) -> &[String] {
        &self.scopable_tools
    }

    #[must_use]
    pub fn is_scopable(&self, tool: &str) -> bool {
        self.scopable_tools.iter().any(|known| known == tool)
    }

    #[must_use]
    pub fn action_verbs(&self) -> &[String] {
        &self.action_verbs
    }

    #[must_use]
    pub const fn extended_checks(&self) -> bool {
        self.extended_checks
    }

    /// Human-readable listing of every active rule, in evaluation order.
    #[must_use]
    pub fn describe(&self) -> Vec<RuleInfo> {
        let mut rules = Vec::new();
        for field in FrontmatterField::ALL {
            rules.push(RuleInfo::new(
                Gap::missing_field(field),
                format!("`{}` is absent or blank", field.key()),
            ));
        }
        if self.extended_checks {
            rules.push(RuleInfo::new(
                Gap::Frontmatter(FrontmatterGap::AuthorMissingEmail),
                "`author` has no contact email",
            ));
            rules.push(RuleInfo::new(
                Gap::Description(DescriptionGap::TooShort),
                "description shorter than 20 characters",
            ));
        }
        rules.push(RuleInfo::new(
            Gap::Description(DescriptionGap::MissingUseWhen),
            "description lacks a \"Use when\" clause",
        ));
        rules.push(RuleInfo::new(
            Gap::Description(DescriptionGap::MissingTriggerWith),
            "description lacks a \"Trigger with\" clause",
        ));
        rules.push(RuleInfo::new(
            Gap::Description(DescriptionGap::MissingActionVerbs),
            format!("description uses none of {} action verbs", self.action_verbs.len()),
        ));
        for tool in &self.scopable_tools {
            rules.push(RuleInfo::new(
                Gap::unscoped_tool(tool.clone()),
                format!("`{tool}` listed without a (...) scope"),
            ));
        }
        for section in CanonicalSection::ALL {
            rules.push(RuleInfo::new(
                Gap::missing_section(section),
                format!("no `## {section}` heading"),
            ));
            rules.push(RuleInfo::new(
                Gap::empty_section(section),
                format!(
                    "`## {section}` has fewer than {} characters",
                    self.min_chars_for(section)
                ),
            ));
        }
        if self.extended_checks {
            rules.push(RuleInfo::new(
                Gap::Section(SectionGap::NotStepByStep),
                "Instructions are not a numbered or step-by-step list",
            ));
        }
        rules
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub code: String,
    pub category: GapCategory,
    pub severity: Severity,
    pub description: String,
}

impl RuleInfo {
    fn new(gap: Gap, description: impl Into<String>) -> Self {
        Self {
            code: gap.code(),
            category: gap.category(),
            severity: gap.severity(),
            description: description.into(),
        }
    }
}
