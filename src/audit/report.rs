//! Per-document and batch reports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fixer::{FixAction, FixRecord};
use super::proposer::Proposals;
use super::revalidate::Revalidation;
use super::rules::GapRecord;
use crate::error::{AuditError, StructuredError};

/// Number of entries kept in [`BatchSummary::top_gaps`].
pub const TOP_GAPS: usize = 20;

/// Share of compliant documents a batch is measured against.
pub const COMPLIANCE_TARGET_PCT: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    Clean,
    Fixed,
    NeedsReview,
    ParseError,
}

impl DocumentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Fixed => "fixed",
            Self::NeedsReview => "needs-review",
            Self::ParseError => "parse-error",
        }
    }

    /// Clean or fully fixed.
    #[must_use]
    pub const fn is_compliant(self) -> bool {
        matches!(self, Self::Clean | Self::Fixed)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage order; higher sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(AuditError::ValidationFailed(format!(
                "unknown priority {other:?} (expected critical, high, medium, low or none)"
            ))),
        }
    }
}

/// Segment after `plugins/`, `standalone` under `skills/`, else `unknown`.
#[must_use]
pub fn category_for_path(path: &str) -> String {
    let segments: Vec<&str> = path.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
    if let Some(idx) = segments.iter().position(|s| *s == "plugins") {
        if let Some(category) = segments.get(idx + 1).filter(|_| idx + 2 < segments.len()) {
            return (*category).to_string();
        }
    }
    if segments.contains(&"skills") {
        return "standalone".to_string();
    }
    "unknown".to_string()
}

/// Priority from the number of gaps left to resolve; priority categories
/// rank one level higher.
#[must_use]
pub fn priority_for(status: DocumentStatus, open_gaps: usize, boosted: bool) -> Priority {
    match (status, open_gaps) {
        (DocumentStatus::ParseError, _) => Priority::Critical,
        (_, 0) => Priority::None,
        (_, 1..=4) if boosted => Priority::High,
        (_, 1..=4) => Priority::Medium,
        (_, 5..=6) if boosted => Priority::Medium,
        _ => Priority::Low,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub path: String,
    pub gaps: Vec<GapRecord>,
    pub fixes: Vec<FixRecord>,
    pub proposals: Proposals,
    pub residual_gaps: Vec<GapRecord>,
    pub status: DocumentStatus,
    pub category: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regressed_gaps: Vec<GapRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

impl DocumentReport {
    /// Report for a document that went through the whole pipeline.
    #[must_use]
    pub fn audited(
        path: impl Into<String>,
        gaps: Vec<GapRecord>,
        fixes: Vec<FixRecord>,
        proposals: Proposals,
        revalidation: Revalidation,
        priority_categories: &[String],
    ) -> Self {
        let path = path.into();
        let status = if gaps.is_empty() {
            DocumentStatus::Clean
        } else if revalidation.is_clean() {
            DocumentStatus::Fixed
        } else {
            DocumentStatus::NeedsReview
        };
        let category = category_for_path(&path);
        let open = revalidation.residual.len() + revalidation.regressed.len();
        let priority = priority_for(status, open, priority_categories.contains(&category));
        Self {
            path,
            gaps,
            fixes,
            proposals,
            residual_gaps: revalidation.residual,
            status,
            category,
            priority,
            regressed_gaps: revalidation.regressed,
            error: None,
        }
    }

    /// Report for a document that could not be audited. Carries no gaps
    /// or fixes.
    #[must_use]
    pub fn fatal(path: impl Into<String>, err: &AuditError) -> Self {
        let path = path.into();
        let category = category_for_path(&path);
        Self {
            path,
            gaps: Vec::new(),
            fixes: Vec::new(),
            proposals: Proposals::new(),
            residual_gaps: Vec::new(),
            status: DocumentStatus::ParseError,
            category,
            priority: Priority::Critical,
            regressed_gaps: Vec::new(),
            error: Some(err.to_structured()),
        }
    }

    pub fn count_fixes(&self, action: FixAction) -> usize {
        self.fixes.iter().filter(|fix| fix.action == action).count()
    }

    /// Gaps still open: residual plus regressed.
    #[must_use]
    pub fn open_gaps(&self) -> usize {
        self.residual_gaps.len() + self.regressed_gaps.len()
    }
}

/// Highest priority first, then most open gaps, then path.
pub fn sort_by_priority(reports: &mut [DocumentReport]) {
    reports.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.open_gaps().cmp(&a.open_gaps()))
            .then_with(|| a.path.cmp(&b.path))
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapCount {
    pub code: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total: usize,
    pub compliant: usize,
    pub needs_review: usize,
    pub parse_errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub documents: usize,
    pub clean: usize,
    pub fixed: usize,
    pub needs_review: usize,
    pub parse_errors: usize,
    pub total_gaps: usize,
    pub auto_fixed: usize,
    pub skipped: usize,
    pub proposed: usize,
    pub residual: usize,
    pub regressions: usize,
    pub compliant_pct: f64,
    /// Compliant documents needed to reach [`COMPLIANCE_TARGET_PCT`].
    pub target_compliant: usize,
    /// Documents still to bring into compliance to hit the target.
    pub gap_to_target: usize,
    pub top_gaps: Vec<GapCount>,
    pub by_category: BTreeMap<String, CategoryStats>,
}

impl BatchSummary {
    #[must_use]
    pub fn from_reports(reports: &[DocumentReport]) -> Self {
        let mut summary = Self {
            documents: reports.len(),
            ..Self::default()
        };
        let mut frequency: BTreeMap<String, usize> = BTreeMap::new();

        for report in reports {
            match report.status {
                DocumentStatus::Clean => summary.clean += 1,
                DocumentStatus::Fixed => summary.fixed += 1,
                DocumentStatus::NeedsReview => summary.needs_review += 1,
                DocumentStatus::ParseError => summary.parse_errors += 1,
            }
            summary.total_gaps += report.gaps.len();
            summary.auto_fixed += report.count_fixes(FixAction::AutoApplied);
            summary.skipped += report.count_fixes(FixAction::Skipped);
            summary.proposed += report.proposals.len();
            summary.residual += report.residual_gaps.len();
            summary.regressions += report.regressed_gaps.len();

            for gap in &report.gaps {
                *frequency.entry(gap.code.code()).or_default() += 1;
            }

            let stats = summary.by_category.entry(report.category.clone()).or_default();
            stats.total += 1;
            match report.status {
                DocumentStatus::Clean | DocumentStatus::Fixed => stats.compliant += 1,
                DocumentStatus::NeedsReview => stats.needs_review += 1,
                DocumentStatus::ParseError => stats.parse_errors += 1,
            }
        }

        let compliant = summary.clean + summary.fixed;
        summary.compliant_pct = percent(compliant, summary.documents);
        summary.target_compliant = summary.documents * COMPLIANCE_TARGET_PCT / 100;
        summary.gap_to_target = summary.target_compliant.saturating_sub(compliant);
        let mut top: Vec<GapCount> = frequency
            .into_iter()
            .map(|(code, count)| GapCount { code, count })
            .collect();
        // Stable sort keeps code order for equal counts.
        top.sort_by(|a, b| b.count.cmp(&a.count));
        top.truncate(TOP_GAPS);
        summary.top_gaps = top;
        summary
    }

    /// Every document is clean or fixed, and nothing regressed.
    #[must_use]
    pub const fn all_compliant(&self) -> bool {
        self.needs_review == 0 && self.parse_errors == 0 && self.regressions == 0
    }
}

/// Percentage rounded to one decimal place.
#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<DocumentReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    #[must_use]
    pub fn from_reports(reports: Vec<DocumentReport>) -> Self {
        let summary = BatchSummary::from_reports(&reports);
        Self { reports, summary }
    }
}
