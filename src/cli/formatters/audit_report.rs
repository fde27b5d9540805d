//! Batch audit report formatter

use console::style;
use serde::Serialize;

use crate::audit::fixer::FixAction;
use crate::audit::report::{
    BatchSummary, COMPLIANCE_TARGET_PCT, DocumentReport, DocumentStatus, Priority,
};
use crate::audit::rules::Severity;
use crate::cli::output::{Formattable, HumanLayout, OutputFormat};
use crate::utils::format::{csv_table, truncate_string};

/// Max gap detail width in human output.
const DETAIL_WIDTH: usize = 100;

/// View over a batch run: the listed reports plus the summary of the whole
/// batch.
#[derive(Debug, Clone)]
pub struct AuditReportView<'a> {
    pub title: &'a str,
    /// Reports to list; may be a filtered subset of the batch.
    pub reports: &'a [DocumentReport],
    pub summary: &'a BatchSummary,
    /// Documents written back to disk, if the command writes.
    pub written: Option<usize>,
}

#[derive(Serialize)]
struct JsonView<'a> {
    reports: &'a [DocumentReport],
    summary: &'a BatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<usize>,
}

impl<'a> AuditReportView<'a> {
    #[must_use]
    pub const fn new(
        title: &'a str,
        reports: &'a [DocumentReport],
        summary: &'a BatchSummary,
    ) -> Self {
        Self {
            title,
            reports,
            summary,
            written: None,
        }
    }

    #[must_use]
    pub const fn with_written(mut self, written: usize) -> Self {
        self.written = Some(written);
        self
    }

    fn status_label(status: DocumentStatus) -> String {
        let label = status.as_str();
        match status {
            DocumentStatus::Clean => style(label).green().to_string(),
            DocumentStatus::Fixed => style(label).cyan().to_string(),
            DocumentStatus::NeedsReview => style(label).yellow().to_string(),
            DocumentStatus::ParseError => style(label).red().bold().to_string(),
        }
    }

    fn priority_label(priority: Priority) -> String {
        let label = priority.as_str();
        match priority {
            Priority::Critical => style(label).red().bold().to_string(),
            Priority::High => style(label).red().to_string(),
            Priority::Medium => style(label).yellow().to_string(),
            Priority::Low | Priority::None => style(label).dim().to_string(),
        }
    }

    fn format_human(&self) -> String {
        let mut layout = HumanLayout::new();
        layout.title(self.title);

        for report in self.reports {
            layout.push_line(format!(
                "{} {} [{}]",
                Self::status_label(report.status),
                style(&report.path).bold(),
                Self::priority_label(report.priority),
            ));
            if let Some(err) = &report.error {
                layout.push_line(format!("    {} {}", style(err.code.code_string()).red(), err.message));
                layout.push_line(format!("    {}", style(&err.suggestion).dim()));
            }
            for gap in &report.gaps {
                let closed = !report.residual_gaps.iter().any(|r| r.code == gap.code);
                let marker = if closed {
                    style("✓").green().to_string()
                } else if gap.severity == Severity::ManualReview {
                    style("•").yellow().to_string()
                } else {
                    style("✗").red().to_string()
                };
                layout.push_line(format!(
                    "  {marker} {} {}",
                    gap.code,
                    style(truncate_string(&gap.detail, DETAIL_WIDTH)).dim()
                ));
            }
            for gap in &report.regressed_gaps {
                layout.push_line(format!(
                    "  {} {} introduced by auto-fix",
                    style("!").red().bold(),
                    gap.code
                ));
            }
        }
        if !self.reports.is_empty() {
            layout.blank();
        }

        let summary = self.summary;
        layout.section("Summary");
        layout.kv("Documents", &summary.documents.to_string());
        layout.kv("Clean", &summary.clean.to_string());
        layout.kv("Fixed", &summary.fixed.to_string());
        layout.kv("Needs review", &summary.needs_review.to_string());
        if summary.parse_errors > 0 {
            layout.kv("Parse errors", &style(summary.parse_errors).red().to_string());
        }
        layout.kv("Gaps found", &summary.total_gaps.to_string());
        layout.kv("Auto-fixed", &summary.auto_fixed.to_string());
        layout.kv("Proposals", &summary.proposed.to_string());
        if summary.regressions > 0 {
            layout.kv("Regressions", &style(summary.regressions).red().bold().to_string());
        }
        layout.kv("Compliant", &format!("{:.1}%", summary.compliant_pct));
        layout.kv(
            &format!("Target ({COMPLIANCE_TARGET_PCT}%)"),
            &format!(
                "{} documents, {} to go",
                summary.target_compliant, summary.gap_to_target
            ),
        );
        if let Some(written) = self.written {
            layout.kv("Written", &written.to_string());
        }

        if !summary.top_gaps.is_empty() {
            layout.blank();
            layout.section("Most common gaps");
            for entry in summary.top_gaps.iter().take(10) {
                layout.bullet(&format!("{:>4}  {}", entry.count, entry.code));
            }
        }
        layout.build()
    }

    fn format_plain(&self) -> String {
        let mut lines: Vec<String> = self
            .reports
            .iter()
            .map(|report| {
                let fixed = report.count_fixes(FixAction::AutoApplied);
                format!(
                    "{} {} priority={} gaps={} fixed={} residual={}",
                    report.status,
                    report.path,
                    report.priority,
                    report.gaps.len(),
                    fixed,
                    report.residual_gaps.len()
                )
            })
            .collect();
        let s = self.summary;
        lines.push(format!(
            "documents={} clean={} fixed={} needs-review={} parse-errors={} regressions={} compliant={:.1}%",
            s.documents, s.clean, s.fixed, s.needs_review, s.parse_errors, s.regressions, s.compliant_pct
        ));
        lines.join("\n")
    }

    fn format_tsv(&self) -> String {
        let mut lines = vec!["path\tstatus\tpriority\tcategory\tgaps\tresidual\tcodes".to_string()];
        for report in self.reports {
            let codes: Vec<String> = report.residual_gaps.iter().map(|g| g.code.code()).collect();
            lines.push(format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                report.path.replace('\t', " "),
                report.status,
                report.priority,
                report.category,
                report.gaps.len(),
                report.residual_gaps.len(),
                codes.join(",")
            ));
        }
        lines.join("\n")
    }

    fn format_csv(&self) -> String {
        let rows = self.reports.iter().map(|report| {
            let codes: Vec<String> = report.residual_gaps.iter().map(|g| g.code.code()).collect();
            vec![
                report.path.clone(),
                report.status.to_string(),
                report.priority.to_string(),
                report.category.clone(),
                report.gaps.len().to_string(),
                report.count_fixes(FixAction::AutoApplied).to_string(),
                report.residual_gaps.len().to_string(),
                codes.join("; "),
            ]
        });
        csv_table(
            &["path", "status", "priority", "category", "gaps", "auto_fixed", "residual", "codes"],
            rows,
        )
    }

    fn json_view(&self) -> JsonView<'_> {
        JsonView {
            reports: self.reports,
            summary: self.summary,
            written: self.written,
        }
    }
}

impl Formattable for AuditReportView<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => serde_json::to_string_pretty(&self.json_view()).unwrap_or_default(),
            OutputFormat::Jsonl => self
                .reports
                .iter()
                .filter_map(|report| serde_json::to_string(report).ok())
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Plain => self.format_plain(),
            OutputFormat::Tsv => self.format_tsv(),
            OutputFormat::Csv => self.format_csv(),
        }
    }
}
