//! skill-audit report - Audit skills without touching them
//!
//! The report goes to stdout, or to `--output FILE` in the selected format.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::app::AppContext;
use crate::audit::batch::BatchRunner;
use crate::audit::report::{DocumentReport, DocumentStatus, Priority, sort_by_priority};
use crate::cli::commands::{audit_paths, ensure_no_regressions};
use crate::cli::formatters::AuditReportView;
use crate::cli::output::{Formattable, OutputFormat, robot_ok, to_jsonl};
use crate::error::Result;
use crate::utils::fs::write_atomic;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Files or directories to audit (default: plugins/ and skills/)
    pub paths: Vec<PathBuf>,

    /// Only list documents in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only list documents at or above this priority
    #[arg(long, value_name = "PRIORITY")]
    pub min_priority: Option<Priority>,

    /// Include clean documents in the listing
    #[arg(long)]
    pub all: bool,

    /// Worker threads (default: batch.jobs from config)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Write the report to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ReportArgs) -> Result<()> {
    let mut runner = BatchRunner::from_config(&ctx.config)?;
    if let Some(jobs) = args.jobs {
        runner = runner.with_jobs(jobs);
    }
    let audit = audit_paths(ctx, &runner, &args.paths, None)?;
    let summary = audit.outcome.summary.clone();

    let mut listed: Vec<DocumentReport> = audit
        .outcome
        .outcomes
        .iter()
        .map(|outcome| &outcome.report)
        .filter(|report| selected(report, args))
        .cloned()
        .collect();
    sort_by_priority(&mut listed);

    let rendered = match ctx.output_format {
        OutputFormat::Json => serde_json::to_string_pretty(&robot_ok(serde_json::json!({
            "reports": &listed,
            "summary": &summary,
        })))?,
        OutputFormat::Jsonl => to_jsonl(&listed)?,
        format => AuditReportView::new("Skill audit", &listed, &summary).format(format),
    };

    match &args.output {
        Some(path) => {
            write_atomic(path, &format!("{rendered}\n"))?;
            info!(file = %path.display(), documents = listed.len(), "report written");
            if !ctx.quiet && !ctx.robot_mode {
                eprintln!("{} {}", "Report written to".green(), path.display());
            }
        }
        None => {
            let machine = matches!(ctx.output_format, OutputFormat::Json | OutputFormat::Jsonl);
            if (machine || !ctx.quiet) && !rendered.is_empty() {
                println!("{rendered}");
            }
        }
    }

    ensure_no_regressions(&audit.outcome)
}

fn selected(report: &DocumentReport, args: &ReportArgs) -> bool {
    if !args.all && report.status == DocumentStatus::Clean {
        return false;
    }
    if let Some(category) = &args.category {
        if &report.category != category {
            return false;
        }
    }
    args.min_priority.is_none_or(|min| report.priority >= min)
}
