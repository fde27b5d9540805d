//! skill-audit fix - Apply safe fixes and write the revised documents

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use tracing::{error, info};

use crate::app::AppContext;
use crate::audit::batch::BatchRunner;
use crate::audit::report::DocumentReport;
use crate::cli::commands::{audit_paths, ensure_no_regressions};
use crate::cli::formatters::AuditReportView;
use crate::cli::output::{OutputFormat, emit, emit_json, emit_jsonl, robot_ok};
use crate::error::{AuditError, Result};
use crate::utils::format::simple_diff;
use crate::utils::fs::write_atomic;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Files or directories to fix (default: plugins/ and skills/)
    pub paths: Vec<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Print a line diff for every revised document
    #[arg(long)]
    pub diff: bool,

    /// Process at most N documents
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Worker threads (default: batch.jobs from config)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Fail unless every document ends up clean or fixed
    #[arg(long)]
    pub check: bool,
}

pub fn run(ctx: &AppContext, args: &FixArgs) -> Result<()> {
    let mut runner = BatchRunner::from_config(&ctx.config)?;
    if let Some(jobs) = args.jobs {
        runner = runner.with_jobs(jobs);
    }
    let audit = audit_paths(ctx, &runner, &args.paths, args.limit)?;

    let mut written = 0usize;
    let mut first_failure: Option<AuditError> = None;
    for (file, outcome) in audit.files.iter().zip(&audit.outcome.outcomes) {
        let Some(revised) = &outcome.revised_text else {
            continue;
        };
        if args.diff && !ctx.robot_mode {
            print_diff(&outcome.report, file, revised)?;
        }
        if args.dry_run {
            continue;
        }
        match write_atomic(file, revised) {
            Ok(()) => {
                written += 1;
                info!(path = %outcome.report.path, "revised document written");
            }
            Err(err) => {
                error!(path = %outcome.report.path, error = %err, "write-back failed");
                first_failure.get_or_insert(err);
            }
        }
    }

    let reports: Vec<DocumentReport> = audit
        .outcome
        .outcomes
        .iter()
        .map(|outcome| outcome.report.clone())
        .collect();
    let summary = &audit.outcome.summary;
    let pending = audit
        .outcome
        .outcomes
        .iter()
        .filter(|outcome| outcome.revised_text.is_some())
        .count();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(serde_json::json!({
            "reports": &reports,
            "summary": summary,
            "written": written,
            "dryRun": args.dry_run,
        })))?,
        OutputFormat::Jsonl => emit_jsonl(&reports)?,
        format => {
            if !ctx.quiet {
                emit(
                    &AuditReportView::new("Skill fix", &reports, summary).with_written(written),
                    format,
                );
                if args.dry_run && pending > 0 {
                    println!(
                        "{}",
                        format!("Dry run: {pending} document(s) would be rewritten").yellow()
                    );
                }
            }
        }
    }

    if let Some(err) = first_failure {
        return Err(err);
    }
    ensure_no_regressions(&audit.outcome)?;
    if args.check && !summary.all_compliant() {
        return Err(AuditError::ValidationFailed(format!(
            "{} document(s) need review and {} could not be parsed",
            summary.needs_review, summary.parse_errors
        )));
    }
    Ok(())
}

fn print_diff(report: &DocumentReport, file: &std::path::Path, revised: &str) -> Result<()> {
    let original = std::fs::read_to_string(file)?;
    println!("{}", format!("--- {}", report.path).red());
    println!("{}", "+++ revised".green());
    for line in simple_diff(&original, revised).lines() {
        if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{}", line.green());
        }
    }
    Ok(())
}
