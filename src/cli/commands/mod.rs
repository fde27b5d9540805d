//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command
//!
//! The commands own every filesystem touch: discovery, reading and
//! write-back. The audit core only sees bytes and returns reports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::app::AppContext;
use crate::audit::batch::{AuditOutcome, BatchOutcome, BatchRunner, DocumentInput};
use crate::audit::report::{BatchSummary, DocumentReport};
use crate::cli::Commands;
use crate::cli::progress::ProgressReporter;
use crate::error::{AuditError, Result};

pub mod fix;
pub mod propose;
pub mod report;
pub mod rules;

/// File name every skill document carries.
pub const SKILL_FILE: &str = "SKILL.md";

/// Roots scanned when no paths are given.
pub const DEFAULT_ROOTS: [&str; 2] = ["plugins", "skills"];

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Report(args) => report::run(ctx, args),
        Commands::Fix(args) => fix::run(ctx, args),
        Commands::Propose(args) => propose::run(ctx, args),
        Commands::Rules(args) => rules::run(ctx, args),
    }
}

/// Every `SKILL.md` under `paths` (or the default roots), in walk order,
/// without duplicates. Explicit paths must exist.
pub(crate) fn discover_skill_markdowns(ctx: &AppContext, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let roots: Vec<PathBuf> = if paths.is_empty() {
        DEFAULT_ROOTS
            .iter()
            .map(|root| ctx.project_root.join(root))
            .filter(|root| root.exists())
            .collect()
    } else {
        for path in paths {
            if !path.exists() {
                return Err(AuditError::DocumentNotFound(path.display().to_string()));
            }
        }
        paths.to_vec()
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for root in roots {
        if root.is_file() {
            if seen.insert(root.clone()) {
                out.push(root);
            }
            continue;
        }
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !ctx.config.batch.is_excluded(&entry.file_name().to_string_lossy())
            });
        for entry in walker {
            let entry = entry.map_err(|err| {
                AuditError::Io(std::io::Error::other(format!("walk {}: {err}", root.display())))
            })?;
            if entry.file_type().is_file() && entry.file_name() == SKILL_FILE {
                let path = entry.path().to_path_buf();
                if seen.insert(path.clone()) {
                    out.push(path);
                }
            }
        }
    }
    debug!(count = out.len(), "discovered skill documents");
    Ok(out)
}

/// Path as shown in reports: relative to the project root when under it.
pub(crate) fn display_path(ctx: &AppContext, path: &Path) -> String {
    path.strip_prefix(&ctx.project_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Audit run over discovered files, with each outcome paired to its file.
pub(crate) struct AuditRun {
    pub files: Vec<PathBuf>,
    pub outcome: BatchOutcome,
}

/// Discover, read and audit. Files that cannot be read get a fatal report
/// and do not stop the batch.
pub(crate) fn audit_paths(
    ctx: &AppContext,
    runner: &BatchRunner,
    paths: &[PathBuf],
    limit: Option<usize>,
) -> Result<AuditRun> {
    let mut files = discover_skill_markdowns(ctx, paths)?;
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    let reporter = ProgressReporter::new(ctx.robot_mode, ctx.quiet);
    if files.is_empty() {
        reporter.warn(&format!("no {SKILL_FILE} documents found"));
    }

    let mut inputs = Vec::with_capacity(files.len());
    let mut unreadable: Vec<Option<AuditOutcome>> = Vec::with_capacity(files.len());
    for file in &files {
        let shown = display_path(ctx, file);
        match std::fs::read(file) {
            Ok(bytes) => {
                inputs.push(DocumentInput::new(shown, bytes));
                unreadable.push(None);
            }
            Err(err) => {
                warn!(path = %shown, error = %err, "cannot read document");
                let err = AuditError::Io(err);
                unreadable.push(Some(AuditOutcome {
                    report: DocumentReport::fatal(&shown, &err),
                    revised_text: None,
                    history: Vec::new(),
                }));
            }
        }
    }

    let progress = reporter.batch(inputs.len() as u64, "Auditing skills");
    let audited = runner.run_with_progress(&inputs, &|outcome: &AuditOutcome| {
        progress.document_done(&outcome.report.path);
    });
    progress.finish_batch(&audited.summary);

    let outcome = if audited.outcomes.len() == files.len() {
        audited
    } else {
        let mut audited = audited.outcomes.into_iter();
        let outcomes: Vec<AuditOutcome> = unreadable
            .into_iter()
            .filter_map(|slot| slot.or_else(|| audited.next()))
            .collect();
        let reports: Vec<DocumentReport> = outcomes.iter().map(|o| o.report.clone()).collect();
        BatchOutcome {
            summary: BatchSummary::from_reports(&reports),
            outcomes,
        }
    };
    Ok(AuditRun { files, outcome })
}

/// Fail the command when the auto-fixer regressed any document.
pub(crate) fn ensure_no_regressions(outcome: &BatchOutcome) -> Result<()> {
    match outcome
        .outcomes
        .iter()
        .find(|o| !o.report.regressed_gaps.is_empty())
    {
        Some(regressed) => Err(AuditError::RegressionDetected {
            path: regressed.report.path.clone(),
            codes: regressed
                .report
                .regressed_gaps
                .iter()
                .map(|gap| gap.code.code())
                .collect(),
        }),
        None => Ok(()),
    }
}
