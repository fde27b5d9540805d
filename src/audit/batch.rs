//! Batch Runner: drives every document through the pipeline and collects
//! the reports.
//!
//! Each document follows `Pending → Parsed → Detected → {Fixed, FixFailed}
//! → Revalidated → Reported`; a document that cannot be decoded goes
//! straight from `Pending` to `Reported`. Documents share nothing but the
//! read-only catalog and fixer settings, so they run in parallel.

use std::fmt;
use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use super::detector::detect_gaps;
use super::fixer::AutoFixer;
use super::parser::parse_document;
use super::proposer::{proposal_records, propose_fixes};
use super::report::{BatchReport, BatchSummary, DocumentReport};
use super::revalidate::revalidate;
use super::rules::RuleCatalog;
use crate::config::{Config, FixerConfig};
use crate::error::{AuditError, Result};

/// Raw document handed to the runner by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentState {
    Pending,
    Parsed,
    Detected,
    Fixed,
    FixFailed,
    Revalidated,
    Reported,
}

impl DocumentState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Parsed => "parsed",
            Self::Detected => "detected",
            Self::Fixed => "fixed",
            Self::FixFailed => "fix-failed",
            Self::Revalidated => "revalidated",
            Self::Reported => "reported",
        }
    }

    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Parsed | Self::Reported)
                | (Self::Parsed, Self::Detected)
                | (Self::Detected, Self::Fixed | Self::FixFailed)
                | (Self::Fixed | Self::FixFailed, Self::Revalidated)
                | (Self::Revalidated, Self::Reported)
        )
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State tracker for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRun {
    path: String,
    history: Vec<DocumentState>,
}

impl DocumentRun {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            history: vec![DocumentState::Pending],
        }
    }

    #[must_use]
    pub fn state(&self) -> DocumentState {
        self.history
            .last()
            .copied()
            .unwrap_or(DocumentState::Pending)
    }

    #[must_use]
    pub fn history(&self) -> &[DocumentState] {
        &self.history
    }

    pub fn advance(&mut self, next: DocumentState) -> Result<()> {
        let current = self.state();
        if !current.can_advance_to(next) {
            return Err(AuditError::InvalidTransition {
                path: self.path.clone(),
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        debug!(path = %self.path, from = %current, to = %next, "document state");
        self.history.push(next);
        Ok(())
    }
}

/// Everything the runner produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub report: DocumentReport,
    /// Revised text when the fixer changed the document and nothing
    /// regressed. The caller decides whether to write it.
    pub revised_text: Option<String>,
    pub history: Vec<DocumentState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub outcomes: Vec<AuditOutcome>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    #[must_use]
    pub fn into_report(self) -> BatchReport {
        BatchReport {
            reports: self.outcomes.into_iter().map(|o| o.report).collect(),
            summary: self.summary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    catalog: Arc<RuleCatalog>,
    fixer: FixerConfig,
    jobs: usize,
    priority_categories: Vec<String>,
}

impl BatchRunner {
    #[must_use]
    pub fn new(catalog: Arc<RuleCatalog>, fixer: FixerConfig) -> Self {
        Self {
            catalog,
            fixer,
            jobs: 0,
            priority_categories: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = RuleCatalog::from_config(&config.rules)?;
        Ok(Self::new(Arc::new(catalog), config.fixer.clone())
            .with_jobs(config.batch.jobs)
            .with_priority_categories(config.batch.priority_categories.clone()))
    }

    /// Worker threads; 0 means one per CPU, 1 runs on the calling thread.
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub fn with_priority_categories(mut self, categories: Vec<String>) -> Self {
        self.priority_categories = categories;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Audit one document. Never fails: anything that goes wrong becomes a
    /// fatal report for this document only.
    #[must_use]
    pub fn audit_one(&self, input: &DocumentInput) -> AuditOutcome {
        let mut run = DocumentRun::new(&input.path);
        match self.pipeline(&mut run, input) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(path = %input.path, error = %err, "audit aborted");
                AuditOutcome {
                    report: DocumentReport::fatal(&input.path, &err),
                    revised_text: None,
                    history: run.history().to_vec(),
                }
            }
        }
    }

    fn pipeline(&self, run: &mut DocumentRun, input: &DocumentInput) -> Result<AuditOutcome> {
        let doc = match parse_document(&input.path, &input.bytes) {
            Ok(doc) => doc,
            Err(parse_error) => {
                warn!(path = %input.path, error = %parse_error, "document not decodable");
                run.advance(DocumentState::Reported)?;
                return Ok(AuditOutcome {
                    report: DocumentReport::fatal(&input.path, &parse_error.into()),
                    revised_text: None,
                    history: run.history().to_vec(),
                });
            }
        };
        run.advance(DocumentState::Parsed)?;

        let gaps = detect_gaps(&doc, &self.catalog);
        run.advance(DocumentState::Detected)?;

        let fixed = AutoFixer::new(&self.catalog, &self.fixer).fix_until_stable(&doc);
        let skipped = fixed.skipped_gaps();
        run.advance(if skipped.is_empty() {
            DocumentState::Fixed
        } else {
            DocumentState::FixFailed
        })?;

        let mut revalidation = revalidate(&gaps, &fixed.document, &self.catalog);
        revalidation.downgrade_skipped(&skipped);
        run.advance(DocumentState::Revalidated)?;
        let regressed = revalidation.ensure_no_regressions(&input.path).err();
        if let Some(err) = &regressed {
            error!(path = %input.path, error = %err, "auto-fix introduced new gaps");
        }

        // Residual gaps are manual-review gaps plus auto fixes that were
        // skipped; both get drafts.
        let proposals = propose_fixes(&fixed.document, &revalidation.remaining(), &self.fixer);
        let mut fixes = fixed.fixes;
        fixes.extend(proposal_records(&fixed.document, &proposals));

        let changed = fixed.document.raw_text() != doc.raw_text();
        let revised_text = (changed && regressed.is_none()).then(|| fixed.document.into_text());

        let report = DocumentReport::audited(
            &input.path,
            gaps,
            fixes,
            proposals,
            revalidation,
            &self.priority_categories,
        );
        run.advance(DocumentState::Reported)?;
        debug!(
            path = %input.path,
            status = %report.status,
            gaps = report.gaps.len(),
            residual = report.residual_gaps.len(),
            "document audited"
        );

        Ok(AuditOutcome {
            report,
            revised_text,
            history: run.history().to_vec(),
        })
    }

    #[must_use]
    pub fn run(&self, inputs: &[DocumentInput]) -> BatchOutcome {
        self.run_with_progress(inputs, &|_| {})
    }

    /// Audit every input, calling `on_done` as each document finishes.
    /// Outcomes keep input order.
    #[must_use]
    pub fn run_with_progress(
        &self,
        inputs: &[DocumentInput],
        on_done: &(dyn Fn(&AuditOutcome) + Sync),
    ) -> BatchOutcome {
        info!(documents = inputs.len(), jobs = self.jobs, "batch started");
        let audit = |input: &DocumentInput| {
            let outcome = self.audit_one(input);
            on_done(&outcome);
            outcome
        };

        let outcomes: Vec<AuditOutcome> = if self.jobs == 1 {
            inputs.iter().map(&audit).collect()
        } else {
            match ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| inputs.par_iter().map(&audit).collect()),
                Err(err) => {
                    warn!(error = %err, "worker pool unavailable, auditing sequentially");
                    inputs.iter().map(&audit).collect()
                }
            }
        };

        let reports: Vec<DocumentReport> = outcomes.iter().map(|o| o.report.clone()).collect();
        let summary = BatchSummary::from_reports(&reports);
        info!(
            documents = summary.documents,
            gaps = summary.total_gaps,
            auto_fixed = summary.auto_fixed,
            residual = summary.residual,
            parse_errors = summary.parse_errors,
            "batch finished"
        );
        if summary.regressions > 0 {
            error!(regressions = summary.regressions, "auto-fixer regressions in batch");
        }
        BatchOutcome { outcomes, summary }
    }
}
