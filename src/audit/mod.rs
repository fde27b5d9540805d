//! Skill compliance auditing.
//!
//! The pipeline for one document: [`parser`] builds a [`Document`],
//! [`detector`] evaluates the [`RuleCatalog`], [`fixer`] closes the
//! auto-fixable gaps, [`proposer`] drafts text for the rest and
//! [`revalidate`] checks that fixing introduced nothing new. [`batch`]
//! runs that over many documents and [`report`] aggregates the results.

pub mod batch;
pub mod detector;
pub mod document;
pub mod fixer;
pub mod parser;
pub mod proposer;
pub mod report;
pub mod revalidate;
pub mod rules;
pub mod templates;

pub use batch::{AuditOutcome, BatchOutcome, BatchRunner, DocumentInput, DocumentState};
pub use detector::detect_gaps;
pub use document::{CanonicalSection, Document, FrontmatterState, Section};
pub use fixer::{AutoFixer, FixAction, FixOutcome, FixRecord, FixSkipped};
pub use parser::{ParseError, parse_document, parse_text};
pub use proposer::{Proposals, propose_fixes, sections_review_file};
pub use report::{BatchReport, BatchSummary, DocumentReport, DocumentStatus, Priority};
pub use revalidate::{Revalidation, revalidate};
pub use rules::{Gap, GapRecord, RuleCatalog, Severity};
