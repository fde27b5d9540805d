//! End-to-end pipeline scenarios on single documents.

use std::sync::Arc;

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::fixer::FixAction;
use skill_audit::audit::report::DocumentStatus;
use skill_audit::audit::rules::{Gap, RuleCatalog, Severity};
use skill_audit::audit::{AuditOutcome, BatchRunner, DocumentInput};
use skill_audit::config::FixerConfig;
use skill_audit::test_utils::fixtures::SkillDoc;

const PATH: &str = "skills/csv-charts/SKILL.md";

fn audit(text: impl Into<Vec<u8>>) -> AuditOutcome {
    BatchRunner::new(Arc::new(RuleCatalog::default()), FixerConfig::default())
        .with_jobs(1)
        .audit_one(&DocumentInput::new(PATH, text))
}

fn codes(records: &[skill_audit::audit::GapRecord]) -> Vec<String> {
    records.iter().map(|gap| gap.code.code()).collect()
}

#[test]
fn missing_author_and_license_are_fixed() {
    let outcome = audit(
        SkillDoc::compliant()
            .without("author")
            .without("license")
            .render(),
    );
    let report = &outcome.report;

    assert_eq!(
        codes(&report.gaps),
        ["frontmatter_missing:author", "frontmatter_missing:license"]
    );
    assert!(report.gaps.iter().all(|g| g.severity == Severity::AutoFixable));
    assert_eq!(report.count_fixes(FixAction::AutoApplied), 2);
    assert_eq!(report.status, DocumentStatus::Fixed);
    assert!(report.residual_gaps.is_empty());

    let revised = outcome.revised_text.expect("revised text");
    assert!(revised.contains("\nlicense: MIT\n"));
}

#[test]
fn bare_bash_is_scoped_and_other_tools_kept() {
    let outcome = audit(
        SkillDoc::compliant()
            .set("allowed-tools", "Read, Write, Bash")
            .render(),
    );

    assert_eq!(codes(&outcome.report.gaps), ["unscoped_tool:Bash"]);
    assert_eq!(outcome.report.status, DocumentStatus::Fixed);
    let revised = outcome.revised_text.expect("revised text");
    assert!(revised.contains("allowed-tools: Read, Write, Bash(bash:*)\n"));
}

#[test]
fn description_clauses_are_appended() {
    let original = "Generate charts from CSV files.";
    let outcome = audit(SkillDoc::compliant().set("description", original).render());

    assert_eq!(
        codes(&outcome.report.gaps),
        ["description_missing:use_when", "description_missing:trigger_with"]
    );
    assert_eq!(outcome.report.status, DocumentStatus::Fixed);

    let fixes: Vec<_> = outcome
        .report
        .fixes
        .iter()
        .filter(|fix| fix.action == FixAction::AutoApplied)
        .collect();
    assert_eq!(fixes.len(), 2);
    assert!(fixes.iter().all(|fix| fix.after.contains(original)));
}

#[test]
fn missing_examples_is_proposed_not_applied() {
    let text = SkillDoc::compliant()
        .without_section(CanonicalSection::Examples)
        .render();
    let outcome = audit(text);
    let report = &outcome.report;
    let gap = Gap::missing_section(CanonicalSection::Examples);

    assert_eq!(codes(&report.residual_gaps), ["missing_section:Examples"]);
    assert_eq!(report.status, DocumentStatus::NeedsReview);
    assert!(report.proposals[&gap].starts_with("## Examples"));
    assert_eq!(report.count_fixes(FixAction::ProposedPendingApproval), 1);
    assert!(outcome.revised_text.is_none());
}

#[test]
fn short_prerequisites_is_empty_section() {
    let outcome = audit(
        SkillDoc::compliant()
            .section(CanonicalSection::Prerequisites, "TBD")
            .render(),
    );
    let report = &outcome.report;

    assert_eq!(codes(&report.gaps), ["empty_section:Prerequisites"]);
    assert_eq!(report.gaps[0].severity, Severity::ManualReview);
    assert_eq!(codes(&report.residual_gaps), ["empty_section:Prerequisites"]);
    assert_eq!(report.status, DocumentStatus::NeedsReview);
}

#[test]
fn invalid_bytes_are_a_parse_error() {
    let mut bytes = SkillDoc::compliant().render().into_bytes();
    bytes.extend_from_slice(&[0xfe, 0xff]);
    let outcome = audit(bytes);

    assert_eq!(outcome.report.status, DocumentStatus::ParseError);
    assert!(outcome.report.gaps.is_empty());
    assert!(outcome.report.fixes.is_empty());
    assert!(outcome.report.error.is_some());
}

#[test]
fn compliant_document_is_clean() {
    let outcome = audit(SkillDoc::compliant().render());
    assert_eq!(outcome.report.status, DocumentStatus::Clean);
    assert!(outcome.report.gaps.is_empty());
    assert!(outcome.revised_text.is_none());
}
