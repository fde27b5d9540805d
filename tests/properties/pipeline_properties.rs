//! Pipeline properties over generated skill documents.

use std::sync::Arc;

use proptest::prelude::*;

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::report::DocumentStatus;
use skill_audit::audit::rules::{RuleCatalog, Severity};
use skill_audit::audit::{BatchRunner, DocumentInput, FixAction, detect_gaps, parse_text};
use skill_audit::config::{FixerConfig, RulesConfig};
use skill_audit::test_utils::fixtures::SkillDoc;

const PATH: &str = "skills/csv-charts/SKILL.md";
const FIELDS: [&str; 6] = ["name", "description", "allowed-tools", "version", "author", "license"];

fn runner() -> BatchRunner {
    BatchRunner::new(Arc::new(RuleCatalog::default()), FixerConfig::default()).with_jobs(1)
}

fn runner_for(rules: &RulesConfig, fixer: &FixerConfig) -> (BatchRunner, Arc<RuleCatalog>) {
    let catalog = Arc::new(RuleCatalog::from_config(rules).unwrap());
    let runner = BatchRunner::new(Arc::clone(&catalog), fixer.clone()).with_jobs(1);
    (runner, catalog)
}

/// Rule and fixer settings a user could configure, including default
/// authors that fail the extended email check.
fn arb_settings() -> impl Strategy<Value = (RulesConfig, FixerConfig)> {
    (
        any::<bool>(),
        "[A-Za-z][A-Za-z .@<>'-]{0,24}",
        prop::sample::select(vec!["MIT", "Apache-2.0", "Proprietary: internal use"]),
    )
        .prop_map(|(extended_checks, default_author, license)| {
            let rules = RulesConfig {
                extended_checks,
                ..RulesConfig::default()
            };
            let fixer = FixerConfig {
                default_author,
                default_license: license.to_string(),
                ..FixerConfig::default()
            };
            (rules, fixer)
        })
}

fn arb_document() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(any::<bool>(), FIELDS.len()),
        prop::sample::select(vec![
            "Generate charts from CSV files. Use when plotting. Trigger with \"plot csv\".",
            "Generate charts from CSV files.",
            "Charts for spreadsheets.",
            "'Generate charts: quickly'",
            "|\n  Generate charts\n  from CSV files.",
        ]),
        prop::sample::select(vec![
            "Read, Write, Bash",
            "Bash",
            "Read, Bash(git:*), Bash",
            "\n  - Read\n  - Bash",
            "Read, Grep, Glob",
        ]),
        prop::collection::vec(0u8..4, CanonicalSection::ALL.len()),
        any::<bool>(),
    )
        .prop_map(|(drop_field, description, tools, section_edits, crlf)| {
            let mut doc = SkillDoc::compliant()
                .set("description", description)
                .set("allowed-tools", tools);
            for (field, drop) in FIELDS.iter().zip(drop_field) {
                if drop {
                    doc = doc.without(field);
                }
            }
            for (section, edit) in CanonicalSection::ALL.into_iter().zip(section_edits) {
                doc = match edit {
                    1 => doc.without_section(section),
                    2 => doc.section(section, "TBD"),
                    _ => doc,
                };
            }
            let text = doc.render();
            if crlf { text.replace('\n', "\r\n") } else { text }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn detection_is_deterministic(text in arb_document()) {
        let catalog = RuleCatalog::default();
        let first = detect_gaps(&parse_text(PATH, &text), &catalog);
        let second = detect_gaps(&parse_text(PATH, &text), &catalog);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn fixing_never_introduces_gaps(
        text in arb_document(),
        (rules, fixer) in arb_settings(),
    ) {
        let (runner, catalog) = runner_for(&rules, &fixer);
        let outcome = runner.audit_one(&DocumentInput::new(PATH, text.clone()));
        prop_assert!(outcome.report.regressed_gaps.is_empty());

        let revised = outcome.revised_text.unwrap_or(text);
        let after = detect_gaps(&parse_text(PATH, &revised), &catalog);
        for gap in &after {
            prop_assert!(
                outcome.report.gaps.iter().any(|g| g.code == gap.code),
                "new gap {} after fixing", gap.code
            );
        }
    }

    #[test]
    fn closed_gaps_stay_closed(
        text in arb_document(),
        (rules, fixer) in arb_settings(),
    ) {
        let (runner, _) = runner_for(&rules, &fixer);
        let first = runner.audit_one(&DocumentInput::new(PATH, text.clone()));
        let revised = first.revised_text.clone().unwrap_or(text);
        let second = runner.audit_one(&DocumentInput::new(PATH, revised));

        for gap in &second.report.gaps {
            prop_assert!(
                first.report.residual_gaps.iter().any(|g| g.code == gap.code),
                "{} reappeared after being closed", gap.code
            );
        }
        prop_assert!(second.revised_text.is_none());
    }

    #[test]
    fn second_pass_is_a_fixed_point(
        text in arb_document(),
        (rules, fixer) in arb_settings(),
    ) {
        let (runner, _) = runner_for(&rules, &fixer);
        let first = runner.audit_one(&DocumentInput::new(PATH, text.clone()));
        let revised = first.revised_text.unwrap_or(text);
        let second = runner.audit_one(&DocumentInput::new(PATH, revised));
        prop_assert_eq!(second.report.count_fixes(FixAction::AutoApplied), 0);
    }

    #[test]
    fn skipped_fixes_are_left_for_review(
        text in arb_document(),
        (rules, fixer) in arb_settings(),
    ) {
        let (runner, _) = runner_for(&rules, &fixer);
        let report = runner.audit_one(&DocumentInput::new(PATH, text)).report;
        for fix in report.fixes.iter().filter(|fix| fix.action == FixAction::Skipped) {
            if let Some(gap) = report.residual_gaps.iter().find(|gap| gap.code == fix.gap_code) {
                prop_assert_eq!(gap.severity, Severity::ManualReview);
            }
        }
    }

    #[test]
    fn one_bad_document_one_parse_error(n in 1usize..12, k in 0usize..12) {
        let k = k % n;
        let inputs: Vec<DocumentInput> = (0..n)
            .map(|i| {
                let path = format!("skills/s{i}/SKILL.md");
                if i == k {
                    DocumentInput::new(path, vec![b'-', 0x80, b'\n'])
                } else {
                    DocumentInput::new(path, SkillDoc::compliant().render())
                }
            })
            .collect();
        let outcome = runner().with_jobs(0).run(&inputs);

        prop_assert_eq!(outcome.outcomes.len(), n);
        let errors: Vec<usize> = outcome
            .outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.report.status == DocumentStatus::ParseError)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(errors, vec![k]);
    }
}
