//! Batch runs: isolation, ordering and aggregation.

use std::sync::Arc;

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::report::{DocumentStatus, Priority};
use skill_audit::audit::rules::RuleCatalog;
use skill_audit::audit::{BatchRunner, DocumentInput};
use skill_audit::config::{Config, FixerConfig};
use skill_audit::test_utils::fixtures::SkillDoc;
use skill_audit::test_utils::logging::init_test_logging;

fn inputs(n: usize, broken: usize) -> Vec<DocumentInput> {
    (0..n)
        .map(|i| {
            let path = format!("skills/skill-{i}/SKILL.md");
            if i == broken {
                DocumentInput::new(path, vec![b'#', b' ', 0xc3, 0x28])
            } else {
                DocumentInput::new(path, SkillDoc::compliant().without("license").render())
            }
        })
        .collect()
}

#[test]
fn one_malformed_document_in_a_batch() {
    init_test_logging();
    let runner = BatchRunner::new(Arc::new(RuleCatalog::default()), FixerConfig::default())
        .with_jobs(4);
    let outcome = runner.run(&inputs(12, 7));

    assert_eq!(outcome.outcomes.len(), 12);
    let parse_errors: Vec<usize> = outcome
        .outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| o.report.status == DocumentStatus::ParseError)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(parse_errors, [7]);
    assert_eq!(outcome.summary.fixed, 11);
    assert_eq!(outcome.summary.parse_errors, 1);
    assert!(!outcome.summary.all_compliant());
}

#[test]
fn outcomes_keep_input_order_in_parallel() {
    let inputs = inputs(20, usize::MAX);
    let sequential = BatchRunner::new(Arc::new(RuleCatalog::default()), FixerConfig::default())
        .with_jobs(1)
        .run(&inputs);
    let parallel = BatchRunner::new(Arc::new(RuleCatalog::default()), FixerConfig::default())
        .with_jobs(0)
        .run(&inputs);

    let paths = |o: &skill_audit::audit::BatchOutcome| -> Vec<String> {
        o.outcomes.iter().map(|x| x.report.path.clone()).collect()
    };
    assert_eq!(paths(&sequential), paths(&parallel));
    assert_eq!(sequential.summary, parallel.summary);
}

#[test]
fn priority_categories_rank_higher() {
    let text = SkillDoc::compliant()
        .without_section(CanonicalSection::Examples)
        .render();
    let runner = BatchRunner::from_config(&Config::default())
        .unwrap()
        .with_jobs(1);
    let outcome = runner.run(&[
        DocumentInput::new("plugins/saas-packs/stripe/skills/charge/SKILL.md", text.clone()),
        DocumentInput::new("plugins/devops/ci/skills/lint/SKILL.md", text),
    ]);

    let saas = &outcome.outcomes[0].report;
    let devops = &outcome.outcomes[1].report;
    assert_eq!(saas.category, "saas-packs");
    assert_eq!(saas.priority, Priority::High);
    assert_eq!(devops.category, "devops");
    assert_eq!(devops.priority, Priority::Medium);
    assert_eq!(outcome.summary.by_category["saas-packs"].needs_review, 1);
}

#[test]
fn empty_batch_has_empty_summary() {
    let outcome = BatchRunner::from_config(&Config::default()).unwrap().run(&[]);
    assert!(outcome.outcomes.is_empty());
    assert_eq!(outcome.summary.documents, 0);
    assert!(outcome.summary.all_compliant());
}
