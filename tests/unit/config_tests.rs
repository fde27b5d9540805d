//! Configuration loading and its effect on the rule catalog.

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::rules::{FrontmatterField, Gap, RuleCatalog, Severity};
use skill_audit::audit::{BatchRunner, DocumentInput, FixAction, detect_gaps, parse_text};
use skill_audit::config::{Config, PROJECT_CONFIG_FILE};
use skill_audit::error::ErrorCode;
use skill_audit::test_utils::fixtures::{SkillDoc, UnitTestFixture};

#[test]
fn explicit_file_replaces_project_file() {
    let fixture = UnitTestFixture::new();
    fixture.create_file(PROJECT_CONFIG_FILE, "[fixer]\ndefault_license = \"Apache-2.0\"\n");
    let explicit = fixture.create_file("custom.toml", "[batch]\njobs = 3\n");

    let config = Config::load(Some(explicit.as_path()), &fixture.data_path).unwrap();
    assert_eq!(config.batch.jobs, 3);
    assert_eq!(config.fixer.default_license, "MIT");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let fixture = UnitTestFixture::new();
    let err = Config::load(Some(fixture.data_path.join("nope.toml").as_path()), &fixture.data_path)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
}

#[test]
fn section_threshold_override_changes_detection() {
    let config = Config::from_toml_str(
        "[rules]\nmin_section_chars = 20\n\n[rules.section_min_chars]\nOverview = 80\n",
    )
    .unwrap();
    let catalog = RuleCatalog::from_config(&config.rules).unwrap();
    let doc = parse_text("skills/csv-charts/SKILL.md", &SkillDoc::compliant().render());

    let gaps = detect_gaps(&doc, &catalog);
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].code, Gap::empty_section(CanonicalSection::Overview));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = Config::from_toml_str("[fixer]\nauthor = \"x\"\n").unwrap_err();
    assert_eq!(err.code().code_string(), "E302");
}

#[test]
fn default_author_without_email_never_regresses_extended_checks() {
    let config = Config::from_toml_str(
        "[rules]\nextended_checks = true\n\n[fixer]\ndefault_author = \"Jane Doe\"\n",
    )
    .unwrap();
    let runner = BatchRunner::from_config(&config).unwrap().with_jobs(1);
    let text = SkillDoc::compliant().without("author").render();
    let outcome = runner.audit_one(&DocumentInput::new("skills/csv-charts/SKILL.md", text));

    assert!(outcome.report.regressed_gaps.is_empty());
    assert!(outcome.revised_text.is_none());
    let author = outcome
        .report
        .residual_gaps
        .iter()
        .find(|gap| gap.code == Gap::missing_field(FrontmatterField::Author))
        .unwrap();
    assert_eq!(author.severity, Severity::ManualReview);
    assert_eq!(outcome.report.count_fixes(FixAction::Skipped), 1);
}
