use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{TempDir, tempdir};

use skill_audit::audit::document::CanonicalSection;
use skill_audit::test_utils::fixtures::SkillDoc;

fn skill_audit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skill-audit").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("SKILL_AUDIT_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    write(dir.path(), "skills/clean/SKILL.md", SkillDoc::compliant().render());
    write(
        dir.path(),
        "skills/unlicensed/SKILL.md",
        SkillDoc::compliant().without("license").render(),
    );
    write(
        dir.path(),
        "plugins/saas-packs/stripe/skills/charge/SKILL.md",
        SkillDoc::compliant()
            .without_section(CanonicalSection::Examples)
            .render(),
    );
    dir
}

#[test]
fn test_cli_help() {
    let dir = tempdir().unwrap();
    skill_audit(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let dir = tempdir().unwrap();
    skill_audit(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_report_never_writes() {
    let dir = workspace();
    let before = std::fs::read_to_string(dir.path().join("skills/unlicensed/SKILL.md")).unwrap();

    let output = skill_audit(dir.path())
        .args(["-m", "report", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["summary"]["documents"], 3);
    assert_eq!(json["data"]["reports"].as_array().unwrap().len(), 3);
    // Highest priority first.
    assert_eq!(
        json["data"]["reports"][0]["path"],
        "plugins/saas-packs/stripe/skills/charge/SKILL.md"
    );

    let after = std::fs::read_to_string(dir.path().join("skills/unlicensed/SKILL.md")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_report_hides_clean_documents_by_default() {
    let dir = workspace();
    skill_audit(dir.path())
        .args(["--plain", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skills/unlicensed/SKILL.md"))
        .stdout(predicate::str::contains("skills/clean/SKILL.md").not());
}

#[test]
fn test_fix_writes_revised_documents() {
    let dir = workspace();
    skill_audit(dir.path())
        .args(["--plain", "fix", "--jobs", "2"])
        .assert()
        .success();

    let fixed = std::fs::read_to_string(dir.path().join("skills/unlicensed/SKILL.md")).unwrap();
    assert!(fixed.contains("\nlicense: MIT\n"));
    let untouched = std::fs::read_to_string(
        dir.path()
            .join("plugins/saas-packs/stripe/skills/charge/SKILL.md"),
    )
    .unwrap();
    assert!(!untouched.contains("## Examples"));
}

#[test]
fn test_fix_dry_run_with_diff() {
    let dir = workspace();
    let path = dir.path().join("skills/unlicensed/SKILL.md");
    let before = std::fs::read_to_string(&path).unwrap();

    skill_audit(dir.path())
        .args(["--color", "never", "fix", "--dry-run", "--diff", "skills"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+license: MIT"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_fix_check_fails_when_review_needed() {
    let dir = workspace();
    let output = skill_audit(dir.path())
        .args(["-m", "fix", "--check", "--dry-run"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    // Report envelope first, then the error envelope.
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"VALIDATION_FAILED\""));
    assert!(stdout.contains("\"numeric_code\": 801") || stdout.contains("\"numeric_code\":801"));
}

#[test]
fn test_fix_check_passes_when_all_fixable() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "skills/a/SKILL.md",
        SkillDoc::compliant().set("allowed-tools", "Read, Bash").render(),
    );
    skill_audit(dir.path())
        .args(["-q", "fix", "--check"])
        .assert()
        .success();
    let fixed = std::fs::read_to_string(dir.path().join("skills/a/SKILL.md")).unwrap();
    assert!(fixed.contains("allowed-tools: Read, Bash(bash:*)\n"));
}

#[test]
fn test_parse_error_does_not_stop_the_batch() {
    let dir = workspace();
    write(dir.path(), "skills/broken/SKILL.md", [b'#', 0xff, 0xfe, b'\n']);

    let output = skill_audit(dir.path())
        .args(["-O", "jsonl", "report", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    let broken: Vec<&Value> = lines
        .iter()
        .filter(|r| r["status"] == "parse-error")
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0]["priority"], "critical");
}

#[test]
fn test_propose_writes_review_files() {
    let dir = workspace();
    let out = dir.path().join("review");
    skill_audit(dir.path())
        .args(["propose", "--output"])
        .arg(&out)
        .assert()
        .success();

    let review = std::fs::read_to_string(out.join("csv-charts-sections.md")).unwrap();
    assert!(review.starts_with("# Missing Sections for csv-charts\n"));
    assert!(review.contains("## Examples"));

    // Proposals are never applied to the skill itself.
    let skill = std::fs::read_to_string(
        dir.path()
            .join("plugins/saas-packs/stripe/skills/charge/SKILL.md"),
    )
    .unwrap();
    assert!(!skill.contains("## Examples"));
}

#[test]
fn test_missing_path_is_structured_error() {
    let dir = tempdir().unwrap();
    let output = skill_audit(dir.path())
        .args(["-m", "report", "does-not-exist"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"]["error"]["code"], "DOCUMENT_NOT_FOUND");
    assert_eq!(json["status"]["error"]["numeric_code"], 101);
}

#[test]
fn test_rules_lists_catalog() {
    let dir = tempdir().unwrap();
    skill_audit(dir.path())
        .args(["-O", "tsv", "rules"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("code\tcategory\tseverity"))
        .stdout(predicate::str::contains("unscoped_tool:Bash\ttool_scope\tauto-fixable"));
}

#[test]
fn test_project_config_is_applied() {
    let dir = workspace();
    write(
        dir.path(),
        ".skill-audit.toml",
        "[fixer]\ndefault_license = \"Apache-2.0\"\n",
    );
    skill_audit(dir.path()).args(["-q", "fix"]).assert().success();
    let fixed = std::fs::read_to_string(dir.path().join("skills/unlicensed/SKILL.md")).unwrap();
    assert!(fixed.contains("\nlicense: Apache-2.0\n"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = workspace();
    write(dir.path(), ".skill-audit.toml", "[fixer]\nmax_passes = 0\n");
    skill_audit(dir.path())
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E302"));
}

#[test]
fn test_report_csv_to_output_file() {
    let dir = workspace();
    skill_audit(dir.path())
        .args(["-O", "csv", "report", "--all", "--output", "gaps.csv"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let csv = std::fs::read_to_string(dir.path().join("gaps.csv")).unwrap();
    insta::assert_snapshot!(csv.trim_end(), @r"
    path,status,priority,category,gaps,auto_fixed,residual,codes
    plugins/saas-packs/stripe/skills/charge/SKILL.md,needs-review,high,saas-packs,1,0,1,missing_section:Examples
    skills/clean/SKILL.md,clean,none,standalone,0,0,0,
    skills/unlicensed/SKILL.md,fixed,none,standalone,1,1,0,
    ");
}

#[test]
fn test_report_json_summary_has_compliance_target() {
    let dir = workspace();
    let out = dir.path().join("report.json");
    skill_audit(dir.path())
        .args(["-m", "report", "--output"])
        .arg(&out)
        .assert()
        .success();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let summary = &json["data"]["summary"];
    assert_eq!(summary["documents"], 3);
    assert_eq!(summary["targetCompliant"], 2);
    assert_eq!(summary["gapToTarget"], 0);
}

#[test]
fn test_propose_keeps_same_named_skills_apart() {
    let dir = tempdir().unwrap();
    let gappy = SkillDoc::compliant()
        .without_section(CanonicalSection::Examples)
        .render();
    write(dir.path(), "plugins/devops/a/skills/charts/SKILL.md", &gappy);
    write(dir.path(), "skills/charts/SKILL.md", &gappy);

    let out = dir.path().join("review");
    skill_audit(dir.path())
        .args(["-q", "propose", "--output"])
        .arg(&out)
        .assert()
        .success();

    let mut names: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["csv-charts-sections.md", "standalone-csv-charts-sections.md"]);
}

#[test]
fn test_rules_csv() {
    let dir = tempdir().unwrap();
    skill_audit(dir.path())
        .args(["-O", "csv", "rules"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("code,category,severity,description\n"))
        .stdout(predicate::str::contains("unscoped_tool:Bash,tool_scope,auto-fixable,"));
}
