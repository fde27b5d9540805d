//! Snapshot of the batch summary for a mixed batch.

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::{BatchRunner, DocumentInput};
use skill_audit::config::Config;
use skill_audit::test_utils::fixtures::SkillDoc;

#[test]
fn mixed_batch_summary() {
    let runner = BatchRunner::from_config(&Config::default())
        .unwrap()
        .with_jobs(2);
    let outcome = runner.run(&[
        DocumentInput::new("skills/clean/SKILL.md", SkillDoc::compliant().render()),
        DocumentInput::new(
            "skills/bash/SKILL.md",
            SkillDoc::compliant()
                .set("allowed-tools", "Read, Write, Bash")
                .render(),
        ),
        DocumentInput::new(
            "skills/examples/SKILL.md",
            SkillDoc::compliant()
                .without_section(CanonicalSection::Examples)
                .render(),
        ),
        DocumentInput::new("skills/broken/SKILL.md", vec![0xff, 0xfe]),
    ]);

    insta::assert_json_snapshot!(outcome.summary, @r#"
    {
      "documents": 4,
      "clean": 1,
      "fixed": 1,
      "needsReview": 1,
      "parseErrors": 1,
      "totalGaps": 2,
      "autoFixed": 1,
      "skipped": 0,
      "proposed": 1,
      "residual": 1,
      "regressions": 0,
      "compliantPct": 50.0,
      "targetCompliant": 3,
      "gapToTarget": 1,
      "topGaps": [
        {
          "code": "missing_section:Examples",
          "count": 1
        },
        {
          "code": "unscoped_tool:Bash",
          "count": 1
        }
      ],
      "byCategory": {
        "standalone": {
          "total": 4,
          "compliant": 2,
          "needsReview": 1,
          "parseErrors": 1
        }
      }
    }
    "#);
}
