//! proptest strategies for SKILL.md documents with realistic gaps.

use proptest::prelude::*;

use crate::audit::document::CanonicalSection;
use crate::test_utils::fixtures::SkillDoc;

const FIELDS: [&str; 6] = ["name", "description", "allowed-tools", "version", "author", "license"];

fn arb_description() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Generate charts from CSV files. Use when visualizing tabular data. Trigger with \"plot csv\"."),
        Just("Generate charts from CSV files."),
        Just("Charts for spreadsheets."),
        Just("\"Generate charts: bar, line and pie.\""),
        Just("Deploy dashboards. use when shipping reports."),
        Just(">\n  Generate charts from CSV files.\n  Handles large inputs."),
        Just("\"\""),
    ]
}

fn arb_tools() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Read, Write, Bash(python:*)"),
        Just("Read, Write, Bash"),
        Just("Bash"),
        Just("Read, Bash, Grep"),
        Just("Read, Grep, Glob"),
    ]
}

fn arb_section_body() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        4 => Just(None),
        1 => Just(Some("TBD")),
        1 => Just(Some("")),
        1 => Just(Some("```\n## not a heading\n```")),
    ]
}

/// A document derived from the compliant fixture by dropping fields,
/// swapping values and removing or emptying sections.
pub fn arb_skill_doc() -> impl Strategy<Value = SkillDoc> {
    (
        prop::collection::vec(any::<bool>(), FIELDS.len()),
        arb_description(),
        arb_tools(),
        prop::collection::vec(any::<bool>(), CanonicalSection::ALL.len()),
        prop::collection::vec(arb_section_body(), CanonicalSection::ALL.len()),
    )
        .prop_map(|(drop_field, description, tools, drop_section, bodies)| {
            let mut doc = SkillDoc::compliant()
                .set("description", description)
                .set("allowed-tools", tools);
            for (field, drop) in FIELDS.iter().zip(drop_field) {
                if drop {
                    doc = doc.without(field);
                }
            }
            for ((section, drop), body) in CanonicalSection::ALL.into_iter().zip(drop_section).zip(bodies) {
                doc = match (drop, body) {
                    (true, _) => doc.without_section(section),
                    (false, Some(body)) => doc.section(section, body),
                    (false, None) => doc,
                };
            }
            doc
        })
}

/// Rendered document text, with or without a frontmatter block.
pub fn arb_skill_text() -> impl Strategy<Value = String> {
    (arb_skill_doc(), prop::bool::weighted(0.9)).prop_map(|(doc, with_frontmatter)| {
        if with_frontmatter {
            doc.render()
        } else {
            doc.render_body_only()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::detector::detect_gaps;
    use crate::audit::fixer::AutoFixer;
    use crate::audit::parser::parse_text;
    use crate::audit::rules::RuleCatalog;
    use crate::config::FixerConfig;

    const PATH: &str = "skills/csv-charts/SKILL.md";

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn detection_is_deterministic(text in arb_skill_text()) {
            let catalog = RuleCatalog::standard();
            let first = detect_gaps(&parse_text(PATH, &text), catalog);
            let second = detect_gaps(&parse_text(PATH, &text), catalog);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn fixing_twice_changes_nothing(text in arb_skill_text()) {
            let catalog = RuleCatalog::standard();
            let settings = FixerConfig::default();
            let fixer = AutoFixer::new(catalog, &settings);
            let once = fixer.fix_until_stable(&parse_text(PATH, &text));
            let twice = fixer.fix_until_stable(&once.document);
            prop_assert_eq!(once.document.raw_text(), twice.document.raw_text());
            prop_assert!(twice.applied().next().is_none());
        }
    }
}
