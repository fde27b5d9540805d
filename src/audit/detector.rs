//! Gap Detector: evaluates the Rule Catalog against a parsed document.
//!
//! Output order is part of the contract: frontmatter gaps in field order,
//! then description gaps, then tool scoping, then section gaps in canonical
//! section order.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::document::{
    CanonicalSection, Document, FrontmatterEntry, FrontmatterState, ScalarStyle,
};
use super::rules::{
    DescriptionGap, FrontmatterField, FrontmatterGap, Gap, GapRecord, RuleCatalog, SectionGap,
};

static USE_WHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\buse\s+when\b").expect("valid regex"));
static TRIGGER_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btrigger\s+with\b").expect("valid regex"));
static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\d+[.)]\s|#{1,6}\s*step\s+\d+|\**step\s+\d+\s*[:.)])")
        .expect("valid regex")
});

/// Characters a description needs before it stops counting as too short.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// Evaluate every rule against `doc`. Pure and deterministic.
#[must_use]
pub fn detect_gaps(doc: &Document, catalog: &RuleCatalog) -> Vec<GapRecord> {
    let mut gaps = Vec::new();
    check_frontmatter(doc, catalog, &mut gaps);
    check_description(doc, catalog, &mut gaps);
    check_tools(doc, catalog, &mut gaps);
    check_sections(doc, catalog, &mut gaps);
    gaps
}

fn check_frontmatter(doc: &Document, catalog: &RuleCatalog, gaps: &mut Vec<GapRecord>) {
    let fm = doc.frontmatter();
    for field in FrontmatterField::ALL {
        let key = field.key();
        if fm.non_blank(key).is_some() {
            continue;
        }
        let detail = match (fm.state(), fm.entry(key)) {
            (FrontmatterState::Absent, _) => format!("no frontmatter block, so `{key}` is missing"),
            (FrontmatterState::Malformed, _) => {
                format!("frontmatter block is unparsable, so `{key}` is unreadable")
            }
            (FrontmatterState::Valid, Some(_)) => format!("`{key}` is blank"),
            (FrontmatterState::Valid, None) => format!("`{key}` is missing"),
        };
        gaps.push(GapRecord::new(Gap::missing_field(field), detail));
    }

    if catalog.extended_checks() {
        if let Some(author) = fm.non_blank(FrontmatterField::Author.key()) {
            if !author.contains('@') {
                gaps.push(GapRecord::new(
                    Gap::Frontmatter(FrontmatterGap::AuthorMissingEmail),
                    format!("author {:?} has no contact email", author.trim()),
                ));
            }
        }
    }
}

fn check_description(doc: &Document, catalog: &RuleCatalog, gaps: &mut Vec<GapRecord>) {
    let Some(description) = doc.description() else {
        return;
    };

    if catalog.extended_checks() {
        let chars = description.chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            gaps.push(GapRecord::new(
                Gap::Description(DescriptionGap::TooShort),
                format!("description has {chars} characters (minimum {MIN_DESCRIPTION_CHARS})"),
            ));
        }
    }
    if !USE_WHEN.is_match(description) {
        gaps.push(GapRecord::new(
            Gap::Description(DescriptionGap::MissingUseWhen),
            "description has no \"Use when\" clause",
        ));
    }
    if !TRIGGER_WITH.is_match(description) {
        gaps.push(GapRecord::new(
            Gap::Description(DescriptionGap::MissingTriggerWith),
            "description has no \"Trigger with\" clause",
        ));
    }
    if !has_action_verb(description, catalog.action_verbs()) {
        gaps.push(GapRecord::new(
            Gap::Description(DescriptionGap::MissingActionVerbs),
            "description uses no action verb (analyze, create, generate, validate, ...)",
        ));
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether any verb occurs as a word prefix. Multi-word verbs must match
/// consecutive words, the last one by prefix.
#[must_use]
pub fn has_action_verb(text: &str, verbs: &[String]) -> bool {
    let tokens = words(text);
    verbs.iter().any(|verb| {
        let parts = words(verb);
        let Some((last, leading)) = parts.split_last() else {
            return false;
        };
        tokens.windows(parts.len()).any(|window| {
            window[..leading.len()] == *leading && window[leading.len()].starts_with(last.as_str())
        })
    })
}

fn check_tools(doc: &Document, catalog: &RuleCatalog, gaps: &mut Vec<GapRecord>) {
    let Some(entry) = doc.frontmatter().entry(FrontmatterField::AllowedTools.key()) else {
        return;
    };
    let tools = tool_entries(entry);
    for tool in catalog.scopable_tools() {
        if tools.iter().any(|listed| listed == tool) {
            gaps.push(GapRecord::new(
                Gap::unscoped_tool(tool.clone()),
                format!("`{tool}` is allowed without a scope such as {tool}({}:*)", tool.to_lowercase()),
            ));
        }
    }
}

/// Tool names listed in an `allowed-tools` entry, trimmed.
#[must_use]
pub fn tool_entries(entry: &FrontmatterEntry) -> Vec<String> {
    if entry.style == ScalarStyle::Nested {
        if let Some(inner) = flow_sequence(&entry.value) {
            let list = &entry.value[inner];
            return split_tool_list(list)
                .into_iter()
                .map(|span| unquote(&list[span]).to_string())
                .filter(|item| !item.is_empty())
                .collect();
        }
        return entry
            .value
            .lines()
            .filter_map(|line| line.trim().strip_prefix('-'))
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
    }
    split_tool_list(&entry.value)
        .into_iter()
        .map(|span| entry.value[span].to_string())
        .collect()
}

/// Inner range of a single-line flow sequence such as `[Read, Bash]`.
#[must_use]
pub fn flow_sequence(value: &str) -> Option<Range<usize>> {
    let trimmed = value.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return None;
    }
    let start = value.len() - value.trim_start().len() + 1;
    Some(start..start + trimmed.len() - 2)
}

/// Item text without surrounding YAML quotes.
#[must_use]
pub fn unquote(item: &str) -> &str {
    item.trim_matches(['"', '\''])
}

/// Byte ranges of the trimmed, non-empty comma-separated items in `value`.
/// Commas inside parentheses do not split.
#[must_use]
pub fn split_tool_list(value: &str) -> Vec<Range<usize>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    let mut push = |items: &mut Vec<Range<usize>>, start: usize, end: usize| {
        let raw = &value[start..end];
        let lead = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            items.push(start + lead..start + lead + trimmed.len());
        }
    };

    for (idx, ch) in value.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push(&mut items, start, idx);
                start = idx + 1;
            }
            _ => {}
        }
    }
    push(&mut items, start, value.len());
    items
}

fn check_sections(doc: &Document, catalog: &RuleCatalog, gaps: &mut Vec<GapRecord>) {
    for section in CanonicalSection::ALL {
        match doc.section(section) {
            None => gaps.push(GapRecord::new(
                Gap::missing_section(section),
                format!("no `## {section}` section"),
            )),
            Some(found) => {
                let chars = doc.section_content(found).trim().chars().count();
                let min = catalog.min_chars_for(section);
                if chars < min {
                    gaps.push(GapRecord::new(
                        Gap::empty_section(section),
                        format!("`## {section}` has {chars} characters (minimum {min})"),
                    ));
                }
            }
        }
    }

    if catalog.extended_checks() {
        if let Some(instructions) = doc.section(CanonicalSection::Instructions) {
            if !STEP_MARKER.is_match(doc.section_content(instructions)) {
                gaps.push(GapRecord::new(
                    Gap::Section(SectionGap::NotStepByStep),
                    "`## Instructions` has no numbered steps",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::parser::parse_text;
    use crate::config::RulesConfig;
    use crate::test_utils::fixtures::{SkillDoc, compliant_skill};

    fn codes(text: &str) -> Vec<String> {
        let doc = parse_text("t/SKILL.md", text);
        detect_gaps(&doc, RuleCatalog::standard())
            .into_iter()
            .map(|gap| gap.code.code())
            .collect()
    }

    fn extended() -> RuleCatalog {
        RuleCatalog::from_config(&RulesConfig {
            extended_checks: true,
            ..RulesConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn compliant_document_has_no_gaps() {
        assert!(codes(&compliant_skill()).is_empty());
    }

    #[test]
    fn missing_author_and_license() {
        let text = SkillDoc::compliant().without("author").without("license").render();
        assert_eq!(
            codes(&text),
            ["frontmatter_missing:author", "frontmatter_missing:license"]
        );
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let text = SkillDoc::compliant().set("version", "\"\"").render();
        assert_eq!(codes(&text), ["frontmatter_missing:version"]);
    }

    #[test]
    fn absent_frontmatter_reports_every_field_then_description_is_skipped() {
        let text = SkillDoc::compliant().render_body_only();
        let found = codes(&text);
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|code| code.starts_with("frontmatter_missing:")));
    }

    #[test]
    fn description_clauses() {
        let text = SkillDoc::compliant()
            .set("description", "Create charts from CSV files.")
            .render();
        assert_eq!(
            codes(&text),
            ["description_missing:use_when", "description_missing:trigger_with"]
        );
    }

    #[test]
    fn clause_detection_is_case_insensitive_and_word_bounded() {
        let text = SkillDoc::compliant()
            .set("description", "Create charts. use WHEN plotting. trigger  with \"chart\".")
            .render();
        assert!(codes(&text).is_empty());

        let text = SkillDoc::compliant()
            .set("description", "Create charts. Reuse whenever. Trigger with \"chart\".")
            .render();
        assert_eq!(codes(&text), ["description_missing:use_when"]);
    }

    #[test]
    fn action_verbs_match_word_prefixes() {
        let verbs: Vec<String> = crate::audit::rules::ACTION_VERBS
            .iter()
            .map(|v| (*v).to_string())
            .collect();
        assert!(has_action_verb("Tracks prices", &verbs));
        assert!(has_action_verb("Helps you set up CI", &verbs));
        assert!(!has_action_verb("A helper for upsets", &verbs));
        assert!(!has_action_verb("Crypto prices at a glance", &verbs));
    }

    #[test]
    fn missing_action_verb() {
        let text = SkillDoc::compliant()
            .set(
                "description",
                "Crypto prices at a glance. Use when checking markets. Trigger with \"prices\".",
            )
            .render();
        assert_eq!(codes(&text), ["description_missing:action_verbs"]);
    }

    #[test]
    fn bare_bash_is_unscoped() {
        let text = SkillDoc::compliant().set("allowed-tools", "Read, Write, Bash").render();
        assert_eq!(codes(&text), ["unscoped_tool:Bash"]);

        let text = SkillDoc::compliant()
            .set("allowed-tools", "Read, Bash(git:*), Bash(npm run, test:*)")
            .render();
        assert!(codes(&text).is_empty());
    }

    #[test]
    fn nested_tool_list_is_checked() {
        let text = SkillDoc::compliant()
            .set("allowed-tools", "\n  - Read\n  - Bash")
            .render();
        assert_eq!(codes(&text), ["unscoped_tool:Bash"]);
    }

    #[test]
    fn flow_sequence_tool_list_is_checked() {
        let text = SkillDoc::compliant()
            .set("allowed-tools", "[Read, \"Bash\"]")
            .render();
        assert_eq!(codes(&text), ["unscoped_tool:Bash"]);

        let scoped = SkillDoc::compliant()
            .set("allowed-tools", "[Read, Bash(git:*)]")
            .render();
        assert!(codes(&scoped).is_empty());
    }

    #[test]
    fn split_tool_list_respects_parentheses() {
        let value = " Read ,Bash(a, b),, Grep";
        let items: Vec<&str> = split_tool_list(value).into_iter().map(|r| &value[r]).collect();
        assert_eq!(items, ["Read", "Bash(a, b)", "Grep"]);
    }

    #[test]
    fn missing_and_empty_sections() {
        let text = SkillDoc::compliant()
            .without_section(CanonicalSection::Examples)
            .section(CanonicalSection::Prerequisites, "TBD")
            .render();
        assert_eq!(
            codes(&text),
            ["empty_section:Prerequisites", "missing_section:Examples"]
        );
    }

    #[test]
    fn per_section_threshold() {
        let mut config = RulesConfig::default();
        config.section_min_chars.insert("Prerequisites".into(), 2);
        let catalog = RuleCatalog::from_config(&config).unwrap();
        let text = SkillDoc::compliant()
            .section(CanonicalSection::Prerequisites, "TBD")
            .render();
        let doc = parse_text("t/SKILL.md", &text);
        assert!(detect_gaps(&doc, &catalog).is_empty());
    }

    #[test]
    fn extended_checks_are_off_by_default() {
        let text = SkillDoc::compliant()
            .set("author", "Jane")
            .section(CanonicalSection::Instructions, "Just read the docs and do the thing.")
            .render();
        assert!(codes(&text).is_empty());

        let doc = parse_text("t/SKILL.md", &text);
        let found: Vec<String> = detect_gaps(&doc, &extended())
            .into_iter()
            .map(|gap| gap.code.code())
            .collect();
        assert_eq!(found, ["author_missing:email", "instructions:not_step_by_step"]);
    }

    #[test]
    fn step_markers_satisfy_step_by_step() {
        let catalog = extended();
        for body in [
            "1. Open the file\n2. Run it",
            "### Step 1: Prepare\nthen go",
            "**Step 1:** prepare everything first",
        ] {
            let text = SkillDoc::compliant()
                .section(CanonicalSection::Instructions, body)
                .render();
            let doc = parse_text("t/SKILL.md", &text);
            assert!(detect_gaps(&doc, &catalog).is_empty(), "{body}");
        }
    }

    #[test]
    fn detection_is_deterministic() {
        let text = SkillDoc::compliant()
            .without("license")
            .set("allowed-tools", "Bash")
            .without_section(CanonicalSection::Output)
            .render();
        let doc = parse_text("t/SKILL.md", &text);
        let first = detect_gaps(&doc, RuleCatalog::standard());
        let second = detect_gaps(&doc, RuleCatalog::standard());
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|g| g.code.code()).collect::<Vec<_>>(),
            ["frontmatter_missing:license", "unscoped_tool:Bash", "missing_section:Output"]
        );
    }
}
