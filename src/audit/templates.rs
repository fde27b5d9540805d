//! Drafting helpers shared by the Auto-Fixer and the Manual-Fix Proposer.
//!
//! Everything here is a pure function of text already in the document: the
//! skill name, its description, section headings and the tool list.

use super::document::{CanonicalSection, Document, ScalarStyle};
use super::detector::tool_entries;

#[derive(Debug, Clone, Copy)]
pub struct SectionTemplate {
    pub section: CanonicalSection,
    pub body: &'static str,
}

/// Boilerplate bodies for each canonical section. Placeholders:
/// `{skill_name}`, `{capability_summary}`, `{tool_list}`.
pub const SECTION_TEMPLATES: &[SectionTemplate] = &[
    SectionTemplate {
        section: CanonicalSection::Overview,
        body: r"{skill_name}: {capability_summary}.

Key capabilities:
- <capability>
- <capability>
",
    },
    SectionTemplate {
        section: CanonicalSection::Prerequisites,
        body: r"- Access to the allowed tools: {tool_list}
- Environment configuration (if applicable)
- Authentication credentials (if applicable)
",
    },
    SectionTemplate {
        section: CanonicalSection::Instructions,
        body: r"1. Analyze the request to understand requirements
2. Execute the primary operation
3. Validate the output
4. Report results to the user
",
    },
    SectionTemplate {
        section: CanonicalSection::Output,
        body: r"- Primary artifact or result
- Status report
- Any generated files or data
",
    },
    SectionTemplate {
        section: CanonicalSection::ErrorHandling,
        body: r"| Error | Cause | Solution |
|-------|-------|----------|
| Configuration error | Missing setup | Check prerequisites |
| Validation failure | Invalid input | Review input format |
| Execution error | Runtime issue | Check logs for details |
",
    },
    SectionTemplate {
        section: CanonicalSection::Examples,
        body: r#"**Example: Basic usage**
Request: "Run {skill_name} for a standard scenario"
Result: <expected output>

**Example: Advanced usage**
Request: "Run {skill_name} with custom parameters"
Result: <expected output>
"#,
    },
    SectionTemplate {
        section: CanonicalSection::Resources,
        body: r"- <link to relevant documentation>
- <link to API reference>
",
    },
];

#[must_use]
pub fn section_template(section: CanonicalSection) -> &'static SectionTemplate {
    SECTION_TEMPLATES
        .iter()
        .find(|template| template.section == section)
        .unwrap_or(&SECTION_TEMPLATES[0])
}

/// Values substituted into section templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub skill_name: String,
    pub capability_summary: String,
    pub tool_list: String,
}

impl TemplateContext {
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let skill_name = skill_name(doc);
        let capability_summary = doc
            .description()
            .map(capability_summary)
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| "specialized functionality".to_string());
        let tool_list = doc
            .frontmatter()
            .entry("allowed-tools")
            .map(tool_entries)
            .filter(|tools| !tools.is_empty())
            .map_or_else(|| "<tools>".to_string(), |tools| tools.join(", "));
        Self {
            skill_name,
            capability_summary,
            tool_list,
        }
    }
}

#[must_use]
pub fn render_section_body(section: CanonicalSection, ctx: &TemplateContext) -> String {
    section_template(section)
        .body
        .replace("{skill_name}", &ctx.skill_name)
        .replace("{capability_summary}", &ctx.capability_summary)
        .replace("{tool_list}", &ctx.tool_list)
}

/// Heading plus body, ready to paste into a document.
#[must_use]
pub fn render_section(section: CanonicalSection, ctx: &TemplateContext) -> String {
    format!("## {section}\n\n{}", render_section_body(section, ctx))
}

/// Name used in drafts: frontmatter `name`, else the skill directory, else
/// the first H1.
#[must_use]
pub fn skill_name(doc: &Document) -> String {
    if let Some(name) = doc.name() {
        return name.to_string();
    }
    if let Some(dir) = skill_dir_name(doc.path()) {
        return dir;
    }
    doc.preamble()
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map_or_else(|| "this skill".to_string(), str::to_string)
}

/// Parent directory of a `SKILL.md` path.
#[must_use]
pub fn skill_dir_name(path: &str) -> Option<String> {
    let mut parts = path.rsplit(['/', '\\']).filter(|part| !part.is_empty());
    let file = parts.next()?;
    if !file.eq_ignore_ascii_case("SKILL.md") {
        return None;
    }
    parts.next().map(str::to_string)
}

/// Lowercase alphanumeric words of a name or heading.
#[must_use]
pub fn name_words(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Lowercase URL-safe slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    name_words(text).join("-")
}

/// Description text before any "Use when"/"Trigger with" clause, first
/// sentence only, without the final period.
#[must_use]
pub fn capability_summary(description: &str) -> String {
    let lower = description.to_ascii_lowercase();
    let cut = ["use when", "trigger with"]
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min()
        .unwrap_or(description.len());
    let head = description[..cut].trim();
    let sentence = head
        .find(". ")
        .map_or(head, |idx| &head[..idx])
        .trim_end_matches('.')
        .trim();
    sentence.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_word(words: &[String], stem: &str) -> bool {
    words.iter().any(|word| word.starts_with(stem))
}

/// Words left after dropping the action stems, or all words if none remain.
fn subject(words: &[String], stems: &[&str]) -> String {
    let rest: Vec<&str> = words
        .iter()
        .filter(|word| !stems.iter().any(|stem| word.starts_with(stem)))
        .map(String::as_str)
        .collect();
    if rest.is_empty() {
        words.join(" ")
    } else {
        rest.join(" ")
    }
}

/// `Use when {scenario}.` derived from the skill name alone.
#[must_use]
pub fn use_when_clause(name: &str) -> Option<String> {
    let words = name_words(name);
    if words.is_empty() {
        return None;
    }
    let phrase = words.join(" ");
    let scenario = if has_word(&words, "api") {
        "working with APIs or building integrations".to_string()
    } else if has_word(&words, "test") {
        format!("writing or running tests for {phrase}")
    } else if has_word(&words, "deploy") {
        "deploying applications or services".to_string()
    } else if has_word(&words, "config") {
        "configuring systems or services".to_string()
    } else if has_word(&words, "monitor") {
        "monitoring systems or services".to_string()
    } else if has_word(&words, "debug") {
        "debugging issues or troubleshooting".to_string()
    } else if has_word(&words, "create") || has_word(&words, "generat") {
        format!("creating or generating {}", subject(&words, &["create", "generat"]))
    } else if has_word(&words, "analy") || has_word(&words, "audit") {
        format!("analyzing or auditing {}", subject(&words, &["analy", "audit"]))
    } else {
        format!("working with {phrase}")
    };
    Some(format!("Use when {scenario}."))
}

/// Up to three trigger phrases from the name and related section headings.
#[must_use]
pub fn trigger_phrases(name: &str, headings: &[&str]) -> Vec<String> {
    let words = name_words(name);
    let Some(first) = words.first() else {
        return Vec::new();
    };
    let mut phrases = vec![words.join(" ")];

    if let Some(last) = words.last().filter(|_| words.len() >= 2) {
        phrases.push(format!("{first} {last}"));
    }
    for action in ["create", "analyze", "deploy"] {
        if words.len() > 1 && words.iter().any(|word| word == action) {
            let rest: Vec<&str> = words
                .iter()
                .filter(|word| *word != action)
                .map(String::as_str)
                .collect();
            phrases.push(format!("{action} {}", rest.join(" ")));
            break;
        }
    }
    for heading in headings {
        let heading_words = name_words(heading);
        if heading_words.iter().any(|word| words.contains(word)) {
            phrases.push(heading_words.join(" "));
        }
    }
    phrases.push(first.clone());

    let mut unique: Vec<String> = Vec::new();
    for phrase in phrases {
        if !phrase.is_empty() && !unique.contains(&phrase) {
            unique.push(phrase);
        }
    }
    unique.truncate(3);
    unique
}

/// `Trigger with phrases like "a", "b", or "c".`
#[must_use]
pub fn trigger_with_clause(name: &str, headings: &[&str]) -> Option<String> {
    let quoted: Vec<String> = trigger_phrases(name, headings)
        .iter()
        .map(|phrase| format!("\"{phrase}\""))
        .collect();
    let list = match quoted.as_slice() {
        [] => return None,
        [one] => one.clone(),
        [a, b] => format!("{a} or {b}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    };
    Some(format!("Trigger with phrases like {list}."))
}

const RESERVED_PLAIN: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "~"];

/// Whether `value` survives as a YAML plain scalar and decodes to the
/// same string.
#[must_use]
pub fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if first.is_whitespace()
        || "-?:,[]{}#&*!|>'\"%@`".contains(first)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.contains(['\n', '\r', '\t'])
    {
        return false;
    }
    let lower = value.to_lowercase();
    !(RESERVED_PLAIN.contains(&lower.as_str()) || value.parse::<f64>().is_ok())
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Render `value` as an inline YAML scalar, keeping `style` when it can
/// represent the value.
#[must_use]
pub fn yaml_scalar(value: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::SingleQuoted if !value.contains(['\n', '\r']) => {
            format!("'{}'", value.replace('\'', "''"))
        }
        ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => double_quoted(value),
        ScalarStyle::Plain | ScalarStyle::Block | ScalarStyle::Nested => {
            if is_plain_safe(value) {
                value.to_string()
            } else {
                double_quoted(value)
            }
        }
    }
}

/// A complete `key: value` frontmatter line.
#[must_use]
pub fn render_entry(key: &str, value: &str, style: ScalarStyle, eol: &str) -> String {
    format!("{key}: {}{eol}", yaml_scalar(value, style))
}
