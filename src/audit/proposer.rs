//! Manual-Fix Proposer: drafts text for gaps that need a human.
//!
//! Drafts are built only from what the document already says (name,
//! description, headings, tool list) and are never applied.

use std::collections::BTreeMap;

use super::detector::tool_entries;
use super::document::{CanonicalSection, Document, ScalarStyle};
use super::fixer::FixRecord;
use super::rules::{
    ACTION_VERBS, DescriptionGap, FrontmatterField, FrontmatterGap, Gap, GapRecord, SectionGap,
    ToolScopeGap,
};
use super::templates::{
    TemplateContext, capability_summary, name_words, render_entry, render_section,
    render_section_body, skill_name, slugify, trigger_with_clause, use_when_clause,
};
use crate::config::FixerConfig;

/// Proposed text keyed by the gap it would close.
pub type Proposals = BTreeMap<Gap, String>;

const DEFAULT_TOOLS: &str = "Read, Grep, Glob";
const DEFAULT_VERSION: &str = "1.0.0";
const FALLBACK_VERB: &str = "manage";

/// Draft a proposal for every gap in `gaps`. Gaps with nothing sensible
/// to draft are left out of the map.
#[must_use]
pub fn propose_fixes(doc: &Document, gaps: &[GapRecord], settings: &FixerConfig) -> Proposals {
    let ctx = TemplateContext::from_document(doc);
    gaps.iter()
        .filter_map(|record| {
            draft(doc, &ctx, &record.code, settings).map(|text| (record.code.clone(), text))
        })
        .collect()
}

fn draft(doc: &Document, ctx: &TemplateContext, gap: &Gap, settings: &FixerConfig) -> Option<String> {
    let text = match gap {
        Gap::Section(SectionGap::Missing(section)) => render_section(*section, ctx),
        Gap::Section(SectionGap::Empty(section)) => render_section_body(*section, ctx),
        Gap::Section(SectionGap::NotStepByStep) => numbered_instructions(doc, ctx),
        Gap::Frontmatter(FrontmatterGap::Missing(field)) => field_entry(doc, ctx, *field, settings),
        Gap::Frontmatter(FrontmatterGap::AuthorMissingEmail) => {
            let author = doc.frontmatter().non_blank("author")?.trim();
            entry("author", &format!("{author} <{}>", contact_email(settings)))
        }
        Gap::Description(DescriptionGap::TooShort) => {
            let existing = doc.description()?;
            entry("description", &full_description(&ctx.skill_name, existing, doc))
        }
        Gap::Description(DescriptionGap::MissingActionVerbs) => {
            let existing = doc.description()?;
            let verb = capitalize(action_verb_for(&ctx.skill_name));
            let phrase = name_words(&ctx.skill_name).join(" ");
            entry("description", &format!("{verb} {phrase}. {existing}"))
        }
        Gap::Description(DescriptionGap::MissingUseWhen) => use_when_clause(&ctx.skill_name)?,
        Gap::Description(DescriptionGap::MissingTriggerWith) => {
            trigger_with_clause(&ctx.skill_name, &headings(doc))?
        }
        Gap::ToolScope(ToolScopeGap::Unscoped(tool)) => {
            let listed = doc.frontmatter().entry("allowed-tools").map(tool_entries)?;
            let scoped: Vec<String> = listed
                .into_iter()
                .map(|item| {
                    if item == *tool {
                        format!("{tool}({}:*)", tool.to_lowercase())
                    } else {
                        item
                    }
                })
                .collect();
            entry("allowed-tools", &scoped.join(", "))
        }
    };
    Some(text)
}

fn entry(key: &str, value: &str) -> String {
    render_entry(key, value, ScalarStyle::Plain, "\n")
}

fn headings(doc: &Document) -> Vec<&str> {
    doc.sections().iter().map(|s| s.title.as_str()).collect()
}

fn field_entry(
    doc: &Document,
    ctx: &TemplateContext,
    field: FrontmatterField,
    settings: &FixerConfig,
) -> String {
    let key = field.key();
    match field {
        FrontmatterField::Name => entry(key, &slugify(&ctx.skill_name)),
        FrontmatterField::Description => {
            let summary = overview_summary(doc).unwrap_or_default();
            entry(key, &full_description(&ctx.skill_name, &summary, doc))
        }
        FrontmatterField::AllowedTools => entry(key, DEFAULT_TOOLS),
        FrontmatterField::Version => entry(key, DEFAULT_VERSION),
        FrontmatterField::Author => entry(key, &settings.default_author),
        FrontmatterField::License => entry(key, &settings.default_license),
    }
}

/// `existing`, or a generic capability line, followed by both clauses.
fn full_description(name: &str, existing: &str, doc: &Document) -> String {
    let summary = capability_summary(existing);
    let opening = if summary.is_empty() {
        let verb = capitalize(action_verb_for(name));
        format!("{verb} {}.", name_words(name).join(" "))
    } else {
        format!("{summary}.")
    };
    let mut parts = vec![opening];
    parts.extend(use_when_clause(name));
    parts.extend(trigger_with_clause(name, &headings(doc)));
    parts.join(" ")
}

/// First sentence of the Overview section, if it has one.
fn overview_summary(doc: &Document) -> Option<String> {
    let section = doc.section(CanonicalSection::Overview)?;
    let first_line = doc
        .section_content(section)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?;
    Some(capability_summary(first_line))
}

/// The first catalog verb a name word starts with.
fn action_verb_for(name: &str) -> &'static str {
    let words = name_words(name);
    ACTION_VERBS
        .iter()
        .find(|verb| words.iter().any(|word| word.starts_with(*verb)))
        .copied()
        .unwrap_or(FALLBACK_VERB)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// The address inside `<...>` of the default author, or a placeholder.
fn contact_email(settings: &FixerConfig) -> &str {
    settings
        .default_author
        .split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(email, _)| email.trim())
        .filter(|email| email.contains('@'))
        .unwrap_or("maintainer@example.com")
}

/// Existing Instructions lines rewritten as a numbered list; falls back to
/// the section template when there is nothing to number.
fn numbered_instructions(doc: &Document, ctx: &TemplateContext) -> String {
    let steps: Vec<&str> = doc
        .section(CanonicalSection::Instructions)
        .map(|section| doc.section_content(section))
        .unwrap_or_default()
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '+']).trim())
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .collect();
    if steps.is_empty() {
        return render_section_body(CanonicalSection::Instructions, ctx);
    }
    steps
        .iter()
        .enumerate()
        .map(|(idx, step)| format!("{}. {step}\n", idx + 1))
        .collect()
}

/// Proposal entries for the fix log. `before` is the text a reviewer would
/// replace: the current section body or frontmatter line, else empty.
#[must_use]
pub fn proposal_records(doc: &Document, proposals: &Proposals) -> Vec<FixRecord> {
    proposals
        .iter()
        .map(|(gap, text)| FixRecord::proposed(gap.clone(), current_text(doc, gap), text.clone()))
        .collect()
}

fn current_text(doc: &Document, gap: &Gap) -> String {
    let key = match gap {
        Gap::Section(SectionGap::Empty(section)) => {
            return doc
                .section(*section)
                .map(|s| doc.section_content(s).trim().to_string())
                .unwrap_or_default();
        }
        Gap::Section(SectionGap::NotStepByStep) => {
            return doc
                .section(CanonicalSection::Instructions)
                .map(|s| doc.section_content(s).trim().to_string())
                .unwrap_or_default();
        }
        Gap::Section(SectionGap::Missing(_)) => return String::new(),
        Gap::Frontmatter(FrontmatterGap::Missing(field)) => field.key(),
        Gap::Frontmatter(FrontmatterGap::AuthorMissingEmail) => "author",
        Gap::Description(_) => "description",
        Gap::ToolScope(_) => "allowed-tools",
    };
    doc.frontmatter()
        .entry(key)
        .map(|entry| doc.slice(entry.span.clone()).to_string())
        .unwrap_or_default()
}

/// A review file collecting drafted sections: `(file_name, contents)`.
/// `None` when no section proposals exist.
#[must_use]
pub fn sections_review_file(doc: &Document, proposals: &Proposals) -> Option<(String, String)> {
    let sections: Vec<String> = proposals
        .iter()
        .filter_map(|(gap, text)| match gap {
            Gap::Section(SectionGap::Missing(_)) => Some(text.clone()),
            Gap::Section(SectionGap::Empty(section)) => Some(format!("## {section}\n\n{text}")),
            _ => None,
        })
        .collect();
    if sections.is_empty() {
        return None;
    }
    let name = skill_name(doc);
    let mut contents = format!(
        "# Missing Sections for {name}\n\nSkill: {}\n\n---\n\n",
        doc.path()
    );
    contents.push_str(&sections.join("\n"));
    Some((format!("{}-sections.md", slugify(&name)), contents))
}
