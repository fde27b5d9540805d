//! Auto-Fixer: deterministic, content-preserving edits for auto-fixable gaps.
//!
//! Every edit is a byte-range splice on the source text followed by a fresh
//! parse, so the original [`Document`] is never mutated. Whether a gap is
//! still open is decided by re-running the detector before each edit, which
//! makes repeated application a no-op.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::detector::{detect_gaps, flow_sequence, split_tool_list, unquote};
use super::document::{Document, FrontmatterEntry, FrontmatterState, ScalarStyle};
use super::parser::parse_text;
use super::rules::{DescriptionGap, FrontmatterField, FrontmatterGap, Gap, GapRecord, RuleCatalog, ToolScopeGap};
use super::templates::{render_entry, trigger_with_clause, use_when_clause};
use crate::config::FixerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAction {
    AutoApplied,
    ProposedPendingApproval,
    Skipped,
}

/// One entry in a document's fix log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRecord {
    pub gap_code: Gap,
    pub action: FixAction,
    /// Replaced text; empty for pure insertions.
    pub before: String,
    pub after: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FixRecord {
    #[must_use]
    pub const fn applied(gap_code: Gap, before: String, after: String) -> Self {
        Self {
            gap_code,
            action: FixAction::AutoApplied,
            before,
            after,
            reason: None,
        }
    }

    #[must_use]
    pub const fn proposed(gap_code: Gap, before: String, after: String) -> Self {
        Self {
            gap_code,
            action: FixAction::ProposedPendingApproval,
            before,
            after,
            reason: None,
        }
    }

    #[must_use]
    pub fn skipped(gap_code: Gap, reason: &FixSkipped) -> Self {
        Self {
            gap_code,
            action: FixAction::Skipped,
            before: String::new(),
            after: String::new(),
            reason: Some(reason.to_string()),
        }
    }
}

/// Why an auto-fixable gap was left for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixSkipped {
    #[error("document has no frontmatter block to edit")]
    NoFrontmatter,
    #[error("frontmatter block is unparsable")]
    MalformedFrontmatter,
    #[error("`{0}` is not a value that can be rewritten in place")]
    UnsupportedValue(String),
    #[error("no `name` to derive the clause from")]
    NoName,
    #[error("`{0}` not found as a bare entry in allowed-tools")]
    ToolNotFound(String),
    #[error("edit would change frontmatter beyond `{0}`")]
    WouldCorrupt(String),
    #[error("setting `{key}` would open `{gap}`")]
    WouldOpenGap { key: String, gap: String },
    #[error("`{0}` has no automatic fix")]
    NotAutoFixable(String),
}

/// Result of running the fixer over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub document: Document,
    pub fixes: Vec<FixRecord>,
}

impl FixOutcome {
    pub fn applied(&self) -> impl Iterator<Item = &FixRecord> {
        self.fixes
            .iter()
            .filter(|fix| fix.action == FixAction::AutoApplied)
    }

    /// Gaps whose fix was skipped and therefore need a human.
    #[must_use]
    pub fn skipped_gaps(&self) -> BTreeSet<Gap> {
        self.fixes
            .iter()
            .filter(|fix| fix.action == FixAction::Skipped)
            .map(|fix| fix.gap_code.clone())
            .collect()
    }
}

/// A splice on the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    span: Range<usize>,
    replacement: String,
    check: Check,
}

/// Post-condition verified on the re-parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Check {
    Equals { key: String, value: String },
    Contains { key: String, fragment: String },
}

impl Check {
    fn key(&self) -> &str {
        match self {
            Self::Equals { key, .. } | Self::Contains { key, .. } => key,
        }
    }

    fn holds(&self, doc: &Document) -> bool {
        if doc.frontmatter().state() != FrontmatterState::Valid {
            return false;
        }
        match self {
            Self::Equals { key, value } => doc.frontmatter().get(key) == Some(value.as_str()),
            Self::Contains { key, fragment } => doc
                .frontmatter()
                .get(key)
                .is_some_and(|current| current.contains(fragment.as_str())),
        }
    }
}

pub struct AutoFixer<'a> {
    catalog: &'a RuleCatalog,
    settings: &'a FixerConfig,
}

impl<'a> AutoFixer<'a> {
    #[must_use]
    pub const fn new(catalog: &'a RuleCatalog, settings: &'a FixerConfig) -> Self {
        Self { catalog, settings }
    }

    /// Apply fixes for the auto-fixable records in `gaps`, in order.
    /// Manual-review records are ignored; gaps already closed are skipped
    /// silently. An edit that would open a gap not already open is
    /// skipped as [`FixSkipped::WouldOpenGap`].
    #[must_use]
    pub fn apply(&self, doc: &Document, gaps: &[GapRecord]) -> FixOutcome {
        let mut current = doc.clone();
        let mut fixes = Vec::new();

        for record in gaps.iter().filter(|record| record.is_auto_fixable()) {
            let gap = &record.code;
            let live = detect_gaps(&current, self.catalog);
            if !live.iter().any(|open| open.code == *gap) {
                continue;
            }

            match self.edit_for(&current, gap) {
                Ok(edit) => {
                    let entries_before = current.frontmatter().len();
                    let candidate = splice(&current, &edit);
                    let grew_by = candidate.frontmatter().len().checked_sub(entries_before);
                    let opened = detect_gaps(&candidate, self.catalog)
                        .into_iter()
                        .find(|after| !live.iter().any(|open| open.code == after.code));
                    let corrupt =
                        !edit.check.holds(&candidate) || !matches!(grew_by, Some(0 | 1));
                    let rejected = if corrupt {
                        Some(FixSkipped::WouldCorrupt(edit.check.key().to_string()))
                    } else {
                        opened.map(|after| FixSkipped::WouldOpenGap {
                            key: edit.check.key().to_string(),
                            gap: after.code.code(),
                        })
                    };
                    if let Some(reason) = rejected {
                        warn!(path = %doc.path(), code = %gap, %reason, "auto-fix skipped");
                        fixes.push(FixRecord::skipped(gap.clone(), &reason));
                        continue;
                    }
                    debug!(path = %doc.path(), code = %gap, "auto-fix applied");
                    let before = current.slice(edit.span.clone()).to_string();
                    fixes.push(FixRecord::applied(gap.clone(), before, edit.replacement));
                    current = candidate;
                }
                Err(reason) => {
                    warn!(path = %doc.path(), code = %gap, %reason, "auto-fix skipped");
                    fixes.push(FixRecord::skipped(gap.clone(), &reason));
                }
            }
        }

        FixOutcome {
            document: current,
            fixes,
        }
    }

    /// Detect and fix repeatedly until nothing auto-fixable remains, no
    /// progress is made, or `max_passes` is reached.
    #[must_use]
    pub fn fix_until_stable(&self, doc: &Document) -> FixOutcome {
        let mut current = doc.clone();
        let mut fixes = Vec::new();
        let mut skipped: BTreeSet<Gap> = BTreeSet::new();

        for pass in 1..=self.settings.max_passes {
            let pending: Vec<GapRecord> = detect_gaps(&current, self.catalog)
                .into_iter()
                .filter(|record| record.is_auto_fixable() && !skipped.contains(&record.code))
                .collect();
            if pending.is_empty() {
                break;
            }

            let outcome = self.apply(&current, &pending);
            let progressed = outcome.applied().next().is_some();
            debug!(
                path = %doc.path(),
                pass,
                pending = pending.len(),
                progressed,
                "fix pass complete"
            );
            skipped.extend(outcome.skipped_gaps());
            fixes.extend(outcome.fixes);
            current = outcome.document;
            if !progressed {
                break;
            }
        }

        FixOutcome {
            document: current,
            fixes,
        }
    }

    fn edit_for(&self, doc: &Document, gap: &Gap) -> Result<Edit, FixSkipped> {
        match gap {
            Gap::Frontmatter(FrontmatterGap::Missing(FrontmatterField::Author)) => {
                set_field(doc, FrontmatterField::Author.key(), &self.settings.default_author)
            }
            Gap::Frontmatter(FrontmatterGap::Missing(FrontmatterField::License)) => {
                set_field(doc, FrontmatterField::License.key(), &self.settings.default_license)
            }
            Gap::Description(DescriptionGap::MissingUseWhen) => {
                let name = doc.name().ok_or(FixSkipped::NoName)?;
                let clause = use_when_clause(name).ok_or(FixSkipped::NoName)?;
                append_to_description(doc, &clause)
            }
            Gap::Description(DescriptionGap::MissingTriggerWith) => {
                let name = doc.name().ok_or(FixSkipped::NoName)?;
                let headings: Vec<&str> = doc
                    .sections()
                    .iter()
                    .map(|section| section.title.as_str())
                    .collect();
                let clause = trigger_with_clause(name, &headings).ok_or(FixSkipped::NoName)?;
                append_to_description(doc, &clause)
            }
            Gap::ToolScope(ToolScopeGap::Unscoped(tool)) => scope_tool(doc, tool),
            other => Err(FixSkipped::NotAutoFixable(other.code())),
        }
    }
}

fn splice(doc: &Document, edit: &Edit) -> Document {
    let raw = doc.raw_text();
    let mut text = String::with_capacity(raw.len() + edit.replacement.len());
    text.push_str(&raw[..edit.span.start]);
    text.push_str(&edit.replacement);
    text.push_str(&raw[edit.span.end..]);
    parse_text(doc.path(), &text)
}

fn line_ending(doc: &Document) -> &'static str {
    if doc.raw_text().contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn require_valid(doc: &Document) -> Result<(), FixSkipped> {
    match doc.frontmatter().state() {
        FrontmatterState::Valid => Ok(()),
        FrontmatterState::Absent => Err(FixSkipped::NoFrontmatter),
        FrontmatterState::Malformed => Err(FixSkipped::MalformedFrontmatter),
    }
}

/// Fill a blank entry in place, or insert a new one before the closing
/// delimiter.
fn set_field(doc: &Document, key: &str, value: &str) -> Result<Edit, FixSkipped> {
    require_valid(doc)?;
    let eol = line_ending(doc);
    let replacement = render_entry(key, value, ScalarStyle::Plain, eol);
    let span = match doc.frontmatter().entry(key) {
        Some(entry) => entry.span.clone(),
        None => {
            let at = doc
                .frontmatter()
                .insert_at()
                .ok_or(FixSkipped::MalformedFrontmatter)?;
            at..at
        }
    };
    Ok(Edit {
        span,
        replacement,
        check: Check::Equals {
            key: key.to_string(),
            value: value.to_string(),
        },
    })
}

fn joiner(existing: &str) -> &'static str {
    if existing.trim_end().ends_with(['.', '!', '?']) {
        " "
    } else {
        ". "
    }
}

/// Append `clause` after the existing description text.
fn append_to_description(doc: &Document, clause: &str) -> Result<Edit, FixSkipped> {
    require_valid(doc)?;
    let key = FrontmatterField::Description.key();
    let entry = doc
        .frontmatter()
        .entry(key)
        .ok_or_else(|| FixSkipped::UnsupportedValue(key.to_string()))?;
    let check = Check::Contains {
        key: key.to_string(),
        fragment: clause.to_string(),
    };

    match entry.style {
        ScalarStyle::Block => {
            let at = end_of_last_content_line(doc, entry)
                .ok_or_else(|| FixSkipped::UnsupportedValue(key.to_string()))?;
            Ok(Edit {
                span: at..at,
                replacement: format!("{}{clause}", joiner(&entry.value)),
                check,
            })
        }
        ScalarStyle::Plain | ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
            let existing = entry.value.trim_end();
            let value = format!("{existing}{}{clause}", joiner(existing));
            Ok(Edit {
                span: entry.span.clone(),
                replacement: render_entry(key, &value, entry.style, line_ending(doc)),
                check,
            })
        }
        ScalarStyle::Nested => Err(FixSkipped::UnsupportedValue(key.to_string())),
    }
}

/// Byte offset just past the trimmed text of the entry's last non-blank
/// continuation line.
fn end_of_last_content_line(doc: &Document, entry: &FrontmatterEntry) -> Option<usize> {
    let source = doc.slice(entry.span.clone());
    let mut offset = entry.span.start;
    let mut found = None;
    for (index, line) in source.split_inclusive('\n').enumerate() {
        let content = line.trim_end();
        if index > 0 && !content.is_empty() {
            found = Some(offset + content.len());
        }
        offset += line.len();
    }
    found
}

fn scoped(tool: &str) -> String {
    format!("{tool}({}:*)", tool.to_lowercase())
}

/// Rewrite every bare `tool` entry to its conservative default scope.
fn scope_tool(doc: &Document, tool: &str) -> Result<Edit, FixSkipped> {
    require_valid(doc)?;
    let key = FrontmatterField::AllowedTools.key();
    let entry = doc
        .frontmatter()
        .entry(key)
        .ok_or_else(|| FixSkipped::ToolNotFound(tool.to_string()))?;

    if entry.style == ScalarStyle::Nested {
        if flow_sequence(&entry.value).is_some() {
            return scope_tool_in_flow(doc, entry, tool);
        }
        return scope_tool_in_list(doc, entry, tool);
    }
    if entry.style == ScalarStyle::Block {
        return Err(FixSkipped::UnsupportedValue(key.to_string()));
    }

    let value = &entry.value;
    let mut rewritten = String::with_capacity(value.len() + tool.len() + 4);
    let mut last = 0;
    for item in split_tool_list(value) {
        if &value[item.clone()] == tool {
            rewritten.push_str(&value[last..item.start]);
            rewritten.push_str(&scoped(tool));
            last = item.end;
        }
    }
    if last == 0 {
        return Err(FixSkipped::ToolNotFound(tool.to_string()));
    }
    rewritten.push_str(&value[last..]);

    Ok(Edit {
        span: entry.span.clone(),
        replacement: render_entry(key, &rewritten, entry.style, line_ending(doc)),
        check: Check::Equals {
            key: key.to_string(),
            value: rewritten,
        },
    })
}

/// Flow-sequence form (`[Read, Bash]`): rewrite bare items inside the
/// brackets, keeping any quotes.
fn scope_tool_in_flow(
    doc: &Document,
    entry: &FrontmatterEntry,
    tool: &str,
) -> Result<Edit, FixSkipped> {
    let unsupported = || FixSkipped::UnsupportedValue(entry.key.clone());
    let source = doc.slice(entry.span.clone());
    let value_at = source.find(entry.value.as_str()).ok_or_else(unsupported)?;
    let inner = flow_sequence(&entry.value).ok_or_else(unsupported)?;
    let list_at = value_at + inner.start;
    let list = &entry.value[inner];

    let mut rewritten = String::with_capacity(source.len() + tool.len() + 4);
    let mut last = 0;
    for item in split_tool_list(list) {
        let text = &list[item.clone()];
        if unquote(text) != tool {
            continue;
        }
        let quote = match text.len() - tool.len() {
            0 => 0,
            2 => 1,
            _ => continue,
        };
        let start = list_at + item.start + quote;
        rewritten.push_str(&source[last..start]);
        rewritten.push_str(&scoped(tool));
        last = start + tool.len();
    }
    if last == 0 {
        return Err(FixSkipped::ToolNotFound(tool.to_string()));
    }
    rewritten.push_str(&source[last..]);

    Ok(Edit {
        span: entry.span.clone(),
        replacement: rewritten,
        check: Check::Contains {
            key: entry.key.clone(),
            fragment: scoped(tool),
        },
    })
}

/// Block-sequence form: rewrite the first `- Tool` item line in place.
fn scope_tool_in_list(
    doc: &Document,
    entry: &FrontmatterEntry,
    tool: &str,
) -> Result<Edit, FixSkipped> {
    let source = doc.slice(entry.span.clone());
    let mut offset = entry.span.start;
    for line in source.split_inclusive('\n') {
        let content = line.trim_end();
        let item = content.trim_start().strip_prefix('-').map(str::trim);
        if item == Some(tool) {
            let start = offset + content.len() - tool.len();
            let scoped = scoped(tool);
            return Ok(Edit {
                span: start..start + tool.len(),
                check: Check::Contains {
                    key: entry.key.clone(),
                    fragment: scoped.clone(),
                },
                replacement: scoped,
            });
        }
        offset += line.len();
    }
    Err(FixSkipped::ToolNotFound(tool.to_string()))
}
