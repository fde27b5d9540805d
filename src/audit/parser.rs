//! SKILL.md parser.
//!
//! Splits a document into its frontmatter block and `##` sections while
//! recording byte spans, so later stages can rewrite the source in place.
//! Anything short of invalid UTF-8 yields a [`Document`]; structural
//! problems are reported through [`FrontmatterState`] instead of errors.

use std::ops::Range;
use std::str::Utf8Error;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value as YamlValue;
use thiserror::Error;
use tracing::debug;

use super::document::{
    CanonicalSection, Document, Frontmatter, FrontmatterEntry, FrontmatterState, ScalarStyle,
    Section, SectionKind,
};

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_.\-]*)[ \t]*:(?:[ \t]+(.*))?$").expect("valid regex")
});

const BOM: char = '\u{feff}';

/// The only unrecoverable parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{path} is not valid UTF-8 (invalid byte sequence at offset {valid_up_to})")]
    InvalidEncoding {
        path: String,
        valid_up_to: usize,
        #[source]
        source: Utf8Error,
    },
}

impl ParseError {
    #[must_use]
    pub fn invalid_encoding(path: impl Into<String>, source: Utf8Error) -> Self {
        Self::InvalidEncoding {
            path: path.into(),
            valid_up_to: source.valid_up_to(),
            source,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidEncoding { path, .. } => path,
        }
    }
}

/// Decode `bytes` as UTF-8 and parse them.
pub fn parse_document(path: impl Into<String>, bytes: &[u8]) -> Result<Document, ParseError> {
    let path = path.into();
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(parse_text(path, text)),
        Err(err) => Err(ParseError::invalid_encoding(path, err)),
    }
}

/// Parse already-decoded text. Never fails.
#[must_use]
pub fn parse_text(path: impl Into<String>, text: &str) -> Document {
    let start = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let (frontmatter, body_start) = parse_frontmatter(text, start);
    let sections = scan_sections(text, body_start);

    Document {
        path: path.into(),
        raw_text: text.to_owned(),
        frontmatter,
        body_start,
        sections,
    }
}

/// Yields `(offset, line)` pairs; each line keeps its terminator.
fn lines_from(text: &str, start: usize) -> impl Iterator<Item = (usize, &str)> {
    text[start..]
        .split_inclusive('\n')
        .scan(start, |offset, line| {
            let at = *offset;
            *offset += line.len();
            Some((at, line))
        })
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_delimiter(line: &str) -> bool {
    strip_eol(line).trim_end() == "---"
}

fn parse_frontmatter(text: &str, start: usize) -> (Frontmatter, usize) {
    let mut lines = lines_from(text, start);
    let Some((_, first)) = lines.next() else {
        return (Frontmatter::absent(), start);
    };
    if !is_delimiter(first) {
        return (Frontmatter::absent(), start);
    }
    let open_end = start + first.len();

    for (at, line) in lines {
        if is_delimiter(line) {
            let close_end = at + line.len();
            let (state, entries) = scan_entries(text, open_end..at);
            let frontmatter = Frontmatter {
                state,
                entries,
                block_span: Some(start..close_end),
                insert_at: Some(at),
            };
            return (frontmatter, close_end);
        }
    }

    debug!("frontmatter block has no closing delimiter");
    let frontmatter = Frontmatter {
        state: FrontmatterState::Malformed,
        entries: Vec::new(),
        block_span: None,
        insert_at: None,
    };
    (frontmatter, start)
}

struct RawEntry {
    key: String,
    inline: String,
    span: Range<usize>,
    continued: bool,
}

fn scan_entries(text: &str, block: Range<usize>) -> (FrontmatterState, Vec<FrontmatterEntry>) {
    let mut raw: Vec<RawEntry> = Vec::new();

    for (at, line) in lines_from(&text[..block.end], block.start) {
        let content = strip_eol(line);
        let end = at + line.len();

        if (content.starts_with([' ', '\t']) && !content.trim().is_empty())
            || content == "-"
            || content.starts_with("- ")
        {
            let Some(current) = raw.last_mut() else {
                debug!(offset = at, "frontmatter continuation line before any key");
                return (FrontmatterState::Malformed, Vec::new());
            };
            current.span.end = end;
            current.continued = true;
            continue;
        }
        if content.trim().is_empty() || content.starts_with('#') {
            continue;
        }

        let Some(caps) = KEY_LINE.captures(content) else {
            debug!(offset = at, line = content, "unrecognized frontmatter line");
            return (FrontmatterState::Malformed, Vec::new());
        };
        raw.push(RawEntry {
            key: caps[1].to_string(),
            inline: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            span: at..end,
            continued: false,
        });
    }

    if raw.is_empty() {
        return (FrontmatterState::Valid, Vec::new());
    }

    let mapping = match serde_yaml::from_str::<YamlValue>(&text[block]) {
        Ok(YamlValue::Mapping(mapping)) => mapping,
        Ok(other) => {
            debug!(kind = yaml_kind(&other), "frontmatter is not a mapping");
            return (FrontmatterState::Malformed, Vec::new());
        }
        Err(err) => {
            debug!(error = %err, "frontmatter is not valid YAML");
            return (FrontmatterState::Malformed, Vec::new());
        }
    };

    if mapping.len() != raw.len() {
        debug!(
            keys = raw.len(),
            parsed = mapping.len(),
            "frontmatter key scan disagrees with YAML"
        );
        return (FrontmatterState::Malformed, Vec::new());
    }

    let mut entries = Vec::with_capacity(raw.len());
    for entry in raw {
        let Some(value) = mapping.get(entry.key.as_str()) else {
            debug!(key = %entry.key, "frontmatter key missing from YAML mapping");
            return (FrontmatterState::Malformed, Vec::new());
        };
        let (value, style) = decode_value(value, &entry, text);
        entries.push(FrontmatterEntry {
            key: entry.key,
            value,
            style,
            span: entry.span,
        });
    }

    (FrontmatterState::Valid, entries)
}

const fn yaml_kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "bool",
        YamlValue::Number(_) => "number",
        YamlValue::String(_) => "string",
        YamlValue::Sequence(_) => "sequence",
        YamlValue::Mapping(_) => "mapping",
        YamlValue::Tagged(_) => "tagged",
    }
}

fn decode_value(value: &YamlValue, entry: &RawEntry, text: &str) -> (String, ScalarStyle) {
    match value {
        YamlValue::String(s) => {
            let style = match entry.inline.chars().next() {
                Some('"') => ScalarStyle::DoubleQuoted,
                Some('\'') => ScalarStyle::SingleQuoted,
                Some('|' | '>') => ScalarStyle::Block,
                // Plain scalar folded over indented lines.
                None => ScalarStyle::Block,
                _ if entry.continued => ScalarStyle::Block,
                _ => ScalarStyle::Plain,
            };
            (s.clone(), style)
        }
        YamlValue::Null => (String::new(), ScalarStyle::Plain),
        YamlValue::Bool(_) | YamlValue::Number(_) => {
            (strip_comment(&entry.inline).to_string(), ScalarStyle::Plain)
        }
        YamlValue::Sequence(_) | YamlValue::Mapping(_) | YamlValue::Tagged(_) => {
            (opaque_text(entry, text), ScalarStyle::Nested)
        }
    }
}

fn strip_comment(inline: &str) -> &str {
    inline.find(" #").map_or(inline, |idx| &inline[..idx]).trim()
}

/// Source text of a nested value with common indentation removed.
fn opaque_text(entry: &RawEntry, text: &str) -> String {
    if !entry.inline.is_empty() {
        return strip_comment(&entry.inline).to_string();
    }
    let source = &text[entry.span.clone()];
    let body: Vec<&str> = source.lines().skip(1).collect();
    let indent = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    body.iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Opening or closing marker of a fenced code block.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Title of a level-2 heading line, if it is one.
fn heading_title(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("##")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(rest.trim().trim_end_matches('#').trim_end())
}

fn scan_sections(text: &str, body_start: usize) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut open_fence: Option<&'static str> = None;
    let mut current: Option<(String, Range<usize>)> = None;

    let close = |sections: &mut Vec<Section>, title: String, heading_span: Range<usize>, end: usize| {
        let kind = CanonicalSection::from_heading(&title)
            .map_or_else(|| SectionKind::Other(title.clone()), SectionKind::Canonical);
        sections.push(Section {
            kind,
            title,
            content_span: heading_span.end..end,
            heading_span,
        });
    };

    for (at, line) in lines_from(text, body_start) {
        let content = strip_eol(line);

        if let Some(marker) = fence_marker(content) {
            match open_fence {
                Some(open) if open == marker => open_fence = None,
                Some(_) => {}
                None => open_fence = Some(marker),
            }
            continue;
        }
        if open_fence.is_some() {
            continue;
        }

        if let Some(title) = heading_title(content) {
            if let Some((prev_title, prev_span)) = current.take() {
                close(&mut sections, prev_title, prev_span, at);
            }
            current = Some((title.to_string(), at..at + line.len()));
        }
    }

    if let Some((title, span)) = current {
        close(&mut sections, title, span, text.len());
    }
    sections
}
