//! In-memory model of a skill document.
//!
//! A [`Document`] keeps the full source text and records byte spans for every
//! structure it recognizes, so fixes can rewrite the source in place and
//! leave unrecognized bytes (preamble, comments, `Other` sections) untouched.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// The fixed set of body sections the compliance standard requires, in
/// canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalSection {
    Overview,
    Prerequisites,
    Instructions,
    Output,
    ErrorHandling,
    Examples,
    Resources,
}

impl CanonicalSection {
    pub const ALL: [Self; 7] = [
        Self::Overview,
        Self::Prerequisites,
        Self::Instructions,
        Self::Output,
        Self::ErrorHandling,
        Self::Examples,
        Self::Resources,
    ];

    /// Heading text exactly as it must appear after `## `.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Prerequisites => "Prerequisites",
            Self::Instructions => "Instructions",
            Self::Output => "Output",
            Self::ErrorHandling => "Error Handling",
            Self::Examples => "Examples",
            Self::Resources => "Resources",
        }
    }

    /// Case-sensitive match of trimmed heading text.
    #[must_use]
    pub fn from_heading(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|section| section.heading() == text)
    }
}

impl fmt::Display for CanonicalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// Classification of a `##` heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Canonical(CanonicalSection),
    /// Anything outside the canonical set. Ignored by rules, preserved on write-back.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// Heading text as authored, trimmed.
    pub title: String,
    /// The `## ...` line including its line terminator.
    pub heading_span: Range<usize>,
    /// Everything after the heading line up to the next `##` heading or EOF.
    pub content_span: Range<usize>,
}

impl Section {
    #[must_use]
    pub const fn canonical(&self) -> Option<CanonicalSection> {
        match self.kind {
            SectionKind::Canonical(section) => Some(section),
            SectionKind::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontmatterState {
    /// Delimited block that parsed as a flat mapping.
    Valid,
    /// No leading `---` block at all.
    Absent,
    /// A block exists but is unclosed or not a mapping we can rewrite safely.
    Malformed,
}

/// How a frontmatter value was written, used to re-render it after a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` or `>` block scalar.
    Block,
    /// Sequence or mapping kept as opaque text.
    Nested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterEntry {
    pub key: String,
    /// Decoded value. Nested structures are the dedented source text.
    pub value: String,
    pub style: ScalarStyle,
    /// Key line plus continuation lines, including the final line terminator.
    pub span: Range<usize>,
}

impl FrontmatterEntry {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub(crate) state: FrontmatterState,
    pub(crate) entries: Vec<FrontmatterEntry>,
    /// Whole block including both delimiter lines.
    pub(crate) block_span: Option<Range<usize>>,
    /// Start of the closing `---` line; new keys are inserted here.
    pub(crate) insert_at: Option<usize>,
}

impl Frontmatter {
    pub(crate) const fn absent() -> Self {
        Self {
            state: FrontmatterState::Absent,
            entries: Vec::new(),
            block_span: None,
            insert_at: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FrontmatterState {
        self.state
    }

    #[must_use]
    pub fn entries(&self) -> &[FrontmatterEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&FrontmatterEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|entry| entry.value.as_str())
    }

    /// Value for `key` when present and not blank.
    #[must_use]
    pub fn non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn block_span(&self) -> Option<Range<usize>> {
        self.block_span.clone()
    }

    #[must_use]
    pub const fn insert_at(&self) -> Option<usize> {
        self.insert_at
    }
}

/// A parsed skill document. Created fresh per audit; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) path: String,
    pub(crate) raw_text: String,
    pub(crate) frontmatter: Frontmatter,
    pub(crate) body_start: usize,
    pub(crate) sections: Vec<Section>,
}

impl Document {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.raw_text
    }

    #[must_use]
    pub const fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// First section filed under `section`.
    #[must_use]
    pub fn section(&self, section: CanonicalSection) -> Option<&Section> {
        self.sections
            .iter()
            .find(|candidate| candidate.canonical() == Some(section))
    }

    #[must_use]
    pub fn section_content(&self, section: &Section) -> &str {
        &self.raw_text[section.content_span.clone()]
    }

    /// Body text before the first `##` heading.
    #[must_use]
    pub fn preamble(&self) -> &str {
        let end = self
            .sections
            .first()
            .map_or(self.raw_text.len(), |section| section.heading_span.start);
        &self.raw_text[self.body_start..end]
    }

    /// Markdown body after the frontmatter block.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.raw_text[self.body_start..]
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.frontmatter.non_blank("name").map(str::trim)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.frontmatter.non_blank("description").map(str::trim)
    }

    /// Slice of the source text covered by `span`.
    #[must_use]
    pub fn slice(&self, span: Range<usize>) -> &str {
        &self.raw_text[span]
    }
}
