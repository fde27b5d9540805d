use std::path::PathBuf;

use tempfile::TempDir;

use crate::audit::document::CanonicalSection;

/// Test fixture providing isolated filesystem environment.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl UnitTestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {:?}", data_path);

        Self { temp_dir, data_path }
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let content = content.as_ref();
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Create `skills/<name>/SKILL.md`.
    pub fn create_skill(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        self.create_file(&format!("skills/{name}/SKILL.md"), content)
    }

    /// Create `plugins/<category>/<plugin>/skills/<name>/SKILL.md`.
    pub fn create_plugin_skill(
        &self,
        category: &str,
        plugin: &str,
        name: &str,
        content: impl AsRef<[u8]>,
    ) -> PathBuf {
        self.create_file(
            &format!("plugins/{category}/{plugin}/skills/{name}/SKILL.md"),
            content,
        )
    }

    pub fn read(&self, relative_path: &str) -> String {
        std::fs::read_to_string(self.data_path.join(relative_path)).expect("Failed to read file")
    }
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}

/// Builder for SKILL.md text. Frontmatter values are raw YAML, written
/// after `key: ` verbatim.
#[derive(Debug, Clone)]
pub struct SkillDoc {
    frontmatter: Vec<(String, String)>,
    title: String,
    sections: Vec<(String, String)>,
}

impl SkillDoc {
    /// A document with no gaps under the standard catalog, including the
    /// extended checks.
    pub fn compliant() -> Self {
        let frontmatter = [
            ("name", "csv-charts"),
            (
                "description",
                "Generate charts from CSV files. Use when visualizing tabular data. Trigger with phrases like \"plot csv\", \"csv chart\".",
            ),
            ("allowed-tools", "Read, Write, Bash(python:*)"),
            ("version", "1.0.0"),
            ("author", "Jane Doe <jane@example.com>"),
            ("license", "MIT"),
        ];
        let sections = [
            (
                CanonicalSection::Overview,
                "Turns CSV files into PNG charts using matplotlib.",
            ),
            (
                CanonicalSection::Prerequisites,
                "- Python 3.10 or newer\n- matplotlib installed",
            ),
            (
                CanonicalSection::Instructions,
                "1. Read the CSV file\n2. Pick a chart type\n3. Render the chart to PNG",
            ),
            (
                CanonicalSection::Output,
                "A PNG file written next to the input CSV.",
            ),
            (
                CanonicalSection::ErrorHandling,
                "If the CSV has no header row, ask for column names.",
            ),
            (
                CanonicalSection::Examples,
                "```bash\npython plot.py sales.csv --kind bar\n```",
            ),
            (
                CanonicalSection::Resources,
                "- matplotlib documentation: https://matplotlib.org",
            ),
        ];
        Self {
            frontmatter: frontmatter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            title: "CSV Charts".to_string(),
            sections: sections
                .into_iter()
                .map(|(s, body)| (s.heading().to_string(), body.to_string()))
                .collect(),
        }
    }

    /// Set or replace a frontmatter key. Values starting with a newline are
    /// written directly after the colon (nested or block values).
    #[must_use]
    pub fn set(mut self, key: &str, raw_value: &str) -> Self {
        match self.frontmatter.iter_mut().find(|(k, _)| k == key) {
            Some((_, value)) => *value = raw_value.to_string(),
            None => self
                .frontmatter
                .push((key.to_string(), raw_value.to_string())),
        }
        self
    }

    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.frontmatter.retain(|(k, _)| k != key);
        self
    }

    /// Set a canonical section's body, inserting it in canonical order.
    #[must_use]
    pub fn section(mut self, section: CanonicalSection, body: &str) -> Self {
        let heading = section.heading();
        if let Some((_, existing)) = self.sections.iter_mut().find(|(h, _)| h == heading) {
            *existing = body.to_string();
            return self;
        }
        let position = self
            .sections
            .iter()
            .position(|(h, _)| CanonicalSection::from_heading(h).is_some_and(|s| s > section))
            .unwrap_or(self.sections.len());
        self.sections
            .insert(position, (heading.to_string(), body.to_string()));
        self
    }

    #[must_use]
    pub fn without_section(mut self, section: CanonicalSection) -> Self {
        self.sections.retain(|(h, _)| h != section.heading());
        self
    }

    /// Append a section with an arbitrary heading.
    #[must_use]
    pub fn other_section(mut self, heading: &str, body: &str) -> Self {
        self.sections.push((heading.to_string(), body.to_string()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.frontmatter {
            if value.starts_with('\n') {
                out.push_str(&format!("{key}:{value}\n"));
            } else {
                out.push_str(&format!("{key}: {value}\n"));
            }
        }
        out.push_str("---\n\n");
        out.push_str(&self.render_body_only());
        out
    }

    /// The Markdown body without any frontmatter block.
    pub fn render_body_only(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        for (heading, body) in &self.sections {
            out.push_str(&format!("## {heading}\n\n{body}\n\n"));
        }
        out
    }
}

/// Rendered [`SkillDoc::compliant`].
pub fn compliant_skill() -> String {
    SkillDoc::compliant().render()
}
