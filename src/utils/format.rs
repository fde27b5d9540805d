//! Output formatting utilities

use itertools::{EitherOrBoth, Itertools};

/// Truncate a string to a maximum length
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len < 3 {
        return "...".to_string();
    }
    let trimmed: String = s.chars().take(max_len - 3).collect();
    format!("{trimmed}...")
}

/// Line diff of `old` against `new`, changed lines only.
///
/// Lines are paired by position, which is enough for the edits the fixer
/// makes (single-line rewrites and inserted frontmatter entries show up
/// as a run of changed lines from the insertion point).
pub fn simple_diff(old: &str, new: &str) -> String {
    let mut out = String::new();
    for pair in old.lines().zip_longest(new.lines()) {
        match pair {
            EitherOrBoth::Both(left, right) if left == right => {}
            EitherOrBoth::Both(left, right) => {
                out.push('-');
                out.push_str(left);
                out.push('\n');
                out.push('+');
                out.push_str(right);
                out.push('\n');
            }
            EitherOrBoth::Left(left) => {
                out.push('-');
                out.push_str(left);
                out.push('\n');
            }
            EitherOrBoth::Right(right) => {
                out.push('+');
                out.push_str(right);
                out.push('\n');
            }
        }
    }
    out
}

/// CSV text with a header row, quoted where needed. No trailing newline.
pub fn csv_table<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    write_csv(header, rows).unwrap_or_default()
}

fn write_csv<I>(header: &[&str], rows: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
}
