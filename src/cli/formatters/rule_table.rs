//! Rule catalog listing

use console::style;

use crate::audit::rules::{RuleInfo, Severity};
use crate::cli::output::{Formattable, HumanLayout, OutputFormat};
use crate::utils::format::csv_table;

#[derive(Debug, Clone)]
pub struct RuleTable<'a> {
    pub rules: &'a [RuleInfo],
}

impl Formattable for RuleTable<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => {
                let mut layout = HumanLayout::new();
                layout.title("Rule catalog");
                let width = self.rules.iter().map(|r| r.code.len()).max().unwrap_or(0);
                for rule in self.rules {
                    let severity = match rule.severity {
                        Severity::AutoFixable => style("auto").green(),
                        Severity::ManualReview => style("review").yellow(),
                    };
                    layout.push_line(format!(
                        "{:<width$}  {:<6}  {}",
                        rule.code, severity, rule.description
                    ));
                }
                layout.build()
            }
            OutputFormat::Json => serde_json::to_string_pretty(self.rules).unwrap_or_default(),
            OutputFormat::Jsonl => self
                .rules
                .iter()
                .filter_map(|rule| serde_json::to_string(rule).ok())
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Plain => self
                .rules
                .iter()
                .map(|rule| format!("{} {} {}", rule.code, rule.severity, rule.description))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Tsv => {
                let mut lines = vec!["code\tcategory\tseverity\tdescription".to_string()];
                lines.extend(self.rules.iter().map(|rule| {
                    format!(
                        "{}\t{}\t{}\t{}",
                        rule.code, rule.category, rule.severity, rule.description
                    )
                }));
                lines.join("\n")
            }
            OutputFormat::Csv => csv_table(
                &["code", "category", "severity", "description"],
                self.rules.iter().map(|rule| {
                    vec![
                        rule.code.clone(),
                        rule.category.to_string(),
                        rule.severity.to_string(),
                        rule.description.clone(),
                    ]
                }),
            ),
        }
    }
}
