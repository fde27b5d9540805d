//! Output formatters for CLI commands
//!
//! Structured views that render to every output format (Human, JSON,
//! JSONL, Plain, TSV).

mod audit_report;
mod rule_table;

pub use audit_report::AuditReportView;
pub use rule_table::RuleTable;
