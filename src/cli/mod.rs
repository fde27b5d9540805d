//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod formatters;
pub mod output;
pub mod progress;

/// Skill Audit - check SKILL.md documents against the compliance standards
/// and fix the gaps that are safe to fix
#[derive(Parser, Debug)]
#[command(name = "skill-audit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (human, json, jsonl, plain, tsv, csv)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Machine-readable JSON output (shorthand for --output-format=json)
    #[arg(long, short = 'm', global = true)]
    pub machine: bool,

    /// Force plain output (no colors, no Unicode)
    #[arg(long, global = true)]
    pub plain: bool,

    /// Color mode: auto, always, never
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (replaces the global and project config files)
    #[arg(long, global = true, env = "SKILL_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl Cli {
    /// Effective output format.
    ///
    /// Priority order:
    /// 1. `--plain`
    /// 2. `--output-format`
    /// 3. `--machine` (JSON)
    /// 4. human
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.plain {
            return OutputFormat::Plain;
        }
        if let Some(fmt) = self.output_format {
            return fmt;
        }
        if self.machine {
            return OutputFormat::Json;
        }
        OutputFormat::Human
    }

    /// Whether output is JSON-shaped, for logging and error rendering.
    #[must_use]
    pub fn is_robot(&self) -> bool {
        matches!(self.output_format(), OutputFormat::Json | OutputFormat::Jsonl)
    }

    #[must_use]
    pub fn force_plain(&self) -> bool {
        self.plain || self.color == Some(ColorMode::Never)
    }

    #[must_use]
    pub fn force_rich(&self) -> bool {
        self.color == Some(ColorMode::Always)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit skills and report gaps without writing anything
    Report(commands::report::ReportArgs),

    /// Apply safe fixes and write revised documents
    Fix(commands::fix::FixArgs),

    /// Write drafted sections for manual review
    Propose(commands::propose::ProposeArgs),

    /// List the active rule catalog
    Rules(commands::rules::RulesArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_wins_over_explicit_format() {
        let cli = Cli::parse_from(["skill-audit", "--plain", "-O", "json", "rules"]);
        assert_eq!(cli.output_format(), OutputFormat::Plain);
        assert!(cli.force_plain());
    }

    #[test]
    fn machine_is_json() {
        let cli = Cli::parse_from(["skill-audit", "-m", "rules"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
        assert!(cli.is_robot());
    }

    #[test]
    fn fix_flags_parse() {
        let cli = Cli::parse_from([
            "skill-audit",
            "fix",
            "skills",
            "--dry-run",
            "--diff",
            "--jobs",
            "2",
            "--limit",
            "5",
        ]);
        let Commands::Fix(args) = cli.command else {
            panic!("expected fix");
        };
        assert!(args.dry_run && args.diff);
        assert_eq!(args.jobs, Some(2));
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.paths, [PathBuf::from("skills")]);
    }

    #[test]
    fn verify_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
