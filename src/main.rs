//! skill-audit - Skill compliance auditor
//!
//! Checks SKILL.md documents against the compliance standards, fixes the
//! gaps that are safe to fix and drafts the rest for review.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use skill_audit::Result;
use skill_audit::app::AppContext;
use skill_audit::cli::Cli;
use skill_audit::cli::output::robot_error_structured;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.is_robot() {
                // Machine output: structured error envelope on stdout
                let payload = serde_json::to_string(&robot_error_structured(&e)).unwrap_or_default();
                println!("{payload}");
            } else {
                let structured = e.to_structured();
                eprintln!("{} [{}] {e}", "Error:".red().bold(), structured.code.code_string());
                eprintln!("  {}", structured.suggestion.dimmed());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    skill_audit::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,skill_audit=info",
        1 => "info,skill_audit=debug",
        2 => "debug,skill_audit=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.is_robot() {
        // JSON logging for machine output
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
