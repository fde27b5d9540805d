//! Per-invocation application context.

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;

pub struct AppContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    /// Directory the project config and default scan roots resolve against.
    pub project_root: PathBuf,
    pub output_format: OutputFormat,
    /// JSON-shaped output (json or jsonl).
    pub robot_mode: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        let output_format = cli.output_format();
        if cli.force_plain() {
            console::set_colors_enabled(false);
            colored::control::set_override(false);
        } else if cli.force_rich() {
            console::set_colors_enabled(true);
            colored::control::set_override(true);
        }

        Ok(Self {
            config,
            config_path: cli.config.clone(),
            project_root,
            robot_mode: matches!(output_format, OutputFormat::Json | OutputFormat::Jsonl),
            output_format,
            quiet: cli.quiet,
            verbosity: cli.verbose,
        })
    }
}
