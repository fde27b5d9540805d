//! skill-audit rules - List the active rule catalog

use clap::Args;

use crate::app::AppContext;
use crate::audit::rules::RuleCatalog;
use crate::cli::formatters::RuleTable;
use crate::cli::output::{OutputFormat, emit, emit_json, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Only list auto-fixable rules
    #[arg(long)]
    pub auto_only: bool,
}

pub fn run(ctx: &AppContext, args: &RulesArgs) -> Result<()> {
    let catalog = RuleCatalog::from_config(&ctx.config.rules)?;
    let mut rules = catalog.describe();
    if args.auto_only {
        rules.retain(|rule| rule.severity == crate::audit::rules::Severity::AutoFixable);
    }

    if ctx.output_format == OutputFormat::Json {
        emit_json(&robot_ok(&rules))
    } else {
        emit(&RuleTable { rules: &rules }, ctx.output_format);
        Ok(())
    }
}
