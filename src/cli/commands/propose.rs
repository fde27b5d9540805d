//! skill-audit propose - Draft text for gaps that need manual review
//!
//! Nothing here touches the audited documents. Drafts are printed, or
//! written as `<name>-sections.md` review files under `--output`. When two
//! skills in one run share a name, the later file is prefixed with its
//! category (and numbered if that still clashes).

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::audit::batch::BatchRunner;
use crate::audit::parser::parse_text;
use crate::audit::proposer::{Proposals, sections_review_file};
use crate::cli::commands::audit_paths;
use crate::cli::output::{OutputFormat, emit_json, emit_jsonl, robot_ok};
use crate::error::Result;
use crate::utils::format::csv_table;
use crate::utils::fs::{ensure_dir, write_atomic};

#[derive(Args, Debug)]
pub struct ProposeArgs {
    /// Files or directories to draft for (default: plugins/ and skills/)
    pub paths: Vec<PathBuf>,

    /// Write section review files into this directory
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Process at most N documents
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentProposals<'a> {
    path: &'a str,
    proposals: &'a Proposals,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_file: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ProposeArgs) -> Result<()> {
    let runner = BatchRunner::from_config(&ctx.config)?;
    let audit = audit_paths(ctx, &runner, &args.paths, args.limit)?;
    if let Some(dir) = &args.output {
        ensure_dir(dir)?;
    }

    let mut drafted = Vec::new();
    let mut taken = HashSet::new();
    for (file, outcome) in audit.files.iter().zip(&audit.outcome.outcomes) {
        let report = &outcome.report;
        if report.proposals.is_empty() {
            continue;
        }
        let mut review_file = None;
        if let Some(dir) = &args.output {
            let text = match &outcome.revised_text {
                Some(revised) => revised.clone(),
                None => std::fs::read_to_string(file)?,
            };
            let doc = parse_text(&report.path, &text);
            if let Some((name, contents)) = sections_review_file(&doc, &report.proposals) {
                let target = dir.join(claim_file_name(&mut taken, &name, &report.category));
                write_atomic(&target, &contents)?;
                info!(path = %report.path, file = %target.display(), "review file written");
                review_file = Some(target.display().to_string());
            }
        }
        drafted.push(DocumentProposals {
            path: &report.path,
            proposals: &report.proposals,
            review_file,
        });
    }

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(&drafted))?,
        OutputFormat::Jsonl => emit_jsonl(&drafted)?,
        OutputFormat::Tsv => {
            println!("path\tgap\treview_file");
            for doc in &drafted {
                for gap in doc.proposals.keys() {
                    println!(
                        "{}\t{}\t{}",
                        doc.path,
                        gap,
                        doc.review_file.as_deref().unwrap_or("")
                    );
                }
            }
        }
        OutputFormat::Csv => {
            let rows = drafted.iter().flat_map(|doc| {
                doc.proposals.keys().map(|gap| {
                    vec![
                        doc.path.to_string(),
                        gap.code(),
                        doc.review_file.clone().unwrap_or_default(),
                    ]
                })
            });
            println!("{}", csv_table(&["path", "gap", "review_file"], rows));
        }
        OutputFormat::Human | OutputFormat::Plain => {
            if !ctx.quiet {
                print_human(&drafted, args.output.is_some());
            }
        }
    }
    Ok(())
}

/// First free name among `name`, `<category>-name`, `<category>-<n>-name`.
fn claim_file_name(taken: &mut HashSet<String>, name: &str, category: &str) -> String {
    let mut candidate = name.to_string();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = if n == 1 {
            format!("{category}-{name}")
        } else {
            format!("{category}-{n}-{name}")
        };
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn print_human(drafted: &[DocumentProposals<'_>], wrote_files: bool) {
    if drafted.is_empty() {
        println!("{}", "No proposals: nothing needs manual review".green());
        return;
    }
    for doc in drafted {
        println!("{}", doc.path.bold());
        if let Some(file) = &doc.review_file {
            println!("  {} {file}", "wrote".cyan());
        }
        for (gap, text) in doc.proposals {
            println!("  {} {gap}", "proposed".yellow());
            if !wrote_files {
                for line in text.lines() {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }
    println!();
    println!(
        "{}",
        "Proposals are drafts. Review them before copying anything into a skill.".dimmed()
    );
}
