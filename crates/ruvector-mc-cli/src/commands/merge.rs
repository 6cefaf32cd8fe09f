//! Merge command: task outputs in, merged solution and credit out.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use ruvector_mc_solver::audit::AuditBuilder;
use ruvector_mc_solver::events::MergeEvent;
use ruvector_mc_solver::merge::{
    MergeOutcome, PartialSolutionMerger, PerIndex, ResultId, Submission,
};
use ruvector_mc_solver::traits::{ConflictPolicy, CreditFunction};
use ruvector_mc_solver::types::PartialSolution;
use tracing::{debug, info};

use crate::config::McConfig;

/// Arguments of the merge command.
pub struct MergeArgs {
    pub outputs: Vec<String>,
    pub task: String,
    pub output: Option<PathBuf>,
    pub per_index: bool,
    pub tolerance: Option<f64>,
    pub events: Option<PathBuf>,
    pub audit: Option<PathBuf>,
}

/// Split `ID=PATH`; a bare path gets `default_id`.
fn parse_output_arg(arg: &str, default_id: ResultId) -> Result<(ResultId, PathBuf)> {
    match arg.split_once('=') {
        Some((id, path)) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
            let id = id
                .parse()
                .with_context(|| format!("Invalid result id in {arg:?}"))?;
            Ok((id, PathBuf::from(path)))
        }
        _ => Ok((default_id, PathBuf::from(arg))),
    }
}

/// Run the merge command
pub fn run(config: &McConfig, args: MergeArgs) -> Result<()> {
    let mut submissions = Vec::with_capacity(args.outputs.len());
    for (k, arg) in args.outputs.iter().enumerate() {
        let (id, path) = parse_output_arg(arg, k as ResultId + 1)?;
        let text = super::read_file(&path)?;
        debug!(result_id = id, path = %path.display(), bytes = text.len(), "task output read");
        submissions.push(Submission::from_text(id, &text));
    }

    let mut merge_config = config.merge;
    if let Some(tolerance) = args.tolerance {
        merge_config.tolerance = tolerance;
    }
    merge_config.validate()?;

    let merger = PartialSolutionMerger::new(merge_config).with_credit(config.credit);
    if args.per_index {
        run_pass(&merger.with_policy(PerIndex), &submissions, &args)
    } else {
        run_pass(&merger, &submissions, &args)
    }
}

fn run_pass<P: ConflictPolicy, C: CreditFunction>(
    merger: &PartialSolutionMerger<P, C>,
    submissions: &[Submission],
    args: &MergeArgs,
) -> Result<()> {
    let audit = AuditBuilder::start(args.task.as_str(), merger.policy().name(), submissions);
    let mut events = Vec::new();
    let result = merger.merge_with_events(submissions, &mut events);
    let entry = audit.finish(&result);
    info!(
        task = %args.task,
        policy = merger.policy().name(),
        events = events.len(),
        wall_time_us = entry.wall_time_us,
        "merge pass finished"
    );

    if let Some(path) = &args.events {
        write_events(path, &events)?;
    }
    if let Some(path) = &args.audit {
        let json = serde_json::to_string_pretty(&entry)?;
        super::write_file(path, &json)?;
    }

    let outcome = result?;
    print_outcome(&outcome);

    if let Some(path) = &args.output {
        let merged = PartialSolution::new(0, outcome.max_idx(), outcome.values.clone())?;
        super::write_file(path, &merged.to_output_string())?;
        println!("  Output: {}", path.display().to_string().cyan());
    }
    Ok(())
}

fn write_events(path: &Path, events: &[MergeEvent]) -> Result<()> {
    let mut out = String::new();
    for event in events {
        writeln!(out, "{}", event.to_json_line()?)?;
    }
    super::write_file(path, &out)
}

fn print_outcome(outcome: &MergeOutcome) {
    println!(
        "{} {} components, canonical result {}",
        "Merged".green().bold(),
        outcome.values.len(),
        outcome.canonical_result_id.to_string().cyan()
    );
    println!("  Credit: {}", format!("{:.2}", outcome.credit).cyan());
    for accepted in &outcome.accepted {
        println!(
            "  {} result {} [{}, {}]",
            "accepted".green(),
            accepted.result_id,
            accepted.solution.start_idx,
            accepted.solution.end_idx
        );
    }
    for rejected in &outcome.rejected {
        println!(
            "  {} result {}: {}",
            "rejected".red(),
            rejected.result_id,
            rejected.reason
        );
    }
}
