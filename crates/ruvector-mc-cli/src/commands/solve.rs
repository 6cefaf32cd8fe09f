//! Solve command: one task file in, one task output out.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ruvector_mc_solver::component::ComponentSolver;
use ruvector_mc_solver::dense::residual_report;
use ruvector_mc_solver::format::parse_task_input;
use ruvector_mc_solver::iteration::IterationFormBuilder;
use tracing::{debug, info};

use crate::config::McConfig;

/// Resolution of the progress bar.
const PROGRESS_TICKS: u64 = 1_000;

/// Arguments of the solve command.
pub struct SolveArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub walks: Option<u64>,
    pub seed: u64,
    pub termination_prob: Option<f64>,
    pub progress: bool,
}

/// Run the solve command
pub fn run(config: &McConfig, args: SolveArgs) -> Result<()> {
    let text = super::read_file(&args.input)?;
    let mut task = parse_task_input(&text)
        .with_context(|| format!("Invalid task file {}", args.input.display()))?;
    if let Some(walks) = args.walks {
        task.range.num_walks = walks;
    }
    debug!(
        path = %args.input.display(),
        n = task.system.dim(),
        start = task.range.start_idx,
        end = task.range.end_idx,
        walks = task.range.num_walks,
        "task loaded"
    );

    let mut params = config.walk;
    if let Some(p) = args.termination_prob {
        params.termination_prob = p;
    }

    let form = IterationFormBuilder::new().build(&task.system)?;
    // With the solution on stdout, human-readable output goes to stderr.
    let to_stdout = args.output.is_none();
    let note = |line: String| {
        if to_stdout {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    };

    if !form.is_convergent() {
        note(format!(
            "{} {} row(s) with row sum >= 1 (max {:.4}); the estimate may not converge",
            "Warning:".yellow().bold(),
            form.convergence_risks().len(),
            form.max_row_sum()
        ));
    }

    let pb = if args.progress && !to_stdout {
        let pb = ProgressBar::new(PROGRESS_TICKS);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let solver = ComponentSolver::new(params);
    let mut rng = if args.seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(args.seed)
    };

    let start = Instant::now();
    let report = solver.solve_with_stats(
        &form,
        &task.range,
        &mut rng,
        &|fraction: f64| pb.set_position((fraction * PROGRESS_TICKS as f64) as u64),
    )?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, "task solved");

    let out = report.solution.to_output_string();
    match &args.output {
        Some(path) => super::write_file(path, &out)?,
        None => print!("{out}"),
    }

    let n = task.system.dim();
    let max_se = report
        .stats
        .iter()
        .map(|s| s.std_error)
        .fold(0.0f64, f64::max);
    note(format!(
        "{} components [{}, {}] of n = {} with {} walks each in {:.2?}",
        "Solved".green().bold(),
        task.range.start_idx,
        task.range.end_idx,
        n,
        task.range.num_walks,
        elapsed
    ));
    note(format!("  Max standard error: {max_se:.3e}"));

    if task.range.is_full(n) {
        let residual = residual_report(&task.system, &report.solution.values)?;
        note(format!(
            "  Residual ||Ax-b||: {:.3e} (relative {:.3e})",
            residual.residual_norm, residual.relative_residual
        ));
    }
    if let Some(path) = &args.output {
        note(format!("  Output: {}", path.display().to_string().cyan()));
    }

    Ok(())
}
