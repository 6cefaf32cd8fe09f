//! Demo command: generate, split, solve each unit, merge, and compare with a
//! direct solve, all in process.

use std::time::Instant;

use anyhow::Result;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ruvector_mc_solver::component::ComponentSolver;
use ruvector_mc_solver::coordinator::MergeCoordinator;
use ruvector_mc_solver::dense::{compare_solutions, dense_solve, residual_report};
use ruvector_mc_solver::generate::diagonally_dominant_system;
use ruvector_mc_solver::iteration::IterationFormBuilder;
use ruvector_mc_solver::merge::{PartialSolutionMerger, Submission};
use ruvector_mc_solver::partition::work_units;

use crate::config::McConfig;

/// Rows shown in the comparison table.
const TABLE_ROWS: usize = 10;

const TASK_ID: &str = "demo";

/// Run the demo command
pub fn run(config: &McConfig, n: usize, units: usize, walks: Option<u64>, seed: u64) -> Result<()> {
    let walks = config.walks_or_default(walks);
    let mut rng = StdRng::seed_from_u64(seed);
    let generated = diagonally_dominant_system(n, &mut rng)?;
    let form = IterationFormBuilder::new().build(&generated.system)?;

    println!("{}", "Monte Carlo Ax = b".bold().cyan());
    println!(
        "  n = {}, max row sum = {:.4}, {} walks per component",
        n,
        form.max_row_sum(),
        walks
    );
    println!();

    let coordinator = MergeCoordinator::new(
        PartialSolutionMerger::new(config.merge).with_credit(config.credit),
    );

    let start = Instant::now();
    for (k, range) in work_units(n, units, walks)?.iter().enumerate() {
        // Each unit stands in for an independent worker with its own seed.
        let unit_seed = seed.wrapping_add(k as u64 + 1);
        let partial = ComponentSolver::new(config.walk)
            .with_seed(unit_seed)
            .solve_seeded(&form, range)?;
        coordinator.submit(TASK_ID, Submission::parsed(k as u64 + 1, partial));
        println!(
            "  unit {} [{}, {}] solved",
            k + 1,
            range.start_idx,
            range.end_idx
        );
    }
    let mc_time = start.elapsed();

    let outcome = coordinator.merge(TASK_ID)?;

    let start = Instant::now();
    let direct = dense_solve(&generated.system)?;
    let direct_time = start.elapsed();

    println!();
    println!(
        "  {:>5}  {:>14}  {:>14}  {:>14}  {:>10}",
        "i", "monte carlo", "direct", "true", "abs err"
    );
    for i in 0..n.min(TABLE_ROWS) {
        println!(
            "  {:>5}  {:>14.6}  {:>14.6}  {:>14.6}  {:>10.2e}",
            i,
            outcome.values[i],
            direct[i],
            generated.solution[i],
            (outcome.values[i] - direct[i]).abs()
        );
    }
    if n > TABLE_ROWS {
        println!("  {:>5}", "...");
    }

    let stats = compare_solutions(&outcome.values, &direct)?;
    let residual = residual_report(&generated.system, &outcome.values)?;
    println!();
    println!("{}", "Error versus direct solve".bold());
    println!("  Max abs error:     {:.3e}", stats.max_abs);
    println!("  Mean abs error:    {:.3e}", stats.mean_abs);
    println!("  Max rel error:     {:.3e}", stats.max_rel);
    println!("  Mean rel error:    {:.3e}", stats.mean_rel);
    println!("  Relative residual: {:.3e}", residual.relative_residual);
    println!();
    println!(
        "  Monte Carlo: {:.2?}  Direct: {:.2?}  Credit: {:.2}",
        mc_time, direct_time, outcome.credit
    );
    println!(
        "{} merged {} components from {} unit(s)",
        "Done".green().bold(),
        outcome.values.len(),
        outcome.accepted.len()
    );

    Ok(())
}
