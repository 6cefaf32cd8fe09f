//! Generate command: a random diagonally dominant system split into work
//! units, one task file per unit.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ruvector_mc_solver::format::write_task_input;
use ruvector_mc_solver::generate::diagonally_dominant_system;
use ruvector_mc_solver::partition::work_units;
use ruvector_mc_solver::types::PartialSolution;

use crate::config::McConfig;

/// File holding the true solution in task-output form.
pub const SOLUTION_FILE: &str = "solution.txt";

/// Name of the task file for unit `k`.
pub fn task_file_name(k: usize) -> String {
    format!("task_{k:03}.txt")
}

/// Run the generate command
pub fn run(
    config: &McConfig,
    n: usize,
    units: usize,
    walks: Option<u64>,
    seed: u64,
    out_dir: &Path,
) -> Result<()> {
    let walks = config.walks_or_default(walks);
    let mut rng = StdRng::seed_from_u64(seed);
    let generated = diagonally_dominant_system(n, &mut rng)?;
    let ranges = work_units(n, units, walks)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory {}", out_dir.display()))?;

    println!(
        "{} {}x{} system, {} work unit(s), {} walks per component",
        "Generated".green().bold(),
        n,
        n,
        ranges.len(),
        walks
    );
    for (k, range) in ranges.iter().enumerate() {
        let path = out_dir.join(task_file_name(k));
        super::write_file(&path, &write_task_input(&generated.system, range))?;
        println!(
            "  {} [{}, {}]",
            path.display().to_string().cyan(),
            range.start_idx,
            range.end_idx
        );
    }

    let truth = PartialSolution::new(0, n - 1, generated.solution)?;
    let path = out_dir.join(SOLUTION_FILE);
    super::write_file(&path, &truth.to_output_string())?;
    println!("  {} (true solution)", path.display().to_string().cyan());

    Ok(())
}
