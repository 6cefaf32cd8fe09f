//! End-to-end tests: task files in, merged solution out.
//!
//! Mirrors the distributed flow: a system is split into work units, each unit
//! is written as a task input, solved independently from its text form, and
//! the text outputs are merged per task.

use rand::rngs::StdRng;
use rand::SeedableRng;
use ruvector_mc_solver::component::ComponentSolver;
use ruvector_mc_solver::coordinator::MergeCoordinator;
use ruvector_mc_solver::dense::{compare_solutions, dense_solve};
use ruvector_mc_solver::format::{parse_partial_solution, parse_task_input, write_task_input};
use ruvector_mc_solver::generate::diagonally_dominant_system;
use ruvector_mc_solver::iteration::IterationFormBuilder;
use ruvector_mc_solver::merge::{MergeConfig, PartialSolutionMerger, Submission};
use ruvector_mc_solver::partition::work_units;
use ruvector_mc_solver::types::{ComponentRange, DenseMatrix, LinearSystem};

/// Solve one task from its text form and return the text output.
fn run_task(text: &str, seed: u64) -> String {
    let task = parse_task_input(text).unwrap();
    let form = IterationFormBuilder::new().build(&task.system).unwrap();
    let partial = ComponentSolver::default()
        .with_seed(seed)
        .solve_seeded(&form, &task.range)
        .unwrap();
    partial.to_output_string()
}

#[test]
fn test_work_units_solved_and_merged() {
    let mut rng = StdRng::seed_from_u64(314);
    let generated = diagonally_dominant_system(10, &mut rng).unwrap();
    let units = work_units(10, 3, 20_000).unwrap();
    assert_eq!(units.len(), 3);
    assert_eq!(units[0], ComponentRange::new(0, 3, 20_000));

    let coord = MergeCoordinator::new(PartialSolutionMerger::new(MergeConfig::default()));
    for (k, unit) in units.iter().enumerate() {
        let input = write_task_input(&generated.system, unit);
        let output = run_task(&input, 1_000 + k as u64);
        coord.submit("wu-314", Submission::from_text(k as u64 + 1, &output));
    }

    let outcome = coord.merge("wu-314").unwrap();
    assert_eq!(outcome.values.len(), 10);
    assert_eq!(outcome.canonical_result_id, 1);
    assert_eq!(outcome.credit, 100.0);

    let direct = dense_solve(&generated.system).unwrap();
    let stats = compare_solutions(&outcome.values, &direct).unwrap();
    assert!(stats.max_abs < 0.1, "max abs error {}", stats.max_abs);
}

#[test]
fn test_replicated_outputs_corroborate() {
    // Tridiagonal system with x = [1, 1, 1, 1], far from zero so that the
    // relative comparison is meaningful.
    let a = DenseMatrix::from_rows(&[
        vec![4.0, 1.0, 0.0, 0.0],
        vec![1.0, 4.0, 1.0, 0.0],
        vec![0.0, 1.0, 4.0, 1.0],
        vec![0.0, 0.0, 1.0, 4.0],
    ])
    .unwrap();
    let system = LinearSystem::new(a, vec![5.0, 6.0, 6.0, 5.0]).unwrap();
    let input = write_task_input(&system, &ComponentRange::new(0, 3, 50_000));

    let a = parse_partial_solution(&run_task(&input, 11)).unwrap();
    let b = parse_partial_solution(&run_task(&input, 12)).unwrap();
    assert_ne!(a.values, b.values);
    // Independent replicas of the same unit agree within a few percent.
    assert!(ruvector_mc_solver::merge::compare_partial_solutions(&a, &b, 0.05));
}

#[test]
fn test_task_without_trailer_covers_everything() {
    let text = "2\n4 1\n1 4\n5\n5\n";
    let task = parse_task_input(text).unwrap();
    assert!(task.range.is_full(2));
    assert_eq!(task.range.num_walks, ruvector_mc_solver::types::DEFAULT_WALKS);
}

#[test]
fn test_output_round_trips_exactly_enough() {
    let text = "1\n2\n4\n0 0 10\n";
    let output = run_task(text, 5);
    let parsed = parse_partial_solution(&output).unwrap();
    // 1x1 system: C = 0 so every walk returns f = 2 exactly.
    assert_eq!(parsed.values, vec![2.0]);
    assert_eq!(output, "0 0\n2.000000000000000e+00\n");
}
