//! Monte Carlo (Ulam–von Neumann) solver for dense linear systems.
//!
//! This crate estimates individual components of the solution of `Ax = b`
//! by averaging random walks over the Jacobi iteration matrix, and merges
//! partial solutions computed independently for disjoint or overlapping
//! component ranges.
//!
//! # Pipeline
//!
//! | Stage | Type | Module |
//! |-------|------|--------|
//! | `A, b` to `x = Cx + f` | [`IterationFormBuilder`](iteration::IterationFormBuilder) | [`iteration`] |
//! | one walk from state `i` | [`RandomWalkEstimator`](walk::RandomWalkEstimator) | [`walk`] |
//! | range of components | [`ComponentSolver`](component::ComponentSolver) | [`component`] |
//! | partial solutions to `x` | [`PartialSolutionMerger`](merge::PartialSolutionMerger) | [`merge`] |
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ruvector_mc_solver::component::ComponentSolver;
//! use ruvector_mc_solver::iteration::IterationFormBuilder;
//! use ruvector_mc_solver::merge::{MergeConfig, PartialSolutionMerger, Submission};
//! use ruvector_mc_solver::types::{ComponentRange, DenseMatrix, LinearSystem};
//!
//! let a = DenseMatrix::from_rows(&[
//!     vec![4.0, 1.0, 0.0],
//!     vec![1.0, 4.0, 1.0],
//!     vec![0.0, 1.0, 4.0],
//! ]).unwrap();
//! let system = LinearSystem::new(a, vec![5.0, 6.0, 5.0]).unwrap();
//! let form = IterationFormBuilder::new().build(&system).unwrap();
//!
//! // Two workers, two ranges, independent generators.
//! let solver = ComponentSolver::default();
//! let left = solver
//!     .solve(&form, &ComponentRange::new(0, 1, 20_000), &mut StdRng::seed_from_u64(1))
//!     .unwrap();
//! let right = solver
//!     .solve(&form, &ComponentRange::new(2, 2, 20_000), &mut StdRng::seed_from_u64(2))
//!     .unwrap();
//!
//! let outcome = PartialSolutionMerger::new(MergeConfig::default())
//!     .merge(&[Submission::parsed(1, left), Submission::parsed(2, right)])
//!     .unwrap();
//! assert_eq!(outcome.values.len(), 3);
//! assert!(outcome.values.iter().all(|x| (x - 1.0).abs() < 0.05));
//! ```
//!
//! # Features
//!
//! - `parallel`: [`ComponentSolver::solve_parallel`](component::ComponentSolver)
//!   runs one rayon task per component.

pub mod audit;
pub mod component;
pub mod coordinator;
pub mod dense;
pub mod error;
pub mod events;
pub mod format;
pub mod generate;
pub mod iteration;
pub mod merge;
pub mod partition;
pub mod traits;
pub mod types;
pub mod validation;
pub mod walk;

