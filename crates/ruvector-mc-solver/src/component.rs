//! Monte Carlo estimation of a contiguous range of solution components.
//!
//! For each index `i` in a [`ComponentRange`] the solver averages
//! `num_walks` independent [`RandomWalkEstimator`] samples started at `i`.
//! The estimate is unbiased; its standard error shrinks with
//! `1 / sqrt(num_walks)`. Welford's online algorithm tracks the per-component
//! variance so callers can see that error without a second pass.
//!
//! # Randomness
//!
//! Every entry point takes its randomness explicitly. [`ComponentSolver::solve`]
//! borrows the caller's generator; [`ComponentSolver::solve_seeded`] builds a
//! private `StdRng` from `seed` (or from OS entropy when `seed == 0`). With the
//! `parallel` feature, [`ComponentSolver::solve_parallel`] gives each component
//! its own generator so rayon workers never share state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::SolverError;
use crate::iteration::IterationForm;
use crate::traits::{NoProgress, ProgressObserver};
use crate::types::{ComponentRange, PartialSolution};
use crate::walk::{RandomWalkEstimator, WalkParams};

/// Walks between two progress reports.
const PROGRESS_INTERVAL: u64 = 1_000;

// ---------------------------------------------------------------------------
// Welford's online variance tracker
// ---------------------------------------------------------------------------

/// Running mean and variance via Welford's numerically stable online
/// algorithm.
#[derive(Debug, Clone)]
struct WelfordAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl WelfordAccumulator {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    #[inline]
    fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Unbiased sample variance; zero with fewer than two samples.
    #[inline]
    fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Standard error of the mean.
    #[inline]
    fn std_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance() / self.count as f64).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary statistics for one estimated component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    /// Absolute component index.
    pub index: usize,
    /// Monte Carlo estimate (mean of the walk sums).
    pub mean: f64,
    /// Standard error of the estimate.
    pub std_error: f64,
    /// Number of walks averaged.
    pub walks: u64,
}

/// A partial solution together with its per-component statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentReport {
    /// Values in the task-output shape.
    pub solution: PartialSolution,
    /// One entry per component, in index order.
    pub stats: Vec<ComponentStats>,
}

// ---------------------------------------------------------------------------
// ComponentSolver
// ---------------------------------------------------------------------------

/// Drives many independent random walks per component and averages them.
///
/// Stateless apart from its configuration: two solvers (or two calls on the
/// same solver) share nothing, which makes one solver run per component range
/// the natural unit of parallel work.
///
/// # Example
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use ruvector_mc_solver::component::ComponentSolver;
/// use ruvector_mc_solver::iteration::IterationFormBuilder;
/// use ruvector_mc_solver::types::{ComponentRange, DenseMatrix, LinearSystem};
///
/// let a = DenseMatrix::from_rows(&[vec![4.0, 1.0], vec![1.0, 4.0]]).unwrap();
/// let system = LinearSystem::new(a, vec![5.0, 5.0]).unwrap();
/// let form = IterationFormBuilder::new().build(&system).unwrap();
///
/// let solver = ComponentSolver::default();
/// let mut rng = StdRng::seed_from_u64(11);
/// let partial = solver
///     .solve(&form, &ComponentRange::new(0, 1, 20_000), &mut rng)
///     .unwrap();
/// assert!((partial.values[0] - 1.0).abs() < 0.05);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentSolver {
    /// Random-walk parameters.
    pub params: WalkParams,
    /// Seed for the generator built by [`solve_seeded`](Self::solve_seeded)
    /// and [`solve_parallel`](Self::solve_parallel) (0 = OS entropy).
    pub seed: u64,
}

impl ComponentSolver {
    /// Create a solver with the given walk parameters and an entropy seed.
    pub fn new(params: WalkParams) -> Self {
        Self { params, seed: 0 }
    }

    /// Set the seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn make_rng(&self) -> StdRng {
        if self.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(self.seed)
        }
    }

    fn validate(&self, form: &IterationForm, range: &ComponentRange) -> Result<(), SolverError> {
        range.validate_for(form.dim())?;
        self.params.validate()?;
        Ok(())
    }

    /// Estimate every component of `range` using the caller's generator.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if the range does not fit the
    /// system or the walk parameters are out of range.
    pub fn solve<R: Rng + ?Sized>(
        &self,
        form: &IterationForm,
        range: &ComponentRange,
        rng: &mut R,
    ) -> Result<PartialSolution, SolverError> {
        self.solve_with_stats(form, range, rng, &NoProgress)
            .map(|report| report.solution)
    }

    /// Like [`solve`](Self::solve) but with a private generator derived from
    /// [`seed`](Self::seed).
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    pub fn solve_seeded(
        &self,
        form: &IterationForm,
        range: &ComponentRange,
    ) -> Result<PartialSolution, SolverError> {
        let mut rng = self.make_rng();
        self.solve(form, range, &mut rng)
    }

    /// Estimate every component of `range`, reporting progress and returning
    /// per-component statistics.
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    #[instrument(
        skip(self, form, rng, progress),
        fields(start = range.start_idx, end = range.end_idx, walks = range.num_walks)
    )]
    pub fn solve_with_stats<R: Rng + ?Sized>(
        &self,
        form: &IterationForm,
        range: &ComponentRange,
        rng: &mut R,
        progress: &dyn ProgressObserver,
    ) -> Result<ComponentReport, SolverError> {
        self.validate(form, range)?;
        let estimator = RandomWalkEstimator::new(form, self.params)?;

        let num_components = range.len();
        let mut values = Vec::with_capacity(num_components);
        let mut stats = Vec::with_capacity(num_components);

        progress.report(0.0);
        for (offset, index) in range.indices().enumerate() {
            let mut acc = WelfordAccumulator::new();
            for walk in 0..range.num_walks {
                acc.update(estimator.sample(index, rng));
                if walk % PROGRESS_INTERVAL == 0 {
                    let fraction = (offset as f64 + walk as f64 / range.num_walks as f64)
                        / num_components as f64;
                    progress.report(fraction);
                }
            }

            let component = ComponentStats {
                index,
                mean: acc.mean,
                std_error: acc.std_error(),
                walks: acc.count,
            };
            debug!(
                target: "ruvector_mc_solver::component",
                index,
                mean = component.mean,
                std_error = component.std_error,
                "component estimated"
            );
            progress.report((offset + 1) as f64 / num_components as f64);

            values.push(component.mean);
            stats.push(component);
        }

        info!(
            target: "ruvector_mc_solver::component",
            start = range.start_idx,
            end = range.end_idx,
            walks = range.num_walks,
            "component range solved"
        );

        Ok(ComponentReport {
            solution: PartialSolution {
                start_idx: range.start_idx,
                end_idx: range.end_idx,
                values,
            },
            stats,
        })
    }

    /// Estimate the components of `range` concurrently, one rayon task per
    /// component, each with its own generator.
    ///
    /// With `seed == 0` every component draws a fresh entropy seed; otherwise
    /// component `i` uses `seed + i * 1000003`, so results are reproducible
    /// but differ from [`solve_seeded`](Self::solve_seeded).
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    #[cfg(feature = "parallel")]
    pub fn solve_parallel(
        &self,
        form: &IterationForm,
        range: &ComponentRange,
    ) -> Result<PartialSolution, SolverError> {
        use rayon::prelude::*;

        self.validate(form, range)?;
        let estimator = RandomWalkEstimator::new(form, self.params)?;

        let values: Vec<f64> = range
            .indices()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|index| {
                let mut rng = if self.seed == 0 {
                    StdRng::from_entropy()
                } else {
                    StdRng::seed_from_u64(self.seed.wrapping_add(index as u64 * 1000003))
                };
                let mut acc = WelfordAccumulator::new();
                for _ in 0..range.num_walks {
                    acc.update(estimator.sample(index, &mut rng));
                }
                acc.mean
            })
            .collect();

        debug!(
            target: "ruvector_mc_solver::component",
            start = range.start_idx,
            end = range.end_idx,
            threads = rayon::current_num_threads(),
            "parallel component range solved"
        );

        Ok(PartialSolution {
            start_idx: range.start_idx,
            end_idx: range.end_idx,
            values,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
