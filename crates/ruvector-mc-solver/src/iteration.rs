//! Jacobi iteration form `x = C x + f` for the random-walk estimator.
//!
//! Splitting `A = D - R` with `D` the diagonal gives
//!
//! ```text
//! f[i]    = b[i] / A[i][i]
//! C[i][j] = -A[i][j] / A[i][i]     (j != i)
//! C[i][i] = 0
//! row_sum[i] = sum_j |C[i][j]|
//! ```
//!
//! `row_sum[i]` normalises the walk's transition probabilities out of state
//! `i`. The Neumann series behind the method converges when every row sum is
//! below one; rows at or above one are reported as [`ConvergenceRisk`] but
//! the form is still produced.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::SolverError;
use crate::types::{DenseMatrix, LinearSystem};

/// Diagonal magnitudes below this are treated as singular.
pub const DIAGONAL_EPSILON: f64 = 1e-12;

/// Row sums at or above this value void the convergence guarantee.
pub const CONVERGENCE_THRESHOLD: f64 = 1.0;

// ---------------------------------------------------------------------------
// ConvergenceRisk
// ---------------------------------------------------------------------------

/// Non-fatal signal: row `row` of `C` has `row_sum >= 1`, so the walk
/// estimator still runs but its accuracy is not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRisk {
    /// Offending row.
    pub row: usize,
    /// Its L1 norm `sum_j |C[row][j]|`.
    pub row_sum: f64,
}

// ---------------------------------------------------------------------------
// IterationForm
// ---------------------------------------------------------------------------

/// The normalised iteration form of a [`LinearSystem`].
///
/// Deterministic in its input and never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationForm {
    c: DenseMatrix,
    f: Vec<f64>,
    row_sum: Vec<f64>,
    risks: Vec<ConvergenceRisk>,
}

impl IterationForm {
    /// Dimension `n`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.f.len()
    }

    /// Iteration matrix `C` (zero diagonal).
    #[inline]
    pub fn matrix(&self) -> &DenseMatrix {
        &self.c
    }

    /// Normalised right-hand side `f = D^{-1} b`.
    #[inline]
    pub fn rhs(&self) -> &[f64] {
        &self.f
    }

    /// L1 norm of each row of `C`.
    #[inline]
    pub fn row_sums(&self) -> &[f64] {
        &self.row_sum
    }

    /// Rows whose sum voids the convergence guarantee, in row order.
    #[inline]
    pub fn convergence_risks(&self) -> &[ConvergenceRisk] {
        &self.risks
    }

    /// `true` when every row sum is below [`CONVERGENCE_THRESHOLD`].
    #[inline]
    pub fn is_convergent(&self) -> bool {
        self.risks.is_empty()
    }

    /// Largest row sum (an upper bound on the spectral radius of `C`).
    pub fn max_row_sum(&self) -> f64 {
        self.row_sum.iter().copied().fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// IterationFormBuilder
// ---------------------------------------------------------------------------

/// Builds an [`IterationForm`] from a [`LinearSystem`].
///
/// # Example
///
/// ```rust
/// use ruvector_mc_solver::iteration::IterationFormBuilder;
/// use ruvector_mc_solver::types::{DenseMatrix, LinearSystem};
///
/// let a = DenseMatrix::from_rows(&[vec![4.0, 1.0], vec![2.0, 5.0]]).unwrap();
/// let system = LinearSystem::new(a, vec![1.0, 2.0]).unwrap();
/// let form = IterationFormBuilder::new().build(&system).unwrap();
/// assert_eq!(form.rhs(), &[0.25, 0.4]);
/// assert!(form.is_convergent());
/// ```
#[derive(Debug, Clone)]
pub struct IterationFormBuilder {
    /// Singular-diagonal threshold.
    ///
    /// Default: [`DIAGONAL_EPSILON`] (`1e-12`).
    pub diagonal_epsilon: f64,
}

impl Default for IterationFormBuilder {
    fn default() -> Self {
        Self {
            diagonal_epsilon: DIAGONAL_EPSILON,
        }
    }
}

impl IterationFormBuilder {
    /// Builder with the default singular-diagonal threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute `C`, `f` and the row sums.
    ///
    /// Rows with `row_sum >= 1` are logged at `warn` and recorded in
    /// [`IterationForm::convergence_risks`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PreconditionFailure`] for the first row whose
    /// diagonal magnitude is below the threshold.
    #[instrument(skip(self, system), fields(n = system.dim()))]
    pub fn build(&self, system: &LinearSystem) -> Result<IterationForm, SolverError> {
        let n = system.dim();
        let a = system.matrix();
        let b = system.rhs();

        let mut c = DenseMatrix::zeros(n, n);
        let mut f = Vec::with_capacity(n);
        let mut row_sum = Vec::with_capacity(n);
        let mut risks = Vec::new();

        for i in 0..n {
            let diag = a.get(i, i);
            if diag.abs() < self.diagonal_epsilon {
                return Err(SolverError::PreconditionFailure {
                    row: i,
                    value: diag,
                    epsilon: self.diagonal_epsilon,
                });
            }

            f.push(b[i] / diag);

            let mut sum = 0.0;
            for (j, &a_ij) in a.row(i).iter().enumerate() {
                if j == i {
                    continue;
                }
                let c_ij = -a_ij / diag;
                c.set(i, j, c_ij);
                sum += c_ij.abs();
            }
            row_sum.push(sum);

            if sum >= CONVERGENCE_THRESHOLD {
                warn!(
                    target: "ruvector_mc_solver::iteration",
                    row = i,
                    row_sum = sum,
                    "row sum >= 1, convergence not guaranteed"
                );
                risks.push(ConvergenceRisk { row: i, row_sum: sum });
            }
        }

        let form = IterationForm {
            c,
            f,
            row_sum,
            risks,
        };
        debug!(
            target: "ruvector_mc_solver::iteration",
            n,
            max_row_sum = form.max_row_sum(),
            risky_rows = form.risks.len(),
            "iteration form built"
        );
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
