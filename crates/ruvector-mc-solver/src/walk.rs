//! Ulam–von Neumann random walk over the iteration matrix.
//!
//! One walk estimates component `x_i` of the solution of `x = C x + f`.
//! Starting at state `i` with weight 1, each step adds `weight * f[state]`,
//! then either terminates (probability `p_term`) or moves to state `j` with
//! probability `|C[state][j]| / row_sum[state]`. The weight is multiplied by
//!
//! ```text
//! sign(C[state][j]) * row_sum[state] / (1 - p_term)
//! ```
//!
//! which is exactly `C[state][j] / P(state -> j and survive)`, so the
//! expected walk sum is `sum_k (C^k f)_i = x_i` whenever the Neumann series
//! converges.
//!
//! # Complexity
//!
//! Expected walk length is `1 / p_term` steps, each costing `O(n)` for the
//! cumulative-sum inversion over a dense row.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, ValidationError};
use crate::iteration::IterationForm;
use crate::validation;

/// Per-step termination probability.
pub const DEFAULT_TERMINATION_PROB: f64 = 0.1;

/// Hard cap on steps per walk.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Row sums below this are absorbing: the walk has nowhere to go.
const ABSORBING_ROW_SUM: f64 = 1e-12;

// ---------------------------------------------------------------------------
// WalkParams
// ---------------------------------------------------------------------------

/// Random-walk parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    /// Probability of stopping after each contribution.
    ///
    /// Default: `0.1`.
    pub termination_prob: f64,
    /// Maximum number of steps before the walk is cut off.
    ///
    /// Default: `10_000`.
    pub max_steps: usize,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            termination_prob: DEFAULT_TERMINATION_PROB,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl WalkParams {
    /// Check the parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] if `termination_prob`
    /// is outside `(0, 1)` or `max_steps` is zero or too large.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_walk_params(self.termination_prob, self.max_steps)
    }
}

// ---------------------------------------------------------------------------
// RandomWalkEstimator
// ---------------------------------------------------------------------------

/// Draws single-walk samples over a borrowed [`IterationForm`].
///
/// The estimator holds no random state of its own; every call takes the
/// caller's generator, so concurrent workers never share one.
///
/// # Example
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use ruvector_mc_solver::iteration::IterationFormBuilder;
/// use ruvector_mc_solver::types::{DenseMatrix, LinearSystem};
/// use ruvector_mc_solver::walk::{RandomWalkEstimator, WalkParams};
///
/// let a = DenseMatrix::from_rows(&[vec![4.0, 1.0], vec![1.0, 4.0]]).unwrap();
/// let system = LinearSystem::new(a, vec![5.0, 5.0]).unwrap();
/// let form = IterationFormBuilder::new().build(&system).unwrap();
///
/// let estimator = RandomWalkEstimator::new(&form, WalkParams::default()).unwrap();
/// let mut rng = StdRng::seed_from_u64(7);
/// let sample = estimator.sample(0, &mut rng);
/// assert!(sample.is_finite());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RandomWalkEstimator<'a> {
    form: &'a IterationForm,
    params: WalkParams,
    /// Cached `1 / (1 - p_term)`.
    survival_scale: f64,
}

impl<'a> RandomWalkEstimator<'a> {
    /// Create an estimator.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `params` is out of range.
    pub fn new(form: &'a IterationForm, params: WalkParams) -> Result<Self, SolverError> {
        params.validate()?;
        Ok(Self {
            form,
            params,
            survival_scale: 1.0 / (1.0 - params.termination_prob),
        })
    }

    /// The parameters in use.
    #[inline]
    pub fn params(&self) -> &WalkParams {
        &self.params
    }

    /// The iteration form being walked.
    #[inline]
    pub fn form(&self) -> &'a IterationForm {
        self.form
    }

    /// Simulate one walk from `start_state` and return its accumulated sum.
    ///
    /// # Panics
    ///
    /// Panics if `start_state >= form.dim()`.
    pub fn sample<R: Rng + ?Sized>(&self, start_state: usize, rng: &mut R) -> f64 {
        let f = self.form.rhs();
        let row_sum = self.form.row_sums();
        assert!(
            start_state < f.len(),
            "start state {} out of bounds for dimension {}",
            start_state,
            f.len(),
        );

        let mut current = start_state;
        let mut weight = 1.0f64;
        let mut sum = 0.0f64;

        for _ in 0..self.params.max_steps {
            sum += weight * f[current];

            if rng.gen::<f64>() < self.params.termination_prob {
                break;
            }

            let norm = row_sum[current];
            if norm < ABSORBING_ROW_SUM {
                break;
            }

            let r = rng.gen::<f64>() * norm;
            let (next, c_ij) = self.select_next_state(current, r);

            let sign = if c_ij >= 0.0 { 1.0 } else { -1.0 };
            weight *= sign * norm * self.survival_scale;
            current = next;
        }

        sum
    }

    /// Cumulative-sum inversion over `|C[row][·]|`.
    ///
    /// Returns the chosen column and its signed coefficient. If round-off
    /// leaves `r` above the final cumulative sum, the last column with a
    /// non-zero coefficient is chosen. The caller guarantees the row has at
    /// least one.
    #[inline]
    fn select_next_state(&self, row: usize, r: f64) -> (usize, f64) {
        let coeffs = self.form.matrix().row(row);
        let mut cumsum = 0.0;
        let mut last_nonzero = (row, 0.0);

        for (j, &c_ij) in coeffs.iter().enumerate() {
            if c_ij == 0.0 {
                continue;
            }
            cumsum += c_ij.abs();
            last_nonzero = (j, c_ij);
            if r <= cumsum {
                return (j, c_ij);
            }
        }

        last_nonzero
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
