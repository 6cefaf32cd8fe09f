//! Shared test helpers for the ruvector-mc-solver integration test suite.
//!
//! Provides deterministic system generators, vector norms and a few
//! shortcuts for building submissions.

#![allow(dead_code)]

use ruvector_mc_solver::merge::{ResultId, Submission};
use ruvector_mc_solver::types::{DenseMatrix, LinearSystem, PartialSolution};

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate a uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// System generators
// ---------------------------------------------------------------------------

/// Dense diagonally dominant matrix whose iteration matrix has every row sum
/// equal to `row_sum` (must be in `(0, 1)` for a convergent system).
///
/// Off-diagonal entries are uniform in `[-1, 1]`; the diagonal is chosen as
/// `sum_j |A[i][j]| / row_sum` with a random sign.
pub fn random_dominant_matrix(n: usize, row_sum: f64, seed: u64) -> DenseMatrix {
    let mut rng = Lcg::new(seed);
    let mut a = DenseMatrix::zeros(n, n);
    for i in 0..n {
        let mut off = 0.0f64;
        for j in 0..n {
            if i != j {
                let v = rng.next_f64_range(-1.0, 1.0);
                a.set(i, j, v);
                off += v.abs();
            }
        }
        if off == 0.0 {
            off = 1.0;
        }
        let sign = if rng.next_f64() < 0.5 { -1.0 } else { 1.0 };
        a.set(i, i, sign * off / row_sum);
    }
    a
}

/// Generate a deterministic random vector of length `n` in `[-1, 1)`.
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.next_f64_range(-1.0, 1.0)).collect()
}

/// Build `A x = b` with `b = A x_true` and return the system and `x_true`.
pub fn system_with_solution(a: DenseMatrix, x_true: Vec<f64>) -> (LinearSystem, Vec<f64>) {
    let mut b = vec![0.0; a.rows()];
    a.matvec(&x_true, &mut b);
    (LinearSystem::new(a, b).unwrap(), x_true)
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Compute the L2 distance between two vectors.
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b.iter())
        .map(|(&ai, &bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

/// Compute the relative error ||approx - exact|| / ||exact||.
///
/// Returns absolute error if the exact solution has zero norm.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let exact_norm = l2_norm(exact);
    let error = l2_distance(approx, exact);
    if exact_norm > 1e-15 {
        error / exact_norm
    } else {
        error
    }
}

/// Mean absolute componentwise error.
pub fn mean_abs_error(approx: &[f64], exact: &[f64]) -> f64 {
    assert_eq!(approx.len(), exact.len(), "vectors must have same length");
    approx
        .iter()
        .zip(exact)
        .map(|(a, e)| (a - e).abs())
        .sum::<f64>()
        / approx.len() as f64
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// A well-formed submission covering `[start, start + values.len() - 1]`.
pub fn submission(id: ResultId, start: usize, values: Vec<f64>) -> Submission {
    let end = start + values.len() - 1;
    Submission::parsed(id, PartialSolution::new(start, end, values).unwrap())
}

/// The slice `x[start..=end]` as a submission.
pub fn slice_submission(id: ResultId, x: &[f64], start: usize, end: usize) -> Submission {
    submission(id, start, x[start..=end].to_vec())
}
