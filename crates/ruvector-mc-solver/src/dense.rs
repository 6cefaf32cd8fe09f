//! Direct reference solve and verification of Monte Carlo estimates.
//!
//! Gaussian elimination gives the exact answer (up to round-off) against
//! which a Monte Carlo solution is judged. [`residual_report`] checks a full
//! solution vector against the system itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SolverError, ValidationError};
use crate::iteration::DIAGONAL_EPSILON;
use crate::types::LinearSystem;

/// Magnitude added to `|direct|` in the relative error of
/// [`compare_solutions`].
const RELATIVE_GUARD: f64 = 1e-10;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`SolverError::PreconditionFailure`] if the largest available
/// pivot in some column is below [`DIAGONAL_EPSILON`].
pub fn dense_solve(system: &LinearSystem) -> Result<Vec<f64>, SolverError> {
    let n = system.dim();
    let a = system.matrix();

    // Augmented matrix [A | b].
    let mut aug: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = Vec::with_capacity(n + 1);
            row.extend_from_slice(a.row(i));
            row.push(system.rhs()[i]);
            row
        })
        .collect();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for (row, r) in aug.iter().enumerate().skip(col + 1) {
            if r[col].abs() > max_val {
                max_val = r[col].abs();
                max_row = row;
            }
        }
        if max_val < DIAGONAL_EPSILON {
            return Err(SolverError::PreconditionFailure {
                row: col,
                value: max_val,
                epsilon: DIAGONAL_EPSILON,
            });
        }
        aug.swap(col, max_row);

        let (pivot_rows, rest) = aug.split_at_mut(col + 1);
        let pivot_row = &pivot_rows[col];
        let pivot = pivot_row[col];
        for r in rest.iter_mut() {
            let factor = r[col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                r[j] -= factor * pivot_row[j];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }

    debug!(target: "ruvector_mc_solver::dense", n, "direct solve complete");
    Ok(x)
}

/// Residual of a full solution vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualReport {
    /// `||A x - b||_2`.
    pub residual_norm: f64,
    /// `max_i |(A x - b)_i|`.
    pub max_abs_residual: f64,
    /// `||b||_2`.
    pub rhs_norm: f64,
    /// `residual_norm / rhs_norm` (or `residual_norm` when `b = 0`).
    pub relative_residual: f64,
}

/// Compute the residual of `x` against `system`.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] if `x.len() != n`.
pub fn residual_report(system: &LinearSystem, x: &[f64]) -> Result<ResidualReport, ValidationError> {
    let n = system.dim();
    if x.len() != n {
        return Err(ValidationError::DimensionMismatch(format!(
            "solution length {} does not match dimension {}",
            x.len(),
            n,
        )));
    }

    let mut ax = vec![0.0f64; n];
    system.matrix().matvec(x, &mut ax);

    let mut sq = 0.0f64;
    let mut max_abs = 0.0f64;
    for (axi, bi) in ax.iter().zip(system.rhs()) {
        let r = axi - bi;
        sq += r * r;
        max_abs = max_abs.max(r.abs());
    }
    let residual_norm = sq.sqrt();
    let rhs_norm = system.rhs().iter().map(|v| v * v).sum::<f64>().sqrt();
    let relative_residual = if rhs_norm > 0.0 {
        residual_norm / rhs_norm
    } else {
        residual_norm
    };

    Ok(ResidualReport {
        residual_norm,
        max_abs_residual: max_abs,
        rhs_norm,
        relative_residual,
    })
}

/// Error statistics of an estimate against a reference solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Largest `|mc_i - direct_i|`.
    pub max_abs: f64,
    /// Mean `|mc_i - direct_i|`.
    pub mean_abs: f64,
    /// Largest `|mc_i - direct_i| / (|direct_i| + 1e-10)`.
    pub max_rel: f64,
    /// Mean of the same relative error.
    pub mean_rel: f64,
}

/// Compare an estimate against a reference component by component.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] for unequal or zero
/// lengths.
pub fn compare_solutions(mc: &[f64], direct: &[f64]) -> Result<ErrorStats, ValidationError> {
    if mc.len() != direct.len() || mc.is_empty() {
        return Err(ValidationError::DimensionMismatch(format!(
            "cannot compare vectors of length {} and {}",
            mc.len(),
            direct.len(),
        )));
    }

    let mut stats = ErrorStats {
        max_abs: 0.0,
        mean_abs: 0.0,
        max_rel: 0.0,
        mean_rel: 0.0,
    };
    for (&m, &d) in mc.iter().zip(direct) {
        let abs = (m - d).abs();
        let rel = abs / (d.abs() + RELATIVE_GUARD);
        stats.max_abs = stats.max_abs.max(abs);
        stats.max_rel = stats.max_rel.max(rel);
        stats.mean_abs += abs;
        stats.mean_rel += rel;
    }
    let n = mc.len() as f64;
    stats.mean_abs /= n;
    stats.mean_rel /= n;
    Ok(stats)
}
