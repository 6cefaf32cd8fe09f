//! Input validation for solver operations.
//!
//! All validation functions run eagerly before any computation begins, so
//! callers receive clear diagnostics instead of silent overflow or runaway
//! walks. Every public function returns [`ValidationError`] on failure, which
//! converts into [`SolverError::InvalidInput`](crate::error::SolverError::InvalidInput)
//! via `From`.
//!
//! # Limits
//!
//! | Resource              | Limit         | Constant            |
//! |-----------------------|---------------|---------------------|
//! | Dimension (dense n)   | 10,000        | [`MAX_DIM`]         |
//! | Walks per component   | 1,000,000,000 | [`MAX_WALKS`]       |
//! | Steps per walk        | 10,000,000    | [`MAX_WALK_STEPS`]  |

use crate::error::ValidationError;
use crate::types::{ComponentRange, DenseMatrix};

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

/// Maximum system dimension. The coefficient matrix is dense, so this caps
/// the allocation at 800 MB of `f64`.
pub const MAX_DIM: usize = 10_000;

/// Maximum number of walks per component.
pub const MAX_WALKS: u64 = 1_000_000_000;

/// Maximum configurable steps per walk.
pub const MAX_WALK_STEPS: usize = 10_000_000;

// ---------------------------------------------------------------------------
// System validation
// ---------------------------------------------------------------------------

/// Validate the shape and contents of a linear system.
///
/// Checks, in order:
///
/// 1. `A` is square and non-empty.
/// 2. `n` is within [`MAX_DIM`].
/// 3. `b.len() == n`.
/// 4. No `NaN` or `Inf` in `A` or `b`.
/// 5. If `b` is all zeros, emits a [`tracing::warn`] (valid, but the
///    solution is trivially zero).
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
pub fn validate_system(a: &DenseMatrix, b: &[f64]) -> Result<(), ValidationError> {
    if !a.is_square() {
        return Err(ValidationError::DimensionMismatch(format!(
            "coefficient matrix must be square, got {}x{}",
            a.rows(),
            a.cols(),
        )));
    }
    let n = a.rows();
    if n == 0 {
        return Err(ValidationError::DimensionMismatch(
            "empty system (n = 0)".into(),
        ));
    }
    if n > MAX_DIM {
        return Err(ValidationError::MatrixTooLarge {
            rows: n,
            cols: n,
            max_dim: MAX_DIM,
        });
    }
    if b.len() != n {
        return Err(ValidationError::DimensionMismatch(format!(
            "rhs length {} does not match matrix dimension {}",
            b.len(),
            n,
        )));
    }

    for i in 0..n {
        for (j, &v) in a.row(i).iter().enumerate() {
            if !v.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "A[{}][{}] = {}",
                    i, j, v,
                )));
            }
        }
    }

    let mut all_zero = true;
    for (i, &v) in b.iter().enumerate() {
        if !v.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!("b[{}] = {}", i, v)));
        }
        if v != 0.0 {
            all_zero = false;
        }
    }
    if all_zero {
        tracing::warn!(
            target: "ruvector_mc_solver::validation",
            n,
            "rhs vector is all zeros; solution will be trivially zero"
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Work-unit validation
// ---------------------------------------------------------------------------

/// Validate a component range against an `n`-dimensional system.
///
/// # Rules
///
/// - `start_idx <= end_idx < n`.
/// - `num_walks` in `[1, MAX_WALKS]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] for the first rule broken.
pub fn validate_range(range: &ComponentRange, n: usize) -> Result<(), ValidationError> {
    if range.start_idx > range.end_idx {
        return Err(ValidationError::ParameterOutOfRange {
            name: "start_idx".into(),
            value: range.start_idx.to_string(),
            expected: format!("<= end_idx ({})", range.end_idx),
        });
    }
    if range.end_idx >= n {
        return Err(ValidationError::ParameterOutOfRange {
            name: "end_idx".into(),
            value: range.end_idx.to_string(),
            expected: format!("[0, {})", n),
        });
    }
    if range.num_walks == 0 || range.num_walks > MAX_WALKS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "num_walks".into(),
            value: range.num_walks.to_string(),
            expected: format!("[1, {}]", MAX_WALKS),
        });
    }
    Ok(())
}

/// Validate random-walk parameters.
///
/// # Rules
///
/// - `termination_prob` is finite and in the open interval `(0, 1)`.
/// - `max_steps` is in `[1, MAX_WALK_STEPS]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`].
pub fn validate_walk_params(
    termination_prob: f64,
    max_steps: usize,
) -> Result<(), ValidationError> {
    if !termination_prob.is_finite() || termination_prob <= 0.0 || termination_prob >= 1.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "termination_prob".into(),
            value: termination_prob.to_string(),
            expected: "(0.0, 1.0) exclusive".into(),
        });
    }
    if max_steps == 0 || max_steps > MAX_WALK_STEPS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "max_steps".into(),
            value: max_steps.to_string(),
            expected: format!("[1, {}]", MAX_WALK_STEPS),
        });
    }
    Ok(())
}

/// Validate merge tolerances.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] if either value is
/// negative or non-finite.
pub fn validate_merge_params(tolerance: f64, magnitude_floor: f64) -> Result<(), ValidationError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "tolerance".into(),
            value: tolerance.to_string(),
            expected: "finite and >= 0".into(),
        });
    }
    if !magnitude_floor.is_finite() || magnitude_floor < 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "magnitude_floor".into(),
            value: magnitude_floor.to_string(),
            expected: "finite and >= 0".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_system() {
        let a = DenseMatrix::identity(3);
        assert!(validate_system(&a, &[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn rejects_empty_system() {
        let a = DenseMatrix::zeros(0, 0);
        assert!(matches!(
            validate_system(&a, &[]),
            Err(ValidationError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn rejects_nan_in_matrix() {
        let mut a = DenseMatrix::identity(2);
        a.set(1, 0, f64::NAN);
        assert!(matches!(
            validate_system(&a, &[1.0, 1.0]),
            Err(ValidationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn rejects_inf_in_rhs() {
        let a = DenseMatrix::identity(2);
        assert!(matches!(
            validate_system(&a, &[1.0, f64::INFINITY]),
            Err(ValidationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn zero_rhs_is_allowed() {
        let a = DenseMatrix::identity(2);
        assert!(validate_system(&a, &[0.0, 0.0]).is_ok());
    }

    #[test]
    fn range_rules() {
        assert!(validate_range(&ComponentRange::new(0, 4, 10), 5).is_ok());
        assert!(validate_range(&ComponentRange::new(3, 2, 10), 5).is_err());
        assert!(validate_range(&ComponentRange::new(0, 5, 10), 5).is_err());
        assert!(validate_range(&ComponentRange::new(0, 4, 0), 5).is_err());
        assert!(validate_range(&ComponentRange::new(0, 4, MAX_WALKS + 1), 5).is_err());
    }

    #[test]
    fn walk_param_rules() {
        assert!(validate_walk_params(0.1, 10_000).is_ok());
        assert!(validate_walk_params(0.0, 10).is_err());
        assert!(validate_walk_params(1.0, 10).is_err());
        assert!(validate_walk_params(f64::NAN, 10).is_err());
        assert!(validate_walk_params(0.5, 0).is_err());
    }

    #[test]
    fn merge_param_rules() {
        assert!(validate_merge_params(0.01, 1e-10).is_ok());
        assert!(validate_merge_params(-0.01, 1e-10).is_err());
        assert!(validate_merge_params(0.01, f64::NAN).is_err());
    }
}
