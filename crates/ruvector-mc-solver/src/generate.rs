//! Random diagonally dominant test systems with a known solution.

use rand::Rng;

use crate::error::ValidationError;
use crate::types::{DenseMatrix, LinearSystem};

/// A generated system and the solution it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSystem {
    /// `A x* = b`.
    pub system: LinearSystem,
    /// The true solution `x*`.
    pub solution: Vec<f64>,
}

/// Generate an `n x n` strictly diagonally dominant system.
///
/// Off-diagonal entries are uniform in `[-1, 1]`, each diagonal entry is
/// `1.5 * sum_j |A[i][j]| + 5`, the true solution is uniform in `[-5, 5]` and
/// `b = A x*`. Every row of the resulting iteration matrix sums to less than
/// `2/3`, so the Neumann series converges. Deterministic given the
/// generator state.
///
/// # Errors
///
/// Returns [`ValidationError`] if `n` is zero or above
/// [`MAX_DIM`](crate::validation::MAX_DIM).
pub fn diagonally_dominant_system<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
) -> Result<GeneratedSystem, ValidationError> {
    if n == 0 || n > crate::validation::MAX_DIM {
        return Err(ValidationError::ParameterOutOfRange {
            name: "n".into(),
            value: n.to_string(),
            expected: format!("[1, {}]", crate::validation::MAX_DIM),
        });
    }

    let mut a = DenseMatrix::zeros(n, n);
    for i in 0..n {
        let mut off = 0.0;
        for j in 0..n {
            if i != j {
                let v = rng.gen_range(-1.0..=1.0);
                a.set(i, j, v);
                off += f64::abs(v);
            }
        }
        a.set(i, i, 1.5 * off + 5.0);
    }

    let solution: Vec<f64> = (0..n).map(|_| rng.gen_range(-5.0..=5.0)).collect();
    let mut b = vec![0.0; n];
    a.matvec(&solution, &mut b);

    Ok(GeneratedSystem {
        system: LinearSystem::new(a, b)?,
        solution,
    })
}
