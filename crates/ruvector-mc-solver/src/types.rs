//! Core types for the Monte Carlo linear solver.
//!
//! Provides [`DenseMatrix`] for heap-owned row-major storage, the immutable
//! [`LinearSystem`] handed over by the work distributor, and the
//! [`ComponentRange`] / [`PartialSolution`] pair that describes one
//! independently dispatchable unit of work and its result.

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, ValidationError};
use crate::validation;

/// Number of walks per component when a task does not say otherwise.
pub const DEFAULT_WALKS: u64 = 100_000;

// ---------------------------------------------------------------------------
// DenseMatrix
// ---------------------------------------------------------------------------

/// Dense row-major matrix sized exactly to its declared dimensions.
///
/// # Layout
///
/// Element `(i, j)` lives at `values[i * cols + j]`; row `i` is the slice
/// `values[i * cols..(i + 1) * cols]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    /// Row-major element storage, length `rows * cols`.
    values: Vec<f64>,
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
}

impl DenseMatrix {
    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            values: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Square identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.values[i * n + i] = 1.0;
        }
        m
    }

    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if `values.len()` is
    /// not `rows * cols`.
    pub fn from_row_major(
        rows: usize,
        cols: usize,
        values: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            ValidationError::DimensionMismatch(format!("{rows}x{cols} overflows usize"))
        })?;
        if values.len() != expected {
            return Err(ValidationError::DimensionMismatch(format!(
                "buffer length {} does not equal {}x{} = {}",
                values.len(),
                rows,
                cols,
                expected,
            )));
        }
        Ok(Self { values, rows, cols })
    }

    /// Build from nested rows. All rows must have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] on ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {} has length {} (expected {})",
                    i,
                    row.len(),
                    n_cols,
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            rows: n_rows,
            cols: n_cols,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `true` when `rows == cols`.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows` or `j >= cols`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols,
        );
        self.values[i * self.cols + j]
    }

    /// Set element `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows` or `j >= cols`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols,
        );
        self.values[i * self.cols + j] = value;
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.values[start..start + self.cols]
    }

    /// The raw row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Dense matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= cols` and `y.len() >= rows`.
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(
            x.len() >= self.cols,
            "matvec: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "matvec: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for (i, yi) in y.iter_mut().enumerate().take(self.rows) {
            *yi = self
                .row(i)
                .iter()
                .zip(x.iter())
                .map(|(&a, &b)| a * b)
                .sum();
        }
    }
}

// ---------------------------------------------------------------------------
// LinearSystem
// ---------------------------------------------------------------------------

/// An immutable linear system `A x = b` with square `A`.
///
/// Construction validates shape and finiteness; the non-zero pivot
/// requirement is checked by [`IterationFormBuilder`] and reported as
/// [`SolverError::PreconditionFailure`].
///
/// [`IterationFormBuilder`]: crate::iteration::IterationFormBuilder
/// [`SolverError::PreconditionFailure`]: crate::error::SolverError::PreconditionFailure
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    a: DenseMatrix,
    b: Vec<f64>,
}

impl LinearSystem {
    /// Create a validated linear system.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `A` is not square, `b` has the wrong
    /// length, the dimension exceeds [`validation::MAX_DIM`], or any entry is
    /// non-finite.
    pub fn new(a: DenseMatrix, b: Vec<f64>) -> Result<Self, ValidationError> {
        validation::validate_system(&a, &b)?;
        Ok(Self { a, b })
    }

    /// Dimension `n`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// Coefficient matrix `A`.
    #[inline]
    pub fn matrix(&self) -> &DenseMatrix {
        &self.a
    }

    /// Right-hand side `b`.
    #[inline]
    pub fn rhs(&self) -> &[f64] {
        &self.b
    }
}

// ---------------------------------------------------------------------------
// ComponentRange
// ---------------------------------------------------------------------------

/// Inclusive component range `[start_idx, end_idx]` with a per-component walk
/// count. The unit of independently dispatchable work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRange {
    /// First component index.
    pub start_idx: usize,
    /// Last component index (inclusive).
    pub end_idx: usize,
    /// Random walks per component.
    pub num_walks: u64,
}

impl ComponentRange {
    /// Create a range. Bounds are checked against a system with
    /// [`validate_for`](Self::validate_for).
    pub fn new(start_idx: usize, end_idx: usize, num_walks: u64) -> Self {
        Self {
            start_idx,
            end_idx,
            num_walks,
        }
    }

    /// Every component of an `n`-dimensional system with the default walk
    /// count. This is the fallback when a task omits its range trailer.
    pub fn full(n: usize) -> Self {
        Self::new(0, n.saturating_sub(1), DEFAULT_WALKS)
    }

    /// Number of components covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end_idx
            .saturating_sub(self.start_idx)
            .saturating_add(1)
    }

    /// Ranges are inclusive and therefore never empty once validated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end_idx < self.start_idx
    }

    /// Iterate over the covered component indices.
    #[inline]
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start_idx..=self.end_idx
    }

    /// `true` when the range spans the whole `[0, n-1]` index space.
    #[inline]
    pub fn is_full(&self, n: usize) -> bool {
        self.start_idx == 0 && self.end_idx.checked_add(1) == Some(n)
    }

    /// Validate the range against an `n`-dimensional system.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] if the range is
    /// inverted, runs past `n - 1`, or requests zero walks.
    pub fn validate_for(&self, n: usize) -> Result<(), ValidationError> {
        validation::validate_range(self, n)
    }
}

// ---------------------------------------------------------------------------
// PartialSolution
// ---------------------------------------------------------------------------

/// Values for a contiguous sub-range of solution components.
///
/// Fields are public so that submissions decoded from untrusted sources can
/// be represented before they are checked; [`check`](Self::check) enforces
/// `values.len() == end_idx - start_idx + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSolution {
    /// First component index.
    pub start_idx: usize,
    /// Last component index (inclusive).
    pub end_idx: usize,
    /// One value per covered component, in ascending index order.
    pub values: Vec<f64>,
}

impl PartialSolution {
    /// Create a checked partial solution.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the range is inverted or the value count
    /// does not match it.
    pub fn new(start_idx: usize, end_idx: usize, values: Vec<f64>) -> Result<Self, FormatError> {
        let sol = Self {
            start_idx,
            end_idx,
            values,
        };
        sol.check()?;
        Ok(sol)
    }

    /// Check the range/length invariant.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidRange`] for an inverted range or one
    /// whose length does not fit in `usize`, and
    /// [`FormatError::LengthMismatch`] when the value count is wrong.
    pub fn check(&self) -> Result<(), FormatError> {
        let declared = self
            .end_idx
            .checked_sub(self.start_idx)
            .and_then(|d| d.checked_add(1))
            .ok_or(FormatError::InvalidRange {
                start_idx: self.start_idx,
                end_idx: self.end_idx,
            })?;
        if self.values.len() != declared {
            return Err(FormatError::LengthMismatch {
                start_idx: self.start_idx,
                end_idx: self.end_idx,
                declared,
                found: self.values.len(),
            });
        }
        Ok(())
    }

    /// Number of components covered according to the declared range.
    #[inline]
    pub fn len(&self) -> usize {
        self.end_idx
            .saturating_sub(self.start_idx)
            .saturating_add(1)
    }

    /// A checked partial solution always covers at least one component.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for absolute component `index`, if covered.
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<f64> {
        if index < self.start_idx || index > self.end_idx {
            return None;
        }
        self.values.get(index - self.start_idx).copied()
    }

    /// Iterate over `(absolute_index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(k, &v)| (self.start_idx + k, v))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
