//! Whitespace-delimited text format for task inputs and task outputs.
//!
//! # Task input
//!
//! ```text
//! n
//! A[0][0] A[0][1] ... A[0][n-1]
//! ...
//! A[n-1][0] ...      A[n-1][n-1]
//! b[0]
//! ...
//! b[n-1]
//! start_idx end_idx num_walks      (optional)
//! ```
//!
//! Line breaks carry no meaning; only token order matters. When the trailer
//! is absent, truncated or unparsable the task covers `[0, n-1]` with
//! [`DEFAULT_WALKS`] walks. A readable trailer is validated against `n`.
//!
//! # Task output
//!
//! ```text
//! start_idx end_idx
//! x[start_idx]
//! ...
//! x[end_idx]
//! ```
//!
//! Values are written in `%.15e` notation. The value count must match the
//! declared range exactly.
//!
//! [`DEFAULT_WALKS`]: crate::types::DEFAULT_WALKS

use std::fmt::Write as _;
use std::str::{FromStr, SplitWhitespace};

use tracing::warn;

use crate::error::{FormatError, SolverError, ValidationError};
use crate::types::{ComponentRange, DenseMatrix, LinearSystem, PartialSolution};
use crate::validation::MAX_DIM;

/// A decoded task: the system and the range to estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    /// The linear system.
    pub system: LinearSystem,
    /// Components to estimate and the walk count.
    pub range: ComponentRange,
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next<T: FromStr>(&mut self, what: impl Into<String>) -> Result<T, FormatError> {
        let what = what.into();
        let token = self
            .inner
            .next()
            .ok_or_else(|| FormatError::UnexpectedEof { what: what.clone() })?;
        token.parse().map_err(|_| FormatError::InvalidNumber {
            what,
            token: token.to_string(),
        })
    }

    fn is_exhausted(&mut self) -> bool {
        self.inner.clone().next().is_none()
    }
}

/// Decode a task input.
///
/// # Errors
///
/// - [`SolverError::Format`] for missing or unparsable tokens in `n`, `A`
///   or `b`.
/// - [`SolverError::InvalidInput`] when `n` is zero or too large, an entry is
///   non-finite, or the trailer range does not fit the system.
pub fn parse_task_input(text: &str) -> Result<TaskInput, SolverError> {
    let mut tokens = Tokens::new(text);

    let n: usize = tokens.next("dimension")?;
    if n == 0 {
        return Err(ValidationError::DimensionMismatch("empty system (n = 0)".into()).into());
    }
    if n > MAX_DIM {
        return Err(ValidationError::MatrixTooLarge {
            rows: n,
            cols: n,
            max_dim: MAX_DIM,
        }
        .into());
    }

    let mut values: Vec<f64> = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            values.push(tokens.next(format!("A[{i}][{j}]"))?);
        }
    }
    let a = DenseMatrix::from_row_major(n, n, values)?;

    let mut b: Vec<f64> = Vec::with_capacity(n);
    for i in 0..n {
        b.push(tokens.next(format!("b[{i}]"))?);
    }
    let system = LinearSystem::new(a, b)?;

    let range = if tokens.is_exhausted() {
        ComponentRange::full(n)
    } else {
        match read_trailer(&mut tokens) {
            Ok(range) => range,
            Err(e) => {
                warn!(
                    target: "ruvector_mc_solver::format",
                    error = %e,
                    "unreadable range trailer, covering all components"
                );
                ComponentRange::full(n)
            }
        }
    };
    range.validate_for(n)?;

    Ok(TaskInput { system, range })
}

fn read_trailer(tokens: &mut Tokens<'_>) -> Result<ComponentRange, FormatError> {
    let start_idx: usize = tokens.next("start_idx")?;
    let end_idx: usize = tokens.next("end_idx")?;
    let num_walks: u64 = tokens.next("num_walks")?;
    Ok(ComponentRange::new(start_idx, end_idx, num_walks))
}

/// Encode a task input, always including the trailer.
pub fn write_task_input(system: &LinearSystem, range: &ComponentRange) -> String {
    let n = system.dim();
    let mut out = String::with_capacity(24 * (n * n + n) + 32);
    let _ = writeln!(out, "{n}");
    for i in 0..n {
        let row: Vec<String> = system.matrix().row(i).iter().map(|&v| sci(v)).collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    for &v in system.rhs() {
        let _ = writeln!(out, "{}", sci(v));
    }
    let _ = writeln!(out, "{} {} {}", range.start_idx, range.end_idx, range.num_walks);
    out
}

/// Decode a task output.
///
/// # Errors
///
/// Returns [`FormatError`] when the header is missing, a token is not a
/// number, the range is inverted, or the value count differs from the range.
pub fn parse_partial_solution(text: &str) -> Result<PartialSolution, FormatError> {
    let mut tokens = Tokens::new(text);
    let start_idx: usize = tokens.next("start_idx")?;
    let end_idx: usize = tokens.next("end_idx")?;

    let mut values: Vec<f64> = Vec::new();
    let mut k = 0usize;
    while !tokens.is_exhausted() {
        values.push(tokens.next(format!("x[{}]", start_idx.saturating_add(k)))?);
        k += 1;
    }
    PartialSolution::new(start_idx, end_idx, values)
}

impl PartialSolution {
    /// Encode in the task-output format.
    pub fn to_output_string(&self) -> String {
        let mut out = String::with_capacity(24 * self.values.len() + 16);
        let _ = writeln!(out, "{} {}", self.start_idx, self.end_idx);
        for &v in &self.values {
            let _ = writeln!(out, "{}", sci(v));
        }
        out
    }
}

/// `%.15e` with a signed, at-least-two-digit exponent (`1.5e-3` becomes
/// `1.500000000000000e-03`).
fn sci(v: f64) -> String {
    let s = format!("{v:.15e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(e) => format!(
                "{mantissa}e{}{:02}",
                if e < 0 { '-' } else { '+' },
                e.unsigned_abs()
            ),
            Err(_) => s,
        },
        None => s,
    }
}
