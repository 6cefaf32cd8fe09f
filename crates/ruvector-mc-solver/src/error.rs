//! Error types for the Monte Carlo solver crate.
//!
//! The taxonomy separates genuine dead ends (a singular diagonal, malformed
//! caller input) from the recoverable outcomes of a merge pass. Only
//! [`SolverError`] aborts a task; [`MergeError`] always asks the work
//! distributor to retry, and [`RejectionReason`] is recorded per submission
//! while the merge carries on. All errors implement `std::error::Error` via
//! `thiserror`.

/// Primary error type for solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// A diagonal element is too small to pivot on. The task cannot proceed
    /// and must not be retried with the same input.
    #[error("singular diagonal at row {row}: |A[{row}][{row}]| = {value:.3e} is below {epsilon:.0e}")]
    PreconditionFailure {
        /// Row whose diagonal element vanished.
        row: usize,
        /// The offending diagonal (or pivot) value.
        value: f64,
        /// Threshold the magnitude had to exceed.
        epsilon: f64,
    },

    /// The caller supplied invalid input (dimensions, parameters, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A task description or task output could not be decoded.
    #[error("format error: {0}")]
    Format(#[from] FormatError),
}

/// Validation errors for solver inputs.
///
/// These are raised eagerly before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Matrix or vector dimensions are inconsistent.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// Matrix size exceeds the implementation limit.
    #[error("matrix size {rows}x{cols} exceeds maximum supported {max_dim}x{max_dim}")]
    MatrixTooLarge {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
        /// Maximum supported dimension.
        max_dim: usize,
    },
}

/// Errors raised while decoding the whitespace-delimited wire format.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// The input ended before a required field was read.
    #[error("unexpected end of input while reading {what}")]
    UnexpectedEof {
        /// Field that was being read.
        what: String,
    },

    /// A token could not be parsed as the expected number type.
    #[error("invalid {what}: {token:?}")]
    InvalidNumber {
        /// Field that was being read.
        what: String,
        /// The offending token.
        token: String,
    },

    /// The declared component range does not match the number of values.
    #[error("range [{start_idx}, {end_idx}] declares {declared} values but {found} were supplied")]
    LengthMismatch {
        /// Declared first index.
        start_idx: usize,
        /// Declared last index (inclusive).
        end_idx: usize,
        /// Value count implied by the range.
        declared: usize,
        /// Value count actually present.
        found: usize,
    },

    /// The declared range is empty or inverted.
    #[error("invalid component range [{start_idx}, {end_idx}]")]
    InvalidRange {
        /// Declared first index.
        start_idx: usize,
        /// Declared last index (inclusive).
        end_idx: usize,
    },
}

/// Why a single submission was left out of a merge pass.
///
/// Rejections never abort the merge; they are logged and reported alongside
/// the outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The submission could not be parsed or its range and value count
    /// disagree.
    #[error("malformed partial solution: {detail}")]
    Malformed {
        /// Human-readable explanation.
        detail: String,
    },

    /// The submission disagrees with an already-claimed component beyond the
    /// merge tolerance.
    #[error(
        "inconsistent value for component {index}: {incoming:.10e} vs claimed {claimed:.10e} (error {error:.3e})"
    )]
    InconsistentOverlap {
        /// First conflicting component index.
        index: usize,
        /// Value carried by the rejected submission.
        incoming: f64,
        /// Value already claimed by an earlier submission.
        claimed: f64,
        /// Relative (or absolute, for tiny magnitudes) error that exceeded
        /// the tolerance.
        error: f64,
    },
}

/// Failure of a whole merge pass.
///
/// Both variants are retryable: a later submission may fill a gap or supply
/// the first valid result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// Every submission was malformed or discarded.
    #[error("no valid results among {submitted} submission(s)")]
    NoValidResults {
        /// Number of submissions examined.
        submitted: usize,
    },

    /// At least one index in `[0, max_idx]` has no accepted value.
    #[error("incomplete coverage: {} component(s) missing in [0, {max_idx}]", .missing.len())]
    IncompleteCoverage {
        /// Highest end index among accepted submissions.
        max_idx: usize,
        /// Unclaimed indices in ascending order.
        missing: Vec<usize>,
    },
}

impl MergeError {
    /// Whether the work distributor should retry (wait for or re-dispatch
    /// more work) rather than fail the task permanently.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        match self {
            MergeError::NoValidResults { .. } | MergeError::IncompleteCoverage { .. } => true,
        }
    }
}
