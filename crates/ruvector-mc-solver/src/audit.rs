//! Audit trail for merge passes.
//!
//! Every merge can produce a [`MergeAuditEntry`] that captures a fingerprint
//! of the submissions, the merged vector, the accept/reject counts and
//! timing. Entries serialise with serde and can be streamed to any log sink.
//!
//! # Hashing
//!
//! We use [`std::hash::DefaultHasher`] (SipHash-2-4 on most platforms) rather
//! than a cryptographic hash. This is sufficient for deduplication and for
//! spotting a replayed merge that produced a different vector, but it is
//! **not** suitable for tamper proofing.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::merge::{MergeOutcome, ResultId, Submission};

// ---------------------------------------------------------------------------
// Audit entry
// ---------------------------------------------------------------------------

/// A single audit record for one merge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeAuditEntry {
    /// Task the submissions belong to.
    pub task_id: String,

    /// Name of the conflict policy in force.
    pub policy: String,

    /// 8-byte hash of the submissions in arrival order. Produced by
    /// [`hash_submissions`].
    pub input_hash: [u8; 8],

    /// 8-byte hash of the merged vector, or `None` if the merge failed.
    /// Produced by [`hash_values`].
    pub output_hash: Option<[u8; 8]>,

    /// Submissions examined.
    pub submissions: usize,

    /// Submissions accepted (zero on failure).
    pub accepted: usize,

    /// Submissions rejected (zero on failure).
    pub rejected: usize,

    /// Canonical result, if the merge succeeded.
    pub canonical_result_id: Option<ResultId>,

    /// Credit granted (zero on failure).
    pub credit: f64,

    /// Failure description, if any.
    pub error: Option<String>,

    /// Wall-clock time in microseconds.
    pub wall_time_us: u64,

    /// Timestamp as nanoseconds since the Unix epoch.
    pub timestamp_ns: u128,
}

// ---------------------------------------------------------------------------
// Hash helpers
// ---------------------------------------------------------------------------

/// Deterministic 8-byte fingerprint of a submission list.
///
/// Hashes each result identity and either the decoded range and value bits
/// or the decode error text.
pub fn hash_submissions(submissions: &[Submission]) -> [u8; 8] {
    let mut h = DefaultHasher::new();
    submissions.len().hash(&mut h);
    for sub in submissions {
        sub.result_id.hash(&mut h);
        match &sub.output {
            Ok(sol) => {
                0u8.hash(&mut h);
                sol.start_idx.hash(&mut h);
                sol.end_idx.hash(&mut h);
                for &v in &sol.values {
                    v.to_bits().hash(&mut h);
                }
            }
            Err(e) => {
                1u8.hash(&mut h);
                e.to_string().hash(&mut h);
            }
        }
    }
    h.finish().to_le_bytes()
}

/// Deterministic 8-byte fingerprint of a merged vector.
pub fn hash_values(values: &[f64]) -> [u8; 8] {
    let mut h = DefaultHasher::new();
    for &v in values {
        v.to_bits().hash(&mut h);
    }
    h.finish().to_le_bytes()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Convenience builder for [`MergeAuditEntry`].
///
/// Start it before the merge pass and call [`finish`](Self::finish) with the
/// result.
///
/// # Example
///
/// ```rust
/// use ruvector_mc_solver::audit::AuditBuilder;
/// use ruvector_mc_solver::merge::{PartialSolutionMerger, MergeConfig, Submission};
///
/// let subs = vec![Submission::from_text(1, "0 0\n2.0\n")];
/// let audit = AuditBuilder::start("task-1", "whole_submission", &subs);
/// let result = PartialSolutionMerger::new(MergeConfig::default()).merge(&subs);
/// let entry = audit.finish(&result);
/// assert_eq!(entry.accepted, 1);
/// assert_eq!(entry.canonical_result_id, Some(1));
/// ```
pub struct AuditBuilder {
    task_id: String,
    policy: String,
    input_hash: [u8; 8],
    submissions: usize,
    start: Instant,
    timestamp_ns: u128,
}

impl AuditBuilder {
    /// Begin an audit trace for a merge pass over `submissions`.
    pub fn start(
        task_id: impl Into<String>,
        policy: impl Into<String>,
        submissions: &[Submission],
    ) -> Self {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();

        Self {
            task_id: task_id.into(),
            policy: policy.into(),
            input_hash: hash_submissions(submissions),
            submissions: submissions.len(),
            start: Instant::now(),
            timestamp_ns,
        }
    }

    /// Finalise the entry once the merge pass returns.
    pub fn finish(self, result: &Result<MergeOutcome, MergeError>) -> MergeAuditEntry {
        let elapsed = self.start.elapsed();
        let mut entry = MergeAuditEntry {
            task_id: self.task_id,
            policy: self.policy,
            input_hash: self.input_hash,
            output_hash: None,
            submissions: self.submissions,
            accepted: 0,
            rejected: 0,
            canonical_result_id: None,
            credit: 0.0,
            error: None,
            wall_time_us: elapsed.as_micros() as u64,
            timestamp_ns: self.timestamp_ns,
        };
        match result {
            Ok(outcome) => {
                entry.output_hash = Some(hash_values(&outcome.values));
                entry.accepted = outcome.accepted.len();
                entry.rejected = outcome.rejected.len();
                entry.canonical_result_id = Some(outcome.canonical_result_id);
                entry.credit = outcome.credit;
            }
            Err(e) => entry.error = Some(e.to_string()),
        }
        entry
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
