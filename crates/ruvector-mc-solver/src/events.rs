//! Event sourcing for merge passes.
//!
//! [`PartialSolutionMerger::merge_with_events`] appends one [`MergeEvent`]
//! per decision it takes, so a merge can be replayed or inspected after the
//! fact: which submissions were accepted, which were skipped and why, and how
//! the pass ended.
//!
//! [`PartialSolutionMerger::merge_with_events`]: crate::merge::PartialSolutionMerger::merge_with_events

use serde::{Deserialize, Serialize};

use crate::error::RejectionReason;
use crate::merge::ResultId;

/// Events emitted during a merge pass.
///
/// Tagged with `#[serde(tag = "type")]` so they serialise as
/// `{ "type": "SubmissionAccepted", ... }` for easy ingestion into event
/// stores or JSON-lines logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MergeEvent {
    /// A merge pass is about to examine `submissions` task outputs.
    MergeStarted {
        /// Number of submissions in arrival order.
        submissions: usize,
        /// Name of the active conflict policy.
        policy: String,
    },

    /// A submission passed the policy and claimed its unclaimed components.
    SubmissionAccepted {
        /// Result identity.
        result_id: ResultId,
        /// First covered index.
        start_idx: usize,
        /// Last covered index (inclusive).
        end_idx: usize,
        /// Components this submission claimed first.
        newly_claimed: usize,
    },

    /// A submission was left out of the pass.
    SubmissionRejected {
        /// Result identity.
        result_id: ResultId,
        /// Why it was skipped.
        reason: RejectionReason,
    },

    /// A disagreeing component was kept at its earlier value while the rest
    /// of the submission was accepted (per-index policies only).
    ComponentConflictIgnored {
        /// Result identity of the accepted submission.
        result_id: ResultId,
        /// Component index.
        index: usize,
        /// Error that exceeded the tolerance.
        error: f64,
    },

    /// The pass produced a complete merged vector.
    MergeCompleted {
        /// Canonical (first accepted) result identity.
        canonical_result_id: ResultId,
        /// Highest merged index.
        max_idx: usize,
        /// Accepted submission count.
        accepted: usize,
        /// Rejected submission count.
        rejected: usize,
        /// Total credit granted.
        credit: f64,
    },

    /// The pass ended without a result; the task should be retried.
    MergeFailed {
        /// Display form of the [`MergeError`](crate::error::MergeError).
        reason: String,
        /// Whether the failure is retryable.
        retryable: bool,
    },
}

impl MergeEvent {
    /// Serialise as a single JSON line.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures (non-finite floats are written as
    /// `null`, so in practice this does not fail).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
