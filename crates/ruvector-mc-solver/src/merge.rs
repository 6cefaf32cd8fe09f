//! Merging independently computed partial solutions into one vector.
//!
//! A merge pass walks the submissions of one task in arrival order:
//!
//! 1. Unparsable, length-mismatched or non-finite submissions, and those
//!    reaching past [`MAX_DIM`], are skipped as
//!    [`RejectionReason::Malformed`].
//! 2. The [`ConflictPolicy`] compares each remaining submission against the
//!    components already claimed. Two values agree when their
//!    [`relative_error`] is within [`MergeConfig::tolerance`]. Under the
//!    default [`WholeSubmission`] policy one disagreement discards the whole
//!    newcomer; the earlier claim always wins.
//! 3. Accepted submissions claim every component nobody claimed before.
//! 4. `max_idx` is the highest end index among accepted submissions and every
//!    index in `[0, max_idx]` must be claimed, otherwise the pass fails with
//!    the retryable [`MergeError::IncompleteCoverage`].
//! 5. The first accepted submission becomes canonical and the
//!    [`CreditFunction`] prices the accepted work.
//!
//! Nothing is shared between passes: a failed pass leaves no state behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{FormatError, MergeError, RejectionReason, ValidationError};
use crate::events::MergeEvent;
use crate::format;
use crate::traits::{ConflictPolicy, CreditFunction};
use crate::types::PartialSolution;
use crate::validation::{self, MAX_DIM};

/// Identity of one task output as assigned by the work distributor.
pub type ResultId = u64;

/// Maximum relative disagreement between two estimates of one component.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Below this average magnitude the absolute difference is compared instead.
pub const DEFAULT_MAGNITUDE_FLOOR: f64 = 1e-10;

/// Credit granted per covered component by [`PerComponentCredit`].
pub const DEFAULT_REWARD_PER_COMPONENT: f64 = 10.0;

// ---------------------------------------------------------------------------
// Configuration and the agreement metric
// ---------------------------------------------------------------------------

/// Merge tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum accepted [`relative_error`] between overlapping values.
    ///
    /// Default: `0.01`.
    pub tolerance: f64,
    /// Average magnitude below which the absolute difference is used.
    ///
    /// Default: `1e-10`.
    pub magnitude_floor: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            magnitude_floor: DEFAULT_MAGNITUDE_FLOOR,
        }
    }
}

impl MergeConfig {
    /// Check that both values are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_merge_params(self.tolerance, self.magnitude_floor)
    }

    /// [`relative_error`] with this config's magnitude floor.
    #[inline]
    pub fn error(&self, a: f64, b: f64) -> f64 {
        relative_error(a, b, self.magnitude_floor)
    }

    /// `true` when `a` and `b` agree within [`tolerance`](Self::tolerance).
    #[inline]
    pub fn agrees(&self, a: f64, b: f64) -> bool {
        self.error(a, b) <= self.tolerance
    }
}

/// `|a - b| / ((|a| + |b|) / 2)`, or `|a - b|` when that average magnitude is
/// at most `magnitude_floor`.
///
/// Symmetric in `a` and `b`, and zero iff `a == b`.
#[inline]
pub fn relative_error(a: f64, b: f64, magnitude_floor: f64) -> f64 {
    let diff = (a - b).abs();
    // Halve first so that large finite inputs do not overflow to inf.
    let avg = a.abs() / 2.0 + b.abs() / 2.0;
    if avg > magnitude_floor {
        diff / avg
    } else {
        diff
    }
}

/// Whether two task outputs for the same range agree.
///
/// True only when both cover the identical range with matching lengths and
/// every component pair is within `tolerance` (using the default magnitude
/// floor). Used to decide whether replicated outputs corroborate each other.
pub fn compare_partial_solutions(a: &PartialSolution, b: &PartialSolution, tolerance: f64) -> bool {
    if a.start_idx != b.start_idx || a.end_idx != b.end_idx {
        return false;
    }
    if a.values.len() != b.values.len() {
        return false;
    }
    for (k, (&x, &y)) in a.values.iter().zip(b.values.iter()).enumerate() {
        let error = relative_error(x, y, DEFAULT_MAGNITUDE_FLOOR);
        if error.is_nan() || error > tolerance {
            debug!(
                target: "ruvector_mc_solver::merge",
                index = a.start_idx + k,
                a = x,
                b = y,
                error,
                "component differs"
            );
            return false;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// One task output as received, tagged with its result identity.
///
/// `output` holds the decoded partial solution or the reason decoding failed;
/// both are fed to the merger so that malformed outputs are counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Result identity.
    pub result_id: ResultId,
    /// Decoded output.
    pub output: Result<PartialSolution, FormatError>,
}

impl Submission {
    /// Wrap an already decoded partial solution.
    pub fn parsed(result_id: ResultId, solution: PartialSolution) -> Self {
        Self {
            result_id,
            output: Ok(solution),
        }
    }

    /// Decode a task output in the wire format.
    pub fn from_text(result_id: ResultId, text: &str) -> Self {
        Self {
            result_id,
            output: format::parse_partial_solution(text),
        }
    }
}

/// A submission that contributed to a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedSubmission {
    /// Result identity.
    pub result_id: ResultId,
    /// The accepted values.
    pub solution: PartialSolution,
}

/// A submission left out of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSubmission {
    /// Result identity.
    pub result_id: ResultId,
    /// Why it was skipped.
    pub reason: RejectionReason,
}

// ---------------------------------------------------------------------------
// MergedSolution
// ---------------------------------------------------------------------------

/// A component value and the submission that claimed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Accepted value.
    pub value: f64,
    /// Submission that claimed the component first.
    pub result_id: ResultId,
}

/// Component index to accepted value, built up during one merge pass.
///
/// Each index is claimed at most once; later claims are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSolution {
    claims: BTreeMap<usize, Claim>,
}

impl MergedSolution {
    /// Empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claimed value for `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.claims.get(&index).map(|c| c.value)
    }

    /// Full claim record for `index`.
    #[inline]
    pub fn claim_at(&self, index: usize) -> Option<&Claim> {
        self.claims.get(&index)
    }

    /// Number of claimed components.
    #[inline]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// `true` when nothing has been claimed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claim `index` unless it is already taken. Returns whether the claim
    /// was recorded.
    pub fn claim(&mut self, index: usize, value: f64, result_id: ResultId) -> bool {
        use std::collections::btree_map::Entry;
        match self.claims.entry(index) {
            Entry::Vacant(slot) => {
                slot.insert(Claim { value, result_id });
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Unclaimed indices in `[0, max_idx]`, ascending.
    pub fn missing(&self, max_idx: usize) -> Vec<usize> {
        (0..=max_idx)
            .filter(|i| !self.claims.contains_key(i))
            .collect()
    }

    /// Iterate over `(index, claim)` in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Claim)> + '_ {
        self.claims.iter().map(|(&i, c)| (i, c))
    }
}

// ---------------------------------------------------------------------------
// Conflict policies
// ---------------------------------------------------------------------------

/// One component on which a submission disagrees with an earlier claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Component index.
    pub index: usize,
    /// Value carried by the incoming submission.
    pub incoming: f64,
    /// Value already claimed.
    pub claimed: f64,
    /// Their relative error.
    pub error: f64,
}

impl From<Conflict> for RejectionReason {
    fn from(c: Conflict) -> Self {
        RejectionReason::InconsistentOverlap {
            index: c.index,
            incoming: c.incoming,
            claimed: c.claimed,
            error: c.error,
        }
    }
}

/// Verdict of a [`ConflictPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Claim every unclaimed component. `conflicts` lists disagreeing
    /// components that keep their earlier value.
    Accept {
        /// Tolerated disagreements.
        conflicts: Vec<Conflict>,
    },
    /// Discard the submission because of this conflict.
    Reject(Conflict),
}

/// Collect every component of `candidate` that disagrees with a claim.
fn conflicts_of<'a>(
    candidate: &'a PartialSolution,
    claims: &'a MergedSolution,
    config: &MergeConfig,
) -> impl Iterator<Item = Conflict> + 'a {
    let config = *config;
    candidate.iter().filter_map(move |(index, incoming)| {
        let claimed = claims.get(index)?;
        let error = config.error(incoming, claimed);
        (error > config.tolerance).then_some(Conflict {
            index,
            incoming,
            claimed,
            error,
        })
    })
}

/// Default policy: one disagreeing component discards the whole newcomer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeSubmission;

impl ConflictPolicy for WholeSubmission {
    fn admit(
        &self,
        candidate: &PartialSolution,
        claims: &MergedSolution,
        config: &MergeConfig,
    ) -> Admission {
        match conflicts_of(candidate, claims, config).next() {
            Some(conflict) => Admission::Reject(conflict),
            None => Admission::Accept {
                conflicts: Vec::new(),
            },
        }
    }

    fn name(&self) -> &'static str {
        "whole_submission"
    }
}

/// Per-component policy: disagreeing components keep their earlier value and
/// the rest of the submission is accepted. A submission that disagrees on
/// every component it covers is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerIndex;

impl ConflictPolicy for PerIndex {
    fn admit(
        &self,
        candidate: &PartialSolution,
        claims: &MergedSolution,
        config: &MergeConfig,
    ) -> Admission {
        let conflicts: Vec<Conflict> = conflicts_of(candidate, claims, config).collect();
        if !conflicts.is_empty() && conflicts.len() == candidate.values.len() {
            return Admission::Reject(conflicts[0]);
        }
        Admission::Accept { conflicts }
    }

    fn name(&self) -> &'static str {
        "per_index"
    }
}

// ---------------------------------------------------------------------------
// Credit
// ---------------------------------------------------------------------------

/// Flat reward per covered component of every accepted submission.
///
/// Independent of the walk count; overlapping submissions are each credited
/// for their full range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerComponentCredit {
    /// Credit per component.
    ///
    /// Default: `10.0`.
    pub reward_per_component: f64,
}

impl Default for PerComponentCredit {
    fn default() -> Self {
        Self {
            reward_per_component: DEFAULT_REWARD_PER_COMPONENT,
        }
    }
}

impl CreditFunction for PerComponentCredit {
    fn credit(&self, accepted: &[AcceptedSubmission]) -> f64 {
        accepted
            .iter()
            .map(|a| a.solution.len() as f64 * self.reward_per_component)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a successful merge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// First accepted submission.
    pub canonical_result_id: ResultId,
    /// Merged values for indices `0..=max_idx`.
    pub values: Vec<f64>,
    /// Total credit for the accepted submissions.
    pub credit: f64,
    /// Accepted submissions in arrival order.
    pub accepted: Vec<AcceptedSubmission>,
    /// Rejected submissions in arrival order.
    pub rejected: Vec<RejectedSubmission>,
}

impl MergeOutcome {
    /// Highest merged index.
    #[inline]
    pub fn max_idx(&self) -> usize {
        self.values.len().saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// PartialSolutionMerger
// ---------------------------------------------------------------------------

/// Aggregates the partial solutions of one task.
///
/// Generic over the [`ConflictPolicy`] and [`CreditFunction`]; the defaults
/// reproduce whole-submission, first-writer-wins rejection and a flat
/// per-component reward.
///
/// # Example
///
/// ```rust
/// use ruvector_mc_solver::merge::{MergeConfig, PartialSolutionMerger, Submission};
/// use ruvector_mc_solver::types::PartialSolution;
///
/// let merger = PartialSolutionMerger::new(MergeConfig::default());
/// let outcome = merger
///     .merge(&[
///         Submission::parsed(1, PartialSolution::new(0, 1, vec![1.0, 2.0]).unwrap()),
///         Submission::parsed(2, PartialSolution::new(2, 2, vec![3.0]).unwrap()),
///     ])
///     .unwrap();
/// assert_eq!(outcome.values, vec![1.0, 2.0, 3.0]);
/// assert_eq!(outcome.canonical_result_id, 1);
/// assert_eq!(outcome.credit, 30.0);
/// ```
#[derive(Debug, Clone)]
pub struct PartialSolutionMerger<P = WholeSubmission, C = PerComponentCredit> {
    config: MergeConfig,
    policy: P,
    credit: C,
}

impl PartialSolutionMerger {
    /// Merger with the default policy and credit function.
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            policy: WholeSubmission,
            credit: PerComponentCredit::default(),
        }
    }
}

impl Default for PartialSolutionMerger {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}

impl<P: ConflictPolicy, C: CreditFunction> PartialSolutionMerger<P, C> {
    /// Replace the conflict policy.
    pub fn with_policy<Q: ConflictPolicy>(self, policy: Q) -> PartialSolutionMerger<Q, C> {
        PartialSolutionMerger {
            config: self.config,
            policy,
            credit: self.credit,
        }
    }

    /// Replace the credit function.
    pub fn with_credit<D: CreditFunction>(self, credit: D) -> PartialSolutionMerger<P, D> {
        PartialSolutionMerger {
            config: self.config,
            policy: self.policy,
            credit,
        }
    }

    /// Active tolerances.
    #[inline]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Active conflict policy.
    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Run one merge pass over `submissions` in arrival order.
    ///
    /// # Errors
    ///
    /// [`MergeError::NoValidResults`] when nothing was accepted and
    /// [`MergeError::IncompleteCoverage`] when `[0, max_idx]` has gaps. Both
    /// are retryable.
    pub fn merge(&self, submissions: &[Submission]) -> Result<MergeOutcome, MergeError> {
        let mut events = Vec::new();
        self.merge_with_events(submissions, &mut events)
    }

    /// Like [`merge`](Self::merge), appending a [`MergeEvent`] for every
    /// decision to `events`.
    ///
    /// # Errors
    ///
    /// See [`merge`](Self::merge).
    #[instrument(skip(self, submissions, events), fields(submissions = submissions.len(), policy = self.policy.name()))]
    pub fn merge_with_events(
        &self,
        submissions: &[Submission],
        events: &mut Vec<MergeEvent>,
    ) -> Result<MergeOutcome, MergeError> {
        events.push(MergeEvent::MergeStarted {
            submissions: submissions.len(),
            policy: self.policy.name().to_string(),
        });

        let mut merged = MergedSolution::new();
        let mut accepted: Vec<AcceptedSubmission> = Vec::new();
        let mut rejected: Vec<RejectedSubmission> = Vec::new();

        for sub in submissions {
            let solution = match well_formed(sub) {
                Ok(solution) => solution,
                Err(reason) => {
                    warn!(
                        target: "ruvector_mc_solver::merge",
                        result_id = sub.result_id,
                        %reason,
                        "skipping malformed submission"
                    );
                    reject(sub.result_id, reason, &mut rejected, events);
                    continue;
                }
            };

            match self.policy.admit(solution, &merged, &self.config) {
                Admission::Reject(conflict) => {
                    warn!(
                        target: "ruvector_mc_solver::merge",
                        result_id = sub.result_id,
                        index = conflict.index,
                        incoming = conflict.incoming,
                        claimed = conflict.claimed,
                        error = conflict.error,
                        "inconsistent overlap, discarding submission"
                    );
                    reject(sub.result_id, conflict.into(), &mut rejected, events);
                }
                Admission::Accept { conflicts } => {
                    for c in &conflicts {
                        warn!(
                            target: "ruvector_mc_solver::merge",
                            result_id = sub.result_id,
                            index = c.index,
                            error = c.error,
                            "inconsistent component kept at earlier value"
                        );
                        events.push(MergeEvent::ComponentConflictIgnored {
                            result_id: sub.result_id,
                            index: c.index,
                            error: c.error,
                        });
                    }

                    let newly_claimed = solution
                        .iter()
                        .filter(|&(index, value)| merged.claim(index, value, sub.result_id))
                        .count();
                    debug!(
                        target: "ruvector_mc_solver::merge",
                        result_id = sub.result_id,
                        start = solution.start_idx,
                        end = solution.end_idx,
                        newly_claimed,
                        "submission accepted"
                    );
                    events.push(MergeEvent::SubmissionAccepted {
                        result_id: sub.result_id,
                        start_idx: solution.start_idx,
                        end_idx: solution.end_idx,
                        newly_claimed,
                    });
                    accepted.push(AcceptedSubmission {
                        result_id: sub.result_id,
                        solution: solution.clone(),
                    });
                }
            }
        }

        let result = self.finish(merged, accepted, rejected, submissions.len());
        match &result {
            Ok(outcome) => events.push(MergeEvent::MergeCompleted {
                canonical_result_id: outcome.canonical_result_id,
                max_idx: outcome.max_idx(),
                accepted: outcome.accepted.len(),
                rejected: outcome.rejected.len(),
                credit: outcome.credit,
            }),
            Err(e) => events.push(MergeEvent::MergeFailed {
                reason: e.to_string(),
                retryable: e.is_retryable(),
            }),
        }
        result
    }

    fn finish(
        &self,
        merged: MergedSolution,
        accepted: Vec<AcceptedSubmission>,
        rejected: Vec<RejectedSubmission>,
        submitted: usize,
    ) -> Result<MergeOutcome, MergeError> {
        let (canonical_result_id, max_idx) = match accepted.first() {
            Some(first) => (
                first.result_id,
                accepted
                    .iter()
                    .map(|a| a.solution.end_idx)
                    .max()
                    .unwrap_or(first.solution.end_idx),
            ),
            None => {
                warn!(
                    target: "ruvector_mc_solver::merge",
                    submitted,
                    "no valid results"
                );
                return Err(MergeError::NoValidResults { submitted });
            }
        };

        let missing = merged.missing(max_idx);
        if !missing.is_empty() {
            warn!(
                target: "ruvector_mc_solver::merge",
                max_idx,
                missing = missing.len(),
                first_missing = missing[0],
                "incomplete coverage"
            );
            return Err(MergeError::IncompleteCoverage { max_idx, missing });
        }

        let values: Vec<f64> = merged.iter().map(|(_, c)| c.value).collect();
        let credit = self.credit.credit(&accepted);

        info!(
            target: "ruvector_mc_solver::merge",
            canonical = canonical_result_id,
            components = values.len(),
            accepted = accepted.len(),
            rejected = rejected.len(),
            credit,
            "merge complete"
        );

        Ok(MergeOutcome {
            canonical_result_id,
            values,
            credit,
            accepted,
            rejected,
        })
    }
}

/// The decoded solution if it is usable, else the malformed reason.
fn well_formed(sub: &Submission) -> Result<&PartialSolution, RejectionReason> {
    let solution = sub.output.as_ref().map_err(|e| RejectionReason::Malformed {
        detail: e.to_string(),
    })?;
    solution.check().map_err(|e| RejectionReason::Malformed {
        detail: e.to_string(),
    })?;
    if solution.end_idx >= MAX_DIM {
        return Err(RejectionReason::Malformed {
            detail: format!(
                "component index {} beyond the largest supported dimension {MAX_DIM}",
                solution.end_idx
            ),
        });
    }
    if let Some((index, value)) = solution.iter().find(|(_, v)| !v.is_finite()) {
        return Err(RejectionReason::Malformed {
            detail: format!("non-finite value {value} at component {index}"),
        });
    }
    Ok(solution)
}

fn reject(
    result_id: ResultId,
    reason: RejectionReason,
    rejected: &mut Vec<RejectedSubmission>,
    events: &mut Vec<MergeEvent>,
) {
    events.push(MergeEvent::SubmissionRejected {
        result_id,
        reason: reason.clone(),
    });
    rejected.push(RejectedSubmission { result_id, reason });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn merger() -> PartialSolutionMerger {
        PartialSolutionMerger::new(MergeConfig::default())
    }

    fn sub(id: ResultId, start: usize, end: usize, values: Vec<f64>) -> Submission {
        Submission::parsed(id, PartialSolution::new(start, end, values).unwrap())
    }

    #[test]
    fn relative_error_handles_huge_magnitudes() {
        let e = relative_error(1e308, 1.7e308, 1e-10);
        assert!(e.is_finite());
        assert!((e - 0.7 / 1.35).abs() < 1e-12);
        assert!(!MergeConfig::default().agrees(1e308, 1.7e308));
    }

    #[test]
    fn component_beyond_max_dim_is_malformed() {
        let mut events = Vec::new();
        let outcome = merger()
            .merge_with_events(
                &[
                    Submission::from_text(1, "50000000 50000000\n1.0\n"),
                    sub(2, 0, 1, vec![1.0, 2.0]),
                ],
                &mut events,
            )
            .unwrap();
        assert_eq!(outcome.values, vec![1.0, 2.0]);
        assert_eq!(outcome.canonical_result_id, 2);
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectionReason::Malformed { .. }
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, MergeEvent::SubmissionRejected { result_id: 1, .. })));
    }

    #[test]
    fn relative_error_metric() {
        assert_eq!(relative_error(1.0, 1.0, 1e-10), 0.0);
        assert!((relative_error(1.0, 1.02, 1e-10) - 0.02 / 1.01).abs() < 1e-15);
        assert_eq!(relative_error(2.0, 1.0, 1e-10), relative_error(1.0, 2.0, 1e-10));
        // Tiny magnitudes fall back to the absolute difference.
        assert_eq!(relative_error(1e-12, -1e-12, 1e-10), 2e-12);
    }

    #[test]
    fn disjoint_partition_merges() {
        let out = merger()
            .merge(&[
                sub(10, 0, 1, vec![1.0, 2.0]),
                sub(11, 2, 3, vec![3.0, 4.0]),
            ])
            .unwrap();
        assert_eq!(out.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.canonical_result_id, 10);
        assert_eq!(out.max_idx(), 3);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn consistent_overlap_keeps_first_value() {
        let out = merger()
            .merge(&[
                sub(1, 0, 2, vec![1.0, 2.0, 3.0]),
                sub(2, 2, 3, vec![3.01, 4.0]),
            ])
            .unwrap();
        assert_eq!(out.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.accepted.len(), 2);
    }

    #[test]
    fn whole_submission_rejection_shrinks_coverage() {
        let outcome = merger()
            .merge(&[
                sub(1, 0, 2, vec![1.0, 2.0, 3.0]),
                sub(2, 2, 3, vec![3.5, 4.0]),
            ])
            .unwrap();
        assert_eq!(outcome.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].result_id, 2);
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectionReason::InconsistentOverlap { index: 2, .. }
        ));
    }

    #[test]
    fn per_index_policy_keeps_consistent_part() {
        let outcome = merger()
            .with_policy(PerIndex)
            .merge(&[
                sub(1, 0, 2, vec![1.0, 2.0, 3.0]),
                sub(2, 2, 3, vec![3.5, 4.0]),
            ])
            .unwrap();
        assert_eq!(outcome.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn per_index_rejects_total_disagreement() {
        let outcome = merger()
            .with_policy(PerIndex)
            .merge(&[sub(1, 0, 1, vec![1.0, 2.0]), sub(2, 0, 1, vec![5.0, 6.0])])
            .unwrap();
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn gap_is_incomplete_coverage() {
        let err = merger()
            .merge(&[sub(1, 0, 2, vec![1.0; 3]), sub(2, 4, 6, vec![1.0; 3])])
            .unwrap_err();
        assert_eq!(
            err,
            MergeError::IncompleteCoverage {
                max_idx: 6,
                missing: vec![3],
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn nothing_valid_is_no_valid_results() {
        let bad = Submission {
            result_id: 1,
            output: Err(FormatError::UnexpectedEof {
                what: "start_idx".into(),
            }),
        };
        let err = merger().merge(&[bad]).unwrap_err();
        assert_eq!(err, MergeError::NoValidResults { submitted: 1 });
        assert!(err.is_retryable());

        let err = merger().merge(&[]).unwrap_err();
        assert_eq!(err, MergeError::NoValidResults { submitted: 0 });
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let bad = Submission::parsed(
            1,
            PartialSolution {
                start_idx: 0,
                end_idx: 2,
                values: vec![1.0, 2.0],
            },
        );
        let out = merger()
            .merge(&[bad, sub(2, 0, 0, vec![7.0])])
            .unwrap();
        assert_eq!(out.values, vec![7.0]);
        assert_eq!(out.canonical_result_id, 2);
        assert!(matches!(
            out.rejected[0].reason,
            RejectionReason::Malformed { .. }
        ));
    }

    #[test]
    fn non_finite_value_is_malformed() {
        let out = merger()
            .merge(&[sub(1, 0, 1, vec![1.0, f64::NAN]), sub(2, 0, 1, vec![1.0, 2.0])])
            .unwrap();
        assert_eq!(out.canonical_result_id, 2);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn credit_is_components_times_reward() {
        let out = merger()
            .merge(&[
                sub(1, 0, 2, vec![1.0; 3]),
                sub(2, 3, 6, vec![1.0; 4]),
                sub(3, 7, 11, vec![1.0; 5]),
            ])
            .unwrap();
        assert_eq!(out.credit, 12.0 * DEFAULT_REWARD_PER_COMPONENT);

        let custom = merger()
            .with_credit(PerComponentCredit {
                reward_per_component: 1.5,
            })
            .merge(&[sub(1, 0, 1, vec![1.0; 2])])
            .unwrap();
        assert_eq!(custom.credit, 3.0);
    }

    #[test]
    fn events_trace_the_pass() {
        let mut events = Vec::new();
        merger()
            .merge_with_events(
                &[sub(1, 0, 0, vec![1.0]), Submission::from_text(2, "garbage")],
                &mut events,
            )
            .unwrap();
        assert!(matches!(events[0], MergeEvent::MergeStarted { submissions: 2, .. }));
        assert!(matches!(
            events[1],
            MergeEvent::SubmissionAccepted {
                result_id: 1,
                newly_claimed: 1,
                ..
            }
        ));
        assert!(matches!(events[2], MergeEvent::SubmissionRejected { result_id: 2, .. }));
        assert!(matches!(events[3], MergeEvent::MergeCompleted { .. }));
    }

    #[test]
    fn compare_same_range() {
        let a = PartialSolution::new(2, 3, vec![1.0, -2.0]).unwrap();
        let b = PartialSolution::new(2, 3, vec![1.005, -2.01]).unwrap();
        let c = PartialSolution::new(2, 3, vec![1.0, -2.5]).unwrap();
        let d = PartialSolution::new(1, 2, vec![1.0, -2.0]).unwrap();
        assert!(compare_partial_solutions(&a, &b, DEFAULT_TOLERANCE));
        assert!(!compare_partial_solutions(&a, &c, DEFAULT_TOLERANCE));
        assert!(!compare_partial_solutions(&a, &d, DEFAULT_TOLERANCE));
    }

    #[test]
    fn merged_solution_claims_once() {
        let mut m = MergedSolution::new();
        assert!(m.claim(3, 1.0, 1));
        assert!(!m.claim(3, 2.0, 2));
        assert_eq!(m.get(3), Some(1.0));
        assert_eq!(m.claim_at(3).map(|c| c.result_id), Some(1));
        assert_eq!(m.missing(4), vec![0, 1, 2, 4]);
    }
}
