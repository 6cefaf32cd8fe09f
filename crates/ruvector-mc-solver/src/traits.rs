//! Extension points of the solver and the merger.
//!
//! [`ProgressObserver`] receives solver progress, [`ConflictPolicy`] decides
//! what happens when a submission disagrees with values that are already
//! claimed, and [`CreditFunction`] prices the accepted work. The merger is
//! generic over the last two so alternative policies can be swapped in
//! without touching the merge pass itself.

use crate::merge::{AcceptedSubmission, Admission, MergeConfig, MergedSolution};
use crate::types::PartialSolution;

/// Observer for [`ComponentSolver`](crate::component::ComponentSolver)
/// progress.
///
/// `fraction` is the share of `(component, walk)` pairs completed, in
/// `[0, 1]`. Observation has no effect on the estimate.
pub trait ProgressObserver: Sync {
    /// Called periodically during a solve and once per finished component.
    fn report(&self, fraction: f64);
}

impl<F: Fn(f64) + Sync> ProgressObserver for F {
    #[inline]
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// Observer that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    #[inline]
    fn report(&self, _fraction: f64) {}
}

/// Decides whether an incoming submission may claim components.
///
/// Called once per well-formed submission, in arrival order, with the claims
/// made so far. Implementations must be deterministic in their inputs: the
/// merge outcome depends only on arrival order and policy.
pub trait ConflictPolicy: Send + Sync {
    /// Inspect `candidate` against `claims` and return the admission verdict.
    fn admit(
        &self,
        candidate: &PartialSolution,
        claims: &MergedSolution,
        config: &MergeConfig,
    ) -> Admission;

    /// Short identifier used in logs and audit records.
    fn name(&self) -> &'static str;
}

/// Prices the work represented by the accepted submissions of one merge.
pub trait CreditFunction: Send + Sync {
    /// Total credit for a successful merge.
    fn credit(&self, accepted: &[AcceptedSubmission]) -> f64;
}
