//! Per-task serialisation of submissions and merge passes.
//!
//! Submissions for one task are appended in arrival order under that task's
//! lock, and a merge pass runs under the same lock so it sees a stable
//! prefix. Different tasks have different locks and never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::audit::{AuditBuilder, MergeAuditEntry};
use crate::error::MergeError;
use crate::events::MergeEvent;
use crate::merge::{MergeConfig, MergeOutcome, PartialSolutionMerger, Submission};
use crate::merge::{PerComponentCredit, WholeSubmission};
use crate::traits::{ConflictPolicy, CreditFunction};

type TaskQueue = Arc<Mutex<Vec<Submission>>>;

/// Collects submissions per task and merges them on demand.
///
/// # Example
///
/// ```rust
/// use ruvector_mc_solver::coordinator::MergeCoordinator;
/// use ruvector_mc_solver::merge::{MergeConfig, PartialSolutionMerger, Submission};
///
/// let coord = MergeCoordinator::new(PartialSolutionMerger::new(MergeConfig::default()));
/// coord.submit("wu-7", Submission::from_text(1, "0 0\n4.0\n"));
/// let outcome = coord.merge("wu-7").unwrap();
/// assert_eq!(outcome.values, vec![4.0]);
/// ```
pub struct MergeCoordinator<P = WholeSubmission, C = PerComponentCredit> {
    merger: PartialSolutionMerger<P, C>,
    tasks: DashMap<String, TaskQueue>,
}

impl Default for MergeCoordinator {
    fn default() -> Self {
        Self::new(PartialSolutionMerger::new(MergeConfig::default()))
    }
}

impl<P: ConflictPolicy, C: CreditFunction> MergeCoordinator<P, C> {
    /// Create a coordinator around `merger`.
    pub fn new(merger: PartialSolutionMerger<P, C>) -> Self {
        Self {
            merger,
            tasks: DashMap::new(),
        }
    }

    /// The merger used for every pass.
    pub fn merger(&self) -> &PartialSolutionMerger<P, C> {
        &self.merger
    }

    fn queue(&self, task_id: &str) -> TaskQueue {
        if let Some(q) = self.tasks.get(task_id) {
            return Arc::clone(q.value());
        }
        Arc::clone(
            self.tasks
                .entry(task_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
                .value(),
        )
    }

    fn existing(&self, task_id: &str) -> Option<TaskQueue> {
        self.tasks.get(task_id).map(|q| Arc::clone(q.value()))
    }

    /// Append a submission to `task_id`'s queue. Returns the queue length.
    pub fn submit(&self, task_id: &str, submission: Submission) -> usize {
        let queue = self.queue(task_id);
        let mut guard = queue.lock();
        guard.push(submission);
        debug!(
            target: "ruvector_mc_solver::coordinator",
            task_id,
            queued = guard.len(),
            "submission queued"
        );
        guard.len()
    }

    /// Number of submissions queued for `task_id`.
    pub fn pending(&self, task_id: &str) -> usize {
        self.existing(task_id).map_or(0, |q| q.lock().len())
    }

    /// Number of tasks with a queue.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Merge everything queued for `task_id`.
    ///
    /// The queue is left intact so that a retryable failure can be followed
    /// by more submissions and another pass.
    ///
    /// # Errors
    ///
    /// See [`PartialSolutionMerger::merge`]. An unknown task yields
    /// [`MergeError::NoValidResults`] with zero submissions.
    pub fn merge(&self, task_id: &str) -> Result<MergeOutcome, MergeError> {
        let mut events = Vec::new();
        self.merge_with_events(task_id, &mut events)
    }

    /// Like [`merge`](Self::merge), recording [`MergeEvent`]s.
    ///
    /// # Errors
    ///
    /// See [`merge`](Self::merge).
    pub fn merge_with_events(
        &self,
        task_id: &str,
        events: &mut Vec<MergeEvent>,
    ) -> Result<MergeOutcome, MergeError> {
        match self.existing(task_id) {
            Some(queue) => {
                let guard = queue.lock();
                self.merger.merge_with_events(&guard, events)
            }
            None => self.merger.merge_with_events(&[], events),
        }
    }

    /// Merge and return an audit record alongside the result.
    pub fn merge_audited(
        &self,
        task_id: &str,
    ) -> (Result<MergeOutcome, MergeError>, MergeAuditEntry) {
        let queue = self.existing(task_id);
        let guard = queue.as_ref().map(|q| q.lock());
        let subs: &[Submission] = match guard.as_deref() {
            Some(queued) => queued.as_slice(),
            None => &[],
        };

        let audit = AuditBuilder::start(task_id, self.merger.policy().name(), subs);
        let result = self.merger.merge(subs);
        let entry = audit.finish(&result);
        (result, entry)
    }

    /// Drop `task_id`'s queue, returning its submissions.
    pub fn remove(&self, task_id: &str) -> Option<Vec<Submission>> {
        let (_, queue) = self.tasks.remove(task_id)?;
        let mut guard = queue.lock();
        Some(std::mem::take(&mut *guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn coordinator() -> MergeCoordinator {
        MergeCoordinator::default()
    }

    #[test]
    fn unknown_task_has_no_valid_results() {
        let coord = coordinator();
        assert_eq!(
            coord.merge("missing").unwrap_err(),
            MergeError::NoValidResults { submitted: 0 }
        );
        assert_eq!(coord.pending("missing"), 0);
    }

    #[test]
    fn retry_after_incomplete_coverage() {
        let coord = coordinator();
        coord.submit("t", Submission::from_text(1, "0 1\n1.0\n2.0\n"));
        coord.submit("t", Submission::from_text(2, "3 3\n4.0\n"));
        let err = coord.merge("t").unwrap_err();
        assert!(err.is_retryable());

        coord.submit("t", Submission::from_text(3, "2 2\n3.0\n"));
        let outcome = coord.merge("t").unwrap();
        assert_eq!(outcome.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(outcome.canonical_result_id, 1);
    }

    #[test]
    fn tasks_are_independent() {
        let coord = coordinator();
        coord.submit("a", Submission::from_text(1, "0 0\n1.0\n"));
        coord.submit("b", Submission::from_text(2, "0 0\n9.0\n"));
        assert_eq!(coord.task_count(), 2);
        assert_eq!(coord.merge("a").unwrap().values, vec![1.0]);
        assert_eq!(coord.merge("b").unwrap().values, vec![9.0]);
    }

    #[test]
    fn concurrent_submits_are_all_kept() {
        let coord = Arc::new(coordinator());
        let handles: Vec<_> = (0..8u64)
            .map(|k| {
                let coord = Arc::clone(&coord);
                thread::spawn(move || {
                    let text = format!("{k} {k}\n{}.0\n", k + 1);
                    coord.submit("shared", Submission::from_text(k, &text));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(coord.pending("shared"), 8);
        let outcome = coord.merge("shared").unwrap();
        assert_eq!(outcome.values, (1..=8).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn audited_merge_matches_plain_merge() {
        let coord = coordinator();
        coord.submit("t", Submission::from_text(1, "0 0\n5.0\n"));
        let (result, entry) = coord.merge_audited("t");
        assert_eq!(result.unwrap().values, vec![5.0]);
        assert_eq!(entry.task_id, "t");
        assert_eq!(entry.policy, "whole_submission");
    }

    #[test]
    fn remove_returns_queue() {
        let coord = coordinator();
        coord.submit("t", Submission::from_text(1, "0 0\n5.0\n"));
        assert_eq!(coord.remove("t").map(|v| v.len()), Some(1));
        assert_eq!(coord.task_count(), 0);
    }
}
