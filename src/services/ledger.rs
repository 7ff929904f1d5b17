//! Append-only attempt ledger.
//!
//! Records every attempt made on a task: tier used, confidence, outcome,
//! feedback. Attempts are never edited or deleted; corrections are expressed
//! as new attempts. Each council router owns its own ledger partition, so no
//! cross-task locking is needed.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Attempt;

/// Append-only record of attempts, partitioned by task id.
#[derive(Debug, Clone, Default)]
pub struct AttemptLedger {
    entries: HashMap<Uuid, Vec<Attempt>>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt.
    ///
    /// Fails with [`DomainError::DuplicateSequence`] unless the sequence
    /// number is exactly one greater than the last recorded attempt for the
    /// task (first attempt is sequence 1). This is a fatal caller bug, never
    /// silently ignored.
    pub fn record(&mut self, attempt: Attempt) -> DomainResult<()> {
        let history = self.entries.entry(attempt.task_id).or_default();
        let expected = history.last().map_or(1, |a| a.sequence + 1);
        if attempt.sequence != expected {
            return Err(DomainError::DuplicateSequence {
                task_id: attempt.task_id,
                expected,
                got: attempt.sequence,
            });
        }
        history.push(attempt);
        Ok(())
    }

    /// Attempts for a task in recording order. Restartable and finite.
    pub fn history(&self, task_id: Uuid) -> impl Iterator<Item = &Attempt> {
        self.entries.get(&task_id).into_iter().flatten()
    }

    /// The most recent `n` attempts (or fewer if history is shorter), in
    /// recording order. Bounds policy lookback without unbounded memory.
    pub fn last_n(&self, task_id: Uuid, n: usize) -> &[Attempt] {
        let history = self
            .entries
            .get(&task_id)
            .map_or(&[] as &[Attempt], Vec::as_slice);
        &history[history.len().saturating_sub(n)..]
    }

    /// Number of attempts recorded for a task.
    pub fn len(&self, task_id: Uuid) -> u64 {
        self.entries.get(&task_id).map_or(0, |h| h.len() as u64)
    }

    pub fn is_empty(&self, task_id: Uuid) -> bool {
        self.len(task_id) == 0
    }

    /// Drain a task's history out of the ledger, e.g. to attach it to a
    /// terminal disposition.
    pub fn take_history(&mut self, task_id: Uuid) -> Vec<Attempt> {
        self.entries.remove(&task_id).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BackendTier, Verification};
    use chrono::Utc;

    fn attempt(task_id: Uuid, sequence: u64) -> Attempt {
        Attempt {
            task_id,
            sequence,
            tier: BackendTier::FastSurgeon,
            confidence: 50,
            verification: Verification::Fail,
            findings: Vec::new(),
            open_questions: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut ledger = AttemptLedger::new();
        let id = Uuid::new_v4();
        ledger.record(attempt(id, 1)).unwrap();
        ledger.record(attempt(id, 2)).unwrap();
        ledger.record(attempt(id, 3)).unwrap();

        let sequences: Vec<u64> = ledger.history(id).map(|a| a.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(ledger.len(id), 3);
    }

    #[test]
    fn test_duplicate_sequence_rejected() {
        let mut ledger = AttemptLedger::new();
        let id = Uuid::new_v4();
        ledger.record(attempt(id, 1)).unwrap();

        let err = ledger.record(attempt(id, 1)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DuplicateSequence {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_gap_in_sequence_rejected() {
        let mut ledger = AttemptLedger::new();
        let id = Uuid::new_v4();
        ledger.record(attempt(id, 1)).unwrap();
        assert!(ledger.record(attempt(id, 3)).is_err());
    }

    #[test]
    fn test_first_attempt_must_be_sequence_one() {
        let mut ledger = AttemptLedger::new();
        let id = Uuid::new_v4();
        assert!(ledger.record(attempt(id, 0)).is_err());
        assert!(ledger.record(attempt(id, 2)).is_err());
        assert!(ledger.record(attempt(id, 1)).is_ok());
    }

    #[test]
    fn test_last_n_bounds_lookback() {
        let mut ledger = AttemptLedger::new();
        let id = Uuid::new_v4();
        for seq in 1..=5 {
            ledger.record(attempt(id, seq)).unwrap();
        }

        let recent: Vec<u64> = ledger.last_n(id, 2).iter().map(|a| a.sequence).collect();
        assert_eq!(recent, vec![4, 5]);

        // Shorter history returns everything.
        let all: Vec<u64> = ledger.last_n(id, 50).iter().map(|a| a.sequence).collect();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partitions_are_independent() {
        let mut ledger = AttemptLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        ledger.record(attempt(a, 1)).unwrap();
        ledger.record(attempt(b, 1)).unwrap();
        ledger.record(attempt(b, 2)).unwrap();

        assert_eq!(ledger.len(a), 1);
        assert_eq!(ledger.len(b), 2);
        assert_eq!(ledger.history(Uuid::new_v4()).count(), 0);
    }
}
