//! Review round and convergence session models.
//!
//! A convergence session drives repeated independent review of one artifact.
//! Convergence is proven by stability: the required number of consecutive
//! rounds (two by default) with zero blocking or major findings. A single
//! clean round can be a fluke of reviewer inattention.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

use super::attempt::{Finding, Severity};

/// Verdict of a single review round, derived from its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// No blockers and no majors.
    Clean,
    /// At least one blocking finding; artifact needs another revision.
    RevisionsRequested,
}

/// One round of independent review within a convergence session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRound {
    /// Round number, strictly increasing within a session, starting at 1.
    pub round: u32,
    /// Findings reported by the reviewer, in the shared severity taxonomy.
    pub findings: Vec<Finding>,
    /// Verdict derived from the findings.
    pub verdict: ReviewVerdict,
}

impl ReviewRound {
    /// Build a round; the verdict is derived, never supplied.
    pub fn new(round: u32, findings: Vec<Finding>) -> Self {
        let verdict = if findings.iter().any(|f| f.severity.is_blocking()) {
            ReviewVerdict::RevisionsRequested
        } else {
            ReviewVerdict::Clean
        };
        Self {
            round,
            findings,
            verdict,
        }
    }

    pub fn blocker_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Blocker)
            .count()
    }

    pub fn major_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Major)
            .count()
    }

    /// Zero blockers and zero majors.
    pub fn is_clean(&self) -> bool {
        self.verdict == ReviewVerdict::Clean
    }
}

/// Rolling review history for one artifact.
///
/// Round numbers are strictly increasing; recording enforces this. The
/// convergence predicate only consults the trailing window, but the full
/// history is kept so exhaustion can be diagnosed by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergenceSession {
    rounds: Vec<ReviewRound>,
}

impl ConvergenceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a round. Rejects a round number that is not exactly one
    /// greater than the previous round's.
    pub fn record(&mut self, round: ReviewRound) -> DomainResult<()> {
        let expected = self.rounds.last().map_or(1, |r| r.round + 1);
        if round.round != expected {
            return Err(DomainError::ValidationFailed(format!(
                "round numbers must be strictly increasing: expected {expected}, got {}",
                round.round
            )));
        }
        self.rounds.push(round);
        Ok(())
    }

    /// Number of rounds recorded so far.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// All rounds, in order.
    pub fn rounds(&self) -> &[ReviewRound] {
        &self.rounds
    }

    /// The convergence predicate: the trailing `required_clean` rounds all
    /// have zero blockers and zero majors. Never true before that many
    /// rounds exist.
    pub fn is_converged(&self, required_clean: u32) -> bool {
        let required = required_clean.max(1) as usize;
        self.rounds.len() >= required
            && self.rounds[self.rounds.len() - required..]
                .iter()
                .all(ReviewRound::is_clean)
    }
}

/// Terminal outcome of a convergence session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceResult {
    /// The required number of consecutive clean rounds was observed.
    Converged,
    /// The round ceiling was hit first. Reported distinctly so callers do
    /// not mistake exhaustion for success.
    RoundsExhausted,
}

/// Outcome of a convergence run plus the full round history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub result: ConvergenceResult,
    pub session: ConvergenceSession,
}

impl ConvergenceReport {
    pub fn converged(&self) -> bool {
        self.result == ConvergenceResult::Converged
    }

    pub fn rounds_used(&self) -> u32 {
        self.session.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::attempt::{Finding, Severity};

    fn clean(round: u32) -> ReviewRound {
        ReviewRound::new(round, vec![Finding::new(Severity::Nit, "style", "naming")])
    }

    fn dirty(round: u32) -> ReviewRound {
        ReviewRound::new(
            round,
            vec![Finding::new(Severity::Blocker, "correctness", "wrong result")],
        )
    }

    #[test]
    fn test_verdict_derived_from_findings() {
        assert_eq!(clean(1).verdict, ReviewVerdict::Clean);
        assert_eq!(dirty(1).verdict, ReviewVerdict::RevisionsRequested);

        let major = ReviewRound::new(1, vec![Finding::new(Severity::Major, "perf", "slow path")]);
        assert_eq!(major.verdict, ReviewVerdict::RevisionsRequested);
        assert_eq!(major.major_count(), 1);
        assert_eq!(major.blocker_count(), 0);
    }

    #[test]
    fn test_round_numbers_strictly_increasing() {
        let mut session = ConvergenceSession::new();
        session.record(clean(1)).unwrap();
        session.record(clean(2)).unwrap();
        let err = session.record(clean(2)).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        assert!(session.record(clean(5)).is_err());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_convergence_needs_two_consecutive_clean_rounds() {
        let mut session = ConvergenceSession::new();
        session.record(clean(1)).unwrap();
        assert!(!session.is_converged(2), "one clean round is not enough");

        session.record(dirty(2)).unwrap();
        assert!(!session.is_converged(2), "clean then dirty must not converge");

        session.record(clean(3)).unwrap();
        assert!(!session.is_converged(2));

        session.record(clean(4)).unwrap();
        assert!(session.is_converged(2));
    }

    #[test]
    fn test_convergence_window_is_configurable() {
        let mut session = ConvergenceSession::new();
        session.record(clean(1)).unwrap();
        assert!(session.is_converged(1));
        assert!(!session.is_converged(3));
    }
}
