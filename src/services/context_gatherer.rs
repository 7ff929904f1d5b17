//! Context gathering between attempts.
//!
//! Resolves the open questions raised by a failed attempt into concrete,
//! evidence-grounded answers before the next dispatch. Bounded in scope:
//! only the asked questions are answered, and at most a small fixed number
//! of new questions may be admitted per cycle. Those caps are the guardrail
//! against runaway context expansion.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Answer;
use crate::domain::ports::EvidenceSearch;

/// Outcome of one gathering cycle.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Questions grounded in evidence.
    pub answers: Vec<Answer>,
    /// Questions that could not be grounded; they stay open, and no answer
    /// is ever fabricated for them.
    pub still_open: Vec<String>,
}

/// Resolves open questions against an evidence search capability.
pub struct ContextGatherer {
    evidence: Arc<dyn EvidenceSearch>,
    /// New questions admitted per gathering cycle.
    max_followup_questions: usize,
}

impl ContextGatherer {
    pub fn new(evidence: Arc<dyn EvidenceSearch>, max_followup_questions: usize) -> Self {
        Self {
            evidence,
            max_followup_questions,
        }
    }

    /// Resolve a single question or fail with
    /// [`DomainError::Unresolved`] when no evidence grounds it.
    pub async fn resolve_one(&self, question: &str, scope: &str) -> DomainResult<Answer> {
        let locators = self.evidence.search(scope, question).await?;
        let Some(first) = locators.first() else {
            return Err(DomainError::Unresolved(question.to_string()));
        };
        Ok(Answer {
            question: question.to_string(),
            locator: first.clone(),
            summary: format!("grounded in {} evidence reference(s)", locators.len()),
        })
    }

    /// Resolve the asked questions, and only those, within a scope.
    ///
    /// Unresolved questions are collected into `still_open` rather than
    /// aborting the cycle; any other search error propagates.
    #[instrument(skip(self, questions), fields(count = questions.len()))]
    pub async fn resolve(&self, questions: &[String], scope: &str) -> DomainResult<Resolution> {
        let mut resolution = Resolution::default();
        for question in questions {
            match self.resolve_one(question, scope).await {
                Ok(answer) => {
                    debug!(question = %question, locator = %answer.locator, "question grounded");
                    resolution.answers.push(answer);
                }
                Err(DomainError::Unresolved(q)) => {
                    warn!(question = %q, "no evidence found, question stays open");
                    resolution.still_open.push(q);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(resolution)
    }

    /// Admit new questions raised since the last cycle, capped to prevent
    /// unbounded scope growth. Questions already in `asked` pass through
    /// the cap untouched.
    pub fn admit_followups(&self, asked: &[String], proposed: &[String]) -> Vec<String> {
        let mut admitted = Vec::new();
        let mut new_count = 0;
        for question in proposed {
            if asked.contains(question) {
                admitted.push(question.clone());
            } else if new_count < self.max_followup_questions {
                admitted.push(question.clone());
                new_count += 1;
            }
        }
        admitted
    }
}
