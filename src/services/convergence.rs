//! Convergence loop: repeated independent review of one artifact.
//!
//! Submits the artifact to a reviewer, classifies findings by severity, and
//! either declares convergence (the required number of consecutive rounds
//! with zero blockers and zero majors) or revises and resubmits. Hitting
//! the round ceiling yields `RoundsExhausted`, reported distinctly so
//! exhaustion is never mistaken for success.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Artifact, ConvergenceConfig, ConvergenceReport, ConvergenceResult, ConvergenceSession,
    Finding, ReviewRound, Severity,
};
use crate::domain::ports::{Reviewer, Reviser};

/// Drives one artifact through review rounds until stable or exhausted.
pub struct ConvergenceLoop {
    config: ConvergenceConfig,
    review_timeout: Duration,
}

impl ConvergenceLoop {
    pub fn new(config: ConvergenceConfig, review_timeout: Duration) -> Self {
        Self {
            config,
            review_timeout,
        }
    }

    /// Run review rounds on the artifact.
    ///
    /// Revision is a caller-supplied capability; the loop never edits the
    /// artifact itself. The full round history is returned either way.
    #[instrument(skip_all, fields(artifact = %artifact.uri, max_rounds = self.config.max_rounds))]
    pub async fn run(
        &self,
        mut artifact: Artifact,
        reviewer: Arc<dyn Reviewer>,
        reviser: Arc<dyn Reviser>,
    ) -> DomainResult<ConvergenceReport> {
        let mut session = ConvergenceSession::new();

        for round_number in 1..=self.config.max_rounds {
            let findings = self.submit(&artifact, reviewer.as_ref()).await;
            let round = ReviewRound::new(round_number, findings);
            debug!(
                round = round_number,
                blockers = round.blocker_count(),
                majors = round.major_count(),
                "review round complete"
            );
            session.record(round)?;

            if session.is_converged(self.config.required_clean_rounds) {
                info!(rounds = round_number, "artifact converged");
                return Ok(ConvergenceReport {
                    result: ConvergenceResult::Converged,
                    session,
                });
            }

            // Revise before the next round. The last round's findings are
            // applied even when the round was clean, because a single clean
            // round is not yet proof of stability.
            if round_number < self.config.max_rounds {
                let findings = session
                    .rounds()
                    .last()
                    .map(|r| r.findings.clone())
                    .unwrap_or_default();
                artifact = reviser.revise(&artifact, &findings).await?;
            }
        }

        warn!(rounds = self.config.max_rounds, "review rounds exhausted");
        Ok(ConvergenceReport {
            result: ConvergenceResult::RoundsExhausted,
            session,
        })
    }

    /// Submit the artifact for review with the configured timeout. A timed
    /// out or errored review is a dirty round, not a separate error path.
    async fn submit(&self, artifact: &Artifact, reviewer: &dyn Reviewer) -> Vec<Finding> {
        match tokio::time::timeout(self.review_timeout, reviewer.review(artifact)).await {
            Ok(Ok(findings)) => findings,
            Ok(Err(err)) => {
                warn!(error = %err, "reviewer error, counting as blocking round");
                vec![Finding::new(Severity::Blocker, "reviewer_error", err.to_string())]
            }
            Err(_) => {
                warn!("review timed out, counting as blocking round");
                vec![Finding::new(
                    Severity::Blocker,
                    "timeout",
                    format!("review timed out after {}s", self.review_timeout.as_secs()),
                )]
            }
        }
    }
}
