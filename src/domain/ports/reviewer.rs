//! Reviewer and reviser ports for the convergence loop.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Artifact, Finding};

/// Independent reviewer capability.
///
/// Returns findings in the same severity taxonomy used for attempt
/// verification. The review verdict is derived from findings, never
/// reported separately.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review an artifact and report findings.
    async fn review(&self, artifact: &Artifact) -> DomainResult<Vec<Finding>>;
}

/// "Revise and resubmit" capability, supplied by the caller.
///
/// The convergence loop applies review findings abstractly through this
/// port; it never edits an artifact itself.
#[async_trait]
pub trait Reviser: Send + Sync {
    /// Produce a revised artifact addressing the findings.
    async fn revise(&self, artifact: &Artifact, findings: &[Finding]) -> DomainResult<Artifact>;
}
