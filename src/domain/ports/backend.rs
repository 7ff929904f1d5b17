//! Backend port - interface for reasoning backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AccumulatedContext, AttemptOutcome, BackendTier, TaskPayload};

/// Trait for reasoning backend implementations.
///
/// A backend is one member of the council: an opaque capability that takes a
/// task payload plus the context accumulated across earlier attempts and
/// reports an outcome. No assumption is made about how the outcome is
/// computed.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the backend name, for logging.
    fn name(&self) -> &'static str;

    /// Run one attempt at the given tier.
    ///
    /// This call may suspend; the router wraps it in the configured dispatch
    /// timeout and treats a timeout as a normal failed attempt.
    async fn attempt(
        &self,
        tier: BackendTier,
        payload: &TaskPayload,
        context: &AccumulatedContext,
    ) -> DomainResult<AttemptOutcome>;
}
