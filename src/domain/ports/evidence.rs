//! Evidence search port, used by the context gatherer.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Evidence search capability.
///
/// Locators are opaque strings (file-and-line, resource id, ...). An empty
/// result means the query could not be grounded; the gatherer must then
/// report the question unresolved rather than fabricate an answer.
#[async_trait]
pub trait EvidenceSearch: Send + Sync {
    /// Search a scope for evidence matching a query.
    async fn search(&self, scope: &str, query: &str) -> DomainResult<Vec<String>>;
}
