//! Static evidence search for tests and the demo CLI.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::EvidenceSearch;

/// Evidence search over a fixed query-to-locators map.
///
/// Queries not in the map return no locators, which the gatherer reports
/// as unresolved.
#[derive(Debug, Clone, Default)]
pub struct StaticEvidence {
    hits: HashMap<String, Vec<String>>,
}

impl StaticEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register locators for an exact query.
    pub fn with_hit(mut self, query: impl Into<String>, locators: &[&str]) -> Self {
        self.hits
            .insert(query.into(), locators.iter().map(ToString::to_string).collect());
        self
    }

    /// Evidence that grounds every query with a synthetic locator.
    pub fn omniscient() -> Omniscient {
        Omniscient
    }
}

#[async_trait]
impl EvidenceSearch for StaticEvidence {
    async fn search(&self, _scope: &str, query: &str) -> DomainResult<Vec<String>> {
        Ok(self.hits.get(query).cloned().unwrap_or_default())
    }
}

/// Evidence search that grounds every query.
#[derive(Debug, Clone, Copy)]
pub struct Omniscient;

#[async_trait]
impl EvidenceSearch for Omniscient {
    async fn search(&self, scope: &str, query: &str) -> DomainResult<Vec<String>> {
        Ok(vec![format!("{scope}#{query}")])
    }
}
