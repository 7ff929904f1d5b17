//! Backend tier model.
//!
//! Tiers are interchangeable reasoning backends ordered by assumed cost and
//! reasoning depth. The ordering is total and escalation only ever moves
//! forward: no task is ever routed back to a cheaper tier.

use serde::{Deserialize, Serialize};

/// Capability level of a reasoning backend.
///
/// Derived `Ord` follows declaration order, which is the cost/depth order:
/// `FastSurgeon < WideContextAnalyst < DeepReasoner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendTier {
    /// Cheap, fast, narrow. Default entry tier.
    FastSurgeon,
    /// Mid-cost tier with a wide context window.
    WideContextAnalyst,
    /// Most expensive, deepest reasoning. Last resort.
    DeepReasoner,
}

impl Default for BackendTier {
    fn default() -> Self {
        Self::FastSurgeon
    }
}

impl BackendTier {
    /// All tiers in ascending cost order.
    pub const ALL: [Self; 3] = [Self::FastSurgeon, Self::WideContextAnalyst, Self::DeepReasoner];

    /// Number of tiers in the ladder.
    pub const COUNT: u32 = Self::ALL.len() as u32;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastSurgeon => "fast_surgeon",
            Self::WideContextAnalyst => "wide_context_analyst",
            Self::DeepReasoner => "deep_reasoner",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast_surgeon" | "fast-surgeon" | "fast" => Some(Self::FastSurgeon),
            "wide_context_analyst" | "wide-context-analyst" | "wide" => {
                Some(Self::WideContextAnalyst)
            }
            "deep_reasoner" | "deep-reasoner" | "deep" => Some(Self::DeepReasoner),
            _ => None,
        }
    }

    /// The next (more expensive) tier, or `None` at the top of the ladder.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::FastSurgeon => Some(Self::WideContextAnalyst),
            Self::WideContextAnalyst => Some(Self::DeepReasoner),
            Self::DeepReasoner => None,
        }
    }

    /// Whether this is the most expensive tier.
    pub fn is_highest(&self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for BackendTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
