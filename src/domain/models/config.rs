//! Engine configuration model.
//!
//! Plain serde structs with programmatic defaults; hierarchical loading and
//! validation live in `infrastructure::config`.

use serde::{Deserialize, Serialize};

use super::tier::BackendTier;

/// Escalation policy tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Minimum confidence (0-100) for a passing attempt to count as
    /// terminal success.
    pub confidence_threshold: u8,
    /// Consecutive failures at one tier before escalating.
    pub failure_cap: u32,
    /// Total context-gathering cycles allowed per task.
    pub context_gather_budget: u32,
    /// New follow-up questions admitted per gathering cycle.
    pub max_followup_questions: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 80,
            failure_cap: 2,
            context_gather_budget: 2,
            max_followup_questions: 2,
        }
    }
}

impl EscalationConfig {
    /// Hard ceiling on attempts per task; configs exceeding it are rejected
    /// as misconfigured.
    pub const ATTEMPT_CEILING: u32 = 64;

    /// Termination bound: no task may ever exceed this many attempts.
    pub fn max_total_attempts(&self) -> u32 {
        BackendTier::COUNT * self.failure_cap + self.context_gather_budget
    }
}

/// Convergence loop tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Review round ceiling. Hitting it yields `RoundsExhausted`.
    pub max_rounds: u32,
    /// Consecutive clean rounds required to declare convergence. The review
    /// cadence is a policy parameter, not a hardcoded constant.
    pub required_clean_rounds: u32,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            required_clean_rounds: 2,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub escalation: EscalationConfig,
    pub convergence: ConvergenceConfig,
    pub runtime: RuntimeConfig,
}

/// Runtime tunables for dispatch and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Backend dispatch timeout in seconds. A timed-out dispatch is a
    /// normal failed attempt, not a special error path.
    pub dispatch_timeout_secs: u64,
    /// Reviewer submission timeout in seconds.
    pub review_timeout_secs: u64,
    /// Independent ready tasks executed concurrently.
    pub max_concurrent_tasks: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_secs: 300,
            review_timeout_secs: 120,
            max_concurrent_tasks: 4,
        }
    }
}
