//! Escalation state derivation and policy.
//!
//! The policy is a pure decision function from derived escalation state to
//! the next action. State is never stored: it is recomputed from the ordered
//! attempt history, so it is deterministic and order-preserving by
//! construction.
//!
//! The ladder is finite, not a graph: tiers only move forward, each tier
//! allows at most `failure_cap` consecutive failures, and context gathering
//! is budgeted, so every task terminates in at most
//! `tiers x failure_cap + context_gather_budget` attempts.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::models::{
    question_set_hash, Attempt, BackendTier, EscalationConfig,
};

/// Next action for a non-terminal task, chosen by [`decide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EscalationAction {
    /// Dispatch again at the current tier.
    RetrySameTier,
    /// Move forward to the given tier and dispatch there.
    EscalateTier(BackendTier),
    /// Resolve these open questions before the next dispatch.
    GatherContext(Vec<String>),
    /// Give up on the task.
    Abandon(String),
}

/// Escalation state derived from a task's attempt history.
///
/// A pure function of the ordered attempts plus the policy config (the
/// confidence threshold decides what counts as a failure, and the gather
/// budget bounds the replayed gather events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationState {
    /// Total attempts recorded.
    pub attempt_count: u32,
    /// Tier of the most recent attempt.
    pub current_tier: BackendTier,
    /// Trailing non-passing attempts at the current tier.
    pub consecutive_failures_at_tier: u32,
    /// Highest tier tried so far, `None` before the first attempt.
    pub highest_tier_tried: Option<BackendTier>,
    /// Distinct failure categories seen across all failed attempts.
    pub failure_categories: BTreeSet<String>,
    /// Question-set hashes already sent to the context gatherer.
    pub gathered_hashes: HashSet<u64>,
    /// Context-gathering cycles consumed so far.
    pub gather_count: u32,
    /// Whether the latest attempt is terminal success.
    pub latest_passed: bool,
    /// Open questions reported by the latest attempt.
    pub latest_open_questions: Vec<String>,
}

impl EscalationState {
    /// Derive state from an ordered attempt history.
    ///
    /// Gather events are replayed: an attempt that failed with a fresh
    /// question set (and budget remaining) triggered a gather before the
    /// next attempt, so its hash joins the gathered set. Only non-final
    /// attempts are replayed; whether the latest attempt triggers a gather
    /// is [`decide`]'s call.
    pub fn derive<'a, I>(history: I, config: &EscalationConfig) -> Self
    where
        I: IntoIterator<Item = &'a Attempt>,
    {
        let attempts: Vec<&Attempt> = history.into_iter().collect();

        let mut failure_categories = BTreeSet::new();
        let mut gathered_hashes = HashSet::new();
        let mut gather_count: u32 = 0;

        for (idx, attempt) in attempts.iter().enumerate() {
            let passed = attempt.passed(config.confidence_threshold);
            if !passed {
                let category = attempt.failure_category();
                if !category.is_empty() {
                    failure_categories.insert(category.to_string());
                }
                let is_final = idx + 1 == attempts.len();
                if !is_final && !attempt.open_questions.is_empty() {
                    let hash = attempt.question_set_hash();
                    if !gathered_hashes.contains(&hash)
                        && gather_count < config.context_gather_budget
                    {
                        gathered_hashes.insert(hash);
                        gather_count += 1;
                    }
                }
            }
        }

        let latest = attempts.last();
        let current_tier = latest.map_or(BackendTier::default(), |a| a.tier);
        let consecutive_failures_at_tier = attempts
            .iter()
            .rev()
            .take_while(|a| a.tier == current_tier && !a.passed(config.confidence_threshold))
            .count() as u32;

        Self {
            attempt_count: attempts.len() as u32,
            current_tier,
            consecutive_failures_at_tier,
            highest_tier_tried: attempts.iter().map(|a| a.tier).max(),
            failure_categories,
            gathered_hashes,
            gather_count,
            latest_passed: latest.is_some_and(|a| a.passed(config.confidence_threshold)),
            latest_open_questions: latest.map_or_else(Vec::new, |a| a.open_questions.clone()),
        }
    }
}

/// The escalation policy: pure decision function from state to action.
///
/// Returns `None` when the task is terminal-success (latest attempt passed
/// verification at or above the confidence threshold). Decision rules, in
/// order:
///
/// 1. Latest attempt passed -> no action, terminal success.
/// 2. Latest attempt has open questions never gathered before (and budget
///    remains) -> `GatherContext`.
/// 3. Consecutive failures at the current tier reached the cap: escalate if
///    a higher tier exists, otherwise `Abandon("exhausted")`.
/// 4. Below the cap -> `RetrySameTier`.
pub fn decide(state: &EscalationState, config: &EscalationConfig) -> Option<EscalationAction> {
    if state.attempt_count == 0 {
        // Nothing to judge yet; the first dispatch is a "retry" of nothing.
        return Some(EscalationAction::RetrySameTier);
    }

    if state.latest_passed {
        return None;
    }

    if !state.latest_open_questions.is_empty()
        && state.gather_count < config.context_gather_budget
        && !state
            .gathered_hashes
            .contains(&question_set_hash(&state.latest_open_questions))
    {
        return Some(EscalationAction::GatherContext(
            state.latest_open_questions.clone(),
        ));
    }

    if state.consecutive_failures_at_tier >= config.failure_cap {
        return Some(match state.current_tier.next() {
            Some(next) => EscalationAction::EscalateTier(next),
            None => EscalationAction::Abandon("exhausted".to_string()),
        });
    }

    Some(EscalationAction::RetrySameTier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Finding, Severity, Verification};
    use chrono::Utc;
    use uuid::Uuid;

    fn attempt(sequence: u64, tier: BackendTier, verification: Verification, confidence: u8) -> Attempt {
        Attempt {
            task_id: Uuid::nil(),
            sequence,
            tier,
            confidence,
            verification,
            findings: Vec::new(),
            open_questions: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    fn failed(sequence: u64, tier: BackendTier, confidence: u8) -> Attempt {
        attempt(sequence, tier, Verification::Fail, confidence)
    }

    #[test]
    fn test_rule_1_pass_at_threshold_is_terminal() {
        let config = EscalationConfig::default();
        let history = vec![attempt(1, BackendTier::FastSurgeon, Verification::Pass, 85)];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(decide(&state, &config), None);
    }

    #[test]
    fn test_pass_below_threshold_is_not_terminal() {
        let config = EscalationConfig::default();
        let history = vec![attempt(1, BackendTier::FastSurgeon, Verification::Pass, 60)];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::RetrySameTier)
        );
    }

    #[test]
    fn test_rule_2_fresh_questions_gather_context() {
        let config = EscalationConfig::default();
        let mut a = failed(1, BackendTier::FastSurgeon, 40);
        a.open_questions = vec!["which schema version?".to_string()];
        let state = EscalationState::derive(&[a], &config);

        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::GatherContext(vec![
                "which schema version?".to_string()
            ]))
        );
    }

    #[test]
    fn test_identical_question_set_never_gathered_twice() {
        let config = EscalationConfig::default();
        let questions = vec!["which schema version?".to_string()];

        let mut first = failed(1, BackendTier::FastSurgeon, 40);
        first.open_questions = questions.clone();
        let mut second = failed(2, BackendTier::FastSurgeon, 45);
        second.open_questions = questions;

        // First attempt already triggered a gather for this set; the second
        // attempt repeating it must fall through to the ladder instead.
        let state = EscalationState::derive(&[first, second], &config);
        assert_eq!(state.gather_count, 1);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::EscalateTier(
                BackendTier::WideContextAnalyst
            ))
        );
    }

    #[test]
    fn test_gather_budget_exhaustion_falls_through() {
        let config = EscalationConfig {
            context_gather_budget: 1,
            ..Default::default()
        };
        let mut first = failed(1, BackendTier::FastSurgeon, 40);
        first.open_questions = vec!["q1?".to_string()];
        let mut second = failed(2, BackendTier::FastSurgeon, 45);
        second.open_questions = vec!["q2?".to_string()];

        let state = EscalationState::derive(&[first, second], &config);
        assert_eq!(state.gather_count, 1);
        // Fresh question set, but no budget left: ladder rules apply.
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::EscalateTier(
                BackendTier::WideContextAnalyst
            ))
        );
    }

    #[test]
    fn test_rule_3_cap_escalates_forward() {
        let config = EscalationConfig::default();
        let history = vec![
            failed(1, BackendTier::FastSurgeon, 40),
            failed(2, BackendTier::FastSurgeon, 30),
        ];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(state.consecutive_failures_at_tier, 2);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::EscalateTier(
                BackendTier::WideContextAnalyst
            ))
        );
    }

    #[test]
    fn test_rule_4_below_cap_retries() {
        let config = EscalationConfig::default();
        let history = vec![failed(1, BackendTier::FastSurgeon, 40)];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::RetrySameTier)
        );
    }

    #[test]
    fn test_rule_5_highest_tier_exhausted_abandons() {
        let config = EscalationConfig::default();
        let history = vec![
            failed(1, BackendTier::DeepReasoner, 20),
            failed(2, BackendTier::DeepReasoner, 25),
        ];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::Abandon("exhausted".to_string()))
        );
    }

    #[test]
    fn test_consecutive_counter_resets_on_new_tier() {
        let config = EscalationConfig::default();
        let history = vec![
            failed(1, BackendTier::FastSurgeon, 40),
            failed(2, BackendTier::FastSurgeon, 30),
            failed(3, BackendTier::WideContextAnalyst, 50),
        ];
        let state = EscalationState::derive(&history, &config);
        assert_eq!(state.consecutive_failures_at_tier, 1);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::RetrySameTier)
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let config = EscalationConfig::default();
        let mut a = failed(1, BackendTier::FastSurgeon, 40);
        a.findings = vec![Finding::new(Severity::Blocker, "tests", "red")];
        let mut b = failed(2, BackendTier::FastSurgeon, 30);
        b.findings = vec![Finding::new(Severity::Major, "types", "mismatch")];
        let history = vec![a, b];

        let first = EscalationState::derive(&history, &config);
        let second = EscalationState::derive(&history, &config);
        assert_eq!(first, second);
        assert_eq!(
            first.failure_categories,
            ["tests", "types"].iter().map(ToString::to_string).collect()
        );
    }

    #[test]
    fn test_empty_history_dispatches() {
        let config = EscalationConfig::default();
        let state = EscalationState::derive(&[], &config);
        assert_eq!(
            decide(&state, &config),
            Some(EscalationAction::RetrySameTier)
        );
    }
}
