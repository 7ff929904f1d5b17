//! Domain models for the Conclave orchestration engine.

pub mod attempt;
pub mod config;
pub mod dispatch;
pub mod review;
pub mod task;
pub mod tier;

pub use attempt::{question_set_hash, Attempt, Finding, Severity, Verification};
pub use config::{ConvergenceConfig, EngineConfig, EscalationConfig, RuntimeConfig};
pub use dispatch::{AccumulatedContext, Answer, Artifact, AttemptOutcome, TaskPayload};
pub use review::{
    ConvergenceReport, ConvergenceResult, ConvergenceSession, ReviewRound, ReviewVerdict,
};
pub use task::{Task, TaskPriority, TaskStatus};
pub use tier::BackendTier;
