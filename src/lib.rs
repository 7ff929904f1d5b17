//! Conclave - Tiered Task Orchestration Engine
//!
//! Conclave drives a backlog of tasks through a council of backends
//! arranged in capability tiers. Each task climbs the tier ladder only
//! when cheaper tiers have demonstrably failed, gathers evidence-grounded
//! context when an attempt surfaces open questions, and finishes with a
//! review loop that must observe consecutive clean rounds before a result
//! counts as converged.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, ports, and errors
//! - **Service Layer** (`services`): Escalation, routing, convergence, coordination
//! - **Adapters** (`adapters`): In-memory store and scripted capabilities
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use conclave::services::TaskCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Build a coordinator, submit tasks, and drain the backlog
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Attempt, AttemptOutcome, BackendTier, ConvergenceConfig, ConvergenceResult, EngineConfig,
    EscalationConfig, Finding, RuntimeConfig, Severity, Task, TaskPriority, TaskStatus,
    Verification,
};
pub use domain::ports::{Backend, EvidenceSearch, Reviewer, Reviser, TaskStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AttemptLedger, ContextGatherer, ConvergenceLoop, CouncilRouter, DependencyResolver,
    EscalationAction, EscalationState, RunSummary, TaskCoordinator, TierCouncil,
};
