//! Service layer: the orchestration logic.

pub mod context_gatherer;
pub mod convergence;
pub mod coordinator;
pub mod council_router;
pub mod dependency_resolver;
pub mod escalation;
pub mod ledger;

pub use context_gatherer::{ContextGatherer, Resolution};
pub use convergence::ConvergenceLoop;
pub use coordinator::{RunSummary, TaskCoordinator, TaskStatusReport};
pub use council_router::{CouncilRouter, TaskDisposition, TierCouncil};
pub use dependency_resolver::DependencyResolver;
pub use escalation::{decide, EscalationAction, EscalationState};
pub use ledger::AttemptLedger;
