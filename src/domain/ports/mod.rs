//! Ports (interfaces) the engine consumes, in the hexagonal sense.

pub mod backend;
pub mod evidence;
pub mod reviewer;
pub mod task_store;

pub use backend::Backend;
pub use evidence::EvidenceSearch;
pub use reviewer::{Reviewer, Reviser};
pub use task_store::TaskStore;
