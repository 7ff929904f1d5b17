//! Scripted mock capabilities for testing and the demo CLI.
//!
//! Each mock replays a queue of configured responses, then keeps returning
//! the last one. Shared-state wrappers let a script be installed after the
//! capability has been handed to the engine.

mod backend;
mod evidence;
mod reviewer;

pub use backend::{PerTaskScriptedBackend, ScriptedBackend, ScriptedOutcome};
pub use evidence::{Omniscient, StaticEvidence};
pub use reviewer::{RevisionCounter, ScriptedReviewer};
