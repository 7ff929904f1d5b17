//! In-memory adapters.

mod task_store;

pub use task_store::InMemoryTaskStore;
