//! Per-node execution state.
//!
//! Each node moves `idle -> running -> (success | error)` during a run. The
//! engine writes transitions; anything else (a UI, the CLI) reads them through
//! [`ExecutionStateStore::get`] or a [`ExecutionStateStore::snapshot`].

mod state;
mod store;

pub use state::{NodeExecutionState, NodeStatus};
pub use store::ExecutionStateStore;
