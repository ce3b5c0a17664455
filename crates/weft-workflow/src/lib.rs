//! Weft Workflow
//!
//! This crate provides the validated workflow representation for weft.
//!
//! Key differences from `weft-config`:
//! - Node ids are unique and every edge references existing nodes
//! - Nodes are indexed for O(1) lookup
//! - Outgoing edges are kept in edge-list order, which fixes traversal order
//! - The trigger node is identified

mod error;
mod graph;
mod workflow;

pub use error::WorkflowError;
pub use workflow::Workflow;
