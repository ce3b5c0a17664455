//! Weft Config
//!
//! This crate contains the serializable workflow configuration types for weft.
//! These types represent a workflow graph as supplied by the graph owner (an
//! editor, a JSON file, a database blob) before it is validated and executed.
//!
//! Node configuration is a sum type over the seven node kinds. Required fields
//! deserialize leniently (missing becomes empty) so that a half-configured
//! graph still loads; each kind's `validate` reports the missing field when the
//! node is reached at run time.

mod edge;
mod error;
mod node;
mod settings;
mod workflow;

pub use edge::{Branch, EdgeDef};
pub use error::ConfigError;
pub use node::{
  ConditionConfig, HttpConfig, ImageConfig, LlmConfig, NodeDef, NodeKind, ScriptConfig,
};
pub use settings::{ProviderEndpoints, RuntimeConfig};
pub use workflow::WorkflowDef;
