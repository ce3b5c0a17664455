//! One executor per node kind.
//!
//! Each executor takes the node's configuration and the previous node's
//! output and either produces this node's output or fails with a
//! [`NodeError`]. Executors write their own progress entries to the log sink;
//! recording state and the final error entry is the run's job.

mod condition;
mod http;
mod image;
mod llm;
mod markers;
mod script;

use serde_json::Value;
use tracing::instrument;
use weft_config::{NodeDef, NodeKind};

use crate::context::RunContext;
use crate::error::NodeError;

/// Validate `node`'s required fields, then run its executor.
#[instrument(
  name = "node_invoke",
  skip(node, previous, ctx),
  fields(node_id = %node.id, kind = node.kind.name())
)]
pub async fn execute(node: &NodeDef, previous: &Value, ctx: &RunContext) -> Result<Value, NodeError> {
  node.kind.validate()?;

  let id = node.id.as_str();
  match &node.kind {
    NodeKind::Trigger => Ok(markers::trigger(id, ctx)),
    NodeKind::Terminator => Ok(markers::terminator(id, ctx)),
    NodeKind::Llm(config) => llm::execute(id, config, previous, ctx).await,
    NodeKind::Http(config) => http::execute(id, config, previous, ctx).await,
    NodeKind::Script(config) => script::execute(id, config, previous, ctx).await,
    NodeKind::Condition(config) => condition::execute(id, config, previous, ctx),
    NodeKind::Image(config) => image::execute(id, config, previous, ctx).await,
  }
}
