use serde_json::{Value, json};
use weft_host_log::LogEntry;

use crate::context::RunContext;

pub(crate) fn trigger(node_id: &str, ctx: &RunContext) -> Value {
  ctx.log(LogEntry::success(node_id, "workflow started"));
  json!({ "message": "workflow started" })
}

/// Outgoing edges of a terminator are still followed by the run.
pub(crate) fn terminator(node_id: &str, ctx: &RunContext) -> Value {
  ctx.log(LogEntry::success(node_id, "workflow ended"));
  json!({ "message": "workflow ended" })
}
