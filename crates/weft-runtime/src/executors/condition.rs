use serde_json::{Map, Value, json};
use weft_config::ConditionConfig;
use weft_host_log::LogEntry;
use weft_sandbox::evaluate_expression;

use crate::context::RunContext;
use crate::error::NodeError;

/// Evaluate the expression against the previous output. A structured output
/// has its fields bound directly as well as under `input`.
pub(crate) fn execute(
  node_id: &str,
  config: &ConditionConfig,
  previous: &Value,
  ctx: &RunContext,
) -> Result<Value, NodeError> {
  ctx.log(LogEntry::info(
    node_id,
    format!("evaluating condition: {}", config.expression),
  ));

  let mut bindings = match previous {
    Value::Object(fields) => fields.clone(),
    _ => Map::new(),
  };
  bindings.insert("input".to_string(), previous.clone());

  let result = evaluate_expression(&config.expression, &bindings)?;

  ctx.log(
    LogEntry::success(
      node_id,
      format!(
        "condition evaluated: {}",
        if result { "True" } else { "False" }
      ),
    )
    .with_data(json!({ "condition": config.expression, "result": result })),
  );

  Ok(json!({ "result": result }))
}
