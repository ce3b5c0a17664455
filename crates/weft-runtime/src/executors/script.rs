use serde_json::{Value, json};
use tracing::warn;
use weft_config::ScriptConfig;
use weft_host_log::LogEntry;
use weft_sandbox::execute_script;

use crate::context::RunContext;
use crate::error::NodeError;

const LOCAL_LANGUAGE: &str = "javascript";
const CODE_PREVIEW_CHARS: usize = 200;

pub(crate) async fn execute(
  node_id: &str,
  config: &ScriptConfig,
  previous: &Value,
  ctx: &RunContext,
) -> Result<Value, NodeError> {
  ctx.log(LogEntry::info(
    node_id,
    format!("function execution: {}", config.language),
  ));

  if !config.language.trim().eq_ignore_ascii_case(LOCAL_LANGUAGE) {
    return Err(NodeError::UnsupportedCapability {
      language: config.language.clone(),
    });
  }

  match execute_script(&config.code, previous, ctx.script_limits()).await {
    Ok(output) => {
      for line in output.logs {
        ctx.log(LogEntry::info(node_id, line));
      }
      ctx.log(
        LogEntry::success(node_id, "function executed").with_data(json!({ "result": output.value })),
      );
      Ok(output.value)
    }
    Err(e) => {
      warn!(node_id, error = %e, "script_failed");
      let preview: String = config.code.chars().take(CODE_PREVIEW_CHARS).collect();
      ctx.log(
        LogEntry::error(node_id, "function execution failed").with_data(json!({
          "error": e.to_string(),
          "code": preview,
          "language": config.language,
        })),
      );
      Err(e.into())
    }
  }
}
