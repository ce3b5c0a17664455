use serde_json::{Value, json};
use weft_config::LlmConfig;
use weft_host_log::LogEntry;

use crate::context::RunContext;
use crate::error::NodeError;
use crate::prompt;
use crate::providers::llm::{self, ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmProvider};

pub(crate) async fn execute(
  node_id: &str,
  config: &LlmConfig,
  previous: &Value,
  ctx: &RunContext,
) -> Result<Value, NodeError> {
  ctx.log(LogEntry::info(
    node_id,
    format!("LLM call: {} - {}", config.provider, config.model),
  ));

  let provider = LlmProvider::parse(&config.provider)?;

  let prompt = prompt::compose(&config.prompt, previous, "\n\nPrevious output: ");
  let prompt = ctx.resolve(&prompt, &json!({ "input": previous }));
  if prompt.trim().is_empty() {
    return Err(NodeError::configuration("llm node has an empty prompt"));
  }

  let request = ChatRequest {
    model: &config.model,
    prompt: &prompt,
    temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
  };

  let completion = llm::complete(provider, &request, ctx)
    .await
    .map_err(|e| e.context("LLM call failed"))?;

  ctx.log(
    LogEntry::success(node_id, "LLM response received").with_data(json!({
      "content": completion.content,
      "usage": completion.usage,
    })),
  );

  Ok(Value::String(completion.content))
}
