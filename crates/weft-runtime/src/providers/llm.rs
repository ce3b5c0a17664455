//! Chat-completion providers.

use serde_json::{Value, json};
use tracing::{debug, instrument};
use weft_host_config::Provider;
use weft_host_http::HttpRequest;

use crate::context::RunContext;
use crate::error::NodeError;
use crate::providers::call_json;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Language-model providers a node may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
  OpenAi,
  Anthropic,
  Gemini,
  Grok,
}

impl LlmProvider {
  pub fn parse(name: &str) -> Result<Self, NodeError> {
    match name.trim().to_lowercase().as_str() {
      "openai" => Ok(LlmProvider::OpenAi),
      "anthropic" => Ok(LlmProvider::Anthropic),
      "gemini" => Ok(LlmProvider::Gemini),
      "grok" => Ok(LlmProvider::Grok),
      _ => Err(NodeError::configuration(format!(
        "unsupported LLM provider: {}",
        name
      ))),
    }
  }

  /// The credential this provider authenticates with.
  pub fn credential(&self) -> Provider {
    match self {
      LlmProvider::OpenAi => Provider::OpenAi,
      LlmProvider::Anthropic => Provider::Anthropic,
      LlmProvider::Gemini => Provider::Gemini,
      LlmProvider::Grok => Provider::Grok,
    }
  }
}

/// One single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest<'a> {
  pub model: &'a str,
  pub prompt: &'a str,
  pub temperature: f64,
  pub max_tokens: u32,
}

/// Text reply plus the provider's usage record, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
  pub content: String,
  pub usage: Value,
}

/// Send `request` to `provider`.
#[instrument(name = "llm_complete", skip(request, ctx), fields(model = %request.model))]
pub async fn complete(
  provider: LlmProvider,
  request: &ChatRequest<'_>,
  ctx: &RunContext,
) -> Result<Completion, NodeError> {
  let key = ctx.secret(provider.credential())?;

  let completion = match provider {
    LlmProvider::OpenAi => openai(request, &key, ctx).await?,
    LlmProvider::Anthropic => anthropic(request, &key, ctx).await?,
    LlmProvider::Gemini => gemini(request, &key, ctx).await?,
    LlmProvider::Grok => grok(request, &key, ctx).await?,
  };

  debug!(chars = completion.content.len(), "llm_completion");
  Ok(completion)
}

/// Newer OpenAI models reject `max_tokens` in favour of
/// `max_completion_tokens`.
pub fn uses_completion_tokens(model: &str) -> bool {
  ["gpt-4o", "gpt-5", "o1", "o3"]
    .iter()
    .any(|family| model.contains(family))
}

fn user_message(prompt: &str) -> Value {
  json!([{ "role": "user", "content": prompt }])
}

fn text_at(body: &Value, pointer: &str) -> String {
  body
    .pointer(pointer)
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string()
}

async fn openai(request: &ChatRequest<'_>, key: &str, ctx: &RunContext) -> Result<Completion, NodeError> {
  let mut body = json!({
    "model": request.model,
    "messages": user_message(request.prompt),
    "temperature": request.temperature,
  });
  let token_field = if uses_completion_tokens(request.model) {
    "max_completion_tokens"
  } else {
    "max_tokens"
  };
  body[token_field] = json!(request.max_tokens);

  let url = format!("{}/chat/completions", ctx.config.endpoints.openai);
  let http = HttpRequest::post_json(url, body.to_string())
    .header("Authorization", format!("Bearer {}", key));

  let reply = call_json(ctx, http, |status| format!("OpenAI API error: {}", status)).await?;

  Ok(Completion {
    content: text_at(&reply, "/choices/0/message/content"),
    usage: reply.get("usage").cloned().unwrap_or(Value::Null),
  })
}

async fn anthropic(
  request: &ChatRequest<'_>,
  key: &str,
  ctx: &RunContext,
) -> Result<Completion, NodeError> {
  let body = json!({
    "model": request.model,
    "max_tokens": request.max_tokens,
    "temperature": request.temperature,
    "messages": user_message(request.prompt),
  });

  let url = format!("{}/messages", ctx.config.endpoints.anthropic);
  let http = HttpRequest::post_json(url, body.to_string())
    .header("x-api-key", key)
    .header("anthropic-version", ANTHROPIC_VERSION);

  let reply = call_json(ctx, http, |status| format!("Anthropic API error: {}", status)).await?;

  Ok(Completion {
    content: text_at(&reply, "/content/0/text"),
    usage: reply.get("usage").cloned().unwrap_or(Value::Null),
  })
}

async fn gemini(request: &ChatRequest<'_>, key: &str, ctx: &RunContext) -> Result<Completion, NodeError> {
  let body = json!({
    "contents": [{ "parts": [{ "text": request.prompt }] }],
    "generationConfig": {
      "temperature": request.temperature,
      "maxOutputTokens": request.max_tokens,
    },
  });

  let url = format!(
    "{}/models/{}:generateContent",
    ctx.config.endpoints.gemini, request.model
  );
  let http = HttpRequest::post_json(url, body.to_string()).header("x-goog-api-key", key);

  let reply = call_json(ctx, http, |status| format!("Gemini API error: {}", status)).await?;

  Ok(Completion {
    content: text_at(&reply, "/candidates/0/content/parts/0/text"),
    usage: reply.get("usageMetadata").cloned().unwrap_or(Value::Null),
  })
}

async fn grok(request: &ChatRequest<'_>, key: &str, ctx: &RunContext) -> Result<Completion, NodeError> {
  let body = json!({
    "model": request.model,
    "messages": user_message(request.prompt),
    "temperature": request.temperature,
    "max_completion_tokens": request.max_tokens,
  });

  let url = format!("{}/chat/completions", ctx.config.endpoints.xai);
  let http = HttpRequest::post_json(url, body.to_string())
    .header("Authorization", format!("Bearer {}", key));

  let reply = call_json(ctx, http, |status| format!("Grok API error: {}", status)).await?;

  Ok(Completion {
    content: text_at(&reply, "/choices/0/message/content"),
    usage: reply.get("usage").cloned().unwrap_or(Value::Null),
  })
}
