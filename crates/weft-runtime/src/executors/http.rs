use serde_json::{Value, json};
use weft_config::HttpConfig;
use weft_host_http::{HttpMethod, HttpRequest};
use weft_host_log::LogEntry;

use crate::context::RunContext;
use crate::error::NodeError;
use crate::providers::extract_error_message;

pub(crate) async fn execute(
  node_id: &str,
  config: &HttpConfig,
  previous: &Value,
  ctx: &RunContext,
) -> Result<Value, NodeError> {
  ctx.log(LogEntry::info(
    node_id,
    format!("API call: {} {}", config.method, config.url),
  ));

  let method: HttpMethod = config
    .method
    .parse()
    .map_err(|_| NodeError::configuration(format!("unsupported HTTP method: {}", config.method)))?;

  let scope = json!({ "input": previous });
  let request = build_request(method, config, &scope, ctx);
  let response = ctx.http.send(request).await?;

  let body = serde_json::from_str::<Value>(&response.body)
    .unwrap_or_else(|_| Value::String(response.body.clone()));

  if !response.is_success() {
    let message = extract_error_message(&body)
      .unwrap_or_else(|| format!("HTTP error: {}", response.status));
    return Err(NodeError::external(message));
  }

  ctx.log(
    LogEntry::success(node_id, format!("API response: {}", response.status)).with_data(body.clone()),
  );

  Ok(body)
}

/// Resolve the url, every header value and the body. The body is resolved as
/// text and sent as JSON when the result parses as JSON.
fn build_request(method: HttpMethod, config: &HttpConfig, scope: &Value, ctx: &RunContext) -> HttpRequest {
  let mut request = HttpRequest::new(method, ctx.resolve(&config.url, scope));
  for (name, value) in &config.headers {
    request = request.header(name.as_str(), ctx.resolve(value, scope));
  }

  let Some(body) = config.body.as_ref().filter(|_| method.allows_body()) else {
    return request;
  };

  let raw = match body {
    Value::String(text) => text.clone(),
    other => other.to_string(),
  };
  let resolved = ctx.resolve(&raw, scope);

  if serde_json::from_str::<Value>(&resolved).is_ok() && request.header_value("content-type").is_none() {
    request = request.header("Content-Type", "application/json");
  }
  request.body(resolved)
}
