//! Clients for the external model providers.
//!
//! Every call goes through the context's [`HttpClient`](weft_host_http::HttpClient),
//! so the base URLs in [`ProviderEndpoints`](weft_config::ProviderEndpoints)
//! are the only thing tests need to redirect.

pub mod image;
pub mod llm;

use serde_json::Value;
use weft_host_http::HttpRequest;

use crate::context::RunContext;
use crate::error::NodeError;

/// The human-readable message in a provider's error body, if it has one.
///
/// Checks `error.message`, a bare string `error`, `message` and `detail`, in
/// that order.
pub fn extract_error_message(body: &Value) -> Option<String> {
  let candidates = [
    body.pointer("/error/message"),
    body.get("error"),
    body.get("message"),
    body.get("detail"),
  ];

  candidates
    .into_iter()
    .flatten()
    .find_map(Value::as_str)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Send `request` and parse the JSON reply.
///
/// A non-2xx status becomes an [`NodeError::ExternalCall`] carrying the body's
/// error message, or `fallback(status)` when the body has none.
pub(crate) async fn call_json(
  ctx: &RunContext,
  request: HttpRequest,
  fallback: impl FnOnce(u16) -> String,
) -> Result<Value, NodeError> {
  let response = ctx.http.send(request).await?;
  let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);

  if !response.is_success() {
    let message = extract_error_message(&body).unwrap_or_else(|| fallback(response.status));
    return Err(NodeError::external(message));
  }

  if body.is_null() && !response.body.trim().is_empty() {
    return Err(NodeError::external("provider returned a non-JSON response"));
  }

  Ok(body)
}

/// Borrow a string field, treating blank as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
  value.filter(|s| !s.trim().is_empty())
}
