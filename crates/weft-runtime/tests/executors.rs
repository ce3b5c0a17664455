mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use weft_config::{HttpConfig, ImageConfig, LlmConfig, NodeDef, NodeKind};
use weft_host_config::InMemoryCredentials;
use weft_host_http::HttpMethod;
use weft_runtime::{NodeError, executors};

use common::{Harness, MockHttpClient, node};

fn llm(provider: &str, model: &str) -> NodeDef {
  node(
    "ask",
    NodeKind::Llm(LlmConfig {
      provider: provider.to_string(),
      model: model.to_string(),
      prompt: "Hello".to_string(),
      ..LlmConfig::default()
    }),
  )
}

fn image(provider: &str) -> ImageConfig {
  ImageConfig {
    provider: provider.to_string(),
    prompt: "a red fox".to_string(),
    ..ImageConfig::default()
  }
}

fn header(harness: &Harness, index: usize, name: &str) -> Option<String> {
  harness.http.requests()[index]
    .header_value(name)
    .map(str::to_string)
}

#[tokio::test]
async fn test_openai_request_shape() {
  let http = MockHttpClient::new().route(
    "/chat/completions",
    200,
    json!({"choices": [{"message": {"content": "Hi!"}}], "usage": {"total_tokens": 3}}),
  );
  let harness = Harness::new(http);

  let output = executors::execute(&llm("openai", "gpt-4o"), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(output, json!("Hi!"));
  let body = harness.http.last_body();
  assert_eq!(body["model"], "gpt-4o");
  assert_eq!(body["temperature"], 0.7);
  assert_eq!(body["max_completion_tokens"], 1000);
  assert!(body.get("max_tokens").is_none());
  assert_eq!(body["messages"][0]["content"], "Hello");
  assert_eq!(
    header(&harness, 0, "authorization"),
    Some("Bearer sk-openai".to_string())
  );

  let success = harness.entries().pop().unwrap();
  assert_eq!(success.message, "LLM response received");
  assert_eq!(
    success.data,
    Some(json!({"content": "Hi!", "usage": {"total_tokens": 3}}))
  );
}

#[tokio::test]
async fn test_openai_legacy_model_uses_max_tokens() {
  let http = MockHttpClient::new().route(
    "/chat/completions",
    200,
    json!({"choices": [{"message": {"content": "ok"}}]}),
  );
  let harness = Harness::new(http);

  executors::execute(&llm("openai", "gpt-3.5-turbo"), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  let body = harness.http.last_body();
  assert_eq!(body["max_tokens"], 1000);
  assert!(body.get("max_completion_tokens").is_none());
}

#[tokio::test]
async fn test_anthropic_headers_and_content() {
  let http = MockHttpClient::new().route(
    "/messages",
    200,
    json!({"content": [{"type": "text", "text": "Bonjour"}], "usage": {"input_tokens": 2}}),
  );
  let harness = Harness::new(http);

  let output = executors::execute(&llm("anthropic", "claude-x"), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(output, json!("Bonjour"));
  assert_eq!(header(&harness, 0, "x-api-key"), Some("sk-anthropic".to_string()));
  assert_eq!(
    header(&harness, 0, "anthropic-version"),
    Some("2023-06-01".to_string())
  );
  assert_eq!(harness.http.last_body()["max_tokens"], 1000);
}

#[tokio::test]
async fn test_gemini_key_in_header() {
  let http = MockHttpClient::new().route(
    ":generateContent",
    200,
    json!({"candidates": [{"content": {"parts": [{"text": "Hola"}]}}]}),
  );
  let harness = Harness::new(http);

  let output = executors::execute(&llm("gemini", "gemini-pro"), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(output, json!("Hola"));
  let url = harness.http.requests()[0].url.clone();
  assert!(url.ends_with("/models/gemini-pro:generateContent"));
  assert_eq!(header(&harness, 0, "x-goog-api-key"), Some("gm-key".to_string()));
  assert_eq!(
    harness.http.last_body()["contents"][0]["parts"][0]["text"],
    "Hello"
  );
}

#[tokio::test]
async fn test_grok_uses_xai_chat_completions() {
  let http = MockHttpClient::new().route(
    "/chat/completions",
    200,
    json!({"choices": [{"message": {"content": "yo"}}]}),
  );
  let harness = Harness::new(http);

  executors::execute(&llm("grok", "grok-3"), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(harness.http.last_body()["max_completion_tokens"], 1000);
  assert_eq!(header(&harness, 0, "authorization"), Some("Bearer xai-key".to_string()));
}

#[tokio::test]
async fn test_provider_error_message_is_surfaced() {
  let http = MockHttpClient::new().route(
    "/chat/completions",
    401,
    json!({"error": {"message": "Incorrect API key provided"}}),
  );
  let harness = Harness::new(http);

  let err = executors::execute(&llm("openai", "gpt-4o"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();

  assert_eq!(
    err,
    NodeError::ExternalCall {
      message: "LLM call failed: Incorrect API key provided".to_string()
    }
  );
}

#[tokio::test]
async fn test_provider_error_without_body_uses_status() {
  let http = MockHttpClient::new().route_text("/messages", 503, "upstream down");
  let harness = Harness::new(http);

  let err = executors::execute(&llm("anthropic", "claude-x"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();

  assert_eq!(err.to_string(), "LLM call failed: Anthropic API error: 503");
}

#[tokio::test]
async fn test_missing_key_is_configuration_error() {
  let mut harness = Harness::new(MockHttpClient::new());
  harness.ctx = harness
    .ctx
    .clone()
    .with_credentials(Arc::new(InMemoryCredentials::new()));

  let err = executors::execute(&llm("openai", "gpt-4o"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();

  assert!(matches!(err, NodeError::Configuration { .. }));
  assert!(err.to_string().contains("OpenAI API key is not configured"));
  assert!(harness.http.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_llm_provider() {
  let harness = Harness::new(MockHttpClient::new());
  let err = executors::execute(&llm("mistral", "large"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();
  assert!(matches!(err, NodeError::Configuration { .. }));
  assert!(err.to_string().contains("unsupported LLM provider"));
}

#[tokio::test]
async fn test_http_node_resolves_and_sends_json() {
  let http = MockHttpClient::new().route("/orders", 201, json!({"id": 7}));
  let harness = Harness::new(http);

  let mut headers = BTreeMap::new();
  headers.insert("X-Order".to_string(), "{{input.order}}".to_string());
  let node = node(
    "call",
    NodeKind::Http(HttpConfig {
      url: "http://mock.test/orders/{{input.order}}".to_string(),
      method: "post".to_string(),
      headers,
      body: Some(json!({"order": "{{input.order}}", "qty": 2})),
    }),
  );

  let output = executors::execute(&node, &json!({"order": "A1"}), &harness.ctx)
    .await
    .unwrap();

  assert_eq!(output, json!({"id": 7}));
  let request = harness.http.requests()[0].clone();
  assert_eq!(request.method, HttpMethod::Post);
  assert_eq!(request.url, "http://mock.test/orders/A1");
  assert_eq!(request.header_value("x-order"), Some("A1"));
  assert_eq!(request.header_value("content-type"), Some("application/json"));
  assert_eq!(harness.http.last_body(), json!({"order": "A1", "qty": 2}));
  assert!(
    harness
      .messages("call")
      .contains(&"API response: 201".to_string())
  );
}

#[tokio::test]
async fn test_http_get_sends_no_body_and_keeps_text() {
  let http = MockHttpClient::new().route_text("/ping", 200, "pong");
  let harness = Harness::new(http);

  let node = node(
    "ping",
    NodeKind::Http(HttpConfig {
      url: "http://mock.test/ping".to_string(),
      method: "GET".to_string(),
      body: Some(json!({"ignored": true})),
      ..HttpConfig::default()
    }),
  );

  let output = executors::execute(&node, &Value::Null, &harness.ctx).await.unwrap();

  assert_eq!(output, json!("pong"));
  assert_eq!(harness.http.requests()[0].body, None);
}

#[tokio::test]
async fn test_http_error_status() {
  let http = MockHttpClient::new()
    .route("/missing", 404, json!({"detail": "no such order"}))
    .route_text("/broken", 500, "oops");
  let harness = Harness::new(http);

  let call = |url: &str| {
    node(
      "call",
      NodeKind::Http(HttpConfig {
        url: url.to_string(),
        method: "GET".to_string(),
        ..HttpConfig::default()
      }),
    )
  };

  let err = executors::execute(&call("http://mock.test/missing"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "no such order");

  let err = executors::execute(&call("http://mock.test/broken"), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "HTTP error: 500");
}

#[tokio::test]
async fn test_condition_spreads_structured_input() {
  let harness = Harness::new(MockHttpClient::new());
  let node = node(
    "check",
    NodeKind::Condition(weft_config::ConditionConfig {
      expression: "score >= 60 && input.passed".to_string(),
    }),
  );

  let output = executors::execute(&node, &json!({"score": 70, "passed": true}), &harness.ctx)
    .await
    .unwrap();
  assert_eq!(output, json!({"result": true}));

  let output = executors::execute(&node, &json!(5), &harness.ctx).await;
  assert!(matches!(output, Err(NodeError::Evaluation { .. })));
}

#[tokio::test]
async fn test_dalle_b64_and_revised_prompt() {
  let http = MockHttpClient::new().route(
    "/images/generations",
    200,
    json!({"data": [{"b64_json": "AAAA", "revised_prompt": "a red fox, watercolor"}]}),
  );
  let harness = Harness::new(http);

  let output = executors::execute(&node("img", NodeKind::Image(image("dalle"))), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(
    output,
    json!({
      "images": ["data:image/png;base64,AAAA"],
      "revisedPrompt": "a red fox, watercolor"
    })
  );
  assert_eq!(harness.http.last_body()["model"], "gpt-image-1.5");
  assert!(
    harness
      .messages("img")
      .contains(&"1 images generated".to_string())
  );
}

#[tokio::test]
async fn test_dalle_empty_data_is_error() {
  let http = MockHttpClient::new().route("/images/generations", 200, json!({"data": []}));
  let harness = Harness::new(http);

  let err = executors::execute(&node("img", NodeKind::Image(image("dalle"))), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();
  assert!(matches!(err, NodeError::ExternalCall { .. }));
}

#[tokio::test]
async fn test_grok_image_prompt_limit() {
  let harness = Harness::new(MockHttpClient::new());
  let config = ImageConfig {
    prompt: "x".repeat(1025),
    ..image("grok")
  };

  let err = executors::execute(&node("img", NodeKind::Image(config)), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();

  assert!(matches!(err, NodeError::Configuration { .. }));
  assert!(harness.http.requests().is_empty());
}

#[tokio::test]
async fn test_grok_image_batch_endpoint() {
  let http = MockHttpClient::new().route(
    "/images/generations/batch",
    200,
    json!({"images": ["https://img/1", "https://img/2"]}),
  );
  let harness = Harness::new(http);
  let config = ImageConfig {
    n: Some(2),
    ..image("grok")
  };

  let output = executors::execute(&node("img", NodeKind::Image(config)), &Value::Null, &harness.ctx)
    .await
    .unwrap();

  assert_eq!(output, json!({"images": ["https://img/1", "https://img/2"]}));
  assert!(harness.http.requests()[0].url.ends_with("/images/generations/batch"));
  assert_eq!(harness.http.last_body()["model"], "grok-2-image-1212");
}

#[tokio::test]
async fn test_replicate_polls_until_succeeded() {
  let http = MockHttpClient::new()
    .route("/predictions/p1", 200, json!({"id": "p1", "status": "processing"}))
    .route(
      "/predictions/p1",
      200,
      json!({"id": "p1", "status": "succeeded", "output": ["https://img/fox.png"]}),
    )
    .route("/predictions", 201, json!({"id": "p1", "status": "starting"}));
  let harness = Harness::new(http);

  let output = executors::execute(
    &node("img", NodeKind::Image(image("stable-diffusion"))),
    &Value::Null,
    &harness.ctx,
  )
  .await
  .unwrap();

  assert_eq!(output, json!({"images": ["https://img/fox.png"]}));
  let requests = harness.http.requests();
  assert_eq!(requests.len(), 3);
  assert_eq!(requests[0].header_value("authorization"), Some("Token r8-key"));
  assert_eq!(requests[1].method, HttpMethod::Get);

  let created: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
  assert_eq!(
    created["version"],
    "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf"
  );
  assert_eq!(created["input"]["width"], 1024);
}

#[tokio::test]
async fn test_replicate_times_out() {
  let http = MockHttpClient::new()
    .route("/predictions/p2", 200, json!({"id": "p2", "status": "processing"}))
    .route("/predictions", 201, json!({"id": "p2"}));
  let harness = Harness::new(http);

  let err = executors::execute(&node("img", NodeKind::Image(image("flux"))), &Value::Null, &harness.ctx)
    .await
    .unwrap_err();

  assert!(err.to_string().contains("timed out (status: processing)"));
  // One create plus the configured number of polls.
  assert_eq!(harness.http.requests().len(), 4);
}

#[tokio::test]
async fn test_replicate_failed_prediction() {
  let http = MockHttpClient::new()
    .route(
      "/predictions/p3",
      200,
      json!({"id": "p3", "status": "failed", "error": "NSFW content detected"}),
    )
    .route("/predictions", 201, json!({"id": "p3"}));
  let harness = Harness::new(http);

  let err = executors::execute(
    &node("img", NodeKind::Image(image("stable-diffusion-xl"))),
    &Value::Null,
    &harness.ctx,
  )
  .await
  .unwrap_err();

  assert!(matches!(err, NodeError::ExternalCall { .. }));
  assert!(err.to_string().contains("NSFW content detected"));
}
