#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use weft_config::{EdgeDef, NodeDef, NodeKind, ProviderEndpoints, RuntimeConfig};
use weft_host_config::{InMemoryCredentials, Provider};
use weft_host_http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use weft_host_kv::InMemoryVariableStore;
use weft_host_log::{InMemoryLogSink, LogEntry};
use weft_runtime::RunContext;
use weft_state::ExecutionStateStore;

pub const BASE: &str = "http://mock.test";

type Hook = Box<dyn Fn(&HttpRequest) + Send + Sync>;

/// Scripted transport. Responses are matched by URL substring in the order
/// the routes were added; the last response of a route repeats.
#[derive(Default)]
pub struct MockHttpClient {
  routes: Mutex<Vec<(String, VecDeque<HttpResponse>)>>,
  requests: Mutex<Vec<HttpRequest>>,
  on_send: Option<Hook>,
}

impl MockHttpClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn route(self, pattern: &str, status: u16, body: Value) -> Self {
    self.push(pattern, HttpResponse::new(status, body.to_string()));
    self
  }

  pub fn route_text(self, pattern: &str, status: u16, body: &str) -> Self {
    self.push(pattern, HttpResponse::new(status, body));
    self
  }

  pub fn on_send(mut self, hook: impl Fn(&HttpRequest) + Send + Sync + 'static) -> Self {
    self.on_send = Some(Box::new(hook));
    self
  }

  fn push(&self, pattern: &str, response: HttpResponse) {
    let mut routes = self.routes.lock().unwrap();
    match routes.iter_mut().find(|(p, _)| p == pattern) {
      Some((_, queue)) => queue.push_back(response),
      None => routes.push((pattern.to_string(), VecDeque::from([response]))),
    }
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn last_body(&self) -> Value {
    let requests = self.requests();
    let body = requests
      .last()
      .and_then(|r| r.body.clone())
      .expect("no request body recorded");
    serde_json::from_str(&body).unwrap()
  }
}

#[async_trait]
impl HttpClient for MockHttpClient {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
    if let Some(hook) = &self.on_send {
      hook(&request);
    }
    self.requests.lock().unwrap().push(request.clone());

    let mut routes = self.routes.lock().unwrap();
    let route = routes
      .iter_mut()
      .find(|(pattern, _)| request.url.contains(pattern.as_str()));

    match route {
      Some((_, queue)) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
      Some((_, queue)) => Ok(queue.front().cloned().unwrap()),
      None => Ok(HttpResponse::new(404, r#"{"error":{"message":"no route"}}"#)),
    }
  }
}

/// Context plus handles on the collaborators tests inspect.
pub struct Harness {
  pub ctx: RunContext,
  pub http: Arc<MockHttpClient>,
  pub logs: Arc<InMemoryLogSink>,
  pub states: Arc<ExecutionStateStore>,
  pub variables: Arc<InMemoryVariableStore>,
}

impl Harness {
  pub fn new(http: MockHttpClient) -> Self {
    let http = Arc::new(http);
    let logs = Arc::new(InMemoryLogSink::new());
    let states = Arc::new(ExecutionStateStore::new());
    let variables = Arc::new(InMemoryVariableStore::new());
    let credentials = InMemoryCredentials::new()
      .with(Provider::OpenAi, "sk-openai")
      .with(Provider::Anthropic, "sk-anthropic")
      .with(Provider::Gemini, "gm-key")
      .with(Provider::Grok, "xai-key")
      .with(Provider::Replicate, "r8-key");

    let config = RuntimeConfig {
      replicate_poll_interval_ms: 1,
      replicate_max_attempts: 3,
      endpoints: ProviderEndpoints::all(BASE),
      ..RuntimeConfig::default()
    };

    let ctx = RunContext::new(http.clone())
      .with_log_sink(logs.clone())
      .with_states(states.clone())
      .with_variables(variables.clone())
      .with_credentials(Arc::new(credentials))
      .with_config(config);

    Self {
      ctx,
      http,
      logs,
      states,
      variables,
    }
  }

  pub fn messages(&self, node_id: &str) -> Vec<String> {
    self
      .logs
      .entries()
      .into_iter()
      .filter(|e| e.node_id == node_id)
      .map(|e| e.message)
      .collect()
  }

  pub fn entries(&self) -> Vec<LogEntry> {
    self.logs.entries()
  }
}

pub fn node(id: &str, kind: NodeKind) -> NodeDef {
  NodeDef::new(id, kind)
}

pub fn edge(source: &str, target: &str) -> EdgeDef {
  EdgeDef::new(format!("{}-{}", source, target), source, target)
}

pub fn branch(source: &str, target: &str, label: &str) -> EdgeDef {
  edge(source, target).with_branch(label)
}
