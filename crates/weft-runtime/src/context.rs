//! Explicit collaborators threaded through a run.

use std::sync::Arc;

use serde_json::Value;
use weft_config::RuntimeConfig;
use weft_host_config::{CredentialProvider, InMemoryCredentials, Provider};
use weft_host_http::HttpClient;
use weft_host_kv::{InMemoryVariableStore, VariableStore};
use weft_host_log::{InMemoryLogSink, LogEntry, LogSink};
use weft_resolver::{VariableResolver, has_variables};
use weft_sandbox::ScriptLimits;
use weft_state::ExecutionStateStore;

use crate::error::NodeError;

/// Everything a node executor may touch.
///
/// Cloning is cheap; every collaborator is shared.
#[derive(Clone)]
pub struct RunContext {
  pub variables: Arc<dyn VariableStore>,
  pub credentials: Arc<dyn CredentialProvider>,
  pub logs: Arc<dyn LogSink>,
  pub states: Arc<ExecutionStateStore>,
  pub http: Arc<dyn HttpClient>,
  pub config: RuntimeConfig,
}

impl RunContext {
  /// A context with empty variables, no credentials, an in-memory log and
  /// default settings.
  pub fn new(http: Arc<dyn HttpClient>) -> Self {
    Self {
      variables: Arc::new(InMemoryVariableStore::new()),
      credentials: Arc::new(InMemoryCredentials::new()),
      logs: Arc::new(InMemoryLogSink::new()),
      states: Arc::new(ExecutionStateStore::new()),
      http,
      config: RuntimeConfig::default(),
    }
  }

  pub fn with_variables(mut self, variables: Arc<dyn VariableStore>) -> Self {
    self.variables = variables;
    self
  }

  pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
    self.credentials = credentials;
    self
  }

  pub fn with_log_sink(mut self, logs: Arc<dyn LogSink>) -> Self {
    self.logs = logs;
    self
  }

  pub fn with_states(mut self, states: Arc<ExecutionStateStore>) -> Self {
    self.states = states;
    self
  }

  pub fn with_config(mut self, config: RuntimeConfig) -> Self {
    self.config = config;
    self
  }

  pub fn log(&self, entry: LogEntry) {
    self.logs.emit(entry);
  }

  /// Substitute `{{...}}` tokens in `text`. `context` is the call-scoped
  /// value consulted before the variable store.
  pub fn resolve(&self, text: &str, context: &Value) -> String {
    if !has_variables(text) {
      return text.to_string();
    }
    VariableResolver::new(self.variables.as_ref()).resolve(text, Some(context))
  }

  /// API key for `provider`. A missing or blank key is a configuration error.
  pub fn secret(&self, provider: Provider) -> Result<String, NodeError> {
    self.credentials.secret(provider).ok_or_else(|| {
      NodeError::configuration(format!(
        "{} API key is not configured",
        provider.display_name()
      ))
    })
  }

  pub fn script_limits(&self) -> ScriptLimits {
    ScriptLimits {
      loop_iteration_limit: self.config.script_loop_iteration_limit,
      recursion_limit: self.config.script_recursion_limit,
    }
  }
}
