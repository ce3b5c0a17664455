//! Runtime settings.
//!
//! Every field has a default so a settings file only needs to name what it
//! overrides:
//!
//! ```toml
//! replicate_poll_interval_ms = 500
//! max_node_visits = 1000
//!
//! [endpoints]
//! openai = "http://localhost:8080/v1"
//! ```

use serde::{Deserialize, Serialize};

/// Settings shared by every run started from one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
  /// Delay between status polls for asynchronous image providers.
  pub replicate_poll_interval_ms: u64,
  /// Polls before an asynchronous image generation is reported as timed out.
  pub replicate_max_attempts: u32,
  /// Per-request timeout for outbound HTTP. `None` leaves requests unbounded.
  pub http_timeout_ms: Option<u64>,
  /// Loop iterations a script may run before it is aborted.
  pub script_loop_iteration_limit: u64,
  /// Call depth a script may reach before it is aborted.
  pub script_recursion_limit: usize,
  /// Upper bound on node visits per run. `None` means unbounded, so a cyclic
  /// graph never terminates.
  pub max_node_visits: Option<usize>,
  /// Hosts the HTTP node may call. `None` allows every host.
  pub allowed_hosts: Option<Vec<String>>,
  pub endpoints: ProviderEndpoints,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      replicate_poll_interval_ms: 2000,
      replicate_max_attempts: 120,
      http_timeout_ms: None,
      script_loop_iteration_limit: 1_000_000,
      script_recursion_limit: 512,
      max_node_visits: None,
      allowed_hosts: None,
      endpoints: ProviderEndpoints::default(),
    }
  }
}

/// Base URLs of the external model providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoints {
  pub openai: String,
  pub anthropic: String,
  pub gemini: String,
  pub xai: String,
  pub replicate: String,
}

impl Default for ProviderEndpoints {
  fn default() -> Self {
    Self {
      openai: "https://api.openai.com/v1".to_string(),
      anthropic: "https://api.anthropic.com/v1".to_string(),
      gemini: "https://generativelanguage.googleapis.com/v1beta".to_string(),
      xai: "https://api.x.ai/v1".to_string(),
      replicate: "https://api.replicate.com/v1".to_string(),
    }
  }
}

impl ProviderEndpoints {
  /// Point every provider at one base URL. Used by tests against a mock server.
  pub fn all(base: impl Into<String>) -> Self {
    let base = base.into();
    Self {
      openai: base.clone(),
      anthropic: base.clone(),
      gemini: base.clone(),
      xai: base.clone(),
      replicate: base,
    }
  }
}
