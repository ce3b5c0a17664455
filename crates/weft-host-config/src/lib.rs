//! Credential lookup for external providers.
//!
//! Executors never read credentials from the environment directly; they ask a
//! [`CredentialProvider`] for the secret belonging to a [`Provider`]. A missing
//! or empty secret is reported as `None`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// External services that require an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
  OpenAi,
  Anthropic,
  Gemini,
  Replicate,
  Grok,
}

impl Provider {
  pub const ALL: [Provider; 5] = [
    Provider::OpenAi,
    Provider::Anthropic,
    Provider::Gemini,
    Provider::Replicate,
    Provider::Grok,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Provider::OpenAi => "openai",
      Provider::Anthropic => "anthropic",
      Provider::Gemini => "gemini",
      Provider::Replicate => "replicate",
      Provider::Grok => "grok",
    }
  }

  /// Human readable name used in error messages.
  pub fn display_name(&self) -> &'static str {
    match self {
      Provider::OpenAi => "OpenAI",
      Provider::Anthropic => "Anthropic",
      Provider::Gemini => "Gemini",
      Provider::Replicate => "Replicate",
      Provider::Grok => "Grok",
    }
  }

  /// Environment variable read by [`EnvCredentialProvider`].
  pub fn env_var(&self) -> String {
    format!("WEFT_{}_API_KEY", self.as_str().to_uppercase())
  }
}

impl fmt::Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Provider {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Provider::ALL
      .into_iter()
      .find(|p| p.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown provider: {}", s))
  }
}

/// Source of provider API keys.
pub trait CredentialProvider: Send + Sync {
  /// Secret for a provider, or `None` if not configured.
  fn secret(&self, provider: Provider) -> Option<String>;
}

/// Fixed set of credentials held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
  secrets: HashMap<Provider, String>,
}

impl InMemoryCredentials {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, provider: Provider, secret: impl Into<String>) -> Self {
    self.insert(provider, secret);
    self
  }

  pub fn insert(&mut self, provider: Provider, secret: impl Into<String>) {
    self.secrets.insert(provider, secret.into());
  }
}

impl CredentialProvider for InMemoryCredentials {
  fn secret(&self, provider: Provider) -> Option<String> {
    self
      .secrets
      .get(&provider)
      .filter(|s| !s.trim().is_empty())
      .cloned()
  }
}

/// Reads `WEFT_<PROVIDER>_API_KEY` from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
  fn secret(&self, provider: Provider) -> Option<String> {
    std::env::var(provider.env_var())
      .ok()
      .filter(|s| !s.trim().is_empty())
  }
}
