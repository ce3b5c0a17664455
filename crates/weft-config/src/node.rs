use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// Display label shown in logs; falls back to the id.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(flatten)]
  pub kind: NodeKind,
}

impl NodeDef {
  pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      id: id.into(),
      label: None,
      kind,
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  /// The label if one is set, otherwise the node id.
  pub fn display_name(&self) -> &str {
    self.label.as_deref().unwrap_or(&self.id)
  }
}

/// Kind-specific node configuration.
///
/// Serialized adjacently: `{"kind": "llm", "config": {...}}`. The kind names
/// used by the original graph editor (`start`, `api`, `function`, `end`) are
/// accepted as aliases. Trigger and terminator take no settings, so any
/// `config` stored with them is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum NodeKind {
  #[serde(alias = "start", deserialize_with = "ignore_config")]
  Trigger,
  Llm(LlmConfig),
  #[serde(alias = "api")]
  Http(HttpConfig),
  #[serde(alias = "function")]
  Script(ScriptConfig),
  Condition(ConditionConfig),
  Image(ImageConfig),
  #[serde(alias = "end", deserialize_with = "ignore_config")]
  Terminator,
}

impl NodeKind {
  pub fn name(&self) -> &'static str {
    match self {
      NodeKind::Trigger => "trigger",
      NodeKind::Llm(_) => "llm",
      NodeKind::Http(_) => "http",
      NodeKind::Script(_) => "script",
      NodeKind::Condition(_) => "condition",
      NodeKind::Image(_) => "image",
      NodeKind::Terminator => "terminator",
    }
  }

  pub fn is_trigger(&self) -> bool {
    matches!(self, NodeKind::Trigger)
  }

  /// Check the kind's required fields.
  pub fn validate(&self) -> Result<(), ConfigError> {
    match self {
      NodeKind::Trigger | NodeKind::Terminator => Ok(()),
      NodeKind::Llm(config) => config.validate(),
      NodeKind::Http(config) => config.validate(),
      NodeKind::Script(config) => config.validate(),
      NodeKind::Condition(config) => config.validate(),
      NodeKind::Image(config) => config.validate(),
    }
  }
}

fn ignore_config<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(), D::Error> {
  IgnoredAny::deserialize(deserializer).map(|_| ())
}

fn require(kind: &'static str, field: &'static str, value: &str) -> Result<(), ConfigError> {
  if value.trim().is_empty() {
    Err(ConfigError::missing(kind, field))
  } else {
    Ok(())
  }
}

/// Language-model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
  #[serde(default)]
  pub provider: String,
  #[serde(default)]
  pub model: String,
  #[serde(default)]
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

impl LlmConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    require("llm", "provider", &self.provider)?;
    require("llm", "model", &self.model)
  }
}

/// HTTP call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
  #[serde(default)]
  pub url: String,
  #[serde(default = "default_method")]
  pub method: String,
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<serde_json::Value>,
}

fn default_method() -> String {
  "GET".to_string()
}

impl HttpConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    require("http", "url", &self.url)
  }
}

/// User script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub language: String,
}

impl ScriptConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    require("script", "code", &self.code)?;
    require("script", "language", &self.language)
  }
}

/// Boolean branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
  #[serde(default, alias = "condition")]
  pub expression: String,
}

impl ConditionConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    require("condition", "expression", &self.expression)
  }
}

/// Image generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
  #[serde(default)]
  pub provider: String,
  #[serde(default)]
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  /// `WIDTHxHEIGHT`, e.g. `1024x1024`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quality: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub background: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub n: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub num_outputs: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guidance_scale: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub num_inference_steps: Option<u32>,
}

impl ImageConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    require("image", "provider", &self.provider)?;
    require("image", "prompt", &self.prompt)
  }
}
