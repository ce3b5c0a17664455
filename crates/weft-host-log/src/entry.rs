use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node id used for entries that are not about any particular node.
pub const SYSTEM_NODE_ID: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
  Info,
  Warning,
  Error,
  Success,
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      LogLevel::Info => "info",
      LogLevel::Warning => "warning",
      LogLevel::Error => "error",
      LogLevel::Success => "success",
    })
  }
}

/// One entry in a run's log stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
  pub id: String,
  pub node_id: String,
  pub timestamp: DateTime<Utc>,
  pub level: LogLevel,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

impl LogEntry {
  pub fn new(node_id: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      node_id: node_id.into(),
      timestamp: Utc::now(),
      level,
      message: message.into(),
      data: None,
    }
  }

  pub fn info(node_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(node_id, LogLevel::Info, message)
  }

  pub fn warning(node_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(node_id, LogLevel::Warning, message)
  }

  pub fn error(node_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(node_id, LogLevel::Error, message)
  }

  pub fn success(node_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(node_id, LogLevel::Success, message)
  }

  /// Attach structured data.
  pub fn with_data(mut self, data: Value) -> Self {
    self.data = Some(data);
    self
  }

  pub fn is_system(&self) -> bool {
    self.node_id == SYSTEM_NODE_ID
  }
}
