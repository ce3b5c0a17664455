use thiserror::Error;

/// A required configuration field is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("{kind} node is missing required field '{field}'")]
  MissingField { kind: &'static str, field: &'static str },
}

impl ConfigError {
  pub fn missing(kind: &'static str, field: &'static str) -> Self {
    Self::MissingField { kind, field }
  }
}
