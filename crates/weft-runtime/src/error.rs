//! Node execution errors.

use weft_config::ConfigError;
use weft_host_http::HttpError;
use weft_sandbox::SandboxError;

/// Why a node failed. The message is what the user sees in the log stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
  /// A required field or credential is missing, or a setting is invalid.
  /// Raised before any external call is made.
  #[error("{message}")]
  Configuration { message: String },

  /// An HTTP, language-model or image endpoint failed or answered non-2xx.
  #[error("{message}")]
  ExternalCall { message: String },

  /// A condition or script could not be parsed or threw.
  #[error("{message}")]
  Evaluation { message: String },

  /// Script execution requested in a language that does not run locally.
  #[error("unsupported language '{language}': only javascript runs locally")]
  UnsupportedCapability { language: String },
}

impl NodeError {
  pub fn configuration(message: impl Into<String>) -> Self {
    NodeError::Configuration {
      message: message.into(),
    }
  }

  pub fn external(message: impl Into<String>) -> Self {
    NodeError::ExternalCall {
      message: message.into(),
    }
  }

  /// Prefix the message, keeping the kind.
  pub fn context(self, prefix: &str) -> Self {
    match self {
      NodeError::Configuration { message } => NodeError::Configuration {
        message: format!("{}: {}", prefix, message),
      },
      NodeError::ExternalCall { message } => NodeError::ExternalCall {
        message: format!("{}: {}", prefix, message),
      },
      NodeError::Evaluation { message } => NodeError::Evaluation {
        message: format!("{}: {}", prefix, message),
      },
      unsupported @ NodeError::UnsupportedCapability { .. } => unsupported,
    }
  }
}

impl From<ConfigError> for NodeError {
  fn from(e: ConfigError) -> Self {
    NodeError::configuration(e.to_string())
  }
}

impl From<SandboxError> for NodeError {
  fn from(e: SandboxError) -> Self {
    NodeError::Evaluation {
      message: e.to_string(),
    }
  }
}

impl From<HttpError> for NodeError {
  fn from(e: HttpError) -> Self {
    match e {
      HttpError::HostNotAllowed { .. } | HttpError::InvalidUrl { .. } => {
        NodeError::configuration(e.to_string())
      }
      other => NodeError::external(other.to_string()),
    }
  }
}
