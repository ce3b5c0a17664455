use thiserror::Error;

/// Errors raised by the sandbox.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
  #[error("condition expression is empty")]
  EmptyExpression,

  /// The expression failed to parse or raised at runtime.
  #[error("condition evaluation failed: {message}")]
  Expression { message: String },

  #[error("script code is empty")]
  EmptyScript,

  /// The script threw, failed to compile, or hit a runtime limit.
  #[error("script execution failed ({name}): {message}")]
  Script { name: String, message: String },

  /// The blocking worker running the interpreter did not complete.
  #[error("script worker failed: {message}")]
  Worker { message: String },
}

impl SandboxError {
  pub(crate) fn expression(message: impl Into<String>) -> Self {
    Self::Expression {
      message: message.into(),
    }
  }

  pub(crate) fn script(name: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Script {
      name: name.into(),
      message: message.into(),
    }
  }
}
