//! Safe-subset condition expressions.

mod ast;
mod eval;
mod lexer;
mod parser;
mod value;

use serde_json::{Map, Value};

pub use value::Val;

use crate::error::SandboxError;
use ast::Expr;
use eval::Evaluator;
use lexer::tokenize;
use parser::Parser;

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
  root: Expr,
}

impl Expression {
  pub fn parse(source: &str) -> Result<Self, SandboxError> {
    let source = source.trim();
    if source.is_empty() {
      return Err(SandboxError::EmptyExpression);
    }

    let root = tokenize(source)
      .and_then(|tokens| Parser::new(tokens).parse())
      .map_err(|message| SandboxError::expression(format!("SyntaxError: {}", message)))?;

    Ok(Self { root })
  }

  /// Evaluate with the given bindings in scope.
  pub fn evaluate(&self, bindings: &Map<String, Value>) -> Result<Val, SandboxError> {
    Evaluator::new(bindings)
      .eval(&self.root)
      .map_err(SandboxError::expression)
  }
}

/// Parse `expression`, evaluate it with `context`'s keys bound as variables,
/// and coerce the result to a boolean.
pub fn evaluate_expression(
  expression: &str,
  context: &Map<String, Value>,
) -> Result<bool, SandboxError> {
  let parsed = Expression::parse(expression)?;
  Ok(parsed.evaluate(context)?.is_truthy())
}
