//! Code sandbox for weft.
//!
//! Two entry points:
//!
//! - [`evaluate_expression`] parses a condition into an AST and evaluates it
//!   with JavaScript-like semantics over a restricted grammar: literals,
//!   identifiers bound from the context, property and index access,
//!   arithmetic, comparison, logical operators, the ternary, and a handful of
//!   string and array methods. No code is constructed at runtime.
//! - [`execute_script`] runs a JavaScript function body in an embedded
//!   interpreter (boa) with `input` and a capturing `console` in scope. The
//!   interpreter has no file, network, or process access, but the standard
//!   ECMAScript globals remain reachable; this limits capabilities, it is not a
//!   security boundary.

mod error;
pub mod expression;
mod script;

pub use error::SandboxError;
pub use expression::{Expression, evaluate_expression};
pub use script::{ScriptLimits, ScriptOutput, execute_script, execute_script_blocking};
