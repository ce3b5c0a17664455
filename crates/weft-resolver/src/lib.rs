//! Template variable substitution.
//!
//! Config strings may contain `{{path}}` tokens. The [`VariableResolver`]
//! replaces each token with a value from the call context (the previous node's
//! output, bound as `input`) or from the variable store (`global.*`,
//! `workflow.*`). Tokens that resolve to nothing are left verbatim.

mod resolver;
mod text;

pub use resolver::{VariableResolver, has_variables};
pub use text::stringify;
