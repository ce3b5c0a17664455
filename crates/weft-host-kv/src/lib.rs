//! Variable storage for weft.
//!
//! Variables live in two named scopes, `global` and `workflow`, and are
//! addressed from templates as `global.<key>` / `workflow.<key>`. Stored values
//! are structured JSON, so a path may continue into the stored value:
//! `global.user.name`.

mod path;
mod store;

pub use path::lookup_path;
pub use store::{InMemoryVariableStore, Scope, UnknownScope, VariableStore};
