use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use weft_host_kv::{VariableStore, lookup_path};

use crate::text::stringify;

static TOKEN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("template token pattern is valid"));

/// Whether `text` contains at least one `{{...}}` token.
pub fn has_variables(text: &str) -> bool {
  TOKEN.is_match(text)
}

/// Substitutes `{{path}}` tokens.
///
/// Lookup order for a token path:
/// 1. the call context; `input.<path>` walks into the context's `input`
///    field, any other path walks the context directly
/// 2. the variable store (`global.<key>[.nested]`, `workflow.<key>[.nested]`)
///
/// The store is only read.
#[derive(Clone, Copy)]
pub struct VariableResolver<'a> {
  store: &'a dyn VariableStore,
}

impl<'a> VariableResolver<'a> {
  pub fn new(store: &'a dyn VariableStore) -> Self {
    Self { store }
  }

  /// Replace every resolvable token in `text`.
  pub fn resolve(&self, text: &str, context: Option<&Value>) -> String {
    if !has_variables(text) {
      return text.to_string();
    }

    TOKEN
      .replace_all(text, |caps: &Captures| {
        let path = caps[1].trim();
        match self.lookup(path, context) {
          Some(value) => stringify(&value),
          None => caps[0].to_string(),
        }
      })
      .into_owned()
  }

  fn lookup(&self, path: &str, context: Option<&Value>) -> Option<Value> {
    if let Some(context) = context {
      let found = match path.strip_prefix("input.") {
        Some(nested) => context.get("input").and_then(|input| lookup_path(input, nested)),
        None => lookup_path(context, path),
      };
      if let Some(value) = found {
        return Some(value.clone());
      }
    }

    self.store.resolve_path(path)
  }
}
