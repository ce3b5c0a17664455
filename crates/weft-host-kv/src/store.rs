use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::lookup_path;

/// A named variable scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
  Global,
  Workflow,
}

impl Scope {
  pub fn as_str(&self) -> &'static str {
    match self {
      Scope::Global => "global",
      Scope::Workflow => "workflow",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown variable scope '{0}' (expected 'global' or 'workflow')")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
  type Err = UnknownScope;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "global" => Ok(Scope::Global),
      "workflow" => Ok(Scope::Workflow),
      other => Err(UnknownScope(other.to_string())),
    }
  }
}

/// Trait for two-scope variable storage.
///
/// The store is owned outside the engine; the resolver only reads from it.
pub trait VariableStore: Send + Sync {
  /// Get a value by key.
  fn get(&self, scope: Scope, key: &str) -> Option<Value>;

  /// Set a value.
  fn set(&self, scope: Scope, key: &str, value: Value);

  /// Delete a value.
  fn delete(&self, scope: Scope, key: &str);

  /// Remove every value in a scope.
  fn clear(&self, scope: Scope);

  /// Resolve a `scope.key[.nested...]` path.
  ///
  /// Returns `None` for an unknown scope, a missing key, or a nested path that
  /// does not exist inside the stored value.
  fn resolve_path(&self, path: &str) -> Option<Value> {
    let (scope, rest) = path.split_once('.')?;
    let scope = scope.parse::<Scope>().ok()?;
    let (key, nested) = match rest.split_once('.') {
      Some((key, nested)) => (key, nested),
      None => (rest, ""),
    };

    let value = self.get(scope, key)?;
    lookup_path(&value, nested).cloned()
  }
}

/// In-memory variable store.
#[derive(Debug, Default)]
pub struct InMemoryVariableStore {
  global: RwLock<HashMap<String, Value>>,
  workflow: RwLock<HashMap<String, Value>>,
}

impl InMemoryVariableStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn scope(&self, scope: Scope) -> &RwLock<HashMap<String, Value>> {
    match scope {
      Scope::Global => &self.global,
      Scope::Workflow => &self.workflow,
    }
  }

  /// Copy of every value in a scope.
  pub fn entries(&self, scope: Scope) -> HashMap<String, Value> {
    self
      .scope(scope)
      .read()
      .expect("variable store lock poisoned")
      .clone()
  }
}

impl VariableStore for InMemoryVariableStore {
  fn get(&self, scope: Scope, key: &str) -> Option<Value> {
    self
      .scope(scope)
      .read()
      .expect("variable store lock poisoned")
      .get(key)
      .cloned()
  }

  fn set(&self, scope: Scope, key: &str, value: Value) {
    self
      .scope(scope)
      .write()
      .expect("variable store lock poisoned")
      .insert(key.to_string(), value);
  }

  fn delete(&self, scope: Scope, key: &str) {
    self
      .scope(scope)
      .write()
      .expect("variable store lock poisoned")
      .remove(key);
  }

  fn clear(&self, scope: Scope) {
    self
      .scope(scope)
      .write()
      .expect("variable store lock poisoned")
      .clear();
  }
}
