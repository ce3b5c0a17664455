//! Command-line settings: the runtime config file and `--var` assignments.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use weft_config::RuntimeConfig;
use weft_host_kv::Scope;

pub const CONFIG_FILE: &str = "config.toml";
pub const HISTORY_FILE: &str = "history.json";

/// Load runtime settings.
///
/// An explicit `--config` path must exist. Otherwise `config.toml` in the
/// data directory is used when present, and defaults when it is not.
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<RuntimeConfig> {
  let path: PathBuf = match explicit {
    Some(path) => path.to_path_buf(),
    None => {
      let default = data_dir.join(CONFIG_FILE);
      if !default.exists() {
        return Ok(RuntimeConfig::default());
      }
      default
    }
  };

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  toml::from_str(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// A `scope.key=value` assignment from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct VarAssignment {
  pub scope: Scope,
  pub key: String,
  pub value: Value,
}

/// Parse `global.name=value` or `workflow.name=value`. The value is read as
/// JSON and falls back to a plain string.
pub fn parse_var(raw: &str) -> Result<VarAssignment> {
  let Some((target, value)) = raw.split_once('=') else {
    bail!("expected scope.key=value, got '{}'", raw);
  };
  let Some((scope, key)) = target.split_once('.') else {
    bail!("expected scope.key=value, got '{}'", raw);
  };
  if key.is_empty() {
    bail!("variable name is empty in '{}'", raw);
  }

  let scope: Scope = scope
    .parse()
    .with_context(|| format!("invalid variable assignment '{}'", raw))?;
  let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

  Ok(VarAssignment {
    scope,
    key: key.to_string(),
    value,
  })
}
