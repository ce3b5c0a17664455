use std::sync::LazyLock;

use boa_engine::{Context, Source};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::SandboxError;

static RETURN_KEYWORD: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\breturn\b").expect("return pattern is valid"));

const DEFAULT_RETURN: &str = "return { success: true, executed: true };";

/// Interpreter limits applied to every script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
  pub loop_iteration_limit: u64,
  pub recursion_limit: usize,
}

impl Default for ScriptLimits {
  fn default() -> Self {
    Self {
      loop_iteration_limit: 1_000_000,
      recursion_limit: 512,
    }
  }
}

/// Result of a script run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
  /// The script's return value, converted to JSON.
  pub value: Value,
  /// Lines written through `console.*`, in order.
  pub logs: Vec<String>,
}

/// What the wrapper hands back across the interpreter boundary.
#[derive(Debug, Deserialize)]
struct Envelope {
  ok: bool,
  #[serde(default)]
  value: Option<Value>,
  #[serde(default)]
  undefined: bool,
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  logs: Vec<String>,
}

/// Run `code` as a function body on a blocking worker thread.
pub async fn execute_script(
  code: &str,
  input: &Value,
  limits: ScriptLimits,
) -> Result<ScriptOutput, SandboxError> {
  let code = code.to_string();
  let input = input.clone();

  tokio::task::spawn_blocking(move || execute_script_blocking(&code, &input, limits))
    .await
    .map_err(|e| SandboxError::Worker {
      message: e.to_string(),
    })?
}

/// Run `code` as a function body on the current thread.
///
/// The body sees `input` and a `console` whose output is captured. Without a
/// `return` keyword anywhere in the code, `{success: true, executed: true}`
/// is returned. An explicit `undefined` result is replaced with a structured
/// hint.
pub fn execute_script_blocking(
  code: &str,
  input: &Value,
  limits: ScriptLimits,
) -> Result<ScriptOutput, SandboxError> {
  if code.trim().is_empty() {
    return Err(SandboxError::EmptyScript);
  }

  let body = if RETURN_KEYWORD.is_match(code) {
    code.to_string()
  } else {
    format!("{}\n{}", code, DEFAULT_RETURN)
  };

  let wrapper = build_wrapper(&body, input)?;

  let mut context = Context::default();
  let runtime_limits = context.runtime_limits_mut();
  runtime_limits.set_loop_iteration_limit(limits.loop_iteration_limit);
  runtime_limits.set_recursion_limit(limits.recursion_limit);

  let result = context
    .eval(Source::from_bytes(&wrapper))
    .map_err(|e| SandboxError::script("RuntimeLimit", e.to_string()))?;

  let raw = result
    .as_string()
    .map(|s| s.to_std_string_escaped())
    .ok_or_else(|| SandboxError::script("Error", "script wrapper did not produce a result"))?;

  let envelope: Envelope = serde_json::from_str(&raw)
    .map_err(|e| SandboxError::script("Error", format!("malformed script result: {}", e)))?;

  debug!(ok = envelope.ok, log_lines = envelope.logs.len(), "script_finished");

  if !envelope.ok {
    return Err(SandboxError::script(
      envelope.name.unwrap_or_else(|| "Error".to_string()),
      envelope.message.unwrap_or_default(),
    ));
  }

  let value = if envelope.undefined {
    json!({
      "success": true,
      "message": "code ran but returned no value",
      "hint": "the code has a return statement that produced undefined; return an explicit value"
    })
  } else {
    envelope.value.unwrap_or(Value::Null)
  };

  Ok(ScriptOutput {
    value,
    logs: envelope.logs,
  })
}

/// Compile the user body with the Function constructor inside a try block so
/// syntax errors surface as ordinary script failures.
fn build_wrapper(body: &str, input: &Value) -> Result<String, SandboxError> {
  let body_literal = serde_json::to_string(body)
    .map_err(|e| SandboxError::script("Error", format!("failed to encode code: {}", e)))?;
  let input_literal = serde_json::to_string(input)
    .map_err(|e| SandboxError::script("Error", format!("failed to encode input: {}", e)))?;

  Ok(format!(
    r#"(function () {{
  const __logs = [];
  const __format = (v) => {{
    if (typeof v === 'string') return v;
    if (v === undefined) return 'undefined';
    try {{ return JSON.stringify(v); }} catch (e) {{ return String(v); }}
  }};
  const __log = (...args) => {{ __logs.push(args.map(__format).join(' ')); }};
  const __console = {{ log: __log, info: __log, warn: __log, error: __log, debug: __log }};
  try {{
    const __fn = new Function('input', 'console', {body});
    const __value = __fn({input}, __console);
    if (__value === undefined) {{
      return JSON.stringify({{ ok: true, undefined: true, logs: __logs }});
    }}
    return JSON.stringify({{ ok: true, value: __value, logs: __logs }});
  }} catch (e) {{
    const name = (e && e.name) || 'Error';
    const message = (e && e.message !== undefined) ? String(e.message) : String(e);
    return JSON.stringify({{ ok: false, name: name, message: message, logs: __logs }});
  }}
}})()"#,
    body = body_literal,
    input = input_literal,
  ))
}
