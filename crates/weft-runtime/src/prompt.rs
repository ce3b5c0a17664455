use serde_json::Value;
use weft_resolver::stringify;

/// Falsy in the sense the graph editor uses: null, false, zero and "".
pub(crate) fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

/// The configured prompt with the previous node's output appended after
/// `separator`. An empty prompt becomes the previous output alone.
pub(crate) fn compose(prompt: &str, previous: &Value, separator: &str) -> String {
  if !is_truthy(previous) {
    return prompt.to_string();
  }

  let previous = stringify(previous);
  if prompt.is_empty() {
    previous
  } else {
    format!("{}{}{}", prompt, separator, previous)
  }
}
