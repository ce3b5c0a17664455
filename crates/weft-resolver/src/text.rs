use serde_json::Value;

/// Render a value as substitution text.
///
/// Strings are inserted raw, objects and arrays as compact JSON, and numbers
/// without a trailing `.0` when they are integral.
pub fn stringify(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Number(n) => match n.as_f64() {
      Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
      _ => n.to_string(),
    },
    other => other.to_string(),
  }
}
