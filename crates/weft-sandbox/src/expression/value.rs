use std::collections::BTreeMap;

use serde_json::{Number, Value};

/// Runtime value of the expression evaluator.
///
/// Mirrors the JavaScript value space that JSON data can produce, plus
/// `undefined`.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
  Undefined,
  Null,
  Bool(bool),
  Num(f64),
  Str(String),
  Array(Vec<Val>),
  Object(BTreeMap<String, Val>),
}

impl Val {
  pub fn is_truthy(&self) -> bool {
    match self {
      Val::Undefined | Val::Null => false,
      Val::Bool(b) => *b,
      Val::Num(n) => *n != 0.0 && !n.is_nan(),
      Val::Str(s) => !s.is_empty(),
      Val::Array(_) | Val::Object(_) => true,
    }
  }

  pub fn is_nullish(&self) -> bool {
    matches!(self, Val::Undefined | Val::Null)
  }

  pub fn type_of(&self) -> &'static str {
    match self {
      Val::Undefined => "undefined",
      Val::Null | Val::Array(_) | Val::Object(_) => "object",
      Val::Bool(_) => "boolean",
      Val::Num(_) => "number",
      Val::Str(_) => "string",
    }
  }

  pub fn to_number(&self) -> f64 {
    match self {
      Val::Undefined => f64::NAN,
      Val::Null => 0.0,
      Val::Bool(b) => f64::from(u8::from(*b)),
      Val::Num(n) => *n,
      Val::Str(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          0.0
        } else {
          trimmed.parse().unwrap_or(f64::NAN)
        }
      }
      Val::Array(items) => match items.as_slice() {
        [] => 0.0,
        [single] => single.to_number(),
        _ => f64::NAN,
      },
      Val::Object(_) => f64::NAN,
    }
  }

  /// JavaScript `String(value)`.
  pub fn to_js_string(&self) -> String {
    match self {
      Val::Undefined => "undefined".to_string(),
      Val::Null => "null".to_string(),
      Val::Bool(b) => b.to_string(),
      Val::Num(n) => format_number(*n),
      Val::Str(s) => s.clone(),
      Val::Array(items) => items
        .iter()
        .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
        .collect::<Vec<_>>()
        .join(","),
      Val::Object(_) => "[object Object]".to_string(),
    }
  }

  pub fn is_primitive(&self) -> bool {
    !matches!(self, Val::Array(_) | Val::Object(_))
  }
}

pub(crate) fn format_number(n: f64) -> String {
  if n.is_nan() {
    "NaN".to_string()
  } else if n.is_infinite() {
    let sign = if n > 0.0 { "" } else { "-" };
    format!("{}Infinity", sign)
  } else if n == 0.0 {
    "0".to_string()
  } else if n.fract() == 0.0 && n.abs() < 1e21 {
    format!("{:.0}", n)
  } else {
    n.to_string()
  }
}

impl From<&Value> for Val {
  fn from(value: &Value) -> Self {
    match value {
      Value::Null => Val::Null,
      Value::Bool(b) => Val::Bool(*b),
      Value::Number(n) => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
      Value::String(s) => Val::Str(s.clone()),
      Value::Array(items) => Val::Array(items.iter().map(Val::from).collect()),
      Value::Object(map) => Val::Object(map.iter().map(|(k, v)| (k.clone(), Val::from(v))).collect()),
    }
  }
}

impl From<Val> for Value {
  fn from(value: Val) -> Self {
    match value {
      Val::Undefined | Val::Null => Value::Null,
      Val::Bool(b) => Value::Bool(b),
      Val::Num(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
      Val::Str(s) => Value::String(s),
      Val::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
      Val::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
    }
  }
}
