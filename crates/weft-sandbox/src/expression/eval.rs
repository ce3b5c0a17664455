use serde_json::{Map, Value};

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::value::Val;

/// Evaluates an [`Expr`] against a set of named bindings.
pub(crate) struct Evaluator<'a> {
  bindings: &'a Map<String, Value>,
}

impl<'a> Evaluator<'a> {
  pub(crate) fn new(bindings: &'a Map<String, Value>) -> Self {
    Self { bindings }
  }

  pub(crate) fn eval(&self, expr: &Expr) -> Result<Val, String> {
    match expr {
      Expr::Literal(value) => Ok(value.clone()),
      Expr::Identifier(name) => self
        .bindings
        .get(name)
        .map(Val::from)
        .ok_or_else(|| format!("{} is not defined", name)),
      Expr::Array(items) => items
        .iter()
        .map(|item| self.eval(item))
        .collect::<Result<Vec<_>, _>>()
        .map(Val::Array),
      Expr::Member { object, property } => {
        let object = self.eval(object)?;
        let property = self.eval(property)?;
        get_property(&object, &property)
      }
      Expr::Call { callee, args } => self.call(callee, args),
      Expr::Unary(UnaryOp::TypeOf, operand) => {
        // typeof tolerates undeclared identifiers
        if let Expr::Identifier(name) = operand.as_ref()
          && !self.bindings.contains_key(name)
        {
          return Ok(Val::Str("undefined".to_string()));
        }
        Ok(Val::Str(self.eval(operand)?.type_of().to_string()))
      }
      Expr::Unary(op, operand) => {
        let value = self.eval(operand)?;
        Ok(match op {
          UnaryOp::Not => Val::Bool(!value.is_truthy()),
          UnaryOp::Negate => Val::Num(-value.to_number()),
          UnaryOp::Plus | UnaryOp::TypeOf => Val::Num(value.to_number()),
        })
      }
      Expr::Binary(op, left, right) => {
        let left = self.eval(left)?;
        let right = self.eval(right)?;
        Ok(binary(*op, &left, &right))
      }
      Expr::Logical(op, left, right) => {
        let left = self.eval(left)?;
        let short_circuit = match op {
          LogicalOp::And => !left.is_truthy(),
          LogicalOp::Or => left.is_truthy(),
          LogicalOp::Nullish => !left.is_nullish(),
        };
        if short_circuit {
          Ok(left)
        } else {
          self.eval(right)
        }
      }
      Expr::Conditional {
        test,
        consequent,
        alternate,
      } => {
        if self.eval(test)?.is_truthy() {
          self.eval(consequent)
        } else {
          self.eval(alternate)
        }
      }
    }
  }

  fn call(&self, callee: &Expr, args: &[Expr]) -> Result<Val, String> {
    let args = args
      .iter()
      .map(|arg| self.eval(arg))
      .collect::<Result<Vec<_>, _>>()?;

    match callee {
      Expr::Member { object, property } => {
        let receiver = self.eval(object)?;
        let name = self.eval(property)?.to_js_string();
        if receiver.is_nullish() {
          return Err(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver.to_js_string(),
            name
          ));
        }
        call_method(&receiver, &name, &args)
      }
      Expr::Identifier(name) if !self.bindings.contains_key(name) => {
        let first = args.first().cloned().unwrap_or(Val::Undefined);
        match name.as_str() {
          "Number" => Ok(Val::Num(first.to_number())),
          "String" => Ok(Val::Str(first.to_js_string())),
          "Boolean" => Ok(Val::Bool(first.is_truthy())),
          _ => Err(format!("{} is not defined", name)),
        }
      }
      other => Err(format!("{} is not a function", describe(other))),
    }
  }
}

fn describe(expr: &Expr) -> String {
  match expr {
    Expr::Identifier(name) => name.clone(),
    Expr::Member { object, property } => match property.as_ref() {
      Expr::Literal(Val::Str(name)) => format!("{}.{}", describe(object), name),
      _ => format!("{}[...]", describe(object)),
    },
    _ => "expression".to_string(),
  }
}

fn index_of(property: &Val) -> Option<usize> {
  match property {
    Val::Num(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
    Val::Str(s) => s.parse().ok(),
    _ => None,
  }
}

fn get_property(object: &Val, property: &Val) -> Result<Val, String> {
  let key = property.to_js_string();
  match object {
    Val::Undefined | Val::Null => Err(format!(
      "Cannot read properties of {} (reading '{}')",
      object.to_js_string(),
      key
    )),
    Val::Str(s) if key == "length" => Ok(Val::Num(s.encode_utf16().count() as f64)),
    Val::Str(s) => Ok(
      index_of(property)
        .and_then(|i| s.chars().nth(i))
        .map(|c| Val::Str(c.to_string()))
        .unwrap_or(Val::Undefined),
    ),
    Val::Array(items) if key == "length" => Ok(Val::Num(items.len() as f64)),
    Val::Array(items) => Ok(
      index_of(property)
        .and_then(|i| items.get(i).cloned())
        .unwrap_or(Val::Undefined),
    ),
    Val::Object(map) => Ok(map.get(&key).cloned().unwrap_or(Val::Undefined)),
    Val::Bool(_) | Val::Num(_) => Ok(Val::Undefined),
  }
}

fn call_method(receiver: &Val, name: &str, args: &[Val]) -> Result<Val, String> {
  let arg = |i: usize| args.get(i).cloned().unwrap_or(Val::Undefined);

  match (receiver, name) {
    (Val::Str(s), "includes") => Ok(Val::Bool(s.contains(&arg(0).to_js_string()))),
    (Val::Str(s), "startsWith") => Ok(Val::Bool(s.starts_with(&arg(0).to_js_string()))),
    (Val::Str(s), "endsWith") => Ok(Val::Bool(s.ends_with(&arg(0).to_js_string()))),
    (Val::Str(s), "indexOf") => Ok(Val::Num(
      s.find(&arg(0).to_js_string())
        .map(|byte| s[..byte].chars().count() as f64)
        .unwrap_or(-1.0),
    )),
    (Val::Str(s), "toLowerCase") => Ok(Val::Str(s.to_lowercase())),
    (Val::Str(s), "toUpperCase") => Ok(Val::Str(s.to_uppercase())),
    (Val::Str(s), "trim") => Ok(Val::Str(s.trim().to_string())),
    (Val::Array(items), "includes") => {
      let needle = arg(0);
      Ok(Val::Bool(items.iter().any(|item| strict_equals(item, &needle))))
    }
    (Val::Array(items), "indexOf") => {
      let needle = arg(0);
      Ok(Val::Num(
        items
          .iter()
          .position(|item| strict_equals(item, &needle))
          .map(|i| i as f64)
          .unwrap_or(-1.0),
      ))
    }
    (Val::Array(items), "join") => {
      let separator = match arg(0) {
        Val::Undefined => ",".to_string(),
        other => other.to_js_string(),
      };
      Ok(Val::Str(
        items
          .iter()
          .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
          .collect::<Vec<_>>()
          .join(&separator),
      ))
    }
    (_, "toString") => Ok(Val::Str(receiver.to_js_string())),
    _ => Err(format!("{}.{} is not a function", receiver.type_of(), name)),
  }
}

fn binary(op: BinaryOp, left: &Val, right: &Val) -> Val {
  match op {
    BinaryOp::Add => {
      let stringy = |v: &Val| matches!(v, Val::Str(_) | Val::Array(_) | Val::Object(_));
      if stringy(left) || stringy(right) {
        Val::Str(format!("{}{}", left.to_js_string(), right.to_js_string()))
      } else {
        Val::Num(left.to_number() + right.to_number())
      }
    }
    BinaryOp::Subtract => Val::Num(left.to_number() - right.to_number()),
    BinaryOp::Multiply => Val::Num(left.to_number() * right.to_number()),
    BinaryOp::Divide => Val::Num(left.to_number() / right.to_number()),
    BinaryOp::Remainder => Val::Num(left.to_number() % right.to_number()),
    BinaryOp::Less => Val::Bool(compare(left, right, |o| o.is_lt())),
    BinaryOp::LessEqual => Val::Bool(compare(left, right, |o| o.is_le())),
    BinaryOp::Greater => Val::Bool(compare(left, right, |o| o.is_gt())),
    BinaryOp::GreaterEqual => Val::Bool(compare(left, right, |o| o.is_ge())),
    BinaryOp::Equal => Val::Bool(loose_equals(left, right)),
    BinaryOp::NotEqual => Val::Bool(!loose_equals(left, right)),
    BinaryOp::StrictEqual => Val::Bool(strict_equals(left, right)),
    BinaryOp::StrictNotEqual => Val::Bool(!strict_equals(left, right)),
  }
}

fn compare(left: &Val, right: &Val, accept: fn(std::cmp::Ordering) -> bool) -> bool {
  if let (Val::Str(a), Val::Str(b)) = (left, right) {
    return accept(a.cmp(b));
  }
  left
    .to_number()
    .partial_cmp(&right.to_number())
    .is_some_and(accept)
}

/// `===`. Arrays and objects compare structurally since every value is a
/// fresh copy of context data.
fn strict_equals(left: &Val, right: &Val) -> bool {
  match (left, right) {
    (Val::Undefined, Val::Undefined) | (Val::Null, Val::Null) => true,
    (Val::Bool(a), Val::Bool(b)) => a == b,
    (Val::Num(a), Val::Num(b)) => a == b,
    (Val::Str(a), Val::Str(b)) => a == b,
    (Val::Array(_), Val::Array(_)) | (Val::Object(_), Val::Object(_)) => left == right,
    _ => false,
  }
}

/// `==` with JavaScript's coercions for the JSON value space.
fn loose_equals(left: &Val, right: &Val) -> bool {
  match (left, right) {
    (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
    (Val::Num(_), Val::Str(_)) | (Val::Str(_), Val::Num(_)) => left.to_number() == right.to_number(),
    (Val::Bool(b), other) | (other, Val::Bool(b)) => {
      loose_equals(&Val::Num(f64::from(u8::from(*b))), other)
    }
    (a, b) if a.is_primitive() != b.is_primitive() => {
      let (compound, primitive) = if a.is_primitive() { (b, a) } else { (a, b) };
      loose_equals(&Val::Str(compound.to_js_string()), primitive)
    }
    _ => strict_equals(left, right),
  }
}
