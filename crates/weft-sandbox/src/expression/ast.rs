use super::value::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Not,
  Negate,
  Plus,
  TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Subtract,
  Multiply,
  Divide,
  Remainder,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  Equal,
  NotEqual,
  StrictEqual,
  StrictNotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
  Nullish,
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Literal(Val),
  Identifier(String),
  Array(Vec<Expr>),
  /// `object.name` or `object[expr]`.
  Member {
    object: Box<Expr>,
    property: Box<Expr>,
  },
  Call {
    callee: Box<Expr>,
    args: Vec<Expr>,
  },
  Unary(UnaryOp, Box<Expr>),
  Binary(BinaryOp, Box<Expr>, Box<Expr>),
  Logical(LogicalOp, Box<Expr>, Box<Expr>),
  Conditional {
    test: Box<Expr>,
    consequent: Box<Expr>,
    alternate: Box<Expr>,
  },
}
