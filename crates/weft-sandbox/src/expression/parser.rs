use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::lexer::Token;
use super::value::Val;

/// Deepest tree the parser will build. Evaluation and drop both recurse over
/// the tree, so this also bounds their stack use.
pub(crate) const MAX_DEPTH: usize = 128;

/// Recursive-descent parser over a token stream.
///
/// Precedence, loosest first: ternary, `||`/`??`, `&&`, equality, relational,
/// additive, multiplicative, unary, member/call.
///
/// `depth` counts both recursion and left-associative chaining, since each
/// chained operator wraps the tree built so far one level deeper.
pub(crate) struct Parser {
  tokens: Vec<Token>,
  pos: usize,
  depth: usize,
}

impl Parser {
  pub(crate) fn new(tokens: Vec<Token>) -> Self {
    Self {
      tokens,
      pos: 0,
      depth: 0,
    }
  }

  /// Parse a complete expression. A single trailing `;` is accepted.
  pub(crate) fn parse(mut self) -> Result<Expr, String> {
    if self.tokens.is_empty() {
      return Err("Unexpected end of input".to_string());
    }

    let expr = self.conditional()?;
    self.eat(&Token::Semicolon);
    match self.peek() {
      None => Ok(expr),
      Some(token) => Err(format!("Unexpected token '{}'", token)),
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn advance(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.pos).cloned();
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn eat(&mut self, expected: &Token) -> bool {
    if self.peek() == Some(expected) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, expected: &Token) -> Result<(), String> {
    match self.advance() {
      Some(ref token) if token == expected => Ok(()),
      Some(token) => Err(format!("Unexpected token '{}', expected '{}'", token, expected)),
      None => Err(format!("Unexpected end of input, expected '{}'", expected)),
    }
  }

  /// One level deeper. Callers restore `self.depth` when they return.
  fn descend(&mut self) -> Result<(), String> {
    self.depth += 1;
    if self.depth > MAX_DEPTH {
      return Err("Maximum nesting depth exceeded".to_string());
    }
    Ok(())
  }

  fn conditional(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    self.descend()?;
    let test = self.logical_or()?;
    if !self.eat(&Token::Question) {
      self.depth = depth;
      return Ok(test);
    }

    let consequent = self.conditional()?;
    self.expect(&Token::Colon)?;
    let alternate = self.conditional()?;

    self.depth = depth;
    Ok(Expr::Conditional {
      test: Box::new(test),
      consequent: Box::new(consequent),
      alternate: Box::new(alternate),
    })
  }

  fn logical_or(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.logical_and()?;
    loop {
      let op = match self.peek() {
        Some(Token::OrOr) => LogicalOp::Or,
        Some(Token::Nullish) => LogicalOp::Nullish,
        _ => break,
      };
      self.pos += 1;
      self.descend()?;
      let right = self.logical_and()?;
      left = Expr::Logical(op, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn logical_and(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.equality()?;
    while self.eat(&Token::AndAnd) {
      self.descend()?;
      let right = self.equality()?;
      left = Expr::Logical(LogicalOp::And, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn equality(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.relational()?;
    loop {
      let op = match self.peek() {
        Some(Token::EqEq) => BinaryOp::Equal,
        Some(Token::NotEq) => BinaryOp::NotEqual,
        Some(Token::EqEqEq) => BinaryOp::StrictEqual,
        Some(Token::NotEqEq) => BinaryOp::StrictNotEqual,
        _ => break,
      };
      self.pos += 1;
      self.descend()?;
      let right = self.relational()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn relational(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.additive()?;
    loop {
      let op = match self.peek() {
        Some(Token::Lt) => BinaryOp::Less,
        Some(Token::Le) => BinaryOp::LessEqual,
        Some(Token::Gt) => BinaryOp::Greater,
        Some(Token::Ge) => BinaryOp::GreaterEqual,
        _ => break,
      };
      self.pos += 1;
      self.descend()?;
      let right = self.additive()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn additive(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.multiplicative()?;
    loop {
      let op = match self.peek() {
        Some(Token::Plus) => BinaryOp::Add,
        Some(Token::Minus) => BinaryOp::Subtract,
        _ => break,
      };
      self.pos += 1;
      self.descend()?;
      let right = self.multiplicative()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn multiplicative(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut left = self.unary()?;
    loop {
      let op = match self.peek() {
        Some(Token::Star) => BinaryOp::Multiply,
        Some(Token::Slash) => BinaryOp::Divide,
        Some(Token::Percent) => BinaryOp::Remainder,
        _ => break,
      };
      self.pos += 1;
      self.descend()?;
      let right = self.unary()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    self.depth = depth;
    Ok(left)
  }

  fn unary(&mut self) -> Result<Expr, String> {
    let op = match self.peek() {
      Some(Token::Bang) => UnaryOp::Not,
      Some(Token::Minus) => UnaryOp::Negate,
      Some(Token::Plus) => UnaryOp::Plus,
      Some(Token::Ident(name)) if name == "typeof" => UnaryOp::TypeOf,
      _ => return self.postfix(),
    };
    self.pos += 1;
    let depth = self.depth;
    self.descend()?;
    let operand = self.unary()?;
    self.depth = depth;
    Ok(Expr::Unary(op, Box::new(operand)))
  }

  fn postfix(&mut self) -> Result<Expr, String> {
    let depth = self.depth;
    let mut expr = self.primary()?;
    loop {
      if matches!(
        self.peek(),
        Some(Token::Dot) | Some(Token::LBracket) | Some(Token::LParen)
      ) {
        self.descend()?;
      }
      match self.peek() {
        Some(Token::Dot) => {
          self.pos += 1;
          let name = match self.advance() {
            Some(Token::Ident(name)) => name,
            Some(token) => return Err(format!("Unexpected token '{}'", token)),
            None => return Err("Unexpected end of input".to_string()),
          };
          expr = Expr::Member {
            object: Box::new(expr),
            property: Box::new(Expr::Literal(Val::Str(name))),
          };
        }
        Some(Token::LBracket) => {
          self.pos += 1;
          let property = self.conditional()?;
          self.expect(&Token::RBracket)?;
          expr = Expr::Member {
            object: Box::new(expr),
            property: Box::new(property),
          };
        }
        Some(Token::LParen) => {
          self.pos += 1;
          let args = self.list(&Token::RParen)?;
          expr = Expr::Call {
            callee: Box::new(expr),
            args,
          };
        }
        _ => break,
      }
    }
    self.depth = depth;
    Ok(expr)
  }

  fn primary(&mut self) -> Result<Expr, String> {
    match self.advance() {
      Some(Token::Num(n)) => Ok(Expr::Literal(Val::Num(n))),
      Some(Token::Str(s)) => Ok(Expr::Literal(Val::Str(s))),
      Some(Token::Ident(name)) => Ok(
        keyword_literal(&name)
          .map(Expr::Literal)
          .unwrap_or_else(|| Expr::Identifier(name)),
      ),
      Some(Token::LParen) => {
        let expr = self.conditional()?;
        self.expect(&Token::RParen)?;
        Ok(expr)
      }
      Some(Token::LBracket) => Ok(Expr::Array(self.list(&Token::RBracket)?)),
      Some(token) => Err(format!("Unexpected token '{}'", token)),
      None => Err("Unexpected end of input".to_string()),
    }
  }

  /// Comma-separated expressions up to and including `close`.
  fn list(&mut self, close: &Token) -> Result<Vec<Expr>, String> {
    let mut items = Vec::new();
    if self.eat(close) {
      return Ok(items);
    }
    loop {
      items.push(self.conditional()?);
      if self.eat(close) {
        return Ok(items);
      }
      self.expect(&Token::Comma)?;
    }
  }
}

fn keyword_literal(name: &str) -> Option<Val> {
  match name {
    "true" => Some(Val::Bool(true)),
    "false" => Some(Val::Bool(false)),
    "null" => Some(Val::Null),
    "undefined" => Some(Val::Undefined),
    "NaN" => Some(Val::Num(f64::NAN)),
    "Infinity" => Some(Val::Num(f64::INFINITY)),
    _ => None,
  }
}
