use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
  Num(f64),
  Str(String),
  Ident(String),
  LParen,
  RParen,
  LBracket,
  RBracket,
  Comma,
  Dot,
  Question,
  Colon,
  Semicolon,
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  Bang,
  Lt,
  Le,
  Gt,
  Ge,
  EqEq,
  NotEq,
  EqEqEq,
  NotEqEq,
  AndAnd,
  OrOr,
  Nullish,
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Token::Num(n) => return write!(f, "{}", n),
      Token::Str(s) => return write!(f, "'{}'", s),
      Token::Ident(name) => return f.write_str(name),
      Token::LParen => "(",
      Token::RParen => ")",
      Token::LBracket => "[",
      Token::RBracket => "]",
      Token::Comma => ",",
      Token::Dot => ".",
      Token::Question => "?",
      Token::Colon => ":",
      Token::Semicolon => ";",
      Token::Plus => "+",
      Token::Minus => "-",
      Token::Star => "*",
      Token::Slash => "/",
      Token::Percent => "%",
      Token::Bang => "!",
      Token::Lt => "<",
      Token::Le => "<=",
      Token::Gt => ">",
      Token::Ge => ">=",
      Token::EqEq => "==",
      Token::NotEq => "!=",
      Token::EqEqEq => "===",
      Token::NotEqEq => "!==",
      Token::AndAnd => "&&",
      Token::OrOr => "||",
      Token::Nullish => "??",
    };
    f.write_str(text)
  }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, String> {
  let chars: Vec<char> = source.chars().collect();
  let mut tokens = Vec::new();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();

    if c.is_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
      let (number, end) = read_number(&chars, i)?;
      tokens.push(Token::Num(number));
      i = end;
      continue;
    }

    if c.is_alphabetic() || c == '_' || c == '$' {
      let start = i;
      while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
        i += 1;
      }
      tokens.push(Token::Ident(chars[start..i].iter().collect()));
      continue;
    }

    if c == '\'' || c == '"' || c == '`' {
      let (text, end) = read_string(&chars, i)?;
      tokens.push(Token::Str(text));
      i = end;
      continue;
    }

    let third = chars.get(i + 2).copied();
    let (token, width) = match (c, next, third) {
      ('=', Some('='), Some('=')) => (Token::EqEqEq, 3),
      ('!', Some('='), Some('=')) => (Token::NotEqEq, 3),
      ('=', Some('='), _) => (Token::EqEq, 2),
      ('!', Some('='), _) => (Token::NotEq, 2),
      ('<', Some('='), _) => (Token::Le, 2),
      ('>', Some('='), _) => (Token::Ge, 2),
      ('&', Some('&'), _) => (Token::AndAnd, 2),
      ('|', Some('|'), _) => (Token::OrOr, 2),
      ('?', Some('?'), _) => (Token::Nullish, 2),
      ('(', ..) => (Token::LParen, 1),
      (')', ..) => (Token::RParen, 1),
      ('[', ..) => (Token::LBracket, 1),
      (']', ..) => (Token::RBracket, 1),
      (',', ..) => (Token::Comma, 1),
      ('.', ..) => (Token::Dot, 1),
      ('?', ..) => (Token::Question, 1),
      (':', ..) => (Token::Colon, 1),
      (';', ..) => (Token::Semicolon, 1),
      ('+', ..) => (Token::Plus, 1),
      ('-', ..) => (Token::Minus, 1),
      ('*', ..) => (Token::Star, 1),
      ('/', ..) => (Token::Slash, 1),
      ('%', ..) => (Token::Percent, 1),
      ('!', ..) => (Token::Bang, 1),
      ('<', ..) => (Token::Lt, 1),
      ('>', ..) => (Token::Gt, 1),
      ('=', ..) => return Err("assignment is not allowed in a condition".to_string()),
      _ => return Err(format!("Invalid or unexpected token '{}'", c)),
    };
    tokens.push(token);
    i += width;
  }

  Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> Result<(f64, usize), String> {
  let mut i = start;
  while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
    i += 1;
  }
  if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
    let mut j = i + 1;
    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
      j += 1;
    }
    if j < chars.len() && chars[j].is_ascii_digit() {
      i = j;
      while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
      }
    }
  }

  let text: String = chars[start..i].iter().collect();
  text
    .parse::<f64>()
    .map(|n| (n, i))
    .map_err(|_| format!("Invalid number literal '{}'", text))
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
  let quote = chars[start];
  let mut text = String::new();
  let mut i = start + 1;

  while i < chars.len() {
    match chars[i] {
      c if c == quote => return Ok((text, i + 1)),
      '\\' => {
        let escaped = chars.get(i + 1).ok_or("Invalid or unexpected token")?;
        text.push(match escaped {
          'n' => '\n',
          't' => '\t',
          'r' => '\r',
          '0' => '\0',
          other => *other,
        });
        i += 2;
      }
      c => {
        text.push(c);
        i += 1;
      }
    }
  }

  Err("Invalid or unexpected token: unterminated string".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tokenize_operators() {
    let tokens = tokenize("a === 1 && b !== 'x' || !c ?? d").unwrap();
    assert_eq!(
      tokens,
      vec![
        Token::Ident("a".into()),
        Token::EqEqEq,
        Token::Num(1.0),
        Token::AndAnd,
        Token::Ident("b".into()),
        Token::NotEqEq,
        Token::Str("x".into()),
        Token::OrOr,
        Token::Bang,
        Token::Ident("c".into()),
        Token::Nullish,
        Token::Ident("d".into()),
      ]
    );
  }

  #[test]
  fn test_numbers_and_strings() {
    let tokens = tokenize(r#"1.5e2 .5 "a\"b" 'it\'s'"#).unwrap();
    assert_eq!(
      tokens,
      vec![
        Token::Num(150.0),
        Token::Num(0.5),
        Token::Str("a\"b".into()),
        Token::Str("it's".into()),
      ]
    );
  }

  #[test]
  fn test_rejects_assignment_and_garbage() {
    assert!(tokenize("a = 1").is_err());
    assert!(tokenize("a # b").is_err());
    assert!(tokenize("'open").is_err());
  }
}
