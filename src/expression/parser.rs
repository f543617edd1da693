use super::ExpressionError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    FieldTruthy(String),
    Field(String),
    Literal(Value),
    List(Vec<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    InList(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{name}`"),
            Token::Str(raw) => format!("string '{raw}'"),
            Token::Num(n) => format!("number {n}"),
            Token::Op(_) => "comparison operator".to_string(),
            Token::And => "`&&`".to_string(),
            Token::Or => "`||`".to_string(),
            Token::Not => "`!`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::Comma => "`,`".to_string(),
        }
    }
}

pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(parser.unexpected(Some(token.clone())));
    }
    Ok(expr)
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        let next = chars.get(idx + 1).copied();
        match ch {
            c if c.is_whitespace() => idx += 1,
            '(' => {
                tokens.push(Token::LParen);
                idx += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                idx += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                idx += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                idx += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                idx += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                idx += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                idx += 2;
            }
            '=' | '!' if next == Some('=') => {
                let strict = chars.get(idx + 2) == Some(&'=');
                let op = match (ch, strict) {
                    ('=', false) => CompareOp::Eq,
                    ('=', true) => CompareOp::StrictEq,
                    ('!', false) => CompareOp::Ne,
                    _ => CompareOp::StrictNe,
                };
                tokens.push(Token::Op(op));
                idx += if strict { 3 } else { 2 };
            }
            '!' => {
                tokens.push(Token::Not);
                idx += 1;
            }
            '<' | '>' => {
                let inclusive = next == Some('=');
                let op = match (ch, inclusive) {
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    ('>', false) => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                tokens.push(Token::Op(op));
                idx += if inclusive { 2 } else { 1 };
            }
            '\'' | '"' => {
                let quote = ch;
                let mut literal = String::new();
                idx += 1;
                let mut closed = false;
                while idx < chars.len() {
                    let c = chars[idx];
                    if c == '\\' && idx + 1 < chars.len() {
                        literal.push(chars[idx + 1]);
                        idx += 2;
                        continue;
                    }
                    if c == quote {
                        closed = true;
                        idx += 1;
                        break;
                    }
                    literal.push(c);
                    idx += 1;
                }
                if !closed {
                    return Err(ExpressionError::UnterminatedString {
                        expression: source.to_string(),
                    });
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = idx;
                idx += 1;
                while idx < chars.len() && (chars[idx].is_ascii_digit() || chars[idx] == '.') {
                    idx += 1;
                }
                let raw: String = chars[start..idx].iter().collect();
                let number = raw.parse::<f64>().map_err(|_| ExpressionError::UnexpectedChar {
                    expression: source.to_string(),
                    ch: c,
                    offset: start,
                })?;
                tokens.push(Token::Num(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = idx;
                while idx < chars.len()
                    && (chars[idx].is_ascii_alphanumeric()
                        || chars[idx] == '_'
                        || chars[idx] == '$'
                        || chars[idx] == '.')
                {
                    idx += 1;
                }
                tokens.push(Token::Ident(chars[start..idx].iter().collect()));
            }
            other => {
                return Err(ExpressionError::UnexpectedChar {
                    expression: source.to_string(),
                    ch: other,
                    offset: idx,
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
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

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn unexpected(&self, found: Option<Token>) -> ExpressionError {
        ExpressionError::UnexpectedToken {
            expression: self.source.to_string(),
            found: found
                .map(|token| token.describe())
                .unwrap_or_else(|| "end of expression".to_string()),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.parse_primary()?;
        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.pos += 1;
            let right = self.parse_primary()?;
            return Ok(Expr::Compare(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Not) => {
                let inner = self.parse_primary()?;
                Ok(Expr::Not(Box::new(inner)))
            }
            Some(Token::Str(raw)) => Ok(Expr::Literal(Value::String(raw))),
            Some(Token::Num(number)) => Ok(Expr::Literal(
                serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            )),
            Some(Token::LBracket) => self.parse_list(),
            Some(Token::Ident(name)) => self.parse_ident(name),
            other => Err(self.unexpected(other)),
        }
    }

    fn parse_list(&mut self) -> Result<Expr, ExpressionError> {
        let mut items = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.pos += 1;
            return Ok(Expr::List(items));
        }
        loop {
            items.push(self.parse_or()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RBracket) => return Ok(Expr::List(items)),
                other => return Err(self.unexpected(other)),
            }
        }
    }

    fn parse_ident(&mut self, name: String) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            if name != "in_list" {
                return Err(ExpressionError::UnknownFunction {
                    expression: self.source.to_string(),
                    name,
                });
            }
            let list = self.parse_or()?;
            self.expect(Token::Comma)?;
            let needle = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(Expr::InList(Box::new(list), Box::new(needle)));
        }
        match name.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" | "undefined" => return Ok(Expr::Literal(Value::Null)),
            _ => {}
        }
        let segments: Vec<&str> = name.split('.').collect();
        match segments.as_slice() {
            [field] if !field.is_empty() => Ok(Expr::Field((*field).to_string())),
            ["doc", field] if !field.is_empty() => Ok(Expr::Field((*field).to_string())),
            _ => Err(self.unexpected(Some(Token::Ident(name)))),
        }
    }
}
