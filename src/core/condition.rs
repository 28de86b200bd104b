//! Condition evaluator.
//!
//! Accepts either an in-process predicate callable or a source expression
//! string compiled once into a small AST. The expression language is
//! intentionally tiny — it must never `eval` host code — and supports
//! equality/ordering comparisons, `and`/`or`/`not`, membership (`in`), field
//! access by name, and literal strings/numbers/booleans/null.
//!
//! Grammar (low to high precedence):
//! ```text
//! or_expr      := and_expr ('or' and_expr)*
//! and_expr     := not_expr ('and' not_expr)*
//! not_expr     := 'not' not_expr | membership
//! membership   := comparison ('in' comparison)?
//! comparison   := primary (('==' | '!=' | '<' | '<=' | '>' | '>=') primary)?
//! primary      := literal | identifier | '(' or_expr ')'
//! ```

use crate::core::event::Event;
use crate::error::ConfigError;
use serde_json::Value;
use std::sync::Arc;

/// A compiled or callable predicate, evaluated against an event view.
#[derive(Clone)]
pub enum Condition {
    /// Matches unconditionally — the implicit default case of a `Switch`.
    Always,
    /// An in-process callable, for builders that construct conditions
    /// programmatically rather than from a source string.
    Predicate(Arc<dyn Fn(&Event) -> bool + Send + Sync>),
    /// A compiled expression string.
    Compiled(Arc<Expr>),
}

impl Condition {
    pub fn always() -> Self {
        Condition::Always
    }

    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(predicate))
    }

    /// Compiles a source expression string once. Call sites should hold onto
    /// the returned `Condition` and reuse it for every event rather than
    /// recompiling per event.
    pub fn compile(source: &str) -> Result<Self, ConfigError> {
        let ast = parse(source).map_err(|message| ConfigError::parse(source, message))?;
        Ok(Condition::Compiled(Arc::new(ast)))
    }

    pub fn evaluate(&self, event: &Event) -> bool {
        match self {
            Condition::Always => true,
            Condition::Predicate(f) => f(event),
            Condition::Compiled(ast) => ast.eval(event).truthy(),
        }
    }
}

/// Parsed expression AST. Evaluation never errors: an unresolved identifier
/// simply yields [`Lit::Null`], matching the "missing field is null, never a
/// failure" contract of the event view.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Lit),
    Field(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    In(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Lit>),
}

impl Lit {
    fn truthy(&self) -> bool {
        match self {
            Lit::Null => false,
            Lit::Bool(b) => *b,
            Lit::Num(n) => *n != 0.0,
            Lit::Str(s) => !s.is_empty(),
            Lit::List(items) => !items.is_empty(),
        }
    }

    fn from_value(value: &Value) -> Lit {
        match value {
            Value::Null => Lit::Null,
            Value::Bool(b) => Lit::Bool(*b),
            Value::Number(n) => Lit::Num(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Lit::Str(s.clone()),
            Value::Array(items) => Lit::List(items.iter().map(Lit::from_value).collect()),
            Value::Object(_) => Lit::Null,
        }
    }

    fn partial_cmp(&self, other: &Lit) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Lit::Num(a), Lit::Num(b)) => a.partial_cmp(b),
            (Lit::Str(a), Lit::Str(b)) => a.partial_cmp(b),
            (Lit::Bool(a), Lit::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Expr {
    fn eval(&self, event: &Event) -> Lit {
        match self {
            Expr::Literal(lit) => lit.clone(),
            Expr::Field(name) => Lit::from_value(&event.get(name)),
            Expr::Not(inner) => Lit::Bool(!inner.eval(event).truthy()),
            Expr::And(lhs, rhs) => {
                let left = lhs.eval(event);
                if !left.truthy() {
                    Lit::Bool(false)
                } else {
                    Lit::Bool(rhs.eval(event).truthy())
                }
            }
            Expr::Or(lhs, rhs) => {
                let left = lhs.eval(event);
                if left.truthy() {
                    Lit::Bool(true)
                } else {
                    Lit::Bool(rhs.eval(event).truthy())
                }
            }
            Expr::Compare(op, lhs, rhs) => {
                let left = lhs.eval(event);
                let right = rhs.eval(event);
                let result = match op {
                    CmpOp::Eq => left == right,
                    CmpOp::Ne => left != right,
                    CmpOp::Lt => left.partial_cmp(&right) == Some(std::cmp::Ordering::Less),
                    CmpOp::Le => matches!(
                        left.partial_cmp(&right),
                        Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
                    ),
                    CmpOp::Gt => left.partial_cmp(&right) == Some(std::cmp::Ordering::Greater),
                    CmpOp::Ge => matches!(
                        left.partial_cmp(&right),
                        Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                    ),
                };
                Lit::Bool(result)
            }
            Expr::In(needle, haystack) => {
                let needle = needle.eval(event);
                let result = match haystack.eval(event) {
                    Lit::List(items) => items.contains(&needle),
                    _ => false,
                };
                Lit::Bool(result)
            }
        }
    }
}

// --- Tokenizer ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(format!("unterminated string literal: {source}"));
                }
                i += 1;
                tokens.push(Token::Str(s));
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Le);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ge);
                i += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            _ if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let num = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number literal '{text}'"))?;
                tokens.push(Token::Num(num));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" | "none" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(format!("unexpected character '{other}' in condition")),
        }
    }

    Ok(tokens)
}

// --- Recursive-descent parser -------------------------------------------

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: &Token) -> Result<(), String> {
        match self.advance() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(format!("expected {token:?}, found {t:?}")),
            None => Err(format!("expected {token:?}, found end of input")),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_membership()
    }

    fn parse_membership(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_comparison()?;
        if matches!(self.peek(), Some(Token::In)) {
            self.advance();
            let rhs = self.parse_comparison()?;
            return Ok(Expr::In(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_primary()?;
        let op = match self.peek() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_primary()?;
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Str(s)) => Ok(Expr::Literal(Lit::Str(s.clone()))),
            Some(Token::Num(n)) => Ok(Expr::Literal(Lit::Num(*n))),
            Some(Token::True) => Ok(Expr::Literal(Lit::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Lit::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Lit::Null)),
            Some(Token::Ident(name)) => Ok(Expr::Field(name.clone())),
            other => Err(format!("unexpected token {other:?} in condition")),
        }
    }
}

fn parse(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err("empty condition expression".to_string());
    }
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_or()?;
    if parser.pos != tokens.len() {
        return Err(format!("trailing tokens after position {}", parser.pos));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(field: &str, value: Value) -> Event {
        let mut event = Event::new();
        event.set_field(field, value);
        event
    }

    #[test]
    fn compiling_twice_agrees_on_all_inputs() {
        let a = Condition::compile("severity == \"error\"").unwrap();
        let b = Condition::compile("severity == \"error\"").unwrap();
        let matching = event_with("severity", Value::String("error".into()));
        let other = event_with("severity", Value::String("info".into()));
        assert_eq!(a.evaluate(&matching), b.evaluate(&matching));
        assert_eq!(a.evaluate(&other), b.evaluate(&other));
    }

    #[test]
    fn missing_field_equals_null_holds() {
        let cond = Condition::compile("missing == null").unwrap();
        assert!(cond.evaluate(&Event::new()));

        let cond = Condition::compile("missing == \"x\"").unwrap();
        assert!(!cond.evaluate(&Event::new()));
    }

    #[test]
    fn membership_against_tags() {
        let mut event = Event::new();
        event.add_tag("db");
        let cond = Condition::compile("\"db\" in tags").unwrap();
        assert!(cond.evaluate(&event));
        let cond = Condition::compile("\"web\" in tags").unwrap();
        assert!(!cond.evaluate(&event));
    }

    #[test]
    fn boolean_connectives_and_precedence() {
        let event = event_with("severity", Value::String("error".into()));
        let cond = Condition::compile("severity == \"error\" and \"db\" in tags or severity == \"warn\"").unwrap();
        assert!(!cond.evaluate(&event));

        let cond = Condition::compile("not (severity == \"info\")").unwrap();
        assert!(cond.evaluate(&event));
    }

    #[test]
    fn ordering_comparisons() {
        let event = event_with("count", Value::from(5));
        assert!(Condition::compile("count > 1").unwrap().evaluate(&event));
        assert!(!Condition::compile("count > 10").unwrap().evaluate(&event));
        assert!(Condition::compile("count <= 5").unwrap().evaluate(&event));
    }

    #[test]
    fn always_matches_unconditionally() {
        assert!(Condition::always().evaluate(&Event::new()));
    }
}
