//! mapping::script
//!
//! A small JavaScript-flavoured expression language over JSON values.
//!
//! Supported syntax:
//! - literals: numbers, `'single'` / `"double"` quoted strings, `true`,
//!   `false`, `null`
//! - names bound by the caller (e.g. `result`), member access `a.b`,
//!   indexing `a[0]` / `a['b']`, `.length` on arrays and strings
//! - unary `!` `-`; binary `*` `/` `%` `+` `-` `<` `<=` `>` `>=`
//!   `==` `!=` `===` `!==` `&&` `||`; conditional `c ? a : b`; parentheses
//!
//! `+` concatenates when either side is a string. `&&` and `||` return one
//! of their operands, using JavaScript truthiness. Reading a missing member
//! or an out-of-range index yields `null`; reading anything from `null` is
//! a type error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Number, Value};

use super::{Bindings, ExpressionError, ExpressionEvaluator};

/// Maximum depth of the parsed tree. Nesting and operator chains both count.
const MAX_DEPTH: usize = 64;

/// Evaluator for the embedded expression language.
///
/// Parsed expressions are cached per source string.
#[derive(Debug, Default)]
pub struct ScriptEvaluator {
    cache: Mutex<HashMap<String, Arc<Expr>>>,
}

impl ScriptEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source`, reusing a cached parse when available.
    fn compile(&self, source: &str) -> Result<Arc<Expr>, ExpressionError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(expr) = cache.get(source) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(parse(source)?);
        cache.insert(source.to_string(), Arc::clone(&expr));
        Ok(expr)
    }
}

impl ExpressionEvaluator for ScriptEvaluator {
    fn evaluate(&self, source: &str, bindings: &Bindings) -> Result<Value, ExpressionError> {
        let expr = self.compile(source)?;
        eval(&expr, bindings)
    }

    fn check_syntax(&self, source: &str) -> Result<(), ExpressionError> {
        self.compile(source).map(|_| ())
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
}

/// Operators, longest first so that prefixes do not shadow them.
const OPERATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!",
    "?", ":", ".", "[", "]", "(", ")",
];

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let c = rest.chars().next().unwrap_or('\0');

        if c.is_whitespace() {
            pos += c.len_utf8();
        } else if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
                .unwrap_or(rest.len());
            let number = rest[..len]
                .parse::<f64>()
                .map_err(|_| syntax(pos, format!("invalid number '{}'", &rest[..len])))?;
            tokens.push((pos, Token::Number(number)));
            pos += len;
        } else if c == '\'' || c == '"' {
            let (text, len) = read_string(rest, c).ok_or_else(|| syntax(pos, "unterminated string"))?;
            tokens.push((pos, Token::Str(text)));
            pos += len;
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let len = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
                .unwrap_or(rest.len());
            tokens.push((pos, Token::Ident(rest[..len].to_string())));
            pos += len;
        } else if let Some(&op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            tokens.push((pos, Token::Op(op)));
            pos += op.len();
        } else {
            return Err(syntax(pos, format!("unexpected character '{}'", c)));
        }
    }

    Ok(tokens)
}

/// Read a quoted string starting at `input[0] == quote`.
///
/// Returns the unescaped text and the number of bytes consumed.
fn read_string(input: &str, quote: char) -> Option<(String, usize)> {
    let mut text = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            }
            c if c == quote => return Some((text, i + c.len_utf8())),
            c => text.push(c),
        }
    }
    None
}

// =============================================================================
// Parser
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Name(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
    };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(_) => Err(syntax(parser.offset(), "unexpected trailing input")),
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(p, _)| *p).unwrap_or(self.end)
    }

    fn eat(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, op: &str) -> Result<(), ExpressionError> {
        if self.eat(op) {
            Ok(())
        } else {
            Err(syntax(self.offset(), format!("expected '{}'", op)))
        }
    }

    /// Consume the next token if it is one of `ops`.
    fn eat_any(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        let found = match self.peek() {
            Some(Token::Op(o)) => ops.iter().copied().find(|op| op == o),
            _ => None,
        };
        if found.is_some() {
            self.pos += 1;
        }
        found
    }

    /// Count one more level of the tree being built.
    fn deeper(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax(self.offset(), "expression nested too deeply"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        self.deeper()?;
        let expr = self.conditional();
        self.depth -= 1;
        expr
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        let condition = self.or()?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then = self.expression()?;
        self.expect(":")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let entered = self.depth;
        let mut left = self.and()?;
        while self.eat("||") {
            self.deeper()?;
            left = Expr::Or(Box::new(left), Box::new(self.and()?));
        }
        self.depth = entered;
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let entered = self.depth;
        let mut left = self.binary_level(0)?;
        while self.eat("&&") {
            self.deeper()?;
            left = Expr::And(Box::new(left), Box::new(self.binary_level(0)?));
        }
        self.depth = entered;
        Ok(left)
    }

    /// Left-associative binary operators, loosest first.
    fn binary_level(&mut self, level: usize) -> Result<Expr, ExpressionError> {
        const LEVELS: &[&[&str]] = &[
            &["===", "!==", "==", "!="],
            &["<=", ">=", "<", ">"],
            &["+", "-"],
            &["*", "/", "%"],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        // Chains build left-deep trees; each link counts toward MAX_DEPTH.
        let entered = self.depth;
        let mut left = self.binary_level(level + 1)?;
        while let Some(op) = self.eat_any(ops) {
            self.deeper()?;
            let right = self.binary_level(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = entered;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat("!") {
            return Ok(Expr::Not(Box::new(self.nested_unary()?)));
        }
        if self.eat("-") {
            return Ok(Expr::Negate(Box::new(self.nested_unary()?)));
        }
        self.postfix()
    }

    fn nested_unary(&mut self) -> Result<Expr, ExpressionError> {
        self.deeper()?;
        let expr = self.unary();
        self.depth -= 1;
        expr
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let entered = self.depth;
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                self.deeper()?;
                match self.tokens.get(self.pos) {
                    Some((_, Token::Ident(name))) => {
                        expr = Expr::Member(Box::new(expr), name.clone());
                        self.pos += 1;
                    }
                    _ => return Err(syntax(self.offset(), "expected property name after '.'")),
                }
            } else if self.eat("[") {
                self.deeper()?;
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                self.depth = entered;
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let offset = self.offset();
        let Some((_, token)) = self.tokens.get(self.pos).cloned() else {
            return Err(syntax(offset, "unexpected end of expression"));
        };
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(Expr::Literal(number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Name(name),
            }),
            Token::Op("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Op(op) => Err(syntax(offset, format!("unexpected '{}'", op))),
        }
    }
}

fn syntax(position: usize, message: impl Into<String>) -> ExpressionError {
    ExpressionError::Syntax {
        position,
        message: message.into(),
    }
}

// =============================================================================
// Evaluation
// =============================================================================

fn eval(expr: &Expr, bindings: &Bindings) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Name(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::Reference(name.clone())),
        Expr::Member(target, name) => member(&eval(target, bindings)?, name),
        Expr::Index(target, index) => {
            let target = eval(target, bindings)?;
            let index = eval(index, bindings)?;
            match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => Ok(n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .and_then(|f| items.get(f as usize).cloned())
                    .unwrap_or(Value::Null)),
                (Value::String(s), Value::Number(n)) => Ok(n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .and_then(|f| s.chars().nth(f as usize))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null)),
                _ => member(&target, &to_display(&index)),
            }
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, bindings)?))),
        Expr::Negate(inner) => Ok(number(-to_number(&eval(inner, bindings)?))),
        Expr::And(left, right) => {
            let left = eval(left, bindings)?;
            if truthy(&left) {
                eval(right, bindings)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = eval(left, bindings)?;
            if truthy(&left) {
                Ok(left)
            } else {
                eval(right, bindings)
            }
        }
        Expr::Conditional(condition, then, otherwise) => {
            if truthy(&eval(condition, bindings)?) {
                eval(then, bindings)
            } else {
                eval(otherwise, bindings)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, bindings)?;
            let right = eval(right, bindings)?;
            Ok(binary(op, &left, &right))
        }
    }
}

fn member(target: &Value, name: &str) -> Result<Value, ExpressionError> {
    match target {
        Value::Null => Err(ExpressionError::Type(format!(
            "cannot read property '{}' of null",
            name
        ))),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        _ => Ok(Value::Null),
    }
}

fn binary(op: &str, left: &Value, right: &Value) -> Value {
    match op {
        "+" if left.is_string() || right.is_string() => {
            Value::String(format!("{}{}", to_display(left), to_display(right)))
        }
        "+" => number(to_number(left) + to_number(right)),
        "-" => number(to_number(left) - to_number(right)),
        "*" => number(to_number(left) * to_number(right)),
        "/" => number(to_number(left) / to_number(right)),
        "%" => number(to_number(left) % to_number(right)),
        "==" => Value::Bool(loose_eq(left, right)),
        "!=" => Value::Bool(!loose_eq(left, right)),
        "===" => Value::Bool(strict_eq(left, right)),
        "!==" => Value::Bool(!strict_eq(left, right)),
        "<" | "<=" | ">" | ">=" => Value::Bool(compare(op, left, right)),
        _ => Value::Null,
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        "<" => ordering.is_lt(),
        "<=" => ordering.is_le(),
        ">" => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            left == right
        }
        _ => to_number(left) == to_number(right),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// JSON number for `f`; integral values become integers, non-finite
/// values become `null`.
fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
