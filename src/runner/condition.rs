//! Condition evaluation
//!
//! Steps may carry a guard such as `THIS_PLATFORM == "linux" and not exists("${TARGET_JRE_NAME}")`.
//! The expression is parsed into an [`Expr`] tree and evaluated against the
//! [`ExecutionContext`]. Evaluation has no side effects; filesystem checks go
//! through the context's path predicates.
//!
//! Grammar:
//!
//! ```text
//! expr    := or
//! or      := and (("or" | "||") and)*
//! and     := unary (("and" | "&&") unary)*
//! unary   := ("not" | "!") unary | compare
//! compare := primary (("==" | "!=") primary)?
//! primary := STRING | NUMBER | "true" | "false" | IDENT
//!          | IDENT "(" expr ")" | "(" expr ")"
//! ```

use crate::error::{ConditionError, ConditionResult};
use crate::runner::{interpolate_context, ExecutionContext};
use std::fmt;

// AST

/// A literal or computed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value {
    /// Truthiness when a non-boolean is used as a condition
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }

    fn as_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Num(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.as_text()),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
}

/// Context-provided predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `defined(NAME)`: the context has a value for NAME
    Defined,
    /// `exists(path)`
    Exists,
    /// `is_file(path)`
    IsFile,
    /// `is_dir(path)`
    IsDir,
}

impl Predicate {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "defined" => Some(Predicate::Defined),
            "exists" => Some(Predicate::Exists),
            "is_file" => Some(Predicate::IsFile),
            "is_dir" => Some(Predicate::IsDir),
            _ => None,
        }
    }
}

/// Parsed guard expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Predicate {
        predicate: Predicate,
        arg: Box<Expr>,
    },
}

impl Expr {
    /// Names of all variables the expression may read
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => names.push(name),
            Expr::Compare { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Not(inner) => inner.collect_variables(names),
            Expr::Predicate { arg, .. } => arg.collect_variables(names),
        }
    }
}

// Lexer

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Num(f64),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Eq,
    NotEq,
    LParen,
    RParen,
}

fn syntax(offset: usize, message: impl Into<String>) -> ConditionError {
    ConditionError::Syntax {
        offset,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> ConditionResult<Vec<(Token, usize)>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, offset));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, offset));
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push((Token::Eq, offset));
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push((Token::NotEq, offset));
                i += 2;
            }
            '!' => {
                tokens.push((Token::Not, offset));
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push((Token::And, offset));
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push((Token::Or, offset));
                i += 2;
            }
            '"' | '\'' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    let Some(&(_, c)) = chars.get(i) else {
                        return Err(syntax(offset, "unterminated string literal"));
                    };
                    i += 1;
                    match c {
                        c if c == quote => break,
                        '\\' => {
                            let Some(&(esc_offset, escaped)) = chars.get(i) else {
                                return Err(syntax(offset, "unterminated string literal"));
                            };
                            i += 1;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                '\\' | '"' | '\'' => escaped,
                                other => {
                                    return Err(syntax(
                                        esc_offset,
                                        format!("unknown escape '\\{}'", other),
                                    ))
                                }
                            });
                        }
                        c => value.push(c),
                    }
                }
                tokens.push((Token::Str(value), offset));
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while chars
                    .get(i)
                    .is_some_and(|(_, c)| c.is_ascii_digit() || *c == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(offset, format!("invalid number '{}'", text)))?;
                tokens.push((Token::Num(number), offset));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while chars
                    .get(i)
                    .is_some_and(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|(_, c)| c).collect();
                let token = match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                };
                tokens.push((token, offset));
            }
            other => {
                return Err(syntax(offset, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

// Parser

/// Deepest allowed nesting of parentheses, `not` and predicate calls
const MAX_NESTING: usize = 64;

/// Longest accepted expression, in tokens; bounds the depth of `and`/`or` chains
const MAX_TOKENS: usize = 1024;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, o)| *o).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> ConditionResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(syntax(self.offset(), format!("expected {}", what)))
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ConditionResult<T>,
    ) -> ConditionResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(syntax(self.offset(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> ConditionResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ConditionResult<Expr> {
        let mut left = self.parse_unary()?;
        while self.eat(&Token::And) {
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ConditionResult<Expr> {
        if self.eat(&Token::Not) {
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> ConditionResult<Expr> {
        let left = self.parse_primary()?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::NotEq,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_primary()?;
        Ok(Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_primary(&mut self) -> ConditionResult<Expr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(Value::Num(n))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Variable(name));
                }
                let predicate = Predicate::from_name(&name)
                    .ok_or_else(|| ConditionError::UnknownPredicate(name.clone()))?;
                let arg = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen, "')' after predicate argument")?;
                Ok(Expr::Predicate {
                    predicate,
                    arg: Box::new(arg),
                })
            }
            Some(Token::LParen) => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(token) => Err(syntax(offset, format!("unexpected token {:?}", token))),
            None => Err(syntax(offset, "unexpected end of expression")),
        }
    }
}

/// Parse a guard expression
pub fn parse(input: &str) -> ConditionResult<Expr> {
    if input.trim().is_empty() {
        return Err(ConditionError::Empty);
    }

    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(syntax(
            tokens[MAX_TOKENS].1,
            format!("expression longer than {} tokens", MAX_TOKENS),
        ));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if parser.pos < parser.tokens.len() {
        return Err(syntax(parser.offset(), "unexpected trailing input"));
    }

    Ok(expr)
}

// Evaluation

/// Parse and evaluate a guard expression
pub fn evaluate(input: &str, ctx: &ExecutionContext) -> ConditionResult<bool> {
    let expr = parse(input)?;
    evaluate_expr(&expr, ctx)
}

/// Evaluate a parsed expression to a boolean
pub fn evaluate_expr(expr: &Expr, ctx: &ExecutionContext) -> ConditionResult<bool> {
    match expr {
        Expr::And(left, right) => {
            Ok(evaluate_expr(left, ctx)? && evaluate_expr(right, ctx)?)
        }
        Expr::Or(left, right) => Ok(evaluate_expr(left, ctx)? || evaluate_expr(right, ctx)?),
        Expr::Not(inner) => Ok(!evaluate_expr(inner, ctx)?),
        other => Ok(value_of(other, ctx)?.is_truthy()),
    }
}

fn value_of(expr: &Expr, ctx: &ExecutionContext) -> ConditionResult<Value> {
    match expr {
        Expr::Literal(Value::Str(s)) => Ok(Value::Str(interpolate_context(s, ctx.vars())?)),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => ctx
            .get(name)
            .map(|v| Value::Str(v.to_string()))
            .ok_or_else(|| ConditionError::UndefinedVariable(name.clone())),
        Expr::Compare { op, left, right } => {
            let equal = values_equal(&value_of(left, ctx)?, &value_of(right, ctx)?);
            Ok(Value::Bool(match op {
                CompareOp::Eq => equal,
                CompareOp::NotEq => !equal,
            }))
        }
        Expr::Predicate { predicate, arg } => {
            let result = match predicate {
                Predicate::Defined => match arg.as_ref() {
                    Expr::Variable(name) => ctx.contains(name),
                    other => ctx.contains(&value_of(other, ctx)?.as_text()),
                },
                Predicate::Exists => ctx.path_exists(&value_of(arg, ctx)?.as_text()),
                Predicate::IsFile => ctx.path_is_file(&value_of(arg, ctx)?.as_text()),
                Predicate::IsDir => ctx.path_is_dir(&value_of(arg, ctx)?.as_text()),
            };
            Ok(Value::Bool(result))
        }
        Expr::And(..) | Expr::Or(..) | Expr::Not(..) => {
            Ok(Value::Bool(evaluate_expr(expr, ctx)?))
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Num(n), Value::Str(s)) | (Value::Str(s), Value::Num(n)) => {
            s.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
        }
        (Value::Bool(b), Value::Str(s)) | (Value::Str(s), Value::Bool(b)) => {
            s.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Value::Bool(b), Value::Num(n)) | (Value::Num(n), Value::Bool(b)) => {
            *b == (*n != 0.0)
        }
    }
}
