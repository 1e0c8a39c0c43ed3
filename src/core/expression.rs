//! Boolean selector expressions
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := and (("||" | "or") and)*
//! and     := unary (("&&" | "and") unary)*
//! unary   := ("!" | "not") unary | primary
//! primary := "(" expr ")" | "has(" key ")" | "true" | "false"
//!          | key ("==" | "=" | "!=") value
//! value   := quoted string | bare word
//! ```
//!
//! Lexing and parsing are chumsky combinators over characters and tokens.
//!
//! A comparison against a key the front matter does not declare cannot be
//! evaluated. Such an expression counts as a match, the same permissive bias
//! the flat selectors have for missing keys. Use `has(key)` to guard.

use crate::core::front_matter::FrontMatter;
use crate::error::{ContextError, Result};
use chumsky::prelude::*;
use chumsky::Stream;
use log::debug;
use std::fmt;
use std::hash::Hash;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// Parsed selector expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Literal(bool),
    Has(String),
    Compare {
        key: String,
        op: CompareOp,
        value: String,
    },
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    MissingField(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(key) => write!(f, "field '{}' is not present", key),
        }
    }
}

fn first_error<T: fmt::Display + Hash + Eq>(source: &str, errors: Vec<Simple<T>>) -> ContextError {
    let reason = errors
        .first()
        .map_or_else(|| "malformed expression".to_string(), ToString::to_string);
    ContextError::invalid_expression(source, reason)
}

impl Expression {
    /// Parse an expression
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = lexer()
            .parse(source)
            .map_err(|errors| first_error(source, errors))?;
        let eoi = source.len()..source.len() + 1;
        parser()
            .parse(Stream::from_iter(eoi, tokens.into_iter()))
            .map_err(|errors| first_error(source, errors))
    }

    /// Evaluate against front matter
    pub fn evaluate(&self, fm: &FrontMatter) -> std::result::Result<bool, EvalError> {
        match self {
            Self::Literal(b) => Ok(*b),
            Self::Has(key) => Ok(fm.contains_key(key)),
            Self::Compare { key, op, value } => {
                let actual = fm
                    .get(key)
                    .ok_or_else(|| EvalError::MissingField(key.clone()))?;
                Ok(match op {
                    CompareOp::Eq => actual.contains(value),
                    CompareOp::Ne => !actual.contains(value),
                })
            }
            Self::Not(inner) => Ok(!inner.evaluate(fm)?),
            Self::And(left, right) => Ok(left.evaluate(fm)? && right.evaluate(fm)?),
            Self::Or(left, right) => Ok(left.evaluate(fm)? || right.evaluate(fm)?),
        }
    }

    /// Evaluate, treating evaluation failure as a match
    pub fn matches(&self, fm: &FrontMatter) -> bool {
        self.evaluate(fm).unwrap_or_else(|err| {
            debug!("Selector expression not evaluable ({}), treating as match", err);
            true
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Word(String),
    Quoted(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::And => write!(f, "'&&'"),
            Self::Or => write!(f, "'||'"),
            Self::Not => write!(f, "'!'"),
            Self::Eq => write!(f, "'=='"),
            Self::Ne => write!(f, "'!='"),
            Self::Word(w) => write!(f, "'{}'", w),
            Self::Quoted(q) => write!(f, "\"{}\"", q),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

fn lexer() -> impl Parser<char, Vec<(Token, Range<usize>)>, Error = Simple<char>> {
    let op = choice::<_, Simple<char>>((
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just("==").to(Token::Eq),
        just("!=").to(Token::Ne),
        just('=').to(Token::Eq),
        just('!').to(Token::Not),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    let word = filter(|c: &char| is_word_char(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|word| match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Word(word),
        });

    choice::<_, Simple<char>>((
        op,
        quoted('"').map(Token::Quoted),
        quoted('\'').map(Token::Quoted),
        word,
    ))
    .map_with_span(|token, span| (token, span))
    .padded()
    .repeated()
    .then_ignore(end())
}

/// A quoted string; a backslash takes the next character literally
fn quoted(quote: char) -> impl Parser<char, String, Error = Simple<char>> {
    let escaped = just('\\').ignore_then(any());
    let plain = filter(move |c: &char| *c != quote && *c != '\\');
    just(quote)
        .ignore_then(escaped.or(plain).repeated().collect::<String>())
        .then_ignore(just(quote))
}

fn parser() -> impl Parser<Token, Expression, Error = Simple<Token>> {
    recursive(|expr| {
        let key = select! { Token::Word(word) => word };
        let value = select! { Token::Word(text) => text, Token::Quoted(text) => text };

        let has = just(Token::Word("has".to_string()))
            .ignore_then(
                value
                    .clone()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(Expression::Has);

        let op = choice::<_, Simple<Token>>((
            just(Token::Eq).to(CompareOp::Eq),
            just(Token::Ne).to(CompareOp::Ne),
        ));
        let compare = key
            .clone()
            .then(op)
            .then(value)
            .map(|((key, op), value)| Expression::Compare { key, op, value });

        let literal = key.try_map(|word, span| match word.as_str() {
            "true" => Ok(Expression::Literal(true)),
            "false" => Ok(Expression::Literal(false)),
            _ => Err(Simple::custom(
                span,
                format!("expected a comparison after '{}'", word),
            )),
        });

        let primary = choice::<_, Simple<Token>>((
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
            has,
            compare,
            literal,
        ));

        let unary = just(Token::Not)
            .repeated()
            .then(primary)
            .foldr(|_, inner| Expression::Not(Box::new(inner)));

        let and = unary
            .clone()
            .then(just(Token::And).ignore_then(unary).repeated())
            .foldl(|left, right| Expression::And(Box::new(left), Box::new(right)));

        and.clone()
            .then(just(Token::Or).ignore_then(and).repeated())
            .foldl(|left, right| Expression::Or(Box::new(left), Box::new(right)))
    })
    .then_ignore(end())
}
