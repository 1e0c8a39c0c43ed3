//! Parameter mapping used by `${name}` substitution
//!
//! Parameters come from `-p key=value` flags and from the inline arguments of
//! a nested fragment reference (`/deploy env="prod" fast`). Inline arguments
//! support single and double quotes, backslash escapes and positional words.
//! Positional words are exposed as `1`, `2`, ... and all together as
//! `ARGUMENTS`. The argument grammar is a small chumsky parser.

use crate::error::{ContextError, Result};
use chumsky::prelude::*;
use std::collections::BTreeMap;

/// Key holding all positional arguments, space separated
pub const ARGUMENTS_KEY: &str = "ARGUMENTS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and insert a `key=value` flag; key and value are trimmed
    pub fn add(&mut self, input: &str) -> Result<()> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| ContextError::invalid_parameter(input, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ContextError::invalid_parameter(input, "empty key"));
        }
        self.insert(key, value.trim());
        Ok(())
    }

    /// Build from raw `key=value` flags
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut params = Self::new();
        for raw in args {
            params.add(raw.as_ref())?;
        }
        Ok(params)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    /// A copy of `self` overlaid with `other`; `other` wins on conflicts
    pub fn merged(&self, other: &Params) -> Params {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Parse an inline argument list such as `env="prod" region=eu fast`
    pub fn parse_arguments(input: &str) -> Result<Self> {
        let mut params = Self::new();
        let mut positional = Vec::new();

        for word in split_words(input)? {
            match word {
                Word::Named(key, value) => {
                    if key.is_empty() {
                        return Err(ContextError::invalid_parameter(input, "empty key"));
                    }
                    params.insert(key, value);
                }
                Word::Positional(value) => positional.push(value),
            }
        }

        if !positional.is_empty() {
            for (index, value) in positional.iter().enumerate() {
                params.insert((index + 1).to_string(), value.clone());
            }
            params.insert(ARGUMENTS_KEY, positional.join(" "));
        }
        Ok(params)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Word {
    Named(String, String),
    Positional(String),
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Split on whitespace and commas, honouring quotes and escapes
fn split_words(input: &str) -> Result<Vec<Word>> {
    arguments().parse(input).map_err(|errors| {
        let reason = errors
            .first()
            .map_or_else(|| "malformed arguments".to_string(), ToString::to_string);
        ContextError::invalid_parameter(input, reason)
    })
}

/// `word (sep word)*`, where a word is `key=value` or a bare positional.
/// Only the first unquoted `=` of a word splits it.
fn arguments() -> impl Parser<char, Vec<Word>, Error = Simple<char>> {
    let separators = filter(|c: &char| is_separator(*c)).repeated();

    let named = word_text(false)
        .then_ignore(just('='))
        .then(word_text(true))
        .map(|(key, value)| Word::Named(key.trim().to_string(), value));
    let positional = word_piece(false)
        .repeated()
        .at_least(1)
        .map(|pieces| Word::Positional(pieces.concat()));

    separators
        .clone()
        .ignore_then(choice::<_, Simple<char>>((named, positional)))
        .repeated()
        .then_ignore(separators)
        .then_ignore(end())
}

fn word_text(allow_equals: bool) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    word_piece(allow_equals)
        .repeated()
        .map(|pieces| pieces.concat())
}

/// One quoted run, escape or plain character of a word
fn word_piece(allow_equals: bool) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    let plain = filter(move |c: &char| {
        !is_separator(*c) && !matches!(*c, '"' | '\'' | '\\') && (allow_equals || *c != '=')
    });

    choice::<_, Simple<char>>((
        quoted('"'),
        quoted('\''),
        escape().map(String::from),
        plain.map(String::from),
    ))
}

fn quoted(quote: char) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    let inner = filter(move |c: &char| *c != quote && *c != '\\');
    just(quote)
        .ignore_then(escape().or(inner).repeated().collect::<String>())
        .then_ignore(just(quote))
}

fn escape() -> impl Parser<char, char, Error = Simple<char>> + Clone {
    just('\\').ignore_then(any().or_not()).map(unescape)
}

fn unescape(next: Option<char>) -> char {
    match next {
        Some('n') => '\n',
        Some('t') => '\t',
        Some('r') => '\r',
        Some(other) => other,
        None => '\\',
    }
}
