//! Selector engine
//!
//! Decides whether a fragment takes part in the assembled context, based on
//! its front matter. Two strategies implement [`Matcher`]:
//!
//! - [`SelectorSet`]: flat include/exclude criteria. Repeated keys are OR,
//!   distinct keys are AND, and a key the fragment does not declare never
//!   filters it out.
//! - [`ExpressionMatcher`]: a boolean expression (see
//!   [`Expression`](crate::core::expression::Expression)) combined with the
//!   same include/exclude sets.

use crate::core::expression::Expression;
use crate::core::front_matter::{FrontMatter, RESUME_KEY, TASK_NAME_KEY};
use crate::error::{ContextError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Anything that can accept or reject a fragment by its front matter
pub trait Matcher {
    fn matches(&self, front_matter: &FrontMatter) -> bool;
}

/// Key to OR-set of accepted values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
    criteria: BTreeMap<String, BTreeSet<String>>,
}

impl Selectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a `key=value` criterion
    ///
    /// Key and value are trimmed. An empty value registers the key with no
    /// accepted values unless the key already has some.
    pub fn add(&mut self, input: &str) -> Result<()> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| ContextError::invalid_selector(input, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ContextError::invalid_selector(input, "empty key"));
        }
        let value = value.trim();
        if value.is_empty() {
            self.criteria.entry(key.to_string()).or_default();
        } else {
            self.set_value(key, value);
        }
        Ok(())
    }

    /// Register one accepted value for `key`
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.criteria
            .entry(key.into())
            .or_default()
            .insert(value.into());
    }

    /// True if `value` is registered for `key`
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.criteria
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    /// Register every value of a front matter `selectors` mapping
    pub fn merge_declared(&mut self, declared: &BTreeMap<String, Vec<String>>) {
        for (key, values) in declared {
            for value in values {
                self.set_value(key.clone(), value.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.criteria.keys()
    }

    /// Every key is either absent from the front matter or matches one of its
    /// values. An empty set matches everything.
    pub fn matches_includes(&self, fm: &FrontMatter) -> bool {
        self.criteria
            .iter()
            .all(|(key, values)| !fm.contains_key(key) || key_matches(key, values, fm))
    }

    /// Some key is present in the front matter and matches one of its values.
    /// An empty set excludes nothing.
    pub fn matches_excludes(&self, fm: &FrontMatter) -> bool {
        self.criteria
            .iter()
            .any(|(key, values)| fm.contains_key(key) && key_matches(key, values, fm))
    }
}

/// True if the front matter value at `key` equals one of `values`.
/// Lists match when any element does.
fn key_matches(key: &str, values: &BTreeSet<String>, fm: &FrontMatter) -> bool {
    values.iter().any(|value| fm.array_contains(key, value))
}

impl FromStr for Selectors {
    type Err = ContextError;

    /// Parse a single `key=value` criterion
    fn from_str(s: &str) -> Result<Self> {
        let mut selectors = Self::new();
        selectors.add(s)?;
        Ok(selectors)
    }
}

impl fmt::Display for Selectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .criteria
            .iter()
            .map(|(key, values)| {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                if values.len() == 1 {
                    format!("{}={}", key, values[0])
                } else {
                    format!("{}=[{}]", key, values.join(" "))
                }
            })
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Include and exclude criteria for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSet {
    pub include: Selectors,
    pub exclude: Selectors,
}

impl SelectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `key=value` include and exclude flags
    pub fn from_args<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut set = Self::new();
        for raw in include {
            set.include.add(raw.as_ref())?;
        }
        for raw in exclude {
            set.exclude.add(raw.as_ref())?;
        }
        Ok(set)
    }

    /// Add the auto-selectors derived from the invocation context
    ///
    /// They only ever widen the include side; exclusion stays exactly what
    /// the user asked for.
    pub fn add_auto_selectors(&mut self, task_name: &str, resume: bool) {
        self.include.set_value(TASK_NAME_KEY, task_name);
        if resume {
            self.include.set_value(RESUME_KEY, "true");
        }
    }

    /// Merge a task's or command's declared `selectors` into the include side
    pub fn merge_declared(&mut self, declared: &BTreeMap<String, Vec<String>>) {
        self.include.merge_declared(declared);
    }
}

impl Matcher for SelectorSet {
    fn matches(&self, front_matter: &FrontMatter) -> bool {
        self.include.matches_includes(front_matter) && !self.exclude.matches_excludes(front_matter)
    }
}

/// Expression strategy: the expression must hold, on top of the flat sets
#[derive(Debug, Clone)]
pub struct ExpressionMatcher {
    pub expression: Expression,
    pub selectors: SelectorSet,
}

impl Matcher for ExpressionMatcher {
    fn matches(&self, front_matter: &FrontMatter) -> bool {
        self.selectors.matches(front_matter) && self.expression.matches(front_matter)
    }
}

/// Matching strategy chosen at configuration time
#[derive(Debug, Clone, Default)]
pub enum SelectorMode {
    #[default]
    Flat,
    Expression(Expression),
}

impl SelectorMode {
    /// Build the strategy over the final selector set
    pub fn into_matcher(self, selectors: SelectorSet) -> Box<dyn Matcher> {
        match self {
            Self::Flat => Box::new(selectors),
            Self::Expression(expression) => Box::new(ExpressionMatcher {
                expression,
                selectors,
            }),
        }
    }
}
