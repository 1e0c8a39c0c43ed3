//! Core value types for front matter handling
//!
//! Front matter values that selectors can address are strings, booleans or
//! ordered lists of strings. Everything else YAML can express is coerced into
//! one of those shapes (numbers become their textual form, a bare `key:`
//! becomes the empty string) or dropped (nested mappings are not
//! selector-addressable).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A selector-addressable front matter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontMatterValue {
    Bool(bool),
    String(String),
    List(Vec<String>),
}

impl FrontMatterValue {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Create a list value
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Convert a YAML value, returning `None` for shapes selectors cannot address
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_yaml::Value::Sequence(seq) => {
                Some(Self::List(seq.iter().filter_map(scalar_text).collect()))
            }
            serde_yaml::Value::Mapping(_) => None,
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            // Declared without a value: present, and equal to nothing but ""
            serde_yaml::Value::Null => Some(Self::String(String::new())),
            other => scalar_text(other).map(Self::String),
        }
    }

    /// Check if this value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Try to borrow as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to read as a boolean
    ///
    /// The strings `"true"` and `"false"` count as booleans too.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => s.parse().ok(),
            Self::List(_) => None,
        }
    }

    /// Try to borrow as a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Textual form used when comparing against selector values
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }

    /// True if a list holds `target` or a scalar's textual form equals it
    pub fn contains(&self, target: &str) -> bool {
        match self {
            Self::List(items) => items.iter().any(|item| item == target),
            Self::Bool(b) => (if *b { "true" } else { "false" }) == target,
            Self::String(s) => s == target,
        }
    }
}

impl From<&str> for FrontMatterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FrontMatterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FrontMatterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FrontMatterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl fmt::Display for FrontMatterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Textual form of a scalar YAML value
pub(crate) fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => scalar_text(&tagged.value),
        serde_yaml::Value::Null | serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_from_yaml_scalars() {
        assert_eq!(
            FrontMatterValue::from_yaml(&yaml("go")),
            Some(FrontMatterValue::string("go"))
        );
        assert_eq!(
            FrontMatterValue::from_yaml(&yaml("true")),
            Some(FrontMatterValue::Bool(true))
        );
        assert_eq!(
            FrontMatterValue::from_yaml(&yaml("42")),
            Some(FrontMatterValue::string("42"))
        );
        assert_eq!(
            FrontMatterValue::from_yaml(&yaml("~")),
            Some(FrontMatterValue::string(""))
        );
    }

    #[test]
    fn test_from_yaml_sequences_and_mappings() {
        assert_eq!(
            FrontMatterValue::from_yaml(&yaml("[go, 1, false]")),
            Some(FrontMatterValue::list(["go", "1", "false"]))
        );
        assert_eq!(FrontMatterValue::from_yaml(&yaml("{a: b}")), None);
    }

    #[test]
    fn test_contains() {
        let list = FrontMatterValue::list(["go", "rust"]);
        assert!(list.contains("rust"));
        assert!(!list.contains("java"));
        assert!(!list.contains("go,rust"));

        assert!(FrontMatterValue::Bool(true).contains("true"));
        assert!(!FrontMatterValue::Bool(true).contains("yes"));
        assert!(FrontMatterValue::string("go").contains("go"));
    }

    #[test]
    fn test_as_bool_accepts_textual_booleans() {
        assert_eq!(FrontMatterValue::string("false").as_bool(), Some(false));
        assert_eq!(FrontMatterValue::string("nope").as_bool(), None);
        assert_eq!(FrontMatterValue::Bool(true).as_bool(), Some(true));
    }
}
