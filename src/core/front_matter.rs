//! Front matter model
//!
//! The YAML header of a fragment, flattened to the top-level keys selectors
//! can address plus the declared `selectors` mapping.

use crate::core::value::{scalar_text, FrontMatterValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// Key holding the selectors a task or command contributes to the include set
pub const SELECTORS_KEY: &str = "selectors";
/// Key holding the logical name other fragments can replace
pub const NAME_KEY: &str = "name";
/// Key holding the names this fragment supersedes
pub const REPLACES_KEY: &str = "replaces";
/// Key that turns body expansion off when `false`
pub const EXPAND_KEY: &str = "expand";
/// Auto-selector key carrying the active task name
pub const TASK_NAME_KEY: &str = "task_name";
/// Auto-selector key set in resume mode
pub const RESUME_KEY: &str = "resume";
/// Task key naming the target agent; also the auto-selector key for it
pub const AGENT_KEY: &str = "agent";

/// Parsed metadata of one fragment
///
/// Only top-level keys are addressable. The `selectors` mapping is the single
/// nested shape kept, and lives in its own field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontMatter {
    entries: BTreeMap<String, FrontMatterValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    selectors: BTreeMap<String, Vec<String>>,
}

impl FrontMatter {
    /// Create an empty front matter
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a YAML mapping
    ///
    /// Non-string keys and nested mappings other than `selectors` are skipped.
    pub fn from_mapping(mapping: &serde_yaml::Mapping) -> Self {
        let mut front_matter = Self::new();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else { continue };
            if key == SELECTORS_KEY {
                if let serde_yaml::Value::Mapping(declared) = value {
                    front_matter.selectors = selectors_from_mapping(declared);
                }
                continue;
            }
            if let Some(value) = FrontMatterValue::from_yaml(value) {
                front_matter.entries.insert(key.to_string(), value);
            }
        }
        front_matter
    }

    /// Builder-style insert, mostly useful in tests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FrontMatterValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style selector declaration
    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Textual form of the value at `key`; booleans become `"true"`/`"false"`
    pub fn string_value(&self, key: &str) -> Option<String> {
        self.get(key).map(FrontMatterValue::to_text)
    }

    /// True if the value at `key` is a list containing `target`, or a scalar
    /// whose textual form equals `target`
    pub fn array_contains(&self, key: &str, target: &str) -> bool {
        self.get(key).is_some_and(|value| value.contains(target))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.selectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FrontMatterValue)> {
        self.entries.iter()
    }

    /// Selectors declared under the `selectors` key
    pub fn selectors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.selectors
    }

    /// Declared logical name
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY)
            .and_then(FrontMatterValue::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Names listed under `replaces`, either comma-separated or as a list
    pub fn replaces(&self) -> Vec<String> {
        let raw: Vec<String> = match self.get(REPLACES_KEY) {
            Some(FrontMatterValue::List(items)) => items.clone(),
            Some(FrontMatterValue::String(s)) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        raw.into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Whether the body should go through expansion; defaults to true
    pub fn expand_enabled(&self) -> bool {
        self.get(EXPAND_KEY)
            .and_then(FrontMatterValue::as_bool)
            .unwrap_or(true)
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description").and_then(FrontMatterValue::as_str)
    }

    /// Agent a task asks for, if it names one
    pub fn agent(&self) -> Option<&str> {
        self.get(AGENT_KEY)
            .and_then(FrontMatterValue::as_str)
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
    }
}

fn selectors_from_mapping(mapping: &serde_yaml::Mapping) -> BTreeMap<String, Vec<String>> {
    let mut selectors = BTreeMap::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str() else { continue };
        let values: Vec<String> = match value {
            serde_yaml::Value::Sequence(seq) => seq.iter().filter_map(scalar_text).collect(),
            other => scalar_text(other).into_iter().collect(),
        };
        selectors.insert(key.trim().to_string(), values);
    }
    selectors
}
