//! Fragment model
//!
//! A [`Fragment`] is one discovered markdown file: its front matter and its
//! raw, unexpanded body. Expansion consumes a fragment and yields an
//! [`ExpandedFragment`], which has no way back into the pipeline.

use crate::core::front_matter::FrontMatter;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What role a fragment plays in the assembled context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// Reusable rule or memory snippet, filtered by selectors
    Rule,
    /// The task prompt selected by name
    Task,
    /// A snippet referenced from a task with `/name`
    Command,
    /// A `SKILL.md` advertised to the agent by name and description
    Skill,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule => write!(f, "rule"),
            Self::Task => write!(f, "task"),
            Self::Command => write!(f, "command"),
            Self::Skill => write!(f, "skill"),
        }
    }
}

/// A discovered, unexpanded unit of context
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    path: PathBuf,
    kind: FragmentKind,
    front_matter: FrontMatter,
    body: String,
}

impl Fragment {
    pub fn new(
        path: impl Into<PathBuf>,
        kind: FragmentKind,
        front_matter: FrontMatter,
        body: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            front_matter,
            body: body.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    /// Raw body, exactly as read from disk
    pub fn body(&self) -> &str {
        &self.body
    }

    /// File stem, which is how tasks and commands are referenced
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A fragment whose body has been through the expansion pipeline
#[derive(Debug, Clone, Serialize)]
pub struct ExpandedFragment {
    pub path: PathBuf,
    pub kind: FragmentKind,
    pub front_matter: FrontMatter,
    pub content: String,
    pub tokens: usize,
}

impl ExpandedFragment {
    pub(crate) fn new(fragment: Fragment, content: String) -> Self {
        let tokens = estimate_tokens(&content);
        Self {
            path: fragment.path,
            kind: fragment.kind,
            front_matter: fragment.front_matter,
            content,
            tokens,
        }
    }
}

/// Rough token estimate: four characters per token, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
