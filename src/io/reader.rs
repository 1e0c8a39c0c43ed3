//! Fragment reading and front matter parsing
//!
//! Splits a markdown file into its YAML front matter and body. A malformed
//! front matter block does not fail the read: the fragment gets an empty
//! [`FrontMatter`] and the problem is returned as a [`Warning`].

use crate::core::{Fragment, FragmentKind, FrontMatter, Warning};
use crate::error::{ContextError, Result};
use gray_matter::{engine::YAML, Matter};
use log::debug;
use std::fs;
use std::path::Path;

/// Front matter reader
pub struct FragmentReader {
    matter: Matter<YAML>,
}

impl FragmentReader {
    pub fn new() -> Self {
        Self {
            matter: Matter::<YAML>::new(),
        }
    }

    /// Read a fragment from a file path
    pub fn read_file<P: AsRef<Path>>(
        &self,
        path: P,
        kind: FragmentKind,
    ) -> Result<(Fragment, Option<Warning>)> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ContextError::file_not_found(path));
        }

        debug!("Reading {} {}", kind, path.display());
        let content = fs::read_to_string(path)?;
        Ok(self.parse_content(&content, path, kind))
    }

    /// Parse a fragment from string content
    pub fn parse_content(
        &self,
        content: &str,
        path: &Path,
        kind: FragmentKind,
    ) -> (Fragment, Option<Warning>) {
        match self.extract_front_matter(content) {
            Ok((front_matter, body)) => (Fragment::new(path, kind, front_matter, body), None),
            Err((reason, body)) => {
                let warning = Warning::FrontMatterParse {
                    path: path.to_path_buf(),
                    reason,
                };
                (
                    Fragment::new(path, kind, FrontMatter::new(), body),
                    Some(warning),
                )
            }
        }
    }

    /// Split content into front matter and body. On failure the error carries
    /// the reason and the body to use.
    fn extract_front_matter(
        &self,
        content: &str,
    ) -> std::result::Result<(FrontMatter, String), (String, String)> {
        if !content.trim_start().starts_with("---") {
            return Ok((FrontMatter::new(), content.to_string()));
        }

        let parsed = self.matter.parse(content);
        if parsed.matter.trim().is_empty() {
            return Ok((FrontMatter::new(), parsed.content));
        }

        match serde_yaml::from_str::<serde_yaml::Value>(&parsed.matter) {
            Ok(serde_yaml::Value::Mapping(mapping)) => {
                Ok((FrontMatter::from_mapping(&mapping), parsed.content))
            }
            Ok(serde_yaml::Value::Null) => Ok((FrontMatter::new(), parsed.content)),
            Ok(_) => Err((
                "front matter is not a mapping".to_string(),
                parsed.content,
            )),
            Err(e) => Err((e.to_string(), parsed.content)),
        }
    }

    /// Check if a file is a markdown file
    pub fn is_markdown_file<P: AsRef<Path>>(path: P) -> bool {
        match path.as_ref().extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                matches!(ext.as_str(), "md" | "mdc")
            }
            None => false,
        }
    }
}

impl Default for FragmentReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".md").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_file_with_front_matter() {
        let content = r#"---
language: go
tags: [backend, api]
---
# Go style

Use gofmt."#;

        let file = create_test_file(content);
        let reader = FragmentReader::new();
        let (fragment, warning) = reader.read_file(file.path(), FragmentKind::Rule).unwrap();

        assert!(warning.is_none());
        assert_eq!(fragment.kind(), FragmentKind::Rule);
        assert_eq!(fragment.body().trim(), "# Go style\n\nUse gofmt.");
        assert_eq!(
            fragment.front_matter().string_value("language").as_deref(),
            Some("go")
        );
        assert!(fragment.front_matter().array_contains("tags", "api"));
    }

    #[test]
    fn test_read_file_without_front_matter() {
        let content = "# Hello\n\nJust markdown.";
        let file = create_test_file(content);
        let (fragment, warning) = FragmentReader::new()
            .read_file(file.path(), FragmentKind::Task)
            .unwrap();

        assert!(warning.is_none());
        assert!(fragment.front_matter().is_empty());
        assert_eq!(fragment.body(), content);
    }

    #[test]
    fn test_read_empty_file() {
        let file = create_test_file("");
        let (fragment, warning) = FragmentReader::new()
            .read_file(file.path(), FragmentKind::Rule)
            .unwrap();
        assert!(warning.is_none());
        assert_eq!(fragment.body(), "");
    }

    #[test]
    fn test_malformed_front_matter_is_a_warning() {
        let content = "---\ntitle: [unclosed\nlanguage: go\n---\nBody content";
        let path = Path::new("/repo/rule.md");
        let (fragment, warning) =
            FragmentReader::new().parse_content(content, path, FragmentKind::Rule);

        assert!(fragment.front_matter().is_empty());
        assert!(fragment.body().contains("Body content"));
        assert!(matches!(
            warning,
            Some(Warning::FrontMatterParse { path, .. }) if path == Path::new("/repo/rule.md")
        ));
    }

    #[test]
    fn test_non_mapping_front_matter_is_a_warning() {
        let content = "---\n- a\n- b\n---\nBody";
        let (fragment, warning) = FragmentReader::new().parse_content(
            content,
            Path::new("list.md"),
            FragmentKind::Rule,
        );
        assert!(fragment.front_matter().is_empty());
        assert!(warning.is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = FragmentReader::new().read_file("/nonexistent/task.md", FragmentKind::Task);
        assert!(matches!(result, Err(ContextError::FileNotFound { .. })));
    }

    #[test]
    fn test_is_markdown_file() {
        assert!(FragmentReader::is_markdown_file("rule.md"));
        assert!(FragmentReader::is_markdown_file("rule.MDC"));
        assert!(!FragmentReader::is_markdown_file("notes.txt"));
        assert!(!FragmentReader::is_markdown_file(".cursorrules"));
    }
}
