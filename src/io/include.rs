//! File inclusion
//!
//! Renders a file as a labelled, fenced block. Used for `@path` references in
//! fragment bodies and for explicit attachments.

use crate::error::{ContextError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Fence language used when the extension says nothing
pub const DEFAULT_LANGUAGE: &str = "text";

/// Fence language for a path, derived from its extension
pub fn language_tag(path: &Path) -> String {
    let Some(ext) = path.extension() else {
        return DEFAULT_LANGUAGE.to_string();
    };
    let ext = ext.to_string_lossy().to_lowercase();
    let tag = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "rb" => "ruby",
        "h" => "c",
        "cc" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "kt" | "kts" => "kotlin",
        "sh" => "bash",
        "yml" => "yaml",
        "md" | "mdc" | "markdown" => "markdown",
        "htm" => "html",
        "txt" | "" => DEFAULT_LANGUAGE,
        other => other,
    };
    tag.to_string()
}

/// Render `content` as:
///
/// ````text
/// File: <label>
/// ```<lang>
/// <content>
/// ```
/// ````
pub fn render_file_block(label: &str, lang: &str, content: &str) -> String {
    let mut block = String::with_capacity(content.len() + label.len() + 32);
    block.push_str("File: ");
    block.push_str(label);
    block.push_str("\n```");
    block.push_str(lang);
    block.push('\n');
    block.push_str(content);
    if !content.ends_with('\n') {
        block.push('\n');
    }
    block.push_str("```\n");
    block
}

/// A file block set off from the text around it, for splicing into a body
/// in place of an `@path` reference
pub fn render_reference_block(label: &str, lang: &str, content: &str) -> String {
    format!("\n\n{}\n", render_file_block(label, lang, content))
}

/// Resolve a reference against `base` unless it is already absolute
pub fn resolve_reference(reference: &str, base: &Path) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Read an explicitly requested file and render it as a block labelled
/// with `label`, the path as the user wrote it
///
/// A missing file is fatal here, unlike a reference inside a body.
pub fn render_attachment(label: &str, path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(ContextError::file_not_found(path));
    }
    let content = fs::read_to_string(path)?;
    Ok(render_file_block(label, &language_tag(path), &content))
}
