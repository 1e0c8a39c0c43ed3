//! Skills
//!
//! A skill is a directory under `.agents/skills/` holding a `SKILL.md`. Its
//! body is not inlined. The agent is only told which skills exist, by name
//! and description, and reads the file itself when it needs one.

use crate::core::fragment::{estimate_tokens, Fragment};
use crate::core::front_matter::NAME_KEY;
use serde::Serialize;
use std::path::PathBuf;

pub const SKILL_FILE: &str = "SKILL.md";

const MAX_NAME_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1024;
const MAX_COMPATIBILITY_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Location of the `SKILL.md`
    pub path: PathBuf,
    /// Estimated tokens of the skill body
    pub tokens: usize,
}

impl Skill {
    /// Validate a `SKILL.md` fragment, returning why it is unusable on failure
    pub fn from_fragment(fragment: &Fragment) -> Result<Self, String> {
        let front_matter = fragment.front_matter();
        let name = front_matter
            .string_value(NAME_KEY)
            .map(|name| name.trim().to_string())
            .unwrap_or_default();
        validate_name(&name)?;

        let directory = fragment
            .path()
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        if directory != name {
            return Err(format!(
                "name '{}' must match parent directory name '{}'",
                name, directory
            ));
        }

        let description = front_matter
            .description()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        validate_description(&description)?;

        if let Some(compatibility) = front_matter.string_value("compatibility") {
            if compatibility.chars().count() > MAX_COMPATIBILITY_LEN {
                return Err(format!(
                    "compatibility must be at most {} characters",
                    MAX_COMPATIBILITY_LEN
                ));
            }
        }

        Ok(Self {
            name,
            description,
            path: fragment.path().to_path_buf(),
            tokens: estimate_tokens(fragment.body()),
        })
    }
}

/// Lowercase letters, digits and single hyphens, 1 to 64 characters
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(format!("name must be 1-{} characters", MAX_NAME_LEN));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("name may only contain lowercase letters, digits and hyphens".to_string());
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("name cannot start or end with a hyphen".to_string());
    }
    if name.contains("--") {
        return Err("name cannot contain consecutive hyphens".to_string());
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), String> {
    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "description must be 1-{} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(())
}

/// The `<available_skills>` block listing every skill; empty when there are none
pub fn render_available_skills(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return String::new();
    }
    let mut out = String::from("<available_skills>\n");
    for skill in skills {
        out.push_str("  <skill>\n");
        out.push_str(&format!("    <name>{}</name>\n", xml_escape(&skill.name)));
        out.push_str(&format!(
            "    <description>{}</description>\n",
            xml_escape(&skill.description)
        ));
        out.push_str("  </skill>\n");
    }
    out.push_str("</available_skills>");
    out
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
