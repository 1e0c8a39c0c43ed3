//! Fragment discovery
//!
//! Each search root contributes a fixed set of locations per fragment kind.
//! A location is either a single file (`AGENTS.md`, `.cursorrules`) or a
//! directory walked recursively for `.md`/`.mdc` files. Skills are the
//! exception: only `<skills dir>/<name>/SKILL.md` counts. Order is
//! deterministic: roots in the order given, locations in table order, files
//! within a directory sorted by name.

use crate::core::{FragmentKind, SKILL_FILE};
use crate::io::reader::FragmentReader;
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Rule locations inside a project root
pub const PROJECT_RULE_LOCATIONS: &[&str] = &[
    ".agents/rules",
    ".cursor/rules",
    ".github/copilot-instructions.md",
    "AGENTS.md",
    "CLAUDE.md",
    "CLAUDE.local.md",
    "GEMINI.md",
    ".cursorrules",
    ".windsurfrules",
    ".github/agents",
    ".opencode/agent",
    ".opencode/rules",
    ".gemini/styleguide.md",
    ".augment/rules",
    ".augment/guidelines.md",
    ".windsurf/rules",
];

/// Rule locations inside the home directory
pub const HOME_RULE_LOCATIONS: &[&str] = &[".agents/rules"];

pub const TASK_LOCATIONS: &[&str] = &[".agents/tasks"];

pub const COMMAND_LOCATIONS: &[&str] = &[".agents/commands"];

pub const SKILL_LOCATIONS: &[&str] = &[".agents/skills"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootScope {
    Project,
    Home,
}

/// A directory fragments are discovered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    path: PathBuf,
    scope: RootScope,
}

impl SearchRoot {
    pub fn project(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scope: RootScope::Project,
        }
    }

    pub fn home(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scope: RootScope::Home,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scope(&self) -> RootScope {
        self.scope
    }

    /// Locations this root contributes for `kind`
    pub fn locations(&self, kind: FragmentKind) -> Vec<PathBuf> {
        let table = match (kind, self.scope) {
            (FragmentKind::Rule, RootScope::Project) => PROJECT_RULE_LOCATIONS,
            (FragmentKind::Rule, RootScope::Home) => HOME_RULE_LOCATIONS,
            (FragmentKind::Task, _) => TASK_LOCATIONS,
            (FragmentKind::Command, _) => COMMAND_LOCATIONS,
            (FragmentKind::Skill, _) => SKILL_LOCATIONS,
        };
        table.iter().map(|location| self.path.join(location)).collect()
    }

    /// Files of `kind` under this root, in discovery order
    pub fn files(&self, kind: FragmentKind) -> Vec<PathBuf> {
        let collect: fn(&Path) -> Vec<PathBuf> = match kind {
            FragmentKind::Skill => collect_skill_files,
            _ => collect_files,
        };
        self.locations(kind)
            .iter()
            .flat_map(|location| collect(location))
            .collect()
    }

    /// `path` relative to this root, if it lies under it
    pub fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.strip_prefix(&self.path).ok()
    }
}

/// A single file as is, or the markdown files under a directory
pub fn collect_files(location: &Path) -> Vec<PathBuf> {
    if location.is_file() {
        return vec![location.to_path_buf()];
    }
    if !location.is_dir() {
        return Vec::new();
    }

    WalkDir::new(location)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry under {}: {}", location.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| FragmentReader::is_markdown_file(path))
        .collect()
}

/// The `SKILL.md` of every direct subdirectory of `location`
pub fn collect_skill_files(location: &Path) -> Vec<PathBuf> {
    if !location.is_dir() {
        return Vec::new();
    }

    WalkDir::new(location)
        .follow_links(true)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == SKILL_FILE)
        .map(|entry| entry.into_path())
        .collect()
}

/// Files of `kind` across all roots, without duplicates
pub fn discover(roots: &[SearchRoot], kind: FragmentKind) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for root in roots {
        for file in root.files(kind) {
            let key = file.canonicalize().unwrap_or_else(|_| file.clone());
            if seen.insert(key) {
                files.push(file);
            }
        }
    }
    debug!("Discovered {} {} files", files.len(), kind);
    files
}
