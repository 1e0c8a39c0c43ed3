//! Non-fatal diagnostics
//!
//! A warning never stops assembly. The offending token or fragment is left as
//! it was and the condition is reported alongside the result.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Front matter present but not parseable; the fragment got an empty one
    FrontMatterParse { path: PathBuf, reason: String },
    /// `${name}` with no value
    UnresolvedParameter { name: String },
    /// Inline command exited non-zero or could not be spawned
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    /// `@path` that could not be read
    FileReferenceFailed { path: String, reason: String },
    /// `/name` with no matching command fragment
    FragmentNotFound { name: String },
    /// `/name args` whose argument list does not parse
    InvalidArguments { name: String, reason: String },
    /// Two fragments replace each other; the later one was kept
    ReplacementConflict { kept: PathBuf, dropped: PathBuf },
    /// A `SKILL.md` whose name or description is unusable; it was skipped
    InvalidSkill { path: PathBuf, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrontMatterParse { path, reason } => {
                write!(f, "invalid front matter in {}: {}", path.display(), reason)
            }
            Self::UnresolvedParameter { name } => write!(f, "parameter not found: {}", name),
            Self::CommandFailed {
                command,
                status,
                stderr,
            } => {
                write!(f, "command `{}` failed ({})", command, status)?;
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            Self::FileReferenceFailed { path, reason } => {
                write!(f, "cannot include file {}: {}", path, reason)
            }
            Self::FragmentNotFound { name } => write!(f, "command fragment not found: /{}", name),
            Self::InvalidArguments { name, reason } => {
                write!(f, "invalid arguments for /{}: {}", name, reason)
            }
            Self::ReplacementConflict { kept, dropped } => write!(
                f,
                "{} and {} replace each other; keeping {}",
                dropped.display(),
                kept.display(),
                kept.display()
            ),
            Self::InvalidSkill { path, reason } => {
                write!(f, "skipping skill {}: {}", path.display(), reason)
            }
        }
    }
}
