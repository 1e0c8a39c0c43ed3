//! coding-context: assemble prompt context for AI coding agents
//!
//! Context is built from markdown fragments on disk:
//!
//! - **rules**: reusable guidance, filtered by selectors against their front
//!   matter
//! - **a task**: the prompt for the job at hand, picked by name
//! - **commands**: snippets a task inlines with a `/name` line
//!
//! Fragment bodies can carry dynamic tokens that are expanded in one pass:
//! `${param}`, `` !`shell command` ``, `@path/to/file` and `/command` lines.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coding_context::{Assembler, ContextConfig, Params, Result, SelectorSet};
//!
//! fn main() -> Result<()> {
//!     let config = ContextConfig::new(".")
//!         .with_params(Params::from_args(["issue=1234"])?)
//!         .with_selectors(SelectorSet::from_args(["language=go"], ["stage=draft"])?);
//!
//!     let assembly = Assembler::new(config).run("fix-bug")?;
//!     println!("{}", assembly.prompt);
//!     Ok(())
//! }
//! ```
//!
//! ## Selecting with an expression
//!
//! ```rust
//! use coding_context::{Expression, FrontMatter, Matcher, SelectorMode, SelectorSet};
//!
//! let expr = Expression::parse("has(stage) && stage != \"draft\"").unwrap();
//! let matcher = SelectorMode::Expression(expr).into_matcher(SelectorSet::new());
//! assert!(matcher.matches(&FrontMatter::new().with("stage", "final")));
//! ```
//!
//! # Architecture
//!
//! - [`core`]: front matter model, selectors, expansion, replacement
//! - [`io`]: reading and discovering fragments, file inclusion, shell
//! - [`context`]: one invocation end to end
//! - [`error`]: fatal errors; non-fatal conditions are [`Warning`]s

pub use context::{Assembler, Assembly, ContextConfig, TaskInfo};
pub use error::{ContextError, ErrorSeverity, Result};

pub use crate::core::{
    resolve_replacements, Agent, ExpandedFragment, Expander, Expansion, ExpansionContext, Expression,
    Fragment, FragmentKind, FrontMatter, FrontMatterValue, Matcher, Params, SelectorMode,
    SelectorSet, Selectors, Skill, Warning,
};

pub use io::{CommandRunner, FragmentReader, SearchRoot, ShellRunner};

pub mod context;
pub mod core;
pub mod error;
pub mod io;
