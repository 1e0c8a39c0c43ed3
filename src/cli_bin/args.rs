//! Command-line argument definitions
//!
//! Flags map one to one onto [`ContextConfig`](coding_context::ContextConfig);
//! parsing of `key=value` pairs and expressions happens in the library.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI application
#[derive(Parser)]
#[command(
    name = "coding-context",
    version,
    about = "Assemble prompt context for AI coding agents",
    long_about = "coding-context collects rule, task and command fragments from the \
                  project and home directories, filters rules by their front matter, \
                  expands parameters, shell commands and file references, and prints \
                  the resulting prompt."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Assemble and print the context for a task
    Run(RunArgs),
    /// List available tasks
    List(ListArgs),
}

/// Where to look for fragments
#[derive(Args, Debug, Clone)]
pub struct SearchOptions {
    /// Base directory
    #[arg(short = 'C', long = "dir", value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Extra search root (repeatable)
    #[arg(short = 'd', long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task name, or path to a task file
    pub task: String,

    #[command(flatten)]
    pub search: SearchOptions,

    /// Parameter for ${name} substitution (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Include rules whose front matter matches (repeatable)
    #[arg(short = 's', long = "select", value_name = "KEY=VALUE")]
    pub select: Vec<String>,

    /// Exclude rules whose front matter matches (repeatable)
    #[arg(short = 'S', long = "exclude", value_name = "KEY=VALUE")]
    pub exclude: Vec<String>,

    /// Boolean selector expression, e.g. 'lang == "go" && !has(draft)'
    #[arg(short = 'w', long = "where", value_name = "EXPR")]
    pub where_expr: Option<String>,

    /// Resume mode: add resume=true and skip rules
    #[arg(short, long)]
    pub resume: bool,

    /// Target agent (cursor, opencode, copilot, claude, gemini, augment,
    /// windsurf, codex); its own rule files are skipped
    #[arg(short = 'a', long = "agent", value_name = "AGENT")]
    pub agent: Option<String>,

    /// Append a file to the prompt (repeatable)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Print the assembly as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub search: SearchOptions,

    /// Print the task list as JSON
    #[arg(long)]
    pub json: bool,
}
