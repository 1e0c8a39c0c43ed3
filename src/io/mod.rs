//! Filesystem and process boundaries: reading fragments, discovering them,
//! including files and running shell commands

pub mod fs;
pub mod include;
pub mod reader;
pub mod shell;

pub use fs::{collect_files, collect_skill_files, discover, RootScope, SearchRoot};
pub use include::{language_tag, render_attachment, render_file_block, render_reference_block};
pub use reader::FragmentReader;
pub use shell::{CommandOutput, CommandRunner, ShellRunner};
