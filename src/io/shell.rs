//! Shell command execution for inline `` !`command` `` tokens

use std::io;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

/// Captured result of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    /// Terminating signal, if any
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run printing `stdout`
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// A run that exited with `code`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// A run killed by `signal`
    pub fn killed(signal: i32) -> Self {
        Self {
            signal: Some(signal),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.code == Some(0)
    }

    /// Killed by SIGINT or SIGTERM
    pub fn interrupted(&self) -> bool {
        matches!(self.signal, Some(SIGINT) | Some(SIGTERM))
    }

    /// Human readable exit status
    pub fn status_text(&self) -> String {
        match (self.code, self.signal) {
            (Some(code), _) => format!("exit status {}", code),
            (None, Some(signal)) => format!("killed by signal {}", signal),
            (None, None) => "unknown status".to_string(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            signal: exit_signal(&output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Runs a command line and captures its output
pub trait CommandRunner {
    /// Spawn failures are returned as `Err`; non-zero exits are not errors
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<CommandOutput>;
}

/// Runs commands through `sh -c`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<CommandOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()?;
        Ok(output.into())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_shell_runner_captures_output() {
        let dir = TempDir::new().unwrap();
        let output = ShellRunner.run("echo 42", dir.path()).unwrap();
        assert!(output.succeeded());
        assert_eq!(output.stdout, "42\n");
    }

    #[test]
    fn test_shell_runner_reports_failure() {
        let dir = TempDir::new().unwrap();
        let output = ShellRunner.run("echo oops >&2; exit 3", dir.path()).unwrap();
        assert!(!output.succeeded());
        assert!(!output.interrupted());
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stderr, "oops\n");
        assert_eq!(output.status_text(), "exit status 3");
    }

    #[test]
    fn test_shell_runner_uses_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let output = ShellRunner.run("cat marker.txt", dir.path()).unwrap();
        assert_eq!(output.stdout, "here");
    }

    #[test]
    fn test_shell_runner_detects_termination() {
        let dir = TempDir::new().unwrap();
        let output = ShellRunner.run("kill -TERM $$", dir.path()).unwrap();
        assert!(output.interrupted());
        assert_eq!(output.code, None);
    }
}
