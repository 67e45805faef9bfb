//! External process execution
//!
//! Every translator and compiler invocation in the pipeline goes through a [`ToolRunner`],
//! so a failing command is always reported the same way: the full command line plus the
//! captured stdout/stderr of the child.

use std::ffi::OsString;
use std::io::Write;
use std::process::{Command, ExitStatus};

/// Failure of a single external command
#[derive(Debug, thiserror::Error)]
pub enum ExternalToolError {
    /// The process could not be started at all
    #[error("command failed to start: {command}: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Error returned by the OS
        #[source]
        source: std::io::Error,
    },
    /// The process ran and exited unsuccessfully
    #[error("command failed ({status}): {command}")]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit status of the child
        status: ExitStatus,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },
}

impl ExternalToolError {
    /// Rendered command line of the failing invocation
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

/// Executes external commands on behalf of the pipeline
pub trait ToolRunner {
    /// Runs `argv` to completion.
    ///
    /// `argv[0]` is the program; the rest are its arguments. Returns an error when the
    /// program cannot be spawned or exits with a non-zero status.
    fn run(&mut self, argv: &[OsString]) -> Result<(), ExternalToolError>;
}

/// Runs commands as blocking child processes of the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, argv: &[OsString]) -> Result<(), ExternalToolError> {
        let command = command_line(argv);
        let Some((program, args)) = argv.split_first() else {
            return Err(ExternalToolError::Spawn {
                command,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        tracing::debug!("running {command}");
        let output = match Command::new(program).args(args).output() {
            Ok(output) => output,
            Err(source) => return Err(ExternalToolError::Spawn { command, source }),
        };

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // Surface the tool's own diagnostics before the error propagates
        let mut err = std::io::stderr().lock();
        if !stdout.is_empty() {
            let _ = err.write_all(stdout.as_bytes());
        }
        if !stderr.is_empty() {
            let _ = err.write_all(stderr.as_bytes());
        }
        let _ = err.flush();

        Err(ExternalToolError::Failed {
            command,
            status: output.status,
            stdout,
            stderr,
        })
    }
}

/// Renders an argument vector as a single space-separated command line
pub fn command_line(argv: &[OsString]) -> String {
    argv.iter().map(|arg| arg.to_string_lossy()).collect::<Vec<_>>().join(" ")
}
