//! External process runner
//!
//! Every external tool (encoders, metadata tool, version queries) goes through
//! [`run_tool`], which runs the child non-interactively, captures its output and
//! classifies the outcome.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use thiserror::Error;
use tracing::debug;

/// Windows process creation flag that suppresses the console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Error type for external tool invocations
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable does not exist at the configured path
    #[error("'{}' not found", .path.display())]
    ExecutableMissing { path: PathBuf },

    /// The tool ran and exited with a non-zero status
    #[error("command '{command}' failed with exit code {code}")]
    InvocationFailed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// The tool was terminated by a signal
    #[error("command '{command}' was terminated by signal")]
    Terminated { command: String },

    /// Any other failure to start or wait for the process
    #[error("failed to run '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Captured output of a successful invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-blank stdout lines, trimmed
    pub fn stdout_lines(&self) -> Vec<String> {
        non_blank_lines(&self.stdout)
    }

    /// Non-blank stderr lines, trimmed
    pub fn stderr_lines(&self) -> Vec<String> {
        non_blank_lines(&self.stderr)
    }
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Render a command as a single space-separated line for logs
pub fn command_line(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(windows)]
fn hide_console(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_cmd: &mut Command) {}

/// Run a prepared command to completion
///
/// Stdin is closed so the child can never block on input; stdout and stderr
/// are captured. No timeout is applied.
///
/// # Errors
/// - [`ToolError::ExecutableMissing`] when the program cannot be found
/// - [`ToolError::InvocationFailed`] on a non-zero exit code
/// - [`ToolError::Terminated`] when no exit code is available
/// - [`ToolError::Io`] for any other spawn or wait failure
pub fn run_tool(mut cmd: Command) -> Result<ToolOutput, ToolError> {
    let command = command_line(&cmd);
    debug!("Running: {}", command);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    hide_console(&mut cmd);

    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ToolError::ExecutableMissing {
                path: PathBuf::from(cmd.get_program()),
            });
        }
        Err(source) => return Err(ToolError::Io { command, source }),
    };

    classify(command, output)
}

fn classify(command: String, output: Output) -> Result<ToolOutput, ToolError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        return Ok(ToolOutput { stdout, stderr });
    }

    match output.status.code() {
        Some(code) => Err(ToolError::InvocationFailed {
            command,
            code,
            stdout,
            stderr,
        }),
        None => Err(ToolError::Terminated { command }),
    }
}
