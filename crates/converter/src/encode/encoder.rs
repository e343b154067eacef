//! Encoder invocation
//!
//! Both encoders share one calling convention: `<exe> <input> <output>`
//! followed by the format arguments from [`EncodeSettings::format_args`].

use super::EncodeSettings;
use crate::runner::{run_tool, ToolError};
use std::path::Path;
use std::process::Command;

/// What a successful encode reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOutput {
    /// Non-blank encoder stderr lines, trimmed
    pub stderr_lines: Vec<String>,
}

/// Build the encoder command for one intermediate file
pub fn build_encoder_command(
    executable: &Path,
    input: &Path,
    output: &Path,
    settings: &EncodeSettings,
) -> Command {
    let mut cmd = Command::new(executable);
    cmd.arg(input).arg(output);
    cmd.args(settings.format_args());
    cmd
}

/// Encode `input` into `output`
///
/// Success means the encoder exited with status zero; the output file is
/// whatever the encoder wrote.
pub fn encode(
    executable: &Path,
    input: &Path,
    output: &Path,
    settings: &EncodeSettings,
) -> Result<EncodeOutput, ToolError> {
    let cmd = build_encoder_command(executable, input, output, settings);
    let result = run_tool(cmd)?;

    Ok(EncodeOutput {
        stderr_lines: result.stderr_lines(),
    })
}
