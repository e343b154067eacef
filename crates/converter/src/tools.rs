//! Tool probe for RelayRAFt
//!
//! Verifies that the external executables are present and responsive by running
//! their version query, and keeps the results in a [`ToolRegistry`] snapshot:
//! - cjxl (`--version`)
//! - avifenc (`--version`)
//! - exiftool (`-ver`)

use crate::config::{OutputFormat, ToolsConfig};
use crate::runner::{command_line, run_tool, ToolError, ToolOutput};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The external tools the pipeline depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Cjxl,
    Avifenc,
    Exiftool,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Cjxl, ToolKind::Avifenc, ToolKind::Exiftool];

    /// Name used in status messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::Cjxl => "cjxl",
            ToolKind::Avifenc => "avifenc",
            ToolKind::Exiftool => "exiftool",
        }
    }

    /// Arguments of the version query
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            ToolKind::Cjxl | ToolKind::Avifenc => &["--version"],
            ToolKind::Exiftool => &["-ver"],
        }
    }

    /// The encoder that produces the given output format
    pub fn encoder_for(format: OutputFormat) -> ToolKind {
        match format {
            OutputFormat::Jxl => ToolKind::Cjxl,
            OutputFormat::Avif => ToolKind::Avifenc,
        }
    }
}

/// Availability of one external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub executable_path: PathBuf,
    pub available: bool,
    pub version_info: String,
}

impl ToolStatus {
    /// Status of a tool that has not been probed yet
    pub fn unchecked(executable_path: PathBuf) -> Self {
        Self {
            executable_path,
            available: false,
            version_info: "Not checked".to_string(),
        }
    }
}

/// Build the version string from a successful version query
///
/// exiftool prints its version on stdout only; the encoders may split banner
/// and version over both streams, which are joined with `" | "`.
pub fn version_string(kind: ToolKind, output: &ToolOutput) -> String {
    let stdout = output.stdout.trim();
    if kind == ToolKind::Exiftool {
        return stdout.to_string();
    }

    let stderr = output.stderr.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{} | {}", stdout, stderr),
        (true, false) => stderr.to_string(),
        _ => stdout.to_string(),
    }
}

/// Run the version query of `kind` at `path` and report its availability
///
/// Never fails: every problem is folded into an unavailable status with a
/// diagnostic in `version_info`. No child process outlives the call.
pub fn probe(kind: ToolKind, path: &Path) -> ToolStatus {
    let executable_path = path.to_path_buf();

    if path.as_os_str().is_empty() {
        return ToolStatus {
            executable_path,
            available: false,
            version_info: format!("{} path cannot be empty.", kind.display_name()),
        };
    }

    let mut cmd = Command::new(path);
    cmd.args(kind.version_args());
    let rendered = command_line(&cmd);

    match run_tool(cmd) {
        Ok(output) => ToolStatus {
            executable_path,
            available: true,
            version_info: version_string(kind, &output),
        },
        Err(ToolError::ExecutableMissing { .. }) => ToolStatus {
            executable_path,
            available: false,
            version_info: format!(
                "'{}' not found. Ensure it's in the expected location or the path is correctly set.",
                path.display()
            ),
        },
        Err(ToolError::InvocationFailed { stderr, .. }) => {
            let stderr = stderr.trim();
            ToolStatus {
                executable_path,
                available: false,
                version_info: format!(
                    "Error calling '{}': {}",
                    rendered,
                    if stderr.is_empty() { "No stderr" } else { stderr }
                ),
            }
        }
        Err(e) => ToolStatus {
            executable_path,
            available: false,
            version_info: format!(
                "An unexpected error occurred while checking '{}': {}",
                path.display(),
                e
            ),
        },
    }
}

/// Snapshot of every tool's availability
///
/// Passed by value into a batch run. Re-probing produces a new snapshot
/// instead of mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRegistry {
    pub cjxl: ToolStatus,
    pub avifenc: ToolStatus,
    pub exiftool: ToolStatus,
}

impl ToolRegistry {
    /// A registry in which nothing has been probed yet
    pub fn unchecked(paths: &ToolsConfig) -> Self {
        Self {
            cjxl: ToolStatus::unchecked(paths.cjxl.clone()),
            avifenc: ToolStatus::unchecked(paths.avifenc.clone()),
            exiftool: ToolStatus::unchecked(paths.exiftool.clone()),
        }
    }

    /// Probe every tool at its configured path
    pub fn probe_all(paths: &ToolsConfig) -> Self {
        Self {
            cjxl: probe(ToolKind::Cjxl, &paths.cjxl),
            avifenc: probe(ToolKind::Avifenc, &paths.avifenc),
            exiftool: probe(ToolKind::Exiftool, &paths.exiftool),
        }
    }

    /// A new snapshot with `kind` re-probed at `path`
    pub fn reprobe(&self, kind: ToolKind, path: &Path) -> Self {
        let mut next = self.clone();
        *next.get_mut(kind) = probe(kind, path);
        next
    }

    pub fn get(&self, kind: ToolKind) -> &ToolStatus {
        match kind {
            ToolKind::Cjxl => &self.cjxl,
            ToolKind::Avifenc => &self.avifenc,
            ToolKind::Exiftool => &self.exiftool,
        }
    }

    fn get_mut(&mut self, kind: ToolKind) -> &mut ToolStatus {
        match kind {
            ToolKind::Cjxl => &mut self.cjxl,
            ToolKind::Avifenc => &mut self.avifenc,
            ToolKind::Exiftool => &mut self.exiftool,
        }
    }

    pub fn is_available(&self, kind: ToolKind) -> bool {
        self.get(kind).available
    }

    /// Record that the executable vanished during a run
    pub fn mark_missing(&mut self, kind: ToolKind) {
        let status = self.get_mut(kind);
        status.available = false;
        status.version_info = format!(
            "'{}' not found during batch run.",
            status.executable_path.display()
        );
    }
}
