//! Metadata propagation from the source RAW to the encoded output
//!
//! Only a curated whitelist of tags is copied. The tool rewrites the output in
//! place; a failure leaves whatever the encoder wrote untouched.

use crate::runner::{run_tool, ToolError, ToolOutput};
use std::path::Path;
use std::process::Command;

/// Tags copied from the RAW file, in command-line order
pub const METADATA_TAGS: &[&str] = &[
    // camera
    "Make",
    "Model",
    "Artist",
    "Copyright",
    "DateTimeOriginal",
    "CreateDate",
    "ModifyDate",
    "ISO",
    "ExposureTime",
    "FNumber",
    "FocalLength",
    "LensModel",
    "LensMake",
    "WhiteBalance",
    // location
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "GPSLatitudeRef",
    "GPSLongitudeRef",
    "GPSAltitudeRef",
    "GPSTimeStamp",
    "GPSDateStamp",
    // descriptive
    "Title",
    "Description",
    "Keywords",
    "Subject",
    "Creator",
    "Rights",
];

/// How a line of metadata tool stdout should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutLine {
    /// The "N image files updated/created" summary
    Summary,
    /// Anything else the tool printed
    Info,
}

/// Classify one stdout line (case-insensitive)
pub fn classify_stdout_line(line: &str) -> StdoutLine {
    let lower = line.to_lowercase();
    if lower.contains("image files updated") || lower.contains("image files created") {
        StdoutLine::Summary
    } else {
        StdoutLine::Info
    }
}

/// Build the tag copy command for one output file
pub fn build_metadata_command(executable: &Path, source_raw: &Path, target: &Path) -> Command {
    let mut cmd = Command::new(executable);
    cmd.env("LANG", "C.UTF-8");
    cmd.arg("-tagsFromFile").arg(source_raw);
    cmd.args(METADATA_TAGS.iter().map(|tag| format!("-{}", tag)));
    cmd.arg("-m").arg("-overwrite_original");
    cmd.arg(target);
    cmd
}

/// Copy the whitelisted tags from `source_raw` onto `target`
pub fn copy_metadata(
    executable: &Path,
    source_raw: &Path,
    target: &Path,
) -> Result<ToolOutput, ToolError> {
    run_tool(build_metadata_command(executable, source_raw, target))
}
