//! Per-file task derivation
//!
//! Every enumerated RAW file becomes a [`FileTask`] whose paths are a pure
//! function of the file name, the output folder and the scratch directory.

use crate::config::OutputFormat;
use std::path::{Path, PathBuf};

/// Suffix of the intermediate bitmap written to the scratch area.
const INTERMEDIATE_SUFFIX: &str = "_temp.png";

/// Paths involved in converting one RAW file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub safe_base_name: String,
    pub intermediate_path: PathBuf,
    pub output_path: PathBuf,
}

/// Reduce a file stem to characters safe for both intermediate and output
/// names: alphanumerics, space, `_` and `-` are kept, anything else becomes
/// `_`, then trailing whitespace is trimmed.
pub fn sanitize_base_name(stem: &str) -> String {
    let replaced: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_end().to_string()
}

impl FileTask {
    /// Derive the task for `source_path`
    pub fn new(
        source_path: &Path,
        output_folder: &Path,
        scratch_dir: &Path,
        format: OutputFormat,
    ) -> Self {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let safe_base_name = sanitize_base_name(&stem);

        Self {
            source_path: source_path.to_path_buf(),
            intermediate_path: scratch_dir
                .join(format!("{}{}", safe_base_name, INTERMEDIATE_SUFFIX)),
            output_path: output_path_for(output_folder, &safe_base_name, format),
            safe_base_name,
        }
    }

    /// File name of the source, for messages
    pub fn source_name(&self) -> String {
        file_name_of(&self.source_path)
    }

    /// File name of the output, for messages
    pub fn output_name(&self) -> String {
        file_name_of(&self.output_path)
    }

    /// Whether a previous run already produced this task's output
    ///
    /// Only the selected format's output counts; an existing output in the
    /// other format does not block re-processing.
    pub fn output_exists(&self) -> bool {
        self.output_path.exists()
    }
}

/// Where the encoded output of `safe_base_name` lands for `format`
pub fn output_path_for(
    output_folder: &Path,
    safe_base_name: &str,
    format: OutputFormat,
) -> PathBuf {
    output_folder.join(format!("{}{}", safe_base_name, format.extension()))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
