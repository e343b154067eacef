//! Scanner module for discovering RAW files in the source folder.
//!
//! Only immediate children are considered; the extension match is
//! case-insensitive and the result is sorted by file name so that progress
//! counts are reproducible.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extension of the camera RAW files the pipeline accepts (compared lower-case).
pub const RAW_EXTENSION: &str = "raf";

/// Error type for enumeration
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source folder does not exist
    #[error("Source folder '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// The folder could not be listed
    #[error("Failed to list '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Checks if a file has the RAW extension (case-insensitive).
pub fn is_raw_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(RAW_EXTENSION))
        .unwrap_or(false)
}

/// Lists the RAW files directly inside `source_folder`.
///
/// Subdirectories are not descended into, and directories that happen to
/// carry the RAW extension are ignored. Entries are matched by name without
/// following links, so a dangling link named `X.RAF` is listed and fails on
/// its own when decoded. Entries that cannot be read are skipped; only a
/// failure to open the folder itself is an error.
pub fn enumerate(source_folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !source_folder.exists() {
        return Err(ScanError::NotFound(source_folder.to_path_buf()));
    }

    let walker = WalkDir::new(source_folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ScanError::Io {
                    path: source_folder.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry in '{}': {}", source_folder.display(), e);
                continue;
            }
        };

        if !is_raw_file(entry.path()) {
            continue;
        }
        if entry.file_type().is_dir() || entry.path().is_dir() {
            debug!("Ignoring directory {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}
