//! Lossless intermediate bitmap written to the scratch area before encoding

use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for intermediate writes
#[derive(Debug, Error)]
#[error("failed to write intermediate '{}': {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Write `image` as an 8-bit RGB PNG
pub fn write_intermediate(image: &RgbImage, path: &Path) -> Result<(), WriteError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| WriteError {
            path: path.to_path_buf(),
            source,
        })
}
