//! RAW decoder adapter
//!
//! The decoding engine is a black box behind [`RawDecoder`]. The default
//! [`EngineDecoder`] uses imagepipe (built on rawloader) to develop the sensor
//! data into an 8-bit sRGB buffer with the camera's as-shot white balance.

use image::RgbImage;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error type for RAW decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The engine rejected the file
    #[error("failed to decode '{}': {message}", .path.display())]
    Engine { path: PathBuf, message: String },

    /// The engine produced a buffer that does not match its dimensions
    #[error("decoder returned {len} bytes for a {width}x{height} RGB image")]
    InvalidBuffer { width: usize, height: usize, len: usize },
}

/// Turns a RAW file into an interleaved 8-bit RGB buffer
pub trait RawDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, DecodeError>;
}

/// Default decoder backed by the rawloader/imagepipe engine
///
/// Output is always full resolution, 8 bits per sample, sRGB, developed with
/// the camera white balance and without any automatic brightening.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineDecoder;

/// A max width/height of 0 tells the engine not to downscale.
const FULL_RESOLUTION: usize = 0;

impl RawDecoder for EngineDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, DecodeError> {
        debug!("Decoding RAW image {}", path.display());

        // The engine may panic on malformed sensor data; treat that like any
        // other decode failure.
        let developed = panic::catch_unwind(AssertUnwindSafe(|| {
            imagepipe::simple_decode_8bit(path, FULL_RESOLUTION, FULL_RESOLUTION)
        }))
        .map_err(|payload| DecodeError::Engine {
            path: path.to_path_buf(),
            message: panic_message(payload.as_ref()),
        })?
        .map_err(|message| DecodeError::Engine {
            path: path.to_path_buf(),
            message,
        })?;

        debug!("Decoded image: {}x{}", developed.width, developed.height);
        rgb_from_parts(developed.width, developed.height, developed.data)
    }
}

/// Wrap an interleaved RGB byte buffer, checking it against its dimensions
pub fn rgb_from_parts(width: usize, height: usize, data: Vec<u8>) -> Result<RgbImage, DecodeError> {
    let len = data.len();
    let invalid = || DecodeError::InvalidBuffer { width, height, len };

    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;
    RgbImage::from_raw(w, h, data).ok_or_else(invalid)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("decoder panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("decoder panicked: {}", s)
    } else {
        "decoder panicked".to_string()
    }
}
