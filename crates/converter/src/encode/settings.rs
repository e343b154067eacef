//! Per-format encoder settings

use crate::config::OutputFormat;

/// Quality used for AVIF when lossless output is requested.
const AVIF_LOSSLESS_QUALITY: u8 = 100;

/// AVIF output bit depth.
const AVIF_DEPTH: &str = "10";

/// AVIF chroma subsampling (none).
const AVIF_YUV: &str = "444";

/// Encoder settings, one variant per output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeSettings {
    Jxl { quality: u8, lossless: bool },
    Avif { quality: u8, lossless: bool },
}

impl EncodeSettings {
    pub fn new(format: OutputFormat, quality: u8, lossless: bool) -> Self {
        match format {
            OutputFormat::Jxl => EncodeSettings::Jxl { quality, lossless },
            OutputFormat::Avif => EncodeSettings::Avif { quality, lossless },
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            EncodeSettings::Jxl { .. } => OutputFormat::Jxl,
            EncodeSettings::Avif { .. } => OutputFormat::Avif,
        }
    }

    pub fn quality(&self) -> u8 {
        match *self {
            EncodeSettings::Jxl { quality, .. } | EncodeSettings::Avif { quality, .. } => quality,
        }
    }

    pub fn lossless(&self) -> bool {
        match *self {
            EncodeSettings::Jxl { lossless, .. } | EncodeSettings::Avif { lossless, .. } => lossless,
        }
    }

    /// Quality the encoder actually receives
    ///
    /// Lossless JXL is driven by distance rather than quality, and lossless
    /// AVIF always runs at 100.
    pub fn effective_quality(&self) -> u8 {
        match *self {
            EncodeSettings::Avif { lossless: true, .. } => AVIF_LOSSLESS_QUALITY,
            EncodeSettings::Jxl { lossless: true, .. } => 100,
            _ => self.quality(),
        }
    }

    /// Format-specific arguments appended after `<input> <output>`
    pub fn format_args(&self) -> Vec<String> {
        match *self {
            EncodeSettings::Jxl { lossless: true, .. } => vec!["-d".into(), "0".into()],
            EncodeSettings::Jxl { quality, .. } => vec!["-q".into(), quality.to_string()],
            EncodeSettings::Avif { .. } => vec![
                "-q".into(),
                self.effective_quality().to_string(),
                "--depth".into(),
                AVIF_DEPTH.into(),
                "--yuv".into(),
                AVIF_YUV.into(),
            ],
        }
    }
}
