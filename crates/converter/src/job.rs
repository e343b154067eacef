//! Conversion job parameters
//!
//! A [`ConversionJob`] is validated once when it is built and never changes
//! while a batch runs.

use crate::config::{Config, OutputFormat};
use crate::encode::EncodeSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for job construction
#[derive(Debug, Error, PartialEq)]
pub enum JobConfigError {
    #[error("Quality must be between 1 and 100, got {0}")]
    Quality(u8),

    #[error("Resolution scale must be positive, got {0}")]
    Scale(f64),

    #[error("{0} folder path cannot be empty")]
    EmptyFolder(&'static str),
}

/// Everything one batch run needs besides the tool registry
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    source_folder: PathBuf,
    output_folder: PathBuf,
    settings: EncodeSettings,
    resolution_scale: f64,
    copy_metadata: bool,
}

impl ConversionJob {
    pub fn new(
        source_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        settings: EncodeSettings,
        resolution_scale: f64,
        copy_metadata: bool,
    ) -> Result<Self, JobConfigError> {
        let source_folder = source_folder.into();
        let output_folder = output_folder.into();

        if !(1..=100).contains(&settings.quality()) {
            return Err(JobConfigError::Quality(settings.quality()));
        }
        if !resolution_scale.is_finite() || resolution_scale <= 0.0 {
            return Err(JobConfigError::Scale(resolution_scale));
        }
        if source_folder.as_os_str().is_empty() {
            return Err(JobConfigError::EmptyFolder("Source"));
        }
        if output_folder.as_os_str().is_empty() {
            return Err(JobConfigError::EmptyFolder("Output"));
        }

        Ok(Self {
            source_folder,
            output_folder,
            settings,
            resolution_scale,
            copy_metadata,
        })
    }

    /// Build a job from the folder and conversion sections of a config
    pub fn from_config(config: &Config) -> Result<Self, JobConfigError> {
        let conversion = &config.conversion;
        Self::new(
            &config.folders.input,
            &config.folders.output,
            EncodeSettings::new(conversion.format, conversion.quality, conversion.lossless),
            conversion.resolution_scale,
            conversion.copy_metadata,
        )
    }

    pub fn source_folder(&self) -> &Path {
        &self.source_folder
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    pub fn format(&self) -> OutputFormat {
        self.settings.format()
    }

    pub fn resolution_scale(&self) -> f64 {
        self.resolution_scale
    }

    pub fn copy_metadata(&self) -> bool {
        self.copy_metadata
    }
}
