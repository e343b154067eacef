//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// A value is outside its accepted range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Target image format of a conversion run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG XL via cjxl
    #[default]
    Jxl,
    /// AVIF via avifenc
    Avif,
}

impl OutputFormat {
    /// File extension of encoded outputs, with the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jxl => ".jxl",
            OutputFormat::Avif => ".avif",
        }
    }

    /// Upper-case label used in status messages
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Jxl => "JXL",
            OutputFormat::Avif => "AVIF",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jxl" => Ok(OutputFormat::Jxl),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(ConfigError::Invalid(format!(
                "unsupported output format '{}'",
                other
            ))),
        }
    }
}

fn default_tool_path(subdir: &str, exe: &str) -> PathBuf {
    Path::new(subdir).join(format!("{}{}", exe, env::consts::EXE_SUFFIX))
}

fn default_cjxl_path() -> PathBuf {
    default_tool_path("cjxl", "cjxl")
}

fn default_avifenc_path() -> PathBuf {
    default_tool_path("libavif", "avifenc")
}

fn default_exiftool_path() -> PathBuf {
    default_tool_path("exiftool", "exiftool")
}

/// Locations of the external executables
///
/// Relative paths are resolved against the install location by
/// [`Config::resolve_paths`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_cjxl_path")]
    pub cjxl: PathBuf,
    #[serde(default = "default_avifenc_path")]
    pub avifenc: PathBuf,
    #[serde(default = "default_exiftool_path")]
    pub exiftool: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            cjxl: default_cjxl_path(),
            avifenc: default_avifenc_path(),
            exiftool: default_exiftool_path(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Source and destination folders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoldersConfig {
    #[serde(default = "default_input_dir")]
    pub input: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            input: default_input_dir(),
            output: default_output_dir(),
        }
    }
}

fn default_quality() -> u8 {
    90
}

fn default_resolution_scale() -> f64 {
    1.0
}

fn default_copy_metadata() -> bool {
    true
}

/// Conversion defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Encoder quality for lossy output (1-100, default 90)
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub lossless: bool,
    /// Scale factor applied to the decoded image (default 1.0)
    #[serde(default = "default_resolution_scale")]
    pub resolution_scale: f64,
    /// Copy whitelisted metadata from the RAW file (default true)
    #[serde(default = "default_copy_metadata")]
    pub copy_metadata: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: default_quality(),
            lossless: false,
            resolution_scale: default_resolution_scale(),
            copy_metadata: default_copy_metadata(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub folders: FoldersConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

fn parse_bool(val: &str) -> Option<bool> {
    // Accept "true", "1", "yes" as true; "false", "0", "no" as false
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn resolve_against(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the config file and handles missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - RELAYRAFT_CJXL -> tools.cjxl
    /// - RELAYRAFT_AVIFENC -> tools.avifenc
    /// - RELAYRAFT_EXIFTOOL -> tools.exiftool
    /// - RELAYRAFT_INPUT_DIR -> folders.input
    /// - RELAYRAFT_OUTPUT_DIR -> folders.output
    /// - RELAYRAFT_FORMAT -> conversion.format
    /// - RELAYRAFT_QUALITY -> conversion.quality
    /// - RELAYRAFT_LOSSLESS -> conversion.lossless
    /// - RELAYRAFT_SCALE -> conversion.resolution_scale
    /// - RELAYRAFT_COPY_METADATA -> conversion.copy_metadata
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("RELAYRAFT_CJXL") {
            if !val.trim().is_empty() {
                self.tools.cjxl = PathBuf::from(val.trim());
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_AVIFENC") {
            if !val.trim().is_empty() {
                self.tools.avifenc = PathBuf::from(val.trim());
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_EXIFTOOL") {
            if !val.trim().is_empty() {
                self.tools.exiftool = PathBuf::from(val.trim());
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_INPUT_DIR") {
            if !val.trim().is_empty() {
                self.folders.input = PathBuf::from(val.trim());
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_OUTPUT_DIR") {
            if !val.trim().is_empty() {
                self.folders.output = PathBuf::from(val.trim());
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_FORMAT") {
            if let Ok(format) = val.parse::<OutputFormat>() {
                self.conversion.format = format;
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_QUALITY") {
            if let Ok(quality) = val.trim().parse::<u8>() {
                self.conversion.quality = quality;
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_LOSSLESS") {
            if let Some(lossless) = parse_bool(&val) {
                self.conversion.lossless = lossless;
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_SCALE") {
            if let Ok(scale) = val.trim().parse::<f64>() {
                self.conversion.resolution_scale = scale;
            }
        }

        if let Ok(val) = env::var("RELAYRAFT_COPY_METADATA") {
            if let Some(copy) = parse_bool(&val) {
                self.conversion.copy_metadata = copy;
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Make every relative tool and folder path absolute under `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        resolve_against(base, &mut self.tools.cjxl);
        resolve_against(base, &mut self.tools.avifenc);
        resolve_against(base, &mut self.tools.exiftool);
        resolve_against(base, &mut self.folders.input);
        resolve_against(base, &mut self.folders.output);
    }

    /// Reject conversion values the encoders cannot accept
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quality = self.conversion.quality;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Invalid(format!(
                "quality must be between 1 and 100, got {}",
                quality
            )));
        }

        let scale = self.conversion.resolution_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "resolution scale must be positive, got {}",
                scale
            )));
        }

        Ok(())
    }
}
