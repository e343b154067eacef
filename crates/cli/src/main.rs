//! CLI entry point for RelayRAFt
//!
//! Loads the configuration, probes the external tools, runs one batch on a
//! background worker and renders its reports as log lines.

mod logging;

use clap::Parser;
use relayraft::config::ToolsConfig;
use relayraft::{
    spawn_batch, Config, ConversionJob, EngineDecoder, OutputFormat, ToolKind, ToolRegistry,
    TracingReporter,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Config file looked up next to the executable when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "relayraft.toml";

/// Exit code of a run that finished with per-file failures.
const EXIT_FILES_FAILED: u8 = 2;

/// RelayRAFt - Batch convert Fujifilm RAW files to JPEG XL or AVIF
#[derive(Parser, Debug)]
#[command(name = "relayraft")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to relayraft.toml next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder containing the .RAF files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Folder receiving the encoded images
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (jxl or avif)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Encoder quality, 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Encode losslessly
    #[arg(long)]
    lossless: bool,

    /// Encode lossy even if the config asks for lossless
    #[arg(long, conflicts_with = "lossless")]
    lossy: bool,

    /// Resolution scale applied before encoding (e.g. 0.5)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Do not copy metadata from the RAW files
    #[arg(long)]
    no_metadata: bool,

    /// Path to the cjxl executable
    #[arg(long)]
    cjxl: Option<PathBuf>,

    /// Path to the avifenc executable
    #[arg(long)]
    avifenc: Option<PathBuf>,

    /// Path to the exiftool executable
    #[arg(long)]
    exiftool: Option<PathBuf>,

    /// Only check the external tools and exit
    #[arg(long)]
    check_tools: bool,

    /// Print the batch summary as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Layer command line values over the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.folders.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.folders.output = output.clone();
        }
        if let Some(format) = self.format {
            config.conversion.format = format;
        }
        if let Some(quality) = self.quality {
            config.conversion.quality = quality;
        }
        if self.lossless {
            config.conversion.lossless = true;
        }
        if self.lossy {
            config.conversion.lossless = false;
        }
        if let Some(scale) = self.scale {
            config.conversion.resolution_scale = scale;
        }
        if self.no_metadata {
            config.conversion.copy_metadata = false;
        }
        if let Some(cjxl) = &self.cjxl {
            config.tools.cjxl = cjxl.clone();
        }
        if let Some(avifenc) = &self.avifenc {
            config.tools.avifenc = avifenc.clone();
        }
        if let Some(exiftool) = &self.exiftool {
            config.tools.exiftool = exiftool.clone();
        }
    }
}

/// Directory containing the running executable
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config(args: &Args, base: &Path) -> Result<Config, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(base.join(DEFAULT_CONFIG_FILE))?,
    };
    args.apply_to(&mut config);
    config.resolve_paths(base);
    config.validate()?;
    Ok(config)
}

fn report_tools(registry: &ToolRegistry) -> bool {
    let mut all_ok = true;
    for kind in ToolKind::ALL {
        let status = registry.get(kind);
        if status.available {
            info!("{}: OK ({})", kind.display_name(), status.version_info);
        } else {
            all_ok = false;
            error!("{}: Error ({})", kind.display_name(), status.version_info);
        }
    }
    all_ok
}

/// Create the default input folder on first start
fn ensure_default_input(config: &Config, base: &Path) {
    let default_input = base.join(relayraft::config::FoldersConfig::default().input);
    let input = &config.folders.input;
    if *input != default_input || input.exists() {
        return;
    }

    match std::fs::create_dir_all(input) {
        Ok(()) => info!("Created default input folder: {}", input.display()),
        Err(e) => warn!(
            "Could not create default input folder '{}': {}",
            input.display(),
            e
        ),
    }
}

fn warn_missing_metadata_tool(config: &Config, registry: &ToolRegistry) {
    if !config.conversion.copy_metadata || registry.is_available(ToolKind::Exiftool) {
        return;
    }
    warn!(
        "Metadata copying is enabled, but exiftool is not available or configured. Last status: {}. Metadata will not be copied.",
        registry.get(ToolKind::Exiftool).version_info
    );
}

fn log_tool_paths(tools: &ToolsConfig) {
    info!("cjxl: {}", tools.cjxl.display());
    info!("avifenc: {}", tools.avifenc.display());
    info!("exiftool: {}", tools.exiftool.display());
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let base = install_dir();
    let config = load_config(&args, &base)?;
    log_tool_paths(&config.tools);

    let registry = ToolRegistry::probe_all(&config.tools);
    if args.check_tools {
        let code = if report_tools(&registry) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
        return Ok(code);
    }

    ensure_default_input(&config, &base);
    warn_missing_metadata_tool(&config, &registry);

    let output = &config.folders.output;
    if output.exists() && !output.is_dir() {
        return Err(format!("Output path '{}' is a file, not a folder.", output.display()).into());
    }

    let job = ConversionJob::from_config(&config)?;
    info!(
        "Converting '{}' -> '{}' as {}",
        job.source_folder().display(),
        job.output_folder().display(),
        job.format()
    );

    let mut handle = spawn_batch(job, registry, EngineDecoder);
    let reporter = TracingReporter;
    while let Some(event) = handle.next_event().await {
        reporter.emit(&event);
    }
    let summary = handle.wait().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    let code = if summary.is_aborted() {
        ExitCode::FAILURE
    } else if summary.has_failures() {
        ExitCode::from(EXIT_FILES_FAILED)
    } else {
        ExitCode::SUCCESS
    };
    Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
