//! RelayRAFt
//!
//! Batch conversion pipeline that develops camera RAW files, optionally
//! rescales them, encodes them to JPEG XL or AVIF with external encoders and
//! carries a whitelist of metadata over from the source.

pub mod batch;
pub mod encode;
pub mod intermediate;
pub mod job;
pub mod metadata;
pub mod raw;
pub mod report;
pub mod resize;
pub mod runner;
pub mod scan;
pub mod scratch;
pub mod task;
pub mod tools;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use relayraft_config as config;
pub use relayraft_config::{Config, OutputFormat};
pub use batch::{BatchState, BatchSummary, Orchestrator};
pub use encode::{build_encoder_command, encode, EncodeOutput, EncodeSettings};
pub use intermediate::{write_intermediate, WriteError};
pub use job::{ConversionJob, JobConfigError};
pub use metadata::{build_metadata_command, copy_metadata, METADATA_TAGS};
pub use raw::{DecodeError, EngineDecoder, RawDecoder};
pub use report::{
    BatchEvent, ChannelReporter, ProgressSink, Severity, StatusSink, TracingReporter,
};
pub use resize::{resize, Resized};
pub use runner::{run_tool, ToolError, ToolOutput};
pub use scan::{enumerate, ScanError};
pub use scratch::ScratchArea;
pub use task::{sanitize_base_name, FileTask};
pub use tools::{probe, ToolKind, ToolRegistry, ToolStatus};
pub use worker::{spawn_batch, BatchHandle, WorkerError};
