//! Batch orchestrator for RelayRAFt
//!
//! Drives one conversion run through `Init → Validating → Running → Draining →
//! Done`. Every file is processed in enumeration order; per-file failures are
//! reported and the loop moves on, while batch-level failures abort early but
//! still clean up the scratch area.

use crate::config::OutputFormat;
use crate::encode;
use crate::intermediate::write_intermediate;
use crate::job::ConversionJob;
use crate::metadata::{self, StdoutLine};
use crate::raw::RawDecoder;
use crate::report::{ProgressSink, Severity, StatusSink};
use crate::resize::{resize, Resized};
use crate::runner::ToolError;
use crate::scan;
use crate::scratch::ScratchArea;
use crate::task::FileTask;
use crate::tools::{ToolKind, ToolRegistry};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stage of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Init,
    Validating,
    Running,
    Draining,
    Done,
}

impl BatchState {
    pub fn as_str(&self) -> &str {
        match self {
            BatchState::Init => "init",
            BatchState::Validating => "validating",
            BatchState::Running => "running",
            BatchState::Draining => "draining",
            BatchState::Done => "done",
        }
    }
}

/// Outcome of a finished batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub format: OutputFormat,
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub metadata_copied: usize,
    pub metadata_failed: usize,
    /// Reason the run stopped early, if it did
    pub aborted: Option<String>,
    /// Tool availability as it stood at the end of the run
    pub registry: ToolRegistry,
}

impl BatchSummary {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// The closing status line of a run
    pub fn message(&self) -> String {
        format!(
            "Batch conversion process ({}) finished: {} converted, {} skipped, {} failed.",
            self.format.label(),
            self.converted,
            self.skipped,
            self.failed
        )
    }
}

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    converted: usize,
    skipped: usize,
    failed: usize,
    metadata_copied: usize,
    metadata_failed: usize,
}

enum FileOutcome {
    Converted,
    Skipped,
    Failed,
    Aborted(String),
}

/// Runs conversion batches against a tool registry and a RAW decoder
///
/// The registry is owned by the orchestrator for the duration of a run; an
/// executable that disappears mid-run is marked unavailable here and the
/// updated snapshot is returned in the [`BatchSummary`].
pub struct Orchestrator<D> {
    registry: ToolRegistry,
    decoder: D,
    scratch_root: Option<PathBuf>,
    state: BatchState,
}

impl<D: RawDecoder> Orchestrator<D> {
    pub fn new(registry: ToolRegistry, decoder: D) -> Self {
        Self {
            registry,
            decoder,
            scratch_root: None,
            state: BatchState::Init,
        }
    }

    /// Create scratch areas under `root` instead of the system temp location
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ToolRegistry {
        self.registry
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn transition(&mut self, next: BatchState) {
        debug!("Batch state: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
    }

    /// Run one batch to completion
    ///
    /// Never fails: every problem is reported through `reporter` and reflected
    /// in the returned summary.
    pub fn run<R>(&mut self, job: &ConversionJob, reporter: &R) -> BatchSummary
    where
        R: StatusSink + ProgressSink,
    {
        self.state = BatchState::Init;
        let mut tally = Tally::default();

        self.transition(BatchState::Validating);
        let aborted = match self.validate(job, reporter) {
            Ok(encoder) => {
                self.transition(BatchState::Running);
                self.run_files(job, &encoder, reporter, &mut tally)
            }
            Err(reason) => {
                reporter.error(&reason);
                reporter.progress(0, 0);
                Some(reason)
            }
        };

        self.transition(BatchState::Done);
        let summary = BatchSummary {
            format: job.format(),
            total: tally.total,
            converted: tally.converted,
            skipped: tally.skipped,
            failed: tally.failed,
            metadata_copied: tally.metadata_copied,
            metadata_failed: tally.metadata_failed,
            aborted,
            registry: self.registry.clone(),
        };

        let severity = if summary.is_aborted() {
            Severity::Warning
        } else {
            Severity::Info
        };
        reporter.status(&summary.message(), severity);
        summary
    }

    /// Check the encoder and folders; returns the encoder executable
    fn validate<R: StatusSink>(
        &self,
        job: &ConversionJob,
        reporter: &R,
    ) -> Result<PathBuf, String> {
        let format = job.format();
        let kind = ToolKind::encoder_for(format);
        let encoder = self.registry.get(kind);

        if !encoder.available {
            return Err(format!(
                "Error: {} is not available or not working. Last status: {}",
                kind.display_name(),
                encoder.version_info
            ));
        }
        reporter.info(&format!(
            "Target output format: {} using {}",
            format.label(),
            kind.display_name()
        ));

        let source = job.source_folder();
        if !source.exists() {
            return Err(format!(
                "Error: Source folder '{}' does not exist.",
                source.display()
            ));
        }
        if !source.is_dir() {
            return Err(format!(
                "Error: Source folder '{}' is not a directory.",
                source.display()
            ));
        }

        let output = job.output_folder();
        if !output.exists() {
            fs::create_dir_all(output).map_err(|e| {
                format!("Error creating output folder '{}': {}", output.display(), e)
            })?;
            reporter.info(&format!("Created output folder: {}", output.display()));
        } else if !output.is_dir() {
            return Err(format!(
                "Error: Output path '{}' is not a directory.",
                output.display()
            ));
        }

        Ok(encoder.executable_path.clone())
    }

    /// Running and Draining; returns the abort reason, if any
    fn run_files<R>(
        &mut self,
        job: &ConversionJob,
        encoder: &Path,
        reporter: &R,
        tally: &mut Tally,
    ) -> Option<String>
    where
        R: StatusSink + ProgressSink,
    {
        let files = match scan::enumerate(job.source_folder()) {
            Ok(files) => files,
            Err(e) => {
                let reason = format!("Error: {}", e);
                reporter.error(&reason);
                reporter.progress(0, 0);
                return Some(reason);
            }
        };

        let total = files.len();
        tally.total = total;
        if total == 0 {
            reporter.info(&format!(
                "No .RAF files found in '{}'.",
                job.source_folder().display()
            ));
            reporter.progress(0, 0);
            self.transition(BatchState::Draining);
            return None;
        }

        let scratch = match self.create_scratch() {
            Ok(scratch) => scratch,
            Err(e) => {
                let reason = format!("Error creating temporary directory: {}", e);
                reporter.error(&reason);
                reporter.progress(0, 0);
                return Some(reason);
            }
        };
        debug!("Scratch area: {}", scratch.path().display());

        let mut aborted = None;
        for (index, source) in files.iter().enumerate() {
            let position = index + 1;
            let task = FileTask::new(source, job.output_folder(), scratch.path(), job.format());

            match self.process_file(job, &task, position, total, encoder, reporter, tally) {
                FileOutcome::Aborted(reason) => {
                    aborted = Some(reason);
                    break;
                }
                FileOutcome::Converted => tally.converted += 1,
                FileOutcome::Skipped => tally.skipped += 1,
                FileOutcome::Failed => tally.failed += 1,
            }
            reporter.progress(position, total);
        }

        self.transition(BatchState::Draining);
        reporter.info(&format!(
            "Temporary directory {} will be cleaned up.",
            scratch.path().display()
        ));
        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch area: {}", e);
            reporter.warning(&format!("Failed to clean up temporary directory: {}", e));
        }

        aborted
    }

    fn create_scratch(&self) -> std::io::Result<ScratchArea> {
        match &self.scratch_root {
            Some(root) => ScratchArea::create_in(root),
            None => ScratchArea::create(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_file<R: StatusSink>(
        &mut self,
        job: &ConversionJob,
        task: &FileTask,
        position: usize,
        total: usize,
        encoder: &Path,
        reporter: &R,
        tally: &mut Tally,
    ) -> FileOutcome {
        let name = task.source_name();

        if task.output_exists() {
            reporter.info(&format!(
                "Skipping ({}/{}): {}. Output file '{}' already exists.",
                position,
                total,
                name,
                task.output_name()
            ));
            return FileOutcome::Skipped;
        }

        reporter.info(&format!(
            "Processing ({}/{}): {} -> {}",
            position,
            total,
            name,
            task.output_name()
        ));

        if let Err(message) = self.prepare_intermediate(job, task, reporter) {
            reporter.error(&format!(
                "  Error processing RAW {} to PNG: {}. Skipping.",
                name, message
            ));
            return FileOutcome::Failed;
        }

        if let Some(outcome) = self.encode_task(job, task, encoder, reporter) {
            return outcome;
        }

        if job.copy_metadata() {
            self.propagate_metadata(task, reporter, tally);
        }

        FileOutcome::Converted
    }

    /// Decode, resize and write the intermediate bitmap
    fn prepare_intermediate<R: StatusSink>(
        &self,
        job: &ConversionJob,
        task: &FileTask,
        reporter: &R,
    ) -> Result<(), String> {
        let name = task.source_name();

        reporter.info(&format!("  Reading RAW: {}", name));
        let image = self
            .decoder
            .decode(&task.source_path)
            .map_err(|e| e.to_string())?;

        let scale = job.resolution_scale();
        let image = match resize(image, scale) {
            Resized::Unchanged(image) => image,
            Resized::Resized { image, from, to } => {
                reporter.info(&format!(
                    "  Resizing from {}x{} to {}x{} (scale: {:.2})",
                    from.0, from.1, to.0, to.1, scale
                ));
                image
            }
            Resized::Skipped { image, computed } => {
                reporter.warning(&format!(
                    "  Warning: Invalid new dimensions {}x{} for {}. Original size used.",
                    computed.0, computed.1, name
                ));
                image
            }
        };

        let intermediate_name = task
            .intermediate_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.info(&format!(
            "  Saving intermediate 8-bit PNG: {}",
            intermediate_name
        ));
        write_intermediate(&image, &task.intermediate_path).map_err(|e| e.to_string())
    }

    /// Run the encoder; `None` means the output was written
    fn encode_task<R: StatusSink>(
        &mut self,
        job: &ConversionJob,
        task: &FileTask,
        encoder: &Path,
        reporter: &R,
    ) -> Option<FileOutcome> {
        let settings = job.settings();
        let label = settings.format().label();
        let kind = ToolKind::encoder_for(settings.format());
        let encoder_name = kind.display_name();

        reporter.info(&format!(
            "  Encoding to {} (Lossless: {}, Quality: {}): {}",
            label,
            settings.lossless(),
            settings.effective_quality(),
            task.output_name()
        ));

        match encode::encode(encoder, &task.intermediate_path, &task.output_path, settings) {
            Ok(output) => {
                for line in output.stderr_lines {
                    reporter.info(&format!("    {}: {}", encoder_name, line));
                }
                reporter.info(&format!(
                    "  Saved {}: {}",
                    label,
                    task.output_path.display()
                ));
                None
            }
            Err(ToolError::ExecutableMissing { path }) => {
                let reason = format!(
                    "Error: '{}' not found during conversion. Stopping batch.",
                    path.display()
                );
                reporter.error(&reason);
                self.registry.mark_missing(kind);
                Some(FileOutcome::Aborted(reason))
            }
            Err(ToolError::InvocationFailed {
                command,
                code,
                stdout,
                stderr,
            }) => {
                reporter.error(&format!(
                    "  Error encoding {} with {}. Skipping.",
                    task.output_name(),
                    encoder_name
                ));
                report_invocation(reporter, "    ", &command, code, &stdout, &stderr);
                Some(FileOutcome::Failed)
            }
            Err(e) => {
                reporter.error(&format!(
                    "  Unexpected error during {} encoding for {}: {}. Skipping.",
                    label,
                    task.source_name(),
                    e
                ));
                Some(FileOutcome::Failed)
            }
        }
    }

    /// Copy the whitelisted tags onto a freshly encoded output
    fn propagate_metadata<R: StatusSink>(
        &mut self,
        task: &FileTask,
        reporter: &R,
        tally: &mut Tally,
    ) {
        let status = self.registry.get(ToolKind::Exiftool);
        if !status.available {
            reporter.warning(&format!(
                "    Skipping metadata copy: exiftool is not available or not configured correctly. Last status: {}",
                status.version_info
            ));
            return;
        }

        let executable = status.executable_path.clone();
        let output_name = task.output_name();

        match metadata::copy_metadata(&executable, &task.source_path, &task.output_path) {
            Ok(output) => {
                for line in output.stdout_lines() {
                    let message = match metadata::classify_stdout_line(&line) {
                        StdoutLine::Summary => format!("      exiftool: {}", line),
                        StdoutLine::Info => format!("      exiftool (info): {}", line),
                    };
                    reporter.info(&message);
                }
                for line in output.stderr_lines() {
                    reporter.warning(&format!("      exiftool (stderr/warning): {}", line));
                }
                reporter.info(&format!(
                    "    Successfully copied metadata (including GPS) to {}",
                    output_name
                ));
                tally.metadata_copied += 1;
            }
            Err(ToolError::InvocationFailed {
                command,
                code,
                stdout,
                stderr,
            }) => {
                reporter.error(&format!(
                    "    Error copying metadata to {} using exiftool. File is encoded, but metadata may be missing.",
                    output_name
                ));
                report_invocation(reporter, "      ", &command, code, &stdout, &stderr);
                tally.metadata_failed += 1;
            }
            Err(ToolError::ExecutableMissing { path }) => {
                reporter.error(&format!(
                    "Error: '{}' not found during metadata copy. Disabling exiftool for this run.",
                    path.display()
                ));
                self.registry.mark_missing(ToolKind::Exiftool);
                tally.metadata_failed += 1;
            }
            Err(e) => {
                reporter.error(&format!(
                    "    Unexpected error during metadata copy for {}: {}",
                    output_name, e
                ));
                tally.metadata_failed += 1;
            }
        }
    }
}

fn report_invocation<R: StatusSink>(
    reporter: &R,
    indent: &str,
    command: &str,
    code: i32,
    stdout: &str,
    stderr: &str,
) {
    reporter.error(&format!("{}Command: {}", indent, command));
    reporter.error(&format!("{}Return Code: {}", indent, code));
    reporter.error(&format!("{}Stdout: {}", indent, stdout.trim()));
    reporter.error(&format!("{}Stderr: {}", indent, stderr.trim()));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::encode::EncodeSettings;
    use crate::test_support::{
        fake_encoder, fake_exiftool, write_script, RecordingReporter, SyntheticDecoder,
    };
    use std::fs::File;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
        tools: PathBuf,
        scratch: PathBuf,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let input = dir.path().join("input");
            let tools = dir.path().join("tools");
            let scratch = dir.path().join("scratch");
            for path in [&input, &tools, &scratch] {
                fs::create_dir(path).unwrap();
            }
            for name in files {
                fs::write(input.join(name), b"raw sensor data").unwrap();
            }

            Self {
                output: dir.path().join("output"),
                _dir: dir,
                input,
                tools,
                scratch,
            }
        }

        /// Tool paths with working stand-ins, exiftool optional
        fn tools_config(&self, with_exiftool: bool, exiftool_exit: i32) -> ToolsConfig {
            let exiftool = if with_exiftool {
                fake_exiftool(&self.tools, "exiftool", exiftool_exit)
            } else {
                self.tools.join("no-exiftool")
            };
            ToolsConfig {
                cjxl: fake_encoder(&self.tools, "cjxl"),
                avifenc: fake_encoder(&self.tools, "avifenc"),
                exiftool,
            }
        }

        fn registry(&self, with_exiftool: bool) -> ToolRegistry {
            ToolRegistry::probe_all(&self.tools_config(with_exiftool, 0))
        }

        fn job(&self, format: OutputFormat, scale: f64, copy_metadata: bool) -> ConversionJob {
            ConversionJob::new(
                &self.input,
                &self.output,
                EncodeSettings::new(format, 90, false),
                scale,
                copy_metadata,
            )
            .unwrap()
        }

        fn orchestrator(&self, registry: ToolRegistry) -> Orchestrator<SyntheticDecoder> {
            Orchestrator::new(registry, SyntheticDecoder::default()).with_scratch_root(&self.scratch)
        }

        fn log_lines(&self, tool: &str) -> Vec<String> {
            fs::read_to_string(self.tools.join(format!("{}.log", tool)))
                .map(|s| s.lines().map(String::from).collect())
                .unwrap_or_default()
        }

        /// The stand-in encoder copies its PNG input verbatim
        fn decode_output(&self, name: &str) -> image::DynamicImage {
            image::load_from_memory(&fs::read(self.output.join(name)).unwrap()).unwrap()
        }

        fn scratch_is_empty(&self) -> bool {
            fs::read_dir(&self.scratch).unwrap().next().is_none()
        }
    }

    #[test]
    fn test_converts_all_files_in_order() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let reporter = RecordingReporter::default();
        let mut orchestrator = fx.orchestrator(fx.registry(true));

        let summary = orchestrator.run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(fx.output.join("A.jxl").exists());
        assert!(fx.output.join("B.jxl").exists());
        assert_eq!(reporter.progress_log(), vec![(1, 2), (2, 2)]);
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.total, 2);
        assert!(!summary.is_aborted());
        assert_eq!(orchestrator.state(), BatchState::Done);
        assert!(reporter.any_contains("Target output format: JXL using cjxl"));
        assert!(reporter.any_contains("Processing (1/2): A.RAF -> A.jxl"));
        assert!(reporter.any_contains("cjxl: encoding done"));
        assert!(reporter.any_contains("Created output folder"));
        assert_eq!(reporter.count(Severity::Error), 0);

        let encoder_calls = fx.log_lines("cjxl");
        assert_eq!(encoder_calls.len(), 2);
        assert!(encoder_calls[0].ends_with("-q 90"));
        assert!(fx.scratch_is_empty());
    }

    #[test]
    fn test_existing_output_is_skipped() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        fs::create_dir(&fx.output).unwrap();
        fs::write(fx.output.join("A.jxl"), b"previous").unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(reporter.any_contains("Skipping (1/2): A.RAF. Output file 'A.jxl' already exists."));
        assert_eq!(fs::read(fx.output.join("A.jxl")).unwrap(), b"previous");
        assert!(fx.output.join("B.jxl").exists());
        assert_eq!(reporter.progress_log(), vec![(1, 2), (2, 2)]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.converted, 1);
        assert_eq!(fx.log_lines("cjxl").len(), 1);
    }

    #[test]
    fn test_other_format_output_does_not_block() {
        let fx = Fixture::new(&["A.RAF"]);
        fs::create_dir(&fx.output).unwrap();
        File::create(fx.output.join("A.avif")).unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert_eq!(summary.converted, 1);
        assert!(fx.output.join("A.jxl").exists());
    }

    #[test]
    fn test_second_run_skips_everything() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let registry = fx.registry(true);
        let job = fx.job(OutputFormat::Jxl, 1.0, false);

        fx.orchestrator(registry.clone())
            .run(&job, &RecordingReporter::default());

        let reporter = RecordingReporter::default();
        let summary = fx.orchestrator(registry).run(&job, &reporter);

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.converted, 0);
        assert_eq!(reporter.progress_log(), vec![(1, 2), (2, 2)]);
        assert_eq!(fx.log_lines("cjxl").len(), 2);
    }

    #[test]
    fn test_unavailable_encoder_aborts_before_work() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let mut config = fx.tools_config(true, 0);
        config.cjxl = fx.tools.join("missing-cjxl");
        let registry = ToolRegistry::probe_all(&config);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(registry)
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert_eq!(reporter.count(Severity::Error), 1);
        assert_eq!(reporter.progress_log(), vec![(0, 0)]);
        assert!(summary.is_aborted());
        assert_eq!(summary.converted + summary.skipped + summary.failed, 0);
        assert!(!fx.output.exists());
        assert!(fx.log_lines("exiftool").is_empty());

        let (last, severity) = reporter.status_log().pop().unwrap();
        assert!(last.starts_with("Batch conversion process (JXL) finished"));
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn test_missing_exiftool_warns_and_keeps_output() {
        let fx = Fixture::new(&["A.RAF"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(false))
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert!(fx.output.join("A.jxl").exists());
        assert!(reporter.any_contains("Skipping metadata copy"));
        assert_eq!(reporter.count(Severity::Warning), 1);
        assert_eq!(summary.metadata_copied, 0);
        assert!(fx.log_lines("exiftool").is_empty());
    }

    #[test]
    fn test_vanished_exiftool_disables_metadata_for_rest_of_run() {
        let fx = Fixture::new(&["A.RAF", "B.raf", "C.RAF"]);
        let mut registry = fx.registry(true);
        registry.exiftool.executable_path = fx.tools.join("vanished-exiftool");
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(registry)
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert_eq!(summary.converted, 3);
        assert!(!summary.is_aborted());
        assert_eq!(summary.metadata_failed, 1);
        assert_eq!(summary.metadata_copied, 0);
        assert!(!summary.registry.exiftool.available);
        assert!(summary
            .registry
            .exiftool
            .version_info
            .ends_with("not found during batch run."));

        let statuses = reporter.status_log();
        let not_found: Vec<_> = statuses
            .iter()
            .filter(|(m, _)| m.contains("not found during metadata copy"))
            .collect();
        assert_eq!(not_found.len(), 1);
        assert_eq!(not_found[0].1, Severity::Error);

        let skipped: Vec<_> = statuses
            .iter()
            .filter(|(m, _)| m.contains("Skipping metadata copy"))
            .collect();
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|(_, s)| *s == Severity::Warning));

        assert_eq!(reporter.progress_log(), vec![(1, 3), (2, 3), (3, 3)]);
        for name in ["A.jxl", "B.jxl", "C.jxl"] {
            assert!(fx.output.join(name).exists());
        }
    }

    #[test]
    fn test_dangling_links_do_not_abort_batch() {
        use std::os::unix::fs::symlink;

        let fx = Fixture::new(&["A.RAF", "B.RAF"]);
        symlink(fx.input.join("gone.txt"), fx.input.join("stale-link.txt")).unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(!summary.is_aborted());
        assert_eq!(summary.converted, 2);
        assert_eq!(reporter.progress_log(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_dangling_raw_link_fails_alone() {
        use crate::raw::EngineDecoder;
        use std::os::unix::fs::symlink;

        let fx = Fixture::new(&[]);
        symlink(fx.input.join("gone.RAF"), fx.input.join("X.RAF")).unwrap();
        let reporter = RecordingReporter::default();

        let summary = Orchestrator::new(fx.registry(true), EngineDecoder)
            .with_scratch_root(&fx.scratch)
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(!summary.is_aborted());
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert!(reporter.any_contains("Error processing RAW X.RAF"));
        assert_eq!(reporter.progress_log(), vec![(1, 1)]);
        assert!(fx.scratch_is_empty());
    }

    #[test]
    fn test_metadata_copied_after_encoding() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert_eq!(summary.metadata_copied, 2);
        let calls = fx.log_lines("exiftool");
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with(&format!(
            "-tagsFromFile {}",
            fx.input.join("A.RAF").display()
        )));
        assert!(reporter.any_contains("exiftool: 1 image files updated"));
        assert!(reporter.any_contains("exiftool (stderr/warning): Warning: [minor] Tag not found"));
        assert!(reporter.any_contains("Successfully copied metadata (including GPS) to A.jxl"));
    }

    #[test]
    fn test_metadata_failure_preserves_output() {
        let fx = Fixture::new(&["A.RAF"]);
        let registry = ToolRegistry::probe_all(&fx.tools_config(true, 1));
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(registry)
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert!(fx.output.join("A.jxl").exists());
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.metadata_failed, 1);
        assert!(reporter.any_contains("Error copying metadata to A.jxl"));
        assert!(reporter.any_contains("Return Code: 1"));
        assert_eq!(reporter.progress_log(), vec![(1, 1)]);
    }

    #[test]
    fn test_no_files_reports_and_creates_nothing() {
        let fx = Fixture::new(&[]);
        File::create(fx.input.join("notes.txt")).unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert_eq!(reporter.progress_log(), vec![(0, 0)]);
        assert!(reporter.any_contains("No .RAF files found"));
        assert!(!summary.is_aborted());
        assert_eq!(summary.total, 0);
        assert!(fx.output.is_dir());
        assert_eq!(fs::read_dir(&fx.output).unwrap().count(), 0);
        assert!(fx.scratch_is_empty());
    }

    #[test]
    fn test_tiny_scale_keeps_original_size() {
        let fx = Fixture::new(&["A.RAF"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 0.01, false), &reporter);

        assert_eq!(summary.converted, 1);
        assert!(reporter.any_contains("Invalid new dimensions 0x0 for A.RAF"));
        assert_eq!(reporter.count(Severity::Warning), 1);

        let written = fx.decode_output("A.jxl");
        assert_eq!(written.width(), 8);
        assert_eq!(written.height(), 6);
    }

    #[test]
    fn test_scale_is_applied() {
        let fx = Fixture::new(&["A.RAF"]);
        let reporter = RecordingReporter::default();

        fx.orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 0.5, false), &reporter);

        assert!(reporter.any_contains("Resizing from 8x6 to 4x3 (scale: 0.50)"));
        let written = fx.decode_output("A.jxl");
        assert_eq!((written.width(), written.height()), (4, 3));
    }

    #[test]
    fn test_decode_failure_is_isolated() {
        let fx = Fixture::new(&["A.RAF", "corrupt.RAF", "Z.RAF"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.has_failures());
        assert!(!fx.output.join("corrupt.jxl").exists());
        assert!(reporter.any_contains("Error processing RAW corrupt.RAF to PNG"));
        assert_eq!(reporter.progress_log(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_encoder_failure_is_isolated() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let mut config = fx.tools_config(true, 0);
        config.cjxl = write_script(
            &fx.tools,
            "failing-cjxl",
            "if [ \"$1\" = \"--version\" ]; then echo 'v1'; exit 0; fi\necho 'boom' >&2\nexit 2\n",
        );
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(ToolRegistry::probe_all(&config))
            .run(&fx.job(OutputFormat::Jxl, 1.0, true), &reporter);

        assert_eq!(summary.failed, 2);
        assert!(!summary.is_aborted());
        assert!(reporter.any_contains("Error encoding A.jxl with cjxl. Skipping."));
        assert!(reporter.any_contains("Stderr: boom"));
        assert_eq!(reporter.progress_log(), vec![(1, 2), (2, 2)]);
        assert!(fx.log_lines("exiftool").is_empty());
    }

    #[test]
    fn test_vanished_encoder_aborts_and_cleans_up() {
        let fx = Fixture::new(&["A.RAF", "B.raf"]);
        let mut registry = fx.registry(true);
        registry.cjxl.executable_path = fx.tools.join("vanished-cjxl");
        let reporter = RecordingReporter::default();
        let mut orchestrator = fx.orchestrator(registry);

        let summary = orchestrator.run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(summary.is_aborted());
        assert!(!summary.registry.cjxl.available);
        assert!(!orchestrator.registry().is_available(ToolKind::Cjxl));
        assert!(reporter.any_contains("not found during conversion. Stopping batch."));
        assert!(reporter.progress_log().is_empty());
        assert!(!fx.output.join("A.jxl").exists());
        assert!(fx.scratch_is_empty());
    }

    #[test]
    fn test_missing_source_folder() {
        let fx = Fixture::new(&[]);
        fs::remove_dir(&fx.input).unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(summary.is_aborted());
        assert!(reporter.any_contains("does not exist"));
        assert_eq!(reporter.count(Severity::Error), 1);
        assert_eq!(reporter.progress_log(), vec![(0, 0)]);
    }

    #[test]
    fn test_output_path_is_a_file() {
        let fx = Fixture::new(&["A.RAF"]);
        fs::write(&fx.output, b"not a folder").unwrap();
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert!(summary.is_aborted());
        assert!(reporter.any_contains("is not a directory"));
        assert_eq!(reporter.progress_log(), vec![(0, 0)]);
    }

    #[test]
    fn test_avif_run_uses_avifenc() {
        let fx = Fixture::new(&["A.RAF"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Avif, 1.0, false), &reporter);

        assert_eq!(summary.format, OutputFormat::Avif);
        assert!(fx.output.join("A.avif").exists());
        assert!(fx.log_lines("cjxl").is_empty());
        assert!(fx.log_lines("avifenc")[0].ends_with("-q 90 --depth 10 --yuv 444"));
        assert!(summary
            .message()
            .starts_with("Batch conversion process (AVIF) finished: 1 converted"));
    }

    #[test]
    fn test_colliding_names_are_deterministic() {
        let fx = Fixture::new(&["a(1).RAF", "a[1].RAF"]);
        let reporter = RecordingReporter::default();

        let summary = fx
            .orchestrator(fx.registry(true))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &reporter);

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert!(fx.output.join("a_1_.jxl").exists());
    }

    #[test]
    fn test_summary_serializes() {
        let fx = Fixture::new(&["A.RAF"]);
        let summary = fx
            .orchestrator(fx.registry(false))
            .run(&fx.job(OutputFormat::Jxl, 1.0, false), &RecordingReporter::default());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["format"], "jxl");
        assert_eq!(json["converted"], 1);
        assert!(json["aborted"].is_null());
        assert_eq!(json["registry"]["exiftool"]["available"], false);
    }
}
