//! Background batch worker
//!
//! A batch runs on the blocking thread pool; its status and progress reports
//! come back over a channel and its summary through the task handle.

use crate::batch::{BatchSummary, Orchestrator};
use crate::job::ConversionJob;
use crate::raw::RawDecoder;
use crate::report::{BatchEvent, ChannelReporter};
use crate::tools::ToolRegistry;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Error type for the worker
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The batch task panicked or was cancelled
    #[error("Batch worker did not complete: {0}")]
    Join(#[from] JoinError),
}

/// Handle for a running batch
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    task: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Next report from the worker; `None` once the worker is done and every
    /// report has been received
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Whether the worker has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the batch to finish and return its summary
    ///
    /// Reports not yet taken with [`next_event`](Self::next_event) are
    /// discarded.
    pub async fn wait(self) -> Result<BatchSummary, WorkerError> {
        Ok(self.task.await?)
    }
}

/// Start `job` on a background thread
///
/// The registry moves into the worker; adopt `summary.registry` afterwards.
/// Must be called from within a tokio runtime.
pub fn spawn_batch<D>(job: ConversionJob, registry: ToolRegistry, decoder: D) -> BatchHandle
where
    D: RawDecoder + Send + 'static,
{
    let (reporter, events) = ChannelReporter::channel();
    debug!(
        "Spawning batch worker for {}",
        job.source_folder().display()
    );

    let task = tokio::task::spawn_blocking(move || {
        let mut orchestrator = Orchestrator::new(registry, decoder);
        orchestrator.run(&job, &reporter)
    });

    BatchHandle { events, task }
}
