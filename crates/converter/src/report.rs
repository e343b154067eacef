//! Status and progress reporting
//!
//! The orchestrator only knows two narrow capabilities, [`StatusSink`] and
//! [`ProgressSink`]. Concrete sinks decide where reports go: a channel back to
//! the controlling surface, the tracing subscriber, or a test spy.

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Receives milestone, skip and failure messages
pub trait StatusSink {
    fn status(&self, message: &str, severity: Severity);

    fn info(&self, message: &str) {
        self.status(message, Severity::Info);
    }

    fn warning(&self, message: &str) {
        self.status(message, Severity::Warning);
    }

    fn error(&self, message: &str) {
        self.status(message, Severity::Error);
    }
}

/// Receives `(completed, total)` after every enumerated file
pub trait ProgressSink {
    fn progress(&self, completed: usize, total: usize);
}

/// One report emitted by a running batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BatchEvent {
    Status { message: String, severity: Severity },
    Progress { completed: usize, total: usize },
}

/// Forwards reports over an unbounded channel
///
/// Sending never blocks, so this sink can be driven from the worker thread
/// while the receiving side stays responsive. Reports sent after the receiver
/// is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<BatchEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::UnboundedSender<BatchEvent>) -> Self {
        Self { tx }
    }

    /// Create a reporter together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl StatusSink for ChannelReporter {
    fn status(&self, message: &str, severity: Severity) {
        let _ = self.tx.send(BatchEvent::Status {
            message: message.to_string(),
            severity,
        });
    }
}

impl ProgressSink for ChannelReporter {
    fn progress(&self, completed: usize, total: usize) {
        let _ = self.tx.send(BatchEvent::Progress { completed, total });
    }
}

/// Writes reports to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    /// Log a single event received from a channel
    pub fn emit(&self, event: &BatchEvent) {
        match event {
            BatchEvent::Status { message, severity } => self.status(message, *severity),
            BatchEvent::Progress { completed, total } => self.progress(*completed, *total),
        }
    }
}

impl StatusSink for TracingReporter {
    fn status(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

impl ProgressSink for TracingReporter {
    fn progress(&self, completed: usize, total: usize) {
        let percent = if total > 0 { completed * 100 / total } else { 0 };
        info!("Progress: {}/{} ({}%)", completed, total, percent);
    }
}
