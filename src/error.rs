//! Error types for the logging path.
//!
//! None of these ever reach the caller of the wrapped service. They are
//! reported through `tracing` diagnostics and folded into the exchange record.

use thiserror::Error;

/// Failure while buffering a request or response body for capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("body stream error after {read} bytes: {reason}")]
    Stream { read: usize, reason: String },

    #[error("body exceeds capture limit of {limit} bytes")]
    TooLarge { limit: usize },
}

/// Failure reported by a [`LogSink`](crate::LogSink) while writing an entry.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log sink rejected entry: {0}")]
    Rejected(String),

    #[error("log sink panicked while writing entry")]
    Panicked,

    #[error("{} log sinks failed: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<SinkError>),
}

fn join_errors(errors: &[SinkError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
