//! Data types for captured HTTP exchanges.
//!
//! An [`ExchangeRecord`] is built up over the pre- and post-phase of one exchange,
//! handed to the log worker once, and then dropped. Nothing here is shared between
//! exchanges.

use axum::http::{Method, StatusCode, Uri, Version};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use crate::level::LogLevel;

/// Header name/value pairs after the ignore/redact policy has run
pub type CapturedHeaders = Vec<(String, String)>;

/// What the record knows about a request or response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySnapshot {
    /// Capture disabled by configuration; `size` is filled in when known up front
    Suppressed { size: Option<u64> },
    /// No body, or a zero-length one
    Empty,
    /// The complete body
    Captured(Bytes),
    /// Buffering stopped at the configured limit and the rest was streamed through
    TooLarge { limit: usize },
    /// The body stream failed part-way
    Unreadable { read: usize, reason: String },
}

impl BodySnapshot {
    pub fn captured(&self) -> Option<&Bytes> {
        match self {
            BodySnapshot::Captured(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Data captured from an outgoing request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    /// Target URI exactly as dispatched, query string included
    pub uri: Uri,
    pub version: Version,
    pub headers: CapturedHeaders,
    pub body: BodySnapshot,
}

/// Data captured from the response handed back by the inner transport.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub version: Version,
    pub headers: CapturedHeaders,
    pub body: BodySnapshot,
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The inner transport produced a response
    Completed,
    /// The inner transport returned an error, rendered with `Display`
    Failed { error: String },
    /// The caller dropped the exchange before it finished
    Cancelled,
}

impl ExchangeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeOutcome::Completed => "completed",
            ExchangeOutcome::Failed { .. } => "failed",
            ExchangeOutcome::Cancelled => "cancelled",
        }
    }
}

/// Everything logged about one request/response pair.
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    /// Unique identifier for this exchange within the process
    pub correlation_id: u64,
    /// When the handler started processing the request
    pub timestamp: SystemTime,
    pub request: RequestSnapshot,
    /// Absent when the transport failed or the exchange was cancelled
    pub response: Option<ResponseSnapshot>,
    /// Time from dispatch to the inner transport until its response (or error) arrived
    pub elapsed: Duration,
    pub outcome: ExchangeOutcome,
}

/// One write to a [`LogSink`](crate::LogSink).
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub category: String,
    pub level: LogLevel,
    /// Raw-message rendering of the record
    pub message: String,
    pub record: ExchangeRecord,
}

impl LogEntry {
    pub fn new(category: impl Into<String>, level: LogLevel, record: ExchangeRecord) -> Self {
        Self {
            category: category.into(),
            level,
            message: record.to_string(),
            record,
        }
    }

    /// Structured fields for sinks that index entries.
    pub fn fields(&self) -> BTreeMap<&'static str, String> {
        let record = &self.record;
        let mut fields = BTreeMap::new();
        fields.insert("correlation_id", record.correlation_id.to_string());
        fields.insert("method", record.request.method.to_string());
        fields.insert("uri", record.request.uri.to_string());
        fields.insert("version", format!("{:?}", record.request.version));
        fields.insert("outcome", record.outcome.as_str().to_owned());
        fields.insert("elapsed_ms", format!("{:.3}", record.elapsed.as_secs_f64() * 1000.0));
        if let Some(body) = record.request.body.captured() {
            fields.insert("request_body_bytes", body.len().to_string());
        }
        if let Some(response) = &record.response {
            fields.insert("status", response.status.as_u16().to_string());
            if let Some(body) = response.body.captured() {
                fields.insert("response_body_bytes", body.len().to_string());
            }
        }
        if let ExchangeOutcome::Failed { error } = &record.outcome {
            fields.insert("error", error.clone());
        }
        fields
    }
}
