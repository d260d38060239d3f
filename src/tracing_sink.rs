//! Log sink backed by the `tracing` crate.
//!
//! [`TracingSink`] emits each exchange as one `tracing` event under the
//! `http_message_logging` target. The logger category travels as a field, so
//! subscribers can filter on it alongside the target.

use tracing::Level;

use crate::error::SinkError;
use crate::level::LogLevel;
use crate::sink::LogSink;
use crate::types::LogEntry;

/// Target every record is emitted under.
pub const TARGET: &str = "http_message_logging";

/// [`LogSink`] that writes to the current `tracing` subscriber.
///
/// The event carries these fields:
/// - `category`, `correlation_id`
/// - `method`, `uri`, and `status` when a response arrived
/// - `elapsed_ms`, `outcome`
///
/// The event message is the full raw-message rendering of the exchange.
///
/// # Examples
///
/// ```rust,no_run
/// use http_message_logging::{HttpMessageLoggingLayer, LoggingOptions, TracingSink};
///
/// # #[tokio::main]
/// # async fn main() {
/// let layer = HttpMessageLoggingLayer::new(LoggingOptions::default(), TracingSink);
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! enabled_at {
    ($level:expr) => {
        tracing::enabled!(target: TARGET, $level)
    };
}

macro_rules! emit_at {
    ($level:expr, $entry:expr) => {{
        let entry = $entry;
        let record = &entry.record;
        tracing::event!(
            target: TARGET,
            $level,
            category = %entry.category,
            correlation_id = record.correlation_id,
            method = %record.request.method,
            uri = %record.request.uri,
            status = record.response.as_ref().map(|r| r.status.as_u16()),
            elapsed_ms = record.elapsed.as_millis() as u64,
            outcome = record.outcome.as_str(),
            "{}",
            entry.message
        )
    }};
}

impl LogSink for TracingSink {
    fn is_enabled(&self, _category: &str, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => enabled_at!(Level::TRACE),
            LogLevel::Debug => enabled_at!(Level::DEBUG),
            LogLevel::Information => enabled_at!(Level::INFO),
            LogLevel::Warning => enabled_at!(Level::WARN),
            LogLevel::Error | LogLevel::Critical => enabled_at!(Level::ERROR),
            LogLevel::None => false,
        }
    }

    async fn write(&self, entry: LogEntry) -> Result<(), SinkError> {
        match entry.level {
            LogLevel::Trace => emit_at!(Level::TRACE, &entry),
            LogLevel::Debug => emit_at!(Level::DEBUG, &entry),
            LogLevel::Information => emit_at!(Level::INFO, &entry),
            LogLevel::Warning => emit_at!(Level::WARN, &entry),
            LogLevel::Error | LogLevel::Critical => emit_at!(Level::ERROR, &entry),
            LogLevel::None => {}
        }
        Ok(())
    }
}
