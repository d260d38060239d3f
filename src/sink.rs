//! The log sink contract and its type-erased form.

use std::future::Future;
use std::pin::Pin;

use crate::error::SinkError;
use crate::level::LogLevel;
use crate::types::LogEntry;

/// Destination for exchange records.
///
/// The handler asks [`is_enabled`](LogSink::is_enabled) before doing any capture
/// work, and hands finished entries to [`write`](LogSink::write) on a background
/// task so a slow sink never delays the exchange.
///
/// # Examples
///
/// ```rust
/// use http_message_logging::{LogEntry, LogLevel, LogSink, SinkError};
///
/// #[derive(Debug)]
/// struct Stdout;
///
/// impl LogSink for Stdout {
///     fn is_enabled(&self, _category: &str, level: LogLevel) -> bool {
///         level >= LogLevel::Information
///     }
///
///     async fn write(&self, entry: LogEntry) -> Result<(), SinkError> {
///         println!("[{}] {}", entry.category, entry.message);
///         Ok(())
///     }
/// }
/// ```
pub trait LogSink: Send + Sync + 'static {
    /// Whether entries at `level` under `category` would be recorded.
    fn is_enabled(&self, category: &str, level: LogLevel) -> bool;

    /// Record one entry.
    fn write(&self, entry: LogEntry) -> impl Future<Output = Result<(), SinkError>> + Send;
}

pub(crate) type BoxFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// Object-safe mirror of [`LogSink`] so the layer need not be generic over its sink.
pub(crate) trait DynSink: Send + Sync + 'static {
    fn is_enabled(&self, category: &str, level: LogLevel) -> bool;
    fn write_boxed(&self, entry: LogEntry) -> BoxFuture<'_>;
}

pub(crate) struct SinkWrapper<S: LogSink> {
    pub(crate) inner: S,
}

impl<S: LogSink> DynSink for SinkWrapper<S> {
    fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        self.inner.is_enabled(category, level)
    }

    fn write_boxed(&self, entry: LogEntry) -> BoxFuture<'_> {
        Box::pin(self.inner.write(entry))
    }
}
