//! Composite sink for fanning records out to several destinations.
//!
//! [`MultiSink`] holds any number of [`LogSink`] implementations. An entry is
//! written concurrently to every sink that has its category and level enabled.
//!
//! # Example
//!
//! ```rust
//! use http_message_logging::{MultiSink, TracingSink};
//!
//! let sink = MultiSink::new().with(TracingSink);
//!
//! // let layer = HttpMessageLoggingLayer::new(options, sink);
//! ```

use std::sync::Arc;

use crate::error::SinkError;
use crate::level::LogLevel;
use crate::sink::{DynSink, LogSink, SinkWrapper};
use crate::types::LogEntry;

/// A sink that delegates to multiple inner sinks.
///
/// It is enabled when any inner sink is. Failures from individual sinks are
/// collected into [`SinkError::Aggregate`] after all writes have finished, so one
/// broken destination never starves the others.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn DynSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink. Returns self for builder chaining.
    pub fn with<S: LogSink>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(SinkWrapper { inner: sink }));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl std::fmt::Debug for MultiSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl LogSink for MultiSink {
    fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        self.sinks.iter().any(|s| s.is_enabled(category, level))
    }

    async fn write(&self, entry: LogEntry) -> Result<(), SinkError> {
        let futures: Vec<_> = self
            .sinks
            .iter()
            .filter(|s| s.is_enabled(&entry.category, entry.level))
            .map(|s| {
                let entry = entry.clone();
                let sink = s.clone();
                async move { sink.write_boxed(entry).await }
            })
            .collect();

        let errors: Vec<SinkError> = futures::future::join_all(futures)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SinkError::Aggregate(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodySnapshot, ExchangeOutcome, ExchangeRecord, RequestSnapshot};
    use axum::http::{Method, Uri, Version};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    /// Test sink that counts writes at or above a minimum level
    struct CountingSink {
        min_level: LogLevel,
        writes: Arc<AtomicUsize>,
    }

    impl LogSink for CountingSink {
        fn is_enabled(&self, _category: &str, level: LogLevel) -> bool {
            level >= self.min_level
        }

        async fn write(&self, _entry: LogEntry) -> Result<(), SinkError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn is_enabled(&self, _category: &str, _level: LogLevel) -> bool {
            true
        }

        async fn write(&self, _entry: LogEntry) -> Result<(), SinkError> {
            Err(SinkError::Rejected("unavailable".into()))
        }
    }

    fn entry(level: LogLevel) -> LogEntry {
        let record = ExchangeRecord {
            correlation_id: 123,
            timestamp: SystemTime::now(),
            request: RequestSnapshot {
                method: Method::GET,
                uri: Uri::from_static("/test"),
                version: Version::HTTP_11,
                headers: Vec::new(),
                body: BodySnapshot::Suppressed { size: None },
            },
            response: None,
            elapsed: Duration::from_millis(10),
            outcome: ExchangeOutcome::Cancelled,
        };
        LogEntry::new("test", level, record)
    }

    #[tokio::test]
    async fn empty_multi_sink_is_disabled() {
        let sink = MultiSink::new();
        assert!(sink.is_empty());
        assert!(!sink.is_enabled("test", LogLevel::Critical));
        assert!(sink.write(entry(LogLevel::Information)).await.is_ok());
    }

    #[tokio::test]
    async fn writes_only_to_enabled_sinks() {
        let verbose = Arc::new(AtomicUsize::new(0));
        let quiet = Arc::new(AtomicUsize::new(0));

        let sink = MultiSink::new()
            .with(CountingSink {
                min_level: LogLevel::Debug,
                writes: verbose.clone(),
            })
            .with(CountingSink {
                min_level: LogLevel::Error,
                writes: quiet.clone(),
            });

        assert_eq!(sink.len(), 2);
        assert!(sink.is_enabled("test", LogLevel::Information));

        sink.write(entry(LogLevel::Information)).await.unwrap();
        assert_eq!(verbose.load(Ordering::SeqCst), 1);
        assert_eq!(quiet.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_other_sinks() {
        let writes = Arc::new(AtomicUsize::new(0));
        let sink = MultiSink::new().with(FailingSink).with(CountingSink {
            min_level: LogLevel::Trace,
            writes: writes.clone(),
        });

        let result = sink.write(entry(LogLevel::Warning)).await;
        assert!(matches!(result, Err(SinkError::Aggregate(ref errors)) if errors.len() == 1));
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    /// Sink that waits at a barrier - proves concurrent writes
    struct BarrierSink {
        barrier: Arc<tokio::sync::Barrier>,
    }

    impl LogSink for BarrierSink {
        fn is_enabled(&self, _category: &str, _level: LogLevel) -> bool {
            true
        }

        async fn write(&self, _entry: LogEntry) -> Result<(), SinkError> {
            self.barrier.wait().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn sinks_are_written_concurrently() {
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let sink = MultiSink::new()
            .with(BarrierSink {
                barrier: barrier.clone(),
            })
            .with(BarrierSink {
                barrier: barrier.clone(),
            });

        // Sequential writes would deadlock at the barrier
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            sink.write(entry(LogLevel::Information)),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
