//! # http-message-logging
//!
//! A Tower middleware for outbound HTTP clients that logs every request/response
//! exchange as a raw HTTP message, without changing what the caller or the network
//! sees.
//!
//! ## Features
//!
//! - **Body replay**: bodies are buffered and rebuilt, so both the transport and
//!   the caller still get a complete, readable stream
//! - **Header policy**: per-side ignore and redact sets, matched case-insensitively
//! - **Fail-open**: capture, formatting and sink failures never change the outcome
//!   of the exchange
//! - **Zero-cost when disabled**: if the sink does not have the configured level
//!   enabled, requests go straight through untouched
//! - **Background delivery**: records are written by a background task, off the
//!   request path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::body::Body;
//! use axum::http::{Request, Response};
//! use http_message_logging::{HttpMessageLoggingLayer, LoggingOptions, TracingSink};
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), std::convert::Infallible> {
//! let options = LoggingOptions {
//!     ignore_request_content: false,
//!     ignore_response_content: false,
//!     ..Default::default()
//! };
//!
//! // Any `Service<Request<Body>, Response = Response<Body>>` can sit underneath
//! let transport = service_fn(|_req: Request<Body>| async {
//!     Ok::<_, std::convert::Infallible>(Response::new(Body::from(r#"{"temp":280}"#)))
//! });
//!
//! let client = ServiceBuilder::new()
//!     .layer(HttpMessageLoggingLayer::new(options, TracingSink))
//!     .service(transport);
//!
//! let request = Request::get("http://samples.openweathermap.org/data/2.5/weather?q=London,uk")
//!     .header("Authorization", "Bearer xyz")
//!     .body(Body::empty())
//!     .unwrap();
//! let response = client.oneshot(request).await?;
//! # Ok(())
//! # }
//! ```

use axum::body::Body;
use axum::http::{Request, Response};
use futures::FutureExt;
use std::{
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::{Duration, Instant, SystemTime},
};
use tokio::sync::mpsc;
use tower::{Layer, Service};
use tracing::{debug, error, instrument, warn};

pub mod body_wrapper;
pub mod error;
mod format;
pub mod level;
pub mod multi_sink;
pub mod options;
pub mod redact;
pub mod sink;
pub mod tracing_sink;
pub mod types;

pub use error::{CaptureError, SinkError};
pub use level::LogLevel;
pub use multi_sink::MultiSink;
pub use options::{HeaderNames, LoggingOptions, DEFAULT_CATEGORY};
pub use redact::{HeaderPolicy, REDACTED};
pub use sink::LogSink;
pub use tracing_sink::TracingSink;
pub use types::{
    BodySnapshot, ExchangeOutcome, ExchangeRecord, LogEntry, RequestSnapshot, ResponseSnapshot,
};

use body_wrapper::{buffer_body, suppressed};
use sink::{DynSink, SinkWrapper};

/// Global atomic counter for correlation IDs and process start timestamp
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(1);
static PROCESS_START_TIME: std::sync::OnceLock<u64> = std::sync::OnceLock::new();

/// Generate a unique correlation ID combining process start time and counter
fn generate_correlation_id() -> u64 {
    let start_time = *PROCESS_START_TIME.get_or_init(|| {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    });

    let counter = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed);

    // High 32 bits: process start timestamp, Low 32 bits: counter
    (start_time << 32) | (counter & 0xFFFFFFFF)
}

/// State shared by every clone of the layer and its services.
struct Shared {
    options: LoggingOptions,
    sink: Arc<dyn DynSink>,
    tx: mpsc::UnboundedSender<ExchangeRecord>,
}

impl Shared {
    fn category(&self) -> &str {
        self.options.category()
    }

    fn enabled(&self) -> bool {
        self.options.level != LogLevel::None
            && self.sink.is_enabled(self.category(), self.options.level)
    }
}

/// Tower layer that adds exchange logging to an HTTP client service.
///
/// Building the layer spawns the background task that formats records and writes
/// them to the sink, so it must be created inside a Tokio runtime. Clones share
/// that task.
///
/// # Examples
///
/// ```rust,no_run
/// use http_message_logging::{HeaderNames, HttpMessageLoggingLayer, LoggingOptions, TracingSink};
///
/// # #[tokio::main]
/// # async fn main() {
/// let options = LoggingOptions {
///     category_name: Some("weather-client".into()),
///     ignore_request_headers: HeaderNames::from_iter(["User-Agent"]),
///     ..Default::default()
/// };
/// let layer = HttpMessageLoggingLayer::new(options, TracingSink);
/// # }
/// ```
#[derive(Clone)]
pub struct HttpMessageLoggingLayer {
    shared: Arc<Shared>,
}

impl HttpMessageLoggingLayer {
    /// Create a layer with the given options and sink.
    ///
    /// # Arguments
    ///
    /// * `options` - What to capture and what to hide; fixed from here on
    /// * `sink` - Where finished records go
    pub fn new<S: LogSink>(options: LoggingOptions, sink: S) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ExchangeRecord>();
        let sink: Arc<dyn DynSink> = Arc::new(SinkWrapper { inner: sink });
        let sink_clone = sink.clone();
        let category = options.category().to_owned();
        let level = options.level;

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let correlation_id = record.correlation_id;
                let entry = LogEntry::new(category.as_str(), level, record);
                let write = AssertUnwindSafe(sink_clone.write_boxed(entry)).catch_unwind();
                match write.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(correlation_id = %correlation_id, error = %e, "Log sink failed to write exchange");
                    }
                    Err(_) => {
                        warn!(correlation_id = %correlation_id, error = %SinkError::Panicked, "Log sink failed to write exchange");
                    }
                }
            }
            debug!("Exchange log worker stopped");
        });

        Self {
            shared: Arc::new(Shared { options, sink, tx }),
        }
    }

    pub fn options(&self) -> &LoggingOptions {
        &self.shared.options
    }
}

impl<S> Layer<S> for HttpMessageLoggingLayer {
    type Service = HttpMessageLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMessageLoggingService {
            inner,
            shared: self.shared.clone(),
        }
    }
}

/// Tower service that logs each exchange passing through to `S`.
///
/// Created by [`HttpMessageLoggingLayer`]. The response, or the inner service's
/// error, is returned exactly as `S` produced it.
#[derive(Clone)]
pub struct HttpMessageLoggingService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S> Service<Request<Body>> for HttpMessageLoggingService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display + Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[instrument(skip_all)]
    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if !self.shared.enabled() {
            return Box::pin(self.inner.call(request));
        }

        // The clone takes over readiness for the next call; the driven inner
        // service moves into the future.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let shared = self.shared.clone();

        Box::pin(async move {
            let correlation_id = generate_correlation_id();
            let timestamp = SystemTime::now();
            let options = &shared.options;

            debug!(correlation_id = %correlation_id, method = %request.method(), uri = %request.uri(), "Capturing request");

            let request_policy =
                HeaderPolicy::new(&options.ignore_request_headers, &options.redact_request_headers);
            let request_headers = request_policy.apply(request.headers());

            let request_body = if options.ignore_request_content {
                suppressed(request.body(), request.headers())
            } else {
                let body = std::mem::replace(request.body_mut(), Body::empty());
                let (body, snapshot) = buffer_body(body, options.max_body_bytes, correlation_id).await;
                *request.body_mut() = body;
                snapshot
            };

            let mut exchange = PendingExchange::new(
                shared.tx.clone(),
                ExchangeRecord {
                    correlation_id,
                    timestamp,
                    request: RequestSnapshot {
                        method: request.method().clone(),
                        uri: request.uri().clone(),
                        version: request.version(),
                        headers: request_headers,
                        body: request_body,
                    },
                    response: None,
                    elapsed: Default::default(),
                    outcome: ExchangeOutcome::Cancelled,
                },
            );

            let result = inner.call(request).await;
            let elapsed = exchange.dispatched_at.elapsed();

            match result {
                Ok(response) => {
                    let (parts, body) = response.into_parts();

                    let response_policy = HeaderPolicy::new(
                        &options.ignore_response_headers,
                        &options.redact_response_headers,
                    );
                    exchange.respond(
                        elapsed,
                        ResponseSnapshot {
                            status: parts.status,
                            version: parts.version,
                            headers: response_policy.apply(&parts.headers),
                            body: BodySnapshot::Unreadable {
                                read: 0,
                                reason: "exchange cancelled while reading response body".into(),
                            },
                        },
                    );

                    let (body, body_snapshot) = if options.ignore_response_content {
                        let snapshot = suppressed(&body, &parts.headers);
                        (body, snapshot)
                    } else {
                        buffer_body(body, options.max_body_bytes, correlation_id).await
                    };
                    exchange.complete(body_snapshot);

                    Ok(Response::from_parts(parts, body))
                }
                Err(e) => {
                    debug!(correlation_id = %correlation_id, error = %e, "Inner service failed");
                    exchange.fail(elapsed, e.to_string());
                    Err(e)
                }
            }
        })
    }
}

/// An exchange whose record has not been sent yet.
///
/// Dropping it before [`complete`](PendingExchange::complete) or
/// [`fail`](PendingExchange::fail), which is what happens when the caller drops
/// the response future, sends the record as cancelled. A response head recorded
/// with [`respond`](PendingExchange::respond) is kept in that record.
struct PendingExchange {
    tx: mpsc::UnboundedSender<ExchangeRecord>,
    record: Option<ExchangeRecord>,
    dispatched_at: Instant,
}

impl PendingExchange {
    fn new(tx: mpsc::UnboundedSender<ExchangeRecord>, record: ExchangeRecord) -> Self {
        Self {
            tx,
            record: Some(record),
            dispatched_at: Instant::now(),
        }
    }

    /// Records the response head and the time the inner service took to produce it.
    fn respond(&mut self, elapsed: Duration, head: ResponseSnapshot) {
        if let Some(record) = self.record.as_mut() {
            record.elapsed = elapsed;
            record.response = Some(head);
        }
    }

    fn complete(&mut self, body: BodySnapshot) {
        if let Some(mut record) = self.record.take() {
            if let Some(response) = record.response.as_mut() {
                response.body = body;
            }
            record.outcome = ExchangeOutcome::Completed;
            self.send(record);
        }
    }

    fn fail(&mut self, elapsed: Duration, error: String) {
        if let Some(mut record) = self.record.take() {
            record.elapsed = elapsed;
            record.response = None;
            record.outcome = ExchangeOutcome::Failed { error };
            self.send(record);
        }
    }

    fn send(&self, record: ExchangeRecord) {
        let correlation_id = record.correlation_id;
        if self.tx.send(record).is_err() {
            error!(correlation_id = %correlation_id, "Failed to send exchange record to log worker");
        }
    }
}

impl Drop for PendingExchange {
    fn drop(&mut self) {
        if let Some(mut record) = self.record.take() {
            if record.response.is_none() {
                record.elapsed = self.dispatched_at.elapsed();
            }
            record.outcome = ExchangeOutcome::Cancelled;
            self.send(record);
        }
    }
}
