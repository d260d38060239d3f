//! Configuration for the message logging handler.

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

use crate::level::LogLevel;

/// Category used when [`LoggingOptions::category_name`] is not set.
pub const DEFAULT_CATEGORY: &str = "http_message_logging::HttpMessageLoggingService";

/// A case-insensitive set of header names.
///
/// Names are lowercased on the way in, matching how `http::HeaderName`
/// normalizes them, so lookups against a `HeaderName` are exact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderNames(HashSet<String>);

impl HeaderNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>) {
        self.0.insert(name.as_ref().to_ascii_lowercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.0.contains(&name.to_ascii_lowercase())
        } else {
            self.0.contains(name)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for HeaderNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names = HeaderNames::new();
        for name in iter {
            names.insert(name);
        }
        names
    }
}

impl<'de> Deserialize<'de> for HeaderNames {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

/// Controls what the logging handler captures and what it hides.
///
/// Options are shared read-only once the layer is built. A header listed in both
/// an ignore set and the matching redact set is ignored.
///
/// # Examples
///
/// ```rust
/// use http_message_logging::{HeaderNames, LoggingOptions};
///
/// // Defaults: no bodies, `Authorization` redacted on requests
/// let options = LoggingOptions::default();
/// assert!(options.ignore_request_content);
///
/// // Log bodies too, and drop noisy headers
/// let options = LoggingOptions {
///     ignore_request_content: false,
///     ignore_response_content: false,
///     ignore_request_headers: HeaderNames::from_iter(["User-Agent"]),
///     ignore_response_headers: HeaderNames::from_iter(["Date"]),
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Logger category; falls back to [`DEFAULT_CATEGORY`]
    pub category_name: Option<String>,
    /// Level records are emitted at; nothing is captured unless the sink has it enabled
    pub level: LogLevel,
    /// Skip request body capture
    pub ignore_request_content: bool,
    /// Skip response body capture
    pub ignore_response_content: bool,
    /// Request headers left out of the record
    pub ignore_request_headers: HeaderNames,
    /// Request headers whose values are replaced with the redaction marker
    pub redact_request_headers: HeaderNames,
    /// Response headers left out of the record
    pub ignore_response_headers: HeaderNames,
    /// Response headers whose values are replaced with the redaction marker
    pub redact_response_headers: HeaderNames,
    /// Largest body buffered for capture. Unbounded when `None`.
    pub max_body_bytes: Option<usize>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            category_name: None,
            level: LogLevel::Information,
            ignore_request_content: true,
            ignore_response_content: true,
            ignore_request_headers: HeaderNames::new(),
            redact_request_headers: HeaderNames::from_iter(["Authorization"]),
            ignore_response_headers: HeaderNames::new(),
            redact_response_headers: HeaderNames::new(),
            max_body_bytes: None,
        }
    }
}

impl LoggingOptions {
    /// The category records are written under.
    pub fn category(&self) -> &str {
        self.category_name.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}
