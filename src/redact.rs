//! Header ignore/redact policy.

use axum::http::HeaderMap;

use crate::options::HeaderNames;

/// Value written in place of a redacted header.
pub const REDACTED: &str = "*redacted*";

/// Ignore and redact sets for one side of an exchange.
#[derive(Clone, Copy, Debug)]
pub struct HeaderPolicy<'a> {
    pub ignore: &'a HeaderNames,
    pub redact: &'a HeaderNames,
}

/// What happens to a single header under a [`HeaderPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderAction {
    Omit,
    Redact,
    Keep,
}

impl<'a> HeaderPolicy<'a> {
    pub fn new(ignore: &'a HeaderNames, redact: &'a HeaderNames) -> Self {
        Self { ignore, redact }
    }

    /// Ignore is checked first, so a name in both sets is omitted.
    pub fn action(&self, name: &str) -> HeaderAction {
        if self.ignore.contains(name) {
            HeaderAction::Omit
        } else if self.redact.contains(name) {
            HeaderAction::Redact
        } else {
            HeaderAction::Keep
        }
    }

    /// Applies the policy to `headers`, one entry per distinct name.
    ///
    /// Repeated values are joined with `", "` in arrival order. Values that are not
    /// valid UTF-8 are decoded lossily.
    pub fn apply(&self, headers: &HeaderMap) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(headers.keys_len());
        for name in headers.keys() {
            let value = match self.action(name.as_str()) {
                HeaderAction::Omit => continue,
                HeaderAction::Redact => REDACTED.to_owned(),
                HeaderAction::Keep => headers
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            out.push((name.as_str().to_owned(), value));
        }
        out
    }
}
