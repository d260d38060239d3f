//! Raw-message rendering of exchange records.
//!
//! The output reads like the request and response as they went over the wire:
//!
//! ```text
//! Request:
//! GET http://example.com/data?q=1 HTTP/1.1
//! authorization: *redacted*
//!
//! Response:
//! HTTP/1.1 200 OK
//! content-type: application/json
//!
//! {"temp":280}
//!
//! Elapsed: 12.345ms
//! ```

use std::fmt;

use crate::types::{BodySnapshot, CapturedHeaders, ExchangeOutcome, ExchangeRecord};

impl fmt::Display for BodySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySnapshot::Suppressed { size: Some(size) } => {
                write!(f, "<content omitted, {size} bytes>")
            }
            BodySnapshot::Suppressed { size: None } => f.write_str("<content omitted>"),
            BodySnapshot::Empty => Ok(()),
            BodySnapshot::Captured(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(text),
                Err(_) => write!(f, "<binary, {} bytes>", bytes.len()),
            },
            BodySnapshot::TooLarge { limit } => {
                write!(f, "<content exceeds {limit} byte capture limit>")
            }
            BodySnapshot::Unreadable { read, reason } => {
                write!(f, "<unreadable content after {read} bytes: {reason}>")
            }
        }
    }
}

fn write_headers(f: &mut fmt::Formatter<'_>, headers: &CapturedHeaders) -> fmt::Result {
    for (name, value) in headers {
        writeln!(f, "{name}: {value}")?;
    }
    Ok(())
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &BodySnapshot) -> fmt::Result {
    writeln!(f)?;
    let rendered = body.to_string();
    if !rendered.is_empty() {
        writeln!(f, "{rendered}")?;
    }
    Ok(())
}

impl fmt::Display for ExchangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = &self.request;
        writeln!(f, "Request:")?;
        writeln!(
            f,
            "{} {} {:?}",
            request.method, request.uri, request.version
        )?;
        write_headers(f, &request.headers)?;
        write_body(f, &request.body)?;

        writeln!(f, "Response:")?;
        match (&self.response, &self.outcome) {
            (Some(response), _) => {
                writeln!(f, "{:?} {}", response.version, response.status)?;
                write_headers(f, &response.headers)?;
                write_body(f, &response.body)?;
            }
            (None, ExchangeOutcome::Failed { error }) => {
                writeln!(f, "<failed: {error}>")?;
                writeln!(f)?;
            }
            (None, _) => {
                writeln!(f, "<{}>", self.outcome.as_str())?;
                writeln!(f)?;
            }
        }

        write!(f, "Elapsed: {:.3}ms", self.elapsed.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestSnapshot, ResponseSnapshot};
    use axum::http::{Method, StatusCode, Uri, Version};
    use bytes::Bytes;
    use std::time::{Duration, SystemTime};

    fn record(response: Option<ResponseSnapshot>, outcome: ExchangeOutcome) -> ExchangeRecord {
        ExchangeRecord {
            correlation_id: 7,
            timestamp: SystemTime::now(),
            request: RequestSnapshot {
                method: Method::POST,
                uri: Uri::from_static("http://example.com/search?q=x"),
                version: Version::HTTP_11,
                headers: vec![("authorization".into(), "*redacted*".into())],
                body: BodySnapshot::Captured(Bytes::from_static(br#"{"q":"x"}"#)),
            },
            response,
            elapsed: Duration::from_micros(12_345),
            outcome,
        }
    }

    #[test]
    fn renders_complete_exchange() {
        let response = ResponseSnapshot {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: vec![("content-type".into(), "application/json".into())],
            body: BodySnapshot::Captured(Bytes::from_static(br#"{"temp":280}"#)),
        };
        let text = record(Some(response), ExchangeOutcome::Completed).to_string();

        assert_eq!(
            text,
            "Request:\n\
             POST http://example.com/search?q=x HTTP/1.1\n\
             authorization: *redacted*\n\
             \n\
             {\"q\":\"x\"}\n\
             Response:\n\
             HTTP/1.1 200 OK\n\
             content-type: application/json\n\
             \n\
             {\"temp\":280}\n\
             Elapsed: 12.345ms"
        );
    }

    #[test]
    fn renders_failed_exchange_without_response() {
        let text = record(
            None,
            ExchangeOutcome::Failed {
                error: "connection reset".into(),
            },
        )
        .to_string();

        assert!(text.contains("Response:\n<failed: connection reset>\n"));
        assert!(text.ends_with("Elapsed: 12.345ms"));
    }

    #[test]
    fn binary_bodies_degrade_to_placeholder() {
        let body = BodySnapshot::Captured(Bytes::from_static(&[0xff, 0xfe, 0x00, 0x01]));
        assert_eq!(body.to_string(), "<binary, 4 bytes>");
    }

    #[test]
    fn suppressed_body_is_distinct_from_empty() {
        assert_eq!(
            BodySnapshot::Suppressed { size: Some(42) }.to_string(),
            "<content omitted, 42 bytes>"
        );
        assert_eq!(
            BodySnapshot::Suppressed { size: None }.to_string(),
            "<content omitted>"
        );
        assert_eq!(BodySnapshot::Empty.to_string(), "");
    }

    #[test]
    fn record_marks_omitted_body_of_unknown_size() {
        let response = ResponseSnapshot {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: Vec::new(),
            body: BodySnapshot::Suppressed { size: None },
        };
        let text = record(Some(response), ExchangeOutcome::Completed).to_string();

        assert!(text.contains("HTTP/1.1 200 OK\n\n<content omitted>\nElapsed:"));
    }
}
