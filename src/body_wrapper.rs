//! Body buffering and replay.
//!
//! Bodies are single-read streams. To log one without stealing it from its reader,
//! its frames are drained into memory and a fresh body is built from the same
//! [`Bytes`], followed by any trailers the original carried. The snapshot and the
//! replacement share the buffer, not a stream.

use axum::body::{Body, HttpBody};
use axum::http::{header::CONTENT_LENGTH, HeaderMap};
use bytes::{Bytes, BytesMut};
use futures::{stream, Stream, StreamExt};
use http_body::Frame;
use http_body_util::{BodyExt, BodyStream, StreamBody};
use tracing::{debug, warn};

use crate::error::CaptureError;
use crate::types::BodySnapshot;

type FrameResult = Result<Frame<Bytes>, axum::Error>;

/// Drains `body` and returns a replacement body alongside the captured snapshot.
///
/// The replacement always yields exactly what the original would have, trailers
/// included:
///
/// - on success, a fresh body over the buffered bytes
/// - past `limit`, the bytes read so far followed by the rest of the original body
/// - on a stream error, the bytes read so far followed by that same error
///
/// # Examples
///
/// ```rust
/// use axum::body::Body;
/// use http_body_util::BodyExt;
/// use http_message_logging::{body_wrapper::buffer_body, BodySnapshot};
///
/// # #[tokio::main]
/// # async fn main() {
/// let (body, snapshot) = buffer_body(Body::from("Hello, World!"), None, 1).await;
///
/// assert_eq!(snapshot, BodySnapshot::Captured("Hello, World!".into()));
/// assert_eq!(body.collect().await.unwrap().to_bytes(), "Hello, World!");
/// # }
/// ```
pub async fn buffer_body(
    mut body: Body,
    limit: Option<usize>,
    correlation_id: u64,
) -> (Body, BodySnapshot) {
    if let (Some(limit), Some(exact)) = (limit, body.size_hint().exact()) {
        if exact > limit as u64 {
            debug!(correlation_id = %correlation_id, limit, size = exact, "Body larger than capture limit, not buffering");
            return (body, BodySnapshot::TooLarge { limit });
        }
    }

    let mut buf = BytesMut::new();
    let mut trailers: Option<HeaderMap> = None;

    loop {
        let Some(next) = body.frame().await else {
            break;
        };
        match next {
            Ok(frame) => {
                let frame = match frame.into_data() {
                    Ok(chunk) => {
                        if let Some(limit) = limit.filter(|l| buf.len() + chunk.len() > *l) {
                            let error = CaptureError::TooLarge { limit };
                            debug!(correlation_id = %correlation_id, error = %error, "Streaming remainder of body through");
                            let head = head_frames([buf.freeze(), chunk], trailers);
                            let body = replay(head, BodyStream::new(body));
                            return (body, BodySnapshot::TooLarge { limit });
                        }
                        buf.extend_from_slice(&chunk);
                        continue;
                    }
                    Err(frame) => frame,
                };
                if let Ok(map) = frame.into_trailers() {
                    trailers.get_or_insert_with(HeaderMap::new).extend(map);
                }
            }
            Err(e) => {
                let error = CaptureError::Stream {
                    read: buf.len(),
                    reason: e.to_string(),
                };
                warn!(correlation_id = %correlation_id, error = %error, "Error buffering body for capture");
                let snapshot = BodySnapshot::Unreadable {
                    read: buf.len(),
                    reason: e.to_string(),
                };
                let head = head_frames([buf.freeze()], trailers);
                let tail = stream::once(async move { Err(e) }).chain(BodyStream::new(body));
                return (replay(head, tail), snapshot);
            }
        }
    }

    let bytes = buf.freeze();
    let snapshot = if bytes.is_empty() {
        BodySnapshot::Empty
    } else {
        BodySnapshot::Captured(bytes.clone())
    };
    let rebuilt = match trailers {
        None if bytes.is_empty() => Body::empty(),
        None => Body::from(bytes),
        Some(map) => replay(head_frames([bytes], Some(map)), stream::empty::<FrameResult>()),
    };
    (rebuilt, snapshot)
}

/// Buffered data, then any trailers already seen, as frames to replay.
fn head_frames<const N: usize>(
    chunks: [Bytes; N],
    trailers: Option<HeaderMap>,
) -> Vec<Frame<Bytes>> {
    chunks
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(Frame::data)
        .chain(trailers.map(Frame::trailers))
        .collect()
}

fn replay<T>(head: Vec<Frame<Bytes>>, tail: T) -> Body
where
    T: Stream<Item = FrameResult> + Send + 'static,
{
    let frames = stream::iter(head.into_iter().map(Ok)).chain(tail);
    Body::new(StreamBody::new(frames))
}

/// Snapshot for a body that is forwarded without being read.
///
/// The size comes from the body's exact size hint, falling back to `Content-Length`.
pub fn suppressed(body: &Body, headers: &HeaderMap) -> BodySnapshot {
    let size = body.size_hint().exact().or_else(|| {
        headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    });
    BodySnapshot::Suppressed { size }
}
