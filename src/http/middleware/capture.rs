//! Request and response capture for request logging.
//!
//! # Responsibilities
//! - Observe the outbound response: final status, byte count, optional
//!   mirror of the body
//! - Read a bounded prefix of the inbound request body without consuming it
//!
//! # Design Decisions
//! - The response mirror is capped at the configured maximum; bytes past the
//!   cap are counted but not kept
//! - Completion is signalled exactly once, at end of stream, on a stream
//!   error, or when the body is dropped unfinished

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use futures_util::{future, stream, StreamExt};
use http_body::{Frame, SizeHint};

/// Appended to a mirrored body that hit the size cap.
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// What the middleware learns about a response while it is sent.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    status: Option<StatusCode>,
    size: u64,
    mirror: Option<Mirror>,
}

#[derive(Debug)]
struct Mirror {
    buf: BytesMut,
    limit: usize,
    truncated: bool,
}

impl ResponseCapture {
    /// Count bytes without keeping them.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count bytes and keep up to `limit` of them.
    pub fn mirrored(limit: usize) -> Self {
        Self {
            mirror: Some(Mirror {
                buf: BytesMut::new(),
                limit,
                truncated: false,
            }),
            ..Self::default()
        }
    }

    /// Latch the response status. The first call wins; later calls leave it
    /// unchanged and return `false`.
    pub fn set_status(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Latched status, `200 OK` if none was set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Account for a chunk of body data.
    pub fn record(&mut self, data: &[u8]) {
        self.size += data.len() as u64;

        if let Some(mirror) = self.mirror.as_mut() {
            let room = mirror.limit.saturating_sub(mirror.buf.len());
            if data.len() > room {
                mirror.truncated = true;
            }
            mirror.buf.extend_from_slice(&data[..data.len().min(room)]);
        }
    }

    /// Total body bytes seen.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_truncated(&self) -> bool {
        self.mirror.as_ref().is_some_and(|m| m.truncated)
    }

    /// Mirrored body as text, with [`TRUNCATION_MARKER`] appended when the
    /// cap was hit. `None` when mirroring is off.
    pub fn body_text(&self) -> Option<String> {
        self.mirror.as_ref().map(|mirror| {
            let mut text = String::from_utf8_lossy(&mirror.buf).into_owned();
            if mirror.truncated {
                text.push_str(TRUNCATION_MARKER);
            }
            text
        })
    }
}

type OnComplete = Box<dyn FnOnce(&ResponseCapture) + Send>;

/// Response body wrapper feeding a [`ResponseCapture`].
pub struct CaptureBody {
    inner: Body,
    capture: ResponseCapture,
    on_complete: Option<OnComplete>,
}

impl CaptureBody {
    /// Wrap `inner`. `on_complete` runs once with the final capture.
    pub fn new<F>(inner: Body, capture: ResponseCapture, on_complete: F) -> Self
    where
        F: FnOnce(&ResponseCapture) + Send + 'static,
    {
        Self {
            inner,
            capture,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(&self.capture);
        }
    }
}

impl fmt::Debug for CaptureBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureBody")
            .field("capture", &self.capture)
            .field("finished", &self.on_complete.is_none())
            .finish()
    }
}

impl http_body::Body for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.record(data);
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CaptureBody {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Request body could not be read while capturing it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to read request body: {0}")]
pub struct BodyCaptureError(pub String);

/// Read up to `limit` bytes of `body` and return a replacement body that
/// yields the complete original content, together with the captured prefix
/// as text.
///
/// On a read error the replacement yields the bytes read so far followed by
/// the same error.
pub async fn capture_request_body(body: Body, limit: usize) -> (Body, Result<String, BodyCaptureError>) {
    if limit == 0 {
        return (body, Ok(String::new()));
    }

    let mut data = body.into_data_stream();
    let mut consumed = BytesMut::new();

    while consumed.len() < limit {
        match data.next().await {
            Some(Ok(chunk)) => consumed.extend_from_slice(&chunk),
            Some(Err(e)) => {
                let err = BodyCaptureError(e.to_string());
                let replay = stream::iter(vec![Ok(consumed.freeze()), Err(e)]);
                return (Body::from_stream(replay), Err(err));
            }
            None => {
                let bytes = consumed.freeze();
                let text = prefix_text(&bytes, limit);
                return (Body::from(bytes), Ok(text));
            }
        }
    }

    let bytes = consumed.freeze();
    let text = prefix_text(&bytes, limit);
    let replay = stream::once(future::ready(Ok::<_, axum::Error>(bytes))).chain(data);
    (Body::from_stream(replay), Ok(text))
}

fn prefix_text(bytes: &[u8], limit: usize) -> String {
    String::from_utf8_lossy(&bytes[..bytes.len().min(limit)]).into_owned()
}
