//! Request body stream and the capture-and-replay interceptor.
//!
//! A request body is a single-read stream. The trace middleware needs its
//! bytes for a span tag and the downstream handler needs the very same
//! bytes, so [`intercept`] drains the stream once and hands back an
//! immutable [`CapturedBody`] together with a fresh [`Body`] that replays
//! the captured bytes, followed by the trailers when the request sent any.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream;
use http::HeaderMap;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Body as _;
use hyper::body::{Frame, SizeHint};
use tracing::warn;

use crate::error::{BoxError, Error};
use crate::redact;

/// A streaming request body.
///
/// Wraps any [`hyper::body::Body`] with `Bytes` frames: hyper's `Incoming`,
/// `Full`, or a replayed capture.
pub struct Body(UnsyncBoxBody<Bytes, BoxError>);

impl Body {
    pub fn new<B>(body: B) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self(body.map_err(Into::into).boxed_unsync())
    }

    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Reads the stream to its end.
    pub async fn collect_bytes(self) -> Result<Bytes, Error> {
        let collected = self.0.collect().await.map_err(Error::Body)?;
        Ok(collected.to_bytes())
    }

    /// Body yielding `data` and then one trailers frame.
    fn with_trailers(data: Bytes, trailers: HeaderMap) -> Self {
        let data = (!data.is_empty()).then(|| Frame::data(data));
        let frames = data
            .into_iter()
            .chain([Frame::trailers(trailers)])
            .map(Ok::<_, Infallible>);
        Self::new(StreamBody::new(stream::iter(frames)))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self(Full::new(bytes).map_err(|never| match never {}).boxed_unsync())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

impl hyper::body::Body for Body {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

/// The bytes read once from a request body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedBody(Bytes);

impl CapturedBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the body with password fields masked, for span tags and logs.
    pub fn redacted(&self) -> String {
        redact::redact_body(&self.0)
    }
}

/// Drains `body` and returns the captured bytes plus a replay stream that
/// yields exactly those bytes and the original trailers.
///
/// A stream that fails mid-read is treated as empty: the request still goes
/// through, with an empty capture and an empty replay.
pub async fn intercept(body: Body) -> (CapturedBody, Body) {
    let (bytes, trailers) = match body.0.collect().await {
        Ok(collected) => {
            let trailers = collected.trailers().cloned();
            (collected.to_bytes(), trailers)
        }
        Err(e) => {
            let e = Error::Body(e);
            warn!(error = %e, "request body read failed, continuing with an empty body");
            (Bytes::new(), None)
        }
    };
    let replay = match trailers {
        Some(trailers) => Body::with_trailers(bytes.clone(), trailers),
        None => Body::from(bytes.clone()),
    };
    (CapturedBody(bytes), replay)
}
