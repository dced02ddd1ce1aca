//! Response body types supporting buffered, empty, and streaming modes.
//!
//! This module provides [`FileBody`], the HTTP response body type used
//! throughout the file-serving service. It supports three modes:
//!
//! - **Buffered**: For small generated responses such as error pages,
//!   directory listings, and cache replays.
//! - **Empty**: For responses with no body content (304, HEAD responses).
//! - **Streaming**: For object content. A pump task reads the virtual file
//!   and feeds chunks through a bounded channel; dropping the body drops the
//!   receiver, which tears the pump down and closes the file, so an
//!   abandoned request never leaves a stream running.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;
use tokio::sync::mpsc;

/// Channel depth for streaming bodies. Bounds how far a fast reader can run
/// ahead of a slow client.
pub const STREAM_CHANNEL_DEPTH: usize = 8;

/// Response body supporting buffered, empty, and streaming modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper
/// responses.
#[derive(Debug, Default)]
pub enum FileBody {
    /// Buffered body for small responses: error pages, listings, cached
    /// replays.
    Buffered(Full<Bytes>),
    /// Empty body for 304 responses, HEAD responses, etc.
    #[default]
    Empty,
    /// Streaming body fed by a pump task reading the virtual file.
    Streaming(mpsc::Receiver<Result<Bytes, std::io::Error>>),
}

impl FileBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a streaming body together with the sender side of its
    /// channel.
    #[must_use]
    pub fn streaming() -> (mpsc::Sender<Result<Bytes, std::io::Error>>, Self) {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_DEPTH);
        (tx, Self::Streaming(rx))
    }
}

impl http_body::Body for FileBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
            Self::Streaming(rx) => rx
                .poll_recv(cx)
                .map(|chunk| chunk.map(|result| result.map(http_body::Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
            Self::Streaming(_) => false,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
            Self::Streaming(_) => http_body::SizeHint::default(),
        }
    }
}
