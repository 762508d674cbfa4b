//! Chunked transfer-encoding bodies.
//!
//! Each chunk is framed as `<hex byte length>\r\n<bytes>\r\n` and the body is
//! closed with the zero-length chunk `0\r\n`. The blank line that follows the
//! last chunk on the wire belongs to the response writer, not to the body.
//!
//! ```rust
//! use restmux::{Body, ChunkedBody};
//!
//! let mut body = ChunkedBody::new();
//! body.append_chunk("hello")?.end()?;
//! assert_eq!(body.content(), "5\r\nhello\r\n0\r\n");
//! # Ok::<(), restmux::Error>(())
//! ```

use std::borrow::Cow;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::ops::Range;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::Frame;

use crate::body::{Body, PlainBody};
use crate::error::Error;

const CRLF: &[u8] = b"\r\n";

/// An HTTP body under construction in chunked wire format.
///
/// Lengths are byte lengths, never character counts. Once [`end`] has been
/// called the body is sealed: further appends fail with
/// [`Error::ChunkedBodyEnded`].
///
/// [`end`]: ChunkedBody::end
#[derive(Clone, Debug, Default)]
pub struct ChunkedBody {
    content: BytesMut,
    // Where each chunk's payload sits inside `content`.
    payloads: Vec<Range<usize>>,
    ended: bool,
}

impl ChunkedBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` as one framed chunk.
    pub fn append_chunk(&mut self, chunk: impl AsRef<[u8]>) -> Result<&mut Self, Error> {
        if self.ended {
            return Err(Error::ChunkedBodyEnded);
        }
        let chunk = chunk.as_ref();

        self.content.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
        self.content.extend_from_slice(CRLF);
        let start = self.content.len();
        self.content.extend_from_slice(chunk);
        self.payloads.push(start..self.content.len());
        self.content.extend_from_slice(CRLF);

        Ok(self)
    }

    /// Appends another body's content as one chunk.
    pub fn append_body(&mut self, body: &impl Body) -> Result<&mut Self, Error> {
        self.append_chunk(body.content().as_bytes())
    }

    /// Appends the terminating zero-length chunk and seals the body.
    pub fn end(&mut self) -> Result<&mut Self, Error> {
        if self.ended {
            return Err(Error::ChunkedBodyEnded);
        }
        self.content.extend_from_slice(b"0");
        self.content.extend_from_slice(CRLF);
        self.ended = true;
        Ok(self)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The framed bytes accumulated so far. This, not [`Body::content`], is
    /// the exact form: chunk lengths count these bytes, and `content()`
    /// replaces any invalid UTF-8 in them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Number of data chunks appended, not counting the terminator.
    pub fn chunk_count(&self) -> usize {
        self.payloads.len()
    }

    /// The accumulated text, framing included, as a non-chunked body.
    pub fn as_plain_body(&self) -> PlainBody {
        PlainBody::new(self.content().into_owned())
    }

    /// The chunk payloads a writer should put on the wire, in order.
    ///
    /// Empty chunks are skipped: framed on their own they read as the
    /// terminating chunk.
    pub fn payloads(&self) -> impl Iterator<Item = &[u8]> {
        self.wire_ranges().map(|range| &self.content[range])
    }

    /// Splits the body into its chunk payloads without copying, for
    /// transports that write the chunk framing themselves.
    pub fn into_frames(self) -> ChunkFrames {
        let ranges: Vec<_> = self.wire_ranges().collect();
        let content = self.content.freeze();
        let chunks = ranges.into_iter()
            .map(|range| content.slice(range))
            .collect();
        ChunkFrames { chunks }
    }

    fn wire_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.payloads.iter()
            .filter(|range| !range.is_empty())
            .cloned()
    }
}

impl Body for ChunkedBody {
    /// Lossy for chunks that are not UTF-8; see [`ChunkedBody::as_bytes`].
    fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    fn is_complex(&self) -> bool {
        true
    }
}

// ── ChunkFrames ───────────────────────────────────────────────────────────────

/// The payloads of a [`ChunkedBody`] as an [`http_body::Body`], one data
/// frame per chunk.
///
/// Having no exact size hint, hyper sends it with
/// `transfer-encoding: chunked` over HTTP/1.1 and frames each payload the
/// same way `ChunkedBody` does. Empty chunks are dropped since the wire
/// would read them as the terminator.
#[derive(Debug, Default)]
pub struct ChunkFrames {
    chunks: VecDeque<Bytes>,
}

impl http_body::Body for ChunkFrames {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.chunks.pop_front().map(|chunk| Ok(Frame::data(chunk))))
    }

    fn is_end_stream(&self) -> bool {
        self.chunks.is_empty()
    }
}
