//! Request bodies streamed from a buffer list.
//!
//! The gateway hands object data over as a [`BufferList`]: a sequence of
//! reference-counted [`Bytes`] chunks of arbitrary size. [`BodyFeeder`] walks
//! that list with a [`StreamCursor`] so the payload is never concatenated into
//! one allocation. It can be pulled into a caller buffer ([`BodyFeeder::pull`])
//! or, through [`FeederBody`], polled by the HTTP transport as zero-copy
//! frames.
//!
//! The feeder never yields more than the declared length. If the chunks run
//! out before the declared length is reached the body fails, the feeder keeps
//! that error, and every later [`BodyFeeder::prepare`] returns it until
//! [`BodyFeeder::reset`] is called.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;

/// Largest frame handed to the transport in one poll.
const FRAME_SIZE: usize = 64 * 1024;

/// A sequence of byte chunks with a known total length.
///
/// Cloning is cheap: chunks are reference-counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferList {
    chunks: Vec<Bytes>,
    len: u64,
}

impl BufferList {
    /// Create an empty buffer list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        self.len += chunk.len() as u64;
        self.chunks.push(chunk);
    }

    /// Total number of bytes across all chunks.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the list holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The chunks in order.
    #[must_use]
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }
}

impl From<Bytes> for BufferList {
    fn from(chunk: Bytes) -> Self {
        let mut list = Self::new();
        list.push(chunk);
        list
    }
}

impl From<Vec<u8>> for BufferList {
    fn from(data: Vec<u8>) -> Self {
        Self::from(Bytes::from(data))
    }
}

impl From<String> for BufferList {
    fn from(data: String) -> Self {
        Self::from(Bytes::from(data))
    }
}

impl FromIterator<Bytes> for BufferList {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut list = Self::new();
        for chunk in iter {
            list.push(chunk);
        }
        list
    }
}

/// Errors raised while feeding a request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// A streamed body was prepared with a declared length of zero.
    #[error("declared body length is zero")]
    EmptyBody,

    /// The chunks ran out before the declared length was sent.
    #[error("body ended after {sent} of {declared} declared bytes")]
    ShortBody {
        /// Declared content length.
        declared: u64,
        /// Bytes actually sent.
        sent: u64,
    },
}

/// Position of a feeder inside its chunk list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamCursor {
    /// Index of the chunk being read.
    pub chunk: usize,
    /// Offset inside that chunk.
    pub offset: usize,
    /// Bytes handed out since the last prepare/reset.
    pub total_sent: u64,
}

/// Pull-based reader over a [`BufferList`] bounded by a declared length.
#[derive(Debug, Default)]
pub struct BodyFeeder {
    chunks: BufferList,
    declared_length: u64,
    cursor: StreamCursor,
    failure: Option<FeedError>,
}

impl BodyFeeder {
    /// Create an idle feeder with nothing to send.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the feeder at `chunks` and rewind the cursor.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure if the previous body failed (the cursor is
    /// left untouched), or [`FeedError::EmptyBody`] if `declared_length` is zero.
    pub fn prepare(&mut self, chunks: BufferList, declared_length: u64) -> Result<(), FeedError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        if declared_length == 0 {
            return Err(FeedError::EmptyBody);
        }

        self.chunks = chunks;
        self.declared_length = declared_length;
        self.cursor = StreamCursor::default();
        Ok(())
    }

    /// Copy up to `buf.len()` bytes into `buf`, crossing chunk boundaries.
    ///
    /// Returns the number of bytes written; `0` means the body is complete.
    pub fn pull(&mut self, buf: &mut [u8]) -> usize {
        let limit = usize::try_from(self.remaining())
            .unwrap_or(usize::MAX)
            .min(buf.len());

        let mut written = 0;
        while written < limit {
            let Some(chunk) = self.chunks.chunks.get(self.cursor.chunk) else {
                break;
            };
            let start = self.cursor.offset;
            let n = (chunk.len() - start).min(limit - written);
            buf[written..written + n].copy_from_slice(&chunk[start..start + n]);
            let chunk_len = chunk.len();

            written += n;
            self.advance(n, chunk_len);
        }
        written
    }

    /// Take the next slice of at most `max` bytes without copying.
    ///
    /// Returns `None` when nothing remains or the chunks are exhausted.
    pub fn next_slice(&mut self, max: usize) -> Option<Bytes> {
        let limit = usize::try_from(self.remaining()).unwrap_or(usize::MAX).min(max);
        if limit == 0 {
            return None;
        }

        loop {
            let chunk = self.chunks.chunks.get(self.cursor.chunk)?;
            let start = self.cursor.offset;
            let chunk_len = chunk.len();
            if start == chunk_len {
                self.cursor.chunk += 1;
                self.cursor.offset = 0;
                continue;
            }

            let n = (chunk_len - start).min(limit);
            let slice = chunk.slice(start..start + n);
            self.advance(n, chunk_len);
            return Some(slice);
        }
    }

    /// Clear the cursor, the sent counter, any recorded failure and the chunks.
    pub fn reset(&mut self) {
        self.chunks = BufferList::default();
        self.declared_length = 0;
        self.cursor = StreamCursor::default();
        self.failure = None;
    }

    /// Record a failure; later [`prepare`](Self::prepare) calls return it.
    pub fn fail(&mut self, error: FeedError) {
        self.failure = Some(error);
    }

    /// Bytes still to be sent before the declared length is reached.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.declared_length.saturating_sub(self.cursor.total_sent)
    }

    /// The declared content length.
    #[must_use]
    pub fn declared_length(&self) -> u64 {
        self.declared_length
    }

    /// Current cursor position.
    #[must_use]
    pub fn cursor(&self) -> StreamCursor {
        self.cursor
    }

    /// The failure recorded for the last body, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&FeedError> {
        self.failure.as_ref()
    }

    fn advance(&mut self, n: usize, chunk_len: usize) {
        self.cursor.offset += n;
        self.cursor.total_sent += n as u64;
        if self.cursor.offset == chunk_len {
            self.cursor.chunk += 1;
            self.cursor.offset = 0;
        }
    }
}

/// HTTP request body driven by a [`BodyFeeder`].
///
/// Reports an exact size hint so the transport can send `Content-Length`.
#[derive(Debug, Default)]
pub struct FeederBody {
    feeder: BodyFeeder,
}

impl FeederBody {
    /// A body with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stream `length` bytes of `data`.
    ///
    /// A zero `length` produces an empty body.
    ///
    /// # Errors
    ///
    /// Propagates [`FeedError`] from [`BodyFeeder::prepare`].
    pub fn streamed(data: BufferList, length: u64) -> Result<Self, FeedError> {
        let mut feeder = BodyFeeder::new();
        if length > 0 {
            feeder.prepare(data, length)?;
        }
        Ok(Self { feeder })
    }

    /// The underlying feeder.
    #[must_use]
    pub fn feeder(&self) -> &BodyFeeder {
        &self.feeder
    }
}

impl http_body::Body for FeederBody {
    type Data = Bytes;
    type Error = FeedError;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        let feeder = &mut self.get_mut().feeder;
        if let Some(failure) = feeder.failure() {
            return Poll::Ready(Some(Err(failure.clone())));
        }
        if feeder.remaining() == 0 {
            return Poll::Ready(None);
        }

        match feeder.next_slice(FRAME_SIZE) {
            Some(data) => Poll::Ready(Some(Ok(http_body::Frame::data(data)))),
            None => {
                let error = FeedError::ShortBody {
                    declared: feeder.declared_length(),
                    sent: feeder.cursor().total_sent,
                };
                feeder.fail(error.clone());
                Poll::Ready(Some(Err(error)))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.feeder.failure().is_none() && self.feeder.remaining() == 0
    }

    fn size_hint(&self) -> http_body::SizeHint {
        http_body::SizeHint::with_exact(self.feeder.remaining())
    }
}
