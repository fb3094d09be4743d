use bytes::BytesMut;
use starwire_transport::Link;
use tracing::{debug, trace, warn};

use crate::codec::parse;
use crate::error::{FrameError, Result};
use crate::extract::extract_next;
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Default cap on bytes held for a frame whose end sentinel has not arrived.
pub const DEFAULT_MAX_FRAME_LEN: usize = 4096;

/// Reads complete frames from a [`Link`] without blocking.
///
/// Owns the link's receive buffer: bytes of a partial frame stay buffered
/// across polls until the end sentinel arrives. A pending frame longer than
/// the configured maximum is discarded.
pub struct FrameReader<L> {
    inner: L,
    buf: BytesMut,
    scratch: Vec<u8>,
    max_frame_len: usize,
}

impl<L: Link> FrameReader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scratch: Vec::new(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Set the maximum length of a pending (incomplete) frame.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Move every byte the link has ready into the buffer.
    ///
    /// Returns the number of bytes received.
    pub fn fill(&mut self) -> usize {
        self.scratch.clear();
        let received = self.inner.read_available(&mut self.scratch);
        if received > 0 {
            trace!(received, "link bytes buffered");
            self.buf.extend_from_slice(&self.scratch);
        }
        received
    }

    /// Next complete frame already in the buffer, if any.
    pub fn next_frame(&mut self) -> Option<String> {
        extract_next(&mut self.buf)
    }

    /// One poll: fill from the link, then drain every complete frame.
    ///
    /// Returns immediately with no frames when the link has nothing ready
    /// and no complete frame is buffered.
    pub fn poll_frames(&mut self) -> Vec<String> {
        self.fill();
        let frames = std::iter::from_fn(|| self.next_frame()).collect();
        self.discard_oversized();
        frames
    }

    fn discard_oversized(&mut self) {
        if self.buf.len() > self.max_frame_len {
            warn!(
                pending = self.buf.len(),
                max_frame_len = self.max_frame_len,
                "pending frame too long, discarding"
            );
            self.buf.clear();
        }
    }

    /// One poll, parsing each frame.
    ///
    /// A malformed frame becomes an `Err` entry in place and does not stop
    /// the frames behind it.
    pub fn poll_messages(&mut self) -> Vec<Result<Message>> {
        self.poll_frames()
            .into_iter()
            .map(|frame| {
                debug!(%frame, "frame received");
                parse(&frame).map_err(|reason| FrameError::Malformed { frame, reason })
            })
            .collect()
    }

    /// Bytes buffered but not yet part of a complete frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link (e.g. to write replies).
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the reader and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }
}
