use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::Link;

const READ_CHUNK_SIZE: usize = 1024;

/// Adapts a non-blocking `Read + Write` stream to the [`Link`] contract.
///
/// `available` pulls whatever the stream has ready into an internal queue.
/// The stream must already be in non-blocking mode; a blocking stream would
/// stall the poll loop. Fatal I/O errors close the link: it then reports no
/// bytes and accepts no writes.
#[derive(Debug)]
pub struct StreamLink<T> {
    inner: T,
    rx: VecDeque<u8>,
    closed: bool,
}

impl<T: Read + Write> StreamLink<T> {
    /// Wrap a stream that is already non-blocking.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rx: VecDeque::new(),
            closed: false,
        }
    }

    /// Whether the far end hung up or the stream failed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the link and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn fill(&mut self) {
        if self.closed {
            return;
        }
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    debug!("stream link reached EOF");
                    self.closed = true;
                    return;
                }
                Ok(n) => self.rx.extend(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return,
                Err(err) => {
                    warn!(error = %err, "stream link read failed, closing");
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

#[cfg(unix)]
impl StreamLink<std::os::unix::net::UnixStream> {
    /// Switch a Unix stream to non-blocking mode and wrap it.
    pub fn unix(stream: std::os::unix::net::UnixStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self::new(stream))
    }
}

impl<T: Read + Write> Link for StreamLink<T> {
    fn available(&mut self) -> usize {
        self.fill();
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        if self.rx.is_empty() {
            self.fill();
        }
        self.rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        if self.closed {
            return 0;
        }
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => {
                    self.closed = true;
                    break;
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // No backpressure: whatever the stream cannot take now is dropped.
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!(error = %err, "stream link write failed, closing");
                    self.closed = true;
                    break;
                }
            }
        }
        if let Err(err) = self.inner.flush() {
            if err.kind() != ErrorKind::WouldBlock {
                debug!(error = %err, "stream link flush failed");
            }
        }
        offset
    }
}
