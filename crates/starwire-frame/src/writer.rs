use starwire_transport::Link;
use tracing::{debug, warn};

use crate::codec::build;
use crate::error::{FrameError, Result};
use crate::message::Message;

/// Build `message` and write the frame to `link`.
///
/// Returns the frame text that went out. The link contract has no
/// retransmission, so a partially accepted frame is reported as
/// [`FrameError::ShortWrite`] and left for the far end's extractor to discard.
pub fn write_message<L: Link + ?Sized>(link: &mut L, message: &Message) -> Result<String> {
    let frame = build(message);
    let written = link.write(frame.as_bytes());
    if written < frame.len() {
        warn!(%frame, written, "link accepted a partial frame");
        return Err(FrameError::ShortWrite {
            written,
            expected: frame.len(),
        });
    }
    debug!(%frame, "frame sent");
    Ok(frame)
}

/// Write pre-built frame text to `link` verbatim.
pub fn write_frame<L: Link + ?Sized>(link: &mut L, frame: &str) -> Result<()> {
    let written = link.write(frame.as_bytes());
    if written < frame.len() {
        return Err(FrameError::ShortWrite {
            written,
            expected: frame.len(),
        });
    }
    Ok(())
}

/// Writes complete frames to a [`Link`].
pub struct FrameWriter<L> {
    inner: L,
}

impl<L: Link> FrameWriter<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    /// Encode and send one message.
    pub fn send(&mut self, message: &Message) -> Result<String> {
        write_message(&mut self.inner, message)
    }

    /// Send pre-built frame text verbatim (no validation).
    pub fn send_raw(&mut self, frame: &str) -> Result<()> {
        write_frame(&mut self.inner, frame)
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the writer and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }
}
