use bytes::{Buf, BytesMut};

/// Start-of-frame marker.
pub const START_SENTINEL: &[u8; 2] = b"!!";

/// End-of-frame marker.
pub const END_SENTINEL: &[u8; 2] = b"##";

/// Pull the next complete frame out of `buf`.
///
/// Scanning rules:
/// - No `"!!"` anywhere: the whole buffer is discarded.
/// - Bytes before the first `"!!"` are noise and are dropped.
/// - No `"##"` after the start sentinel: the frame is incomplete, the buffer
///   is left as is and `None` is returned until more bytes arrive.
///
/// On success the inclusive `"!!" ... "##"` slice is removed from the buffer.
/// The returned text is not validated; call repeatedly until `None` to drain
/// every frame that arrived in one poll.
pub fn extract_next(buf: &mut BytesMut) -> Option<String> {
    let Some(start) = find(buf, START_SENTINEL, 0) else {
        buf.clear();
        return None;
    };
    if start > 0 {
        buf.advance(start);
    }

    let end = find(buf, END_SENTINEL, START_SENTINEL.len())?;
    let frame = buf.split_to(end + END_SENTINEL.len());
    Some(String::from_utf8_lossy(&frame).into_owned())
}

/// Extract every complete frame currently in `buf`, in arrival order.
pub fn drain_frames(buf: &mut BytesMut) -> Vec<String> {
    std::iter::from_fn(|| extract_next(buf)).collect()
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
