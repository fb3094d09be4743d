/// A duplex byte link to one peer.
///
/// Mirrors a microcontroller serial port: callers ask how many bytes are
/// ready, pull them one at a time, and push whole buffers out. None of the
/// operations may block; when nothing is ready, `available` returns 0 and
/// `read` returns `None`.
pub trait Link {
    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> usize;

    /// Next received byte, or `None` if nothing is ready.
    fn read(&mut self) -> Option<u8>;

    /// Queue `bytes` for transmission, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Drain every byte that is ready right now into `dst`.
    ///
    /// Returns the number of bytes appended.
    fn read_available(&mut self, dst: &mut Vec<u8>) -> usize {
        let mut count = 0usize;
        while self.available() > 0 {
            match self.read() {
                Some(byte) => {
                    dst.push(byte);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }
}

impl<L: Link + ?Sized> Link for &mut L {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }
}
