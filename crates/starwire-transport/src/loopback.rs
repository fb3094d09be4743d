use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::Link;

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// One end of an in-memory duplex link.
///
/// Bytes written on one end appear in the receive queue of the other end,
/// like two serial ports wired TX-to-RX. Both ends are `Send`, so a pair can
/// be split across threads.
#[derive(Debug)]
pub struct LoopbackLink {
    rx: Queue,
    tx: Option<Queue>,
}

impl LoopbackLink {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let a_to_b: Queue = Arc::default();
        let b_to_a: Queue = Arc::default();
        (
            Self {
                rx: Arc::clone(&b_to_a),
                tx: Some(Arc::clone(&a_to_b)),
            },
            Self {
                rx: a_to_b,
                tx: Some(b_to_a),
            },
        )
    }

    /// An end with nothing attached: reads yield nothing and writes are refused.
    pub fn disconnected() -> Self {
        Self {
            rx: Arc::default(),
            tx: None,
        }
    }

    /// Inject bytes into this end's receive queue as if the peer sent them.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.rx).extend(bytes.iter().copied());
    }

    /// Take every byte currently waiting in this end's receive queue.
    pub fn take_received(&self) -> Vec<u8> {
        lock(&self.rx).drain(..).collect()
    }
}

impl Link for LoopbackLink {
    fn available(&mut self) -> usize {
        lock(&self.rx).len()
    }

    fn read(&mut self) -> Option<u8> {
        lock(&self.rx).pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        match &self.tx {
            Some(tx) => {
                lock(tx).extend(bytes.iter().copied());
                bytes.len()
            }
            None => 0,
        }
    }
}

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<u8>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_cross_over_to_the_peer() {
        let (mut left, mut right) = LoopbackLink::pair();

        assert_eq!(left.write(b"!!ARM1:REQUEST:PING##"), 21);
        assert_eq!(left.available(), 0);
        assert_eq!(right.available(), 21);

        let mut received = Vec::new();
        right.read_available(&mut received);
        assert_eq!(received, b"!!ARM1:REQUEST:PING##");
        assert_eq!(right.read(), None);
    }

    #[test]
    fn both_directions_are_independent() {
        let (mut left, mut right) = LoopbackLink::pair();

        left.write(b"ab");
        right.write(b"xyz");

        assert_eq!(left.take_received(), b"xyz");
        assert_eq!(right.take_received(), b"ab");
    }

    #[test]
    fn disconnected_end_refuses_writes() {
        let mut link = LoopbackLink::disconnected();
        assert_eq!(link.write(b"lost"), 0);
        assert_eq!(link.available(), 0);

        link.inject(b"x");
        assert_eq!(link.read(), Some(b'x'));
    }

    #[test]
    fn ends_can_move_across_threads() {
        let (mut left, mut right) = LoopbackLink::pair();

        let writer = std::thread::spawn(move || {
            for _ in 0..64 {
                left.write(b"#");
            }
        });
        writer.join().unwrap();

        let mut received = Vec::new();
        right.read_available(&mut received);
        assert_eq!(received.len(), 64);
    }
}
