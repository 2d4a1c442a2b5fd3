use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Message sequence number. Wraps modulo 2^32 and advances by exactly
/// one per emitted message. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct SequenceCounter(Arc<AtomicU32>);

impl SequenceCounter {
    pub fn new(start: u32) -> Self {
        Self(Arc::new(AtomicU32::new(start)))
    }

    /// Takes the next number. `fetch_add` on an atomic wraps on overflow.
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The number the next message will get.
    pub fn peek(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn increments_by_one() {
        let seq = SequenceCounter::new(1);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.peek(), 3);
    }

    #[test]
    fn wraps() {
        let seq = SequenceCounter::new(u32::MAX);
        assert_eq!(seq.next(), u32::MAX);
        assert_eq!(seq.next(), 0);
    }

    #[test]
    fn clones_share_state() {
        let a = SequenceCounter::new(10);
        let b = a.clone();
        a.next();
        assert_eq!(b.next(), 11);
    }
}
