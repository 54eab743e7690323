//! Shared state behind an SPSC byte channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::storage::ByteStorage;

/// The byte block plus the two cursors.
///
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │ write (cache-line padded) - published by producer    │
/// ├──────────────────────────────────────────────────────┤
/// │ read (cache-line padded) - published by consumer     │
/// ├──────────────────────────────────────────────────────┤
/// │ storage: page-aligned [u8; capacity]                 │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// Cursors are byte offsets that only ever grow (wrapping at `usize::MAX`)
/// and are masked on use. Unread bytes are `[read, write)`, so
/// `write - read <= capacity` always holds.
pub(crate) struct ByteRing<C> {
    write: CachePadded<AtomicUsize>,
    read: CachePadded<AtomicUsize>,
    pub(crate) storage: ByteStorage,
    pub(crate) cancel: C,
    producer_gone: AtomicBool,
    consumer_gone: AtomicBool,
}

impl<C> ByteRing<C> {
    pub(crate) fn new(storage: ByteStorage, cancel: C) -> Self {
        Self {
            write: CachePadded::new(AtomicUsize::new(0)),
            read: CachePadded::new(AtomicUsize::new(0)),
            storage,
            cancel,
            producer_gone: AtomicBool::new(false),
            consumer_gone: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    // === Cursors ===

    /// Makes everything written before `write` visible to the consumer.
    #[inline]
    pub(crate) fn publish_write(&self, write: usize) {
        self.write.store(write, Ordering::Release);
    }

    /// Hands everything before `read` back to the producer.
    #[inline]
    pub(crate) fn publish_read(&self, read: usize) {
        self.read.store(read, Ordering::Release);
    }

    #[inline]
    pub(crate) fn load_write(&self) -> usize {
        self.write.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn load_read(&self) -> usize {
        self.read.load(Ordering::Acquire)
    }

    /// Unread bytes, including framing and skipped tails. A snapshot.
    #[inline]
    pub(crate) fn used(&self) -> usize {
        let read = self.load_read();
        self.load_write().wrapping_sub(read)
    }

    // === Liveness ===

    pub(crate) fn set_producer_gone(&self) {
        self.producer_gone.store(true, Ordering::Release);
    }

    pub(crate) fn set_consumer_gone(&self) {
        self.consumer_gone.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_producer_gone(&self) -> bool {
        self.producer_gone.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_consumer_gone(&self) -> bool {
        self.consumer_gone.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NeverCancel;
    use crate::storage::Placement;

    fn ring(capacity: usize) -> ByteRing<NeverCancel> {
        ByteRing::new(ByteStorage::new(capacity, Placement::default()).unwrap(), NeverCancel)
    }

    #[test]
    fn cursors_start_at_zero() {
        let ring = ring(128);
        assert_eq!(ring.load_write(), 0);
        assert_eq!(ring.load_read(), 0);
        assert_eq!(ring.used(), 0);
        assert_eq!(ring.capacity(), 128);
    }

    #[test]
    fn used_tracks_cursor_gap() {
        let ring = ring(256);
        ring.publish_write(192);
        ring.publish_read(64);
        assert_eq!(ring.used(), 128);
    }

    #[test]
    fn used_survives_cursor_wraparound() {
        let ring = ring(256);
        ring.publish_read(usize::MAX - 63);
        ring.publish_write(64);
        assert_eq!(ring.used(), 128);
    }

    #[test]
    fn liveness_flags() {
        let ring = ring(64);
        assert!(!ring.is_producer_gone());
        assert!(!ring.is_consumer_gone());
        ring.set_producer_gone();
        ring.set_consumer_gone();
        assert!(ring.is_producer_gone());
        assert!(ring.is_consumer_gone());
    }
}
