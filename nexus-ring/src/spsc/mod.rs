//! Single-producer single-consumer (SPSC) ring of variable-length records.
//!
//! Each record is framed as a native-endian `u32` length followed by the
//! payload, and the frame is padded to a whole number of cache lines:
//!
//! ```text
//!  offset  0        4               len+4        round_up(len+4, 64)
//!          ┌────────┬─────────────────┬────────────┐
//!          │  len   │     payload     │  padding   │
//!          └────────┴─────────────────┴────────────┘
//! ```
//!
//! Every frame therefore starts on a cache-line boundary. When a frame does
//! not fit before the end of the buffer, the producer writes only the length
//! at the tail as a skip marker and places the payload at offset 0. The
//! consumer recognises the marker because `len` no longer fits after it, skips
//! the tail and reads the payload from the start.
//!
//! # Performance Notes
//!
//! Each side keeps a cached copy of the other side's cursor and only reloads
//! the shared atomic when the cached value says the ring is full (producer)
//! or empty (consumer). A full or empty report is always made against a fresh
//! load.
//!
//! # Example
//!
//! ```
//! use nexus_ring::spsc;
//!
//! let (tx, mut rx) = spsc::channel(1024).unwrap();
//!
//! tx.try_produce(b"first").unwrap();
//! tx.try_produce(&[7u8; 100]).unwrap();
//!
//! let mut buf = [0u8; 256];
//! assert_eq!(rx.try_consume(&mut buf).unwrap(), 5);
//! assert_eq!(&buf[..5], b"first");
//! assert_eq!(rx.consume_to_vec().unwrap(), vec![7u8; 100]);
//! assert_eq!(rx.try_consume(&mut buf).unwrap(), 0);
//! ```

mod ring;

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use bytemuck::Pod;
use crossbeam_utils::Backoff;

use ring::ByteRing;

use crate::cancel::{Cancel, NeverCancel};
use crate::error::RingError;
use crate::storage::{ByteStorage, Placement};
use crate::util::round_up_to;
use crate::{CACHE_LINE, MIN_CAPACITY, trace};

/// Size of the length prefix in front of every record.
pub const PREFIX_LEN: usize = std::mem::size_of::<u32>();

/// Creates a channel over at least `capacity` bytes that never cancels.
///
/// # Errors
///
/// See [`ByteRingBuilder::build`].
///
/// ```
/// use nexus_ring::spsc;
///
/// let (tx, _rx) = spsc::channel(146).unwrap();
/// assert_eq!(tx.capacity(), 256);
/// ```
pub fn channel(capacity: usize) -> Result<(Producer, Consumer), RingError> {
    ByteRingBuilder::default().capacity(capacity).build()
}

/// Largest payload a ring of `capacity` bytes accepts.
///
/// A frame may use at most half the ring (or the whole ring when it is a
/// single cache line). That bound guarantees a wrapped record, which also
/// gives up the tail of the buffer, always fits once the consumer catches up.
#[must_use]
pub const fn max_record_len(capacity: usize) -> usize {
    let frame = if capacity / 2 > CACHE_LINE { capacity / 2 } else { CACHE_LINE };
    let len = frame - PREFIX_LEN;
    if len > u32::MAX as usize { u32::MAX as usize } else { len }
}

// =============================================================================
// Producer
// =============================================================================

/// The writing half of an SPSC byte channel.
///
/// `Send` but not `Sync` or `Clone`: exactly one thread produces at a time.
pub struct Producer<C = NeverCancel> {
    ring: Arc<ByteRing<C>>,

    /// Our write cursor (authoritative, only we update it).
    local_write: Cell<usize>,

    /// Snapshot of the consumer's read cursor. Refreshed only when the ring
    /// looks full.
    cached_read: Cell<usize>,
}

impl<C: Cancel> Producer<C> {
    /// Attempts to append one record.
    ///
    /// # Errors
    ///
    /// - [`TryProduceError::Empty`] for a zero-length record.
    /// - [`TryProduceError::TooLarge`] above [`Producer::max_record_len`].
    /// - [`TryProduceError::Full`] if there is not enough free space.
    /// - [`TryProduceError::Disconnected`] if full and the consumer is gone.
    ///
    /// No error changes the ring.
    #[inline]
    pub fn try_produce(&self, record: &[u8]) -> Result<(), TryProduceError> {
        let len = record.len();
        if len == 0 {
            return Err(TryProduceError::Empty);
        }
        let max = self.max_record_len();
        if len > max {
            return Err(self.oversize(len, max));
        }

        let ring = &*self.ring;
        let capacity = ring.capacity();
        let write = self.local_write.get();
        let pos = write & ring.storage.mask();
        #[allow(clippy::cast_possible_truncation)]
        let prefix = (len as u32).to_ne_bytes();

        let frame = round_up_to(PREFIX_LEN + len, CACHE_LINE);

        if pos + frame <= capacity {
            if !self.has_room(write, frame) {
                return Err(self.full());
            }

            // Safety: [pos, pos + frame) is free and inside the block.
            unsafe {
                ring.storage.write(pos, &prefix);
                ring.storage.write(pos + PREFIX_LEN, record);
            }
            self.advance(write, frame);
        } else {
            // Frames start on cache-line boundaries, so the tail always has
            // room for the prefix.
            let tail = capacity - pos;
            debug_assert!(tail >= PREFIX_LEN);
            let needed = tail + round_up_to(len, CACHE_LINE);

            if !self.has_room(write, needed) {
                return Err(self.full());
            }

            // Safety: the tail and [0, round_up(len)) are both free.
            unsafe {
                ring.storage.write(pos, &prefix);
                ring.storage.write(0, record);
            }
            self.advance(write, needed);
        }

        Ok(())
    }

    /// Appends one record, spinning while the ring is full.
    ///
    /// # Errors
    ///
    /// - [`ProduceError::Empty`] / [`ProduceError::TooLarge`] as for
    ///   [`Producer::try_produce`].
    /// - [`ProduceError::Cancelled`] if the cancel predicate fired first.
    /// - [`ProduceError::Disconnected`] if the consumer went away.
    ///
    /// Unlike the slot ring, a cancelled call leaves the ring fully usable.
    pub fn produce(&self, record: &[u8]) -> Result<(), ProduceError> {
        let backoff = Backoff::new();
        loop {
            match self.try_produce(record) {
                Ok(()) => return Ok(()),
                Err(TryProduceError::Full) => {}
                Err(e) => return Err(e.into()),
            }
            if self.ring.cancel.is_cancelled() {
                return Err(ProduceError::Cancelled);
            }
            backoff.snooze();
        }
    }

    /// Appends `value` as one record of `size_of::<T>()` bytes.
    ///
    /// Read it back with [`Consumer::try_consume_value`].
    ///
    /// # Errors
    ///
    /// As for [`Producer::try_produce`] on the value's bytes. A zero-sized
    /// `T` is [`TryProduceError::Empty`].
    #[inline]
    pub fn try_produce_value<T: Pod>(&self, value: &T) -> Result<(), TryProduceError> {
        self.try_produce(bytemuck::bytes_of(value))
    }

    /// Appends `value` as one record, spinning while the ring is full.
    ///
    /// # Errors
    ///
    /// As for [`Producer::produce`].
    pub fn produce_value<T: Pod>(&self, value: &T) -> Result<(), ProduceError> {
        self.produce(bytemuck::bytes_of(value))
    }

    /// Returns `true` if `write + needed` stays within one capacity of the
    /// consumer, reloading the consumer's cursor once if the cached copy says
    /// otherwise.
    #[inline]
    fn has_room(&self, write: usize, needed: usize) -> bool {
        let capacity = self.ring.capacity();
        if capacity - write.wrapping_sub(self.cached_read.get()) >= needed {
            return true;
        }

        let read = self.ring.load_read();
        self.cached_read.set(read);
        capacity - write.wrapping_sub(read) >= needed
    }

    #[inline]
    fn advance(&self, write: usize, by: usize) {
        let next = write.wrapping_add(by);
        self.ring.publish_write(next);
        self.local_write.set(next);
    }

    #[cold]
    fn full(&self) -> TryProduceError {
        if self.ring.is_consumer_gone() {
            TryProduceError::Disconnected
        } else {
            TryProduceError::Full
        }
    }

    #[cold]
    fn oversize(&self, len: usize, max: usize) -> TryProduceError {
        trace::debug!(len, max, capacity = self.capacity(), "record rejected: too large");
        TryProduceError::TooLarge { len, max }
    }
}

impl<C> Producer<C> {
    /// Capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Largest record this ring accepts. See [`max_record_len`].
    #[inline]
    pub fn max_record_len(&self) -> usize {
        max_record_len(self.ring.capacity())
    }

    /// Bytes currently occupied, framing included. A snapshot.
    pub fn len_bytes(&self) -> usize {
        self.ring.used()
    }

    /// Returns `true` if the consumer has consumed everything. A snapshot.
    pub fn is_empty(&self) -> bool {
        self.len_bytes() == 0
    }

    /// Returns `true` if the consumer has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.ring.is_consumer_gone()
    }
}

impl<C> Drop for Producer<C> {
    fn drop(&mut self) {
        self.ring.set_producer_gone();
    }
}

impl<C> fmt::Debug for Producer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("write", &self.local_write.get())
            .field("disconnected", &self.is_disconnected())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// Location of the next record's payload.
#[derive(Clone, Copy, Debug)]
struct Frame {
    offset: usize,
    len: usize,
    /// Read cursor once this frame is released, tail skip included.
    next: usize,
}

/// The reading half of an SPSC byte channel.
///
/// `Send` but not `Sync` or `Clone`: exactly one thread consumes at a time.
pub struct Consumer<C = NeverCancel> {
    ring: Arc<ByteRing<C>>,

    /// Our read cursor (authoritative, only we update it).
    local_read: Cell<usize>,

    /// Snapshot of the producer's write cursor. Refreshed only when the ring
    /// looks empty.
    cached_write: Cell<usize>,
}

impl<C: Cancel> Consumer<C> {
    /// Attempts to read one record into `out`.
    ///
    /// Returns the record length, or `Ok(0)` if the ring is empty. An empty
    /// ring leaves both cursors untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TryConsumeError::BufferTooSmall`] if `out` cannot hold the
    /// next record. The record stays in the ring.
    #[inline]
    pub fn try_consume(&self, out: &mut [u8]) -> Result<usize, TryConsumeError> {
        let Some(frame) = self.next_frame() else {
            return Ok(0);
        };
        if out.len() < frame.len {
            return Err(TryConsumeError::BufferTooSmall { needed: frame.len });
        }

        // Safety: the frame lies inside [read, write), which the producer will
        // not touch until we publish past it.
        unsafe { self.ring.storage.read(frame.offset, &mut out[..frame.len]) };
        self.release(frame);

        Ok(frame.len)
    }

    /// Reads one record in place, handing the payload to `f`.
    ///
    /// Returns `None` if the ring is empty. The record is released after `f`
    /// returns.
    ///
    /// Takes `&mut self` so `f` cannot reach the consumer while the payload is
    /// borrowed:
    ///
    /// ```compile_fail
    /// let (tx, mut rx) = nexus_ring::spsc::channel(256).unwrap();
    /// tx.try_produce(b"aaaa").unwrap();
    /// let mut buf = [0u8; 8];
    /// rx.consume_with(|_| rx.try_consume(&mut buf));
    /// ```
    #[inline]
    pub fn consume_with<R, F>(&mut self, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let frame = self.next_frame()?;

        // Safety: as in try_consume; the slice does not outlive this call and
        // nothing else can move the read cursor while `self` is borrowed.
        let payload = unsafe { self.ring.storage.slice(frame.offset, frame.len) };
        let result = f(payload);
        self.release(frame);

        Some(result)
    }

    /// Reads one record into a fresh `Vec`. Returns `None` if empty.
    pub fn consume_to_vec(&mut self) -> Option<Vec<u8>> {
        self.consume_with(<[u8]>::to_vec)
    }

    /// Reads one record written by [`Producer::try_produce_value`].
    ///
    /// Returns `Ok(None)` if the ring is empty. The payload is copied out, so
    /// it need not be aligned for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`TryConsumeError::SizeMismatch`] if the next record is not
    /// exactly `size_of::<T>()` bytes. The record stays in the ring.
    #[inline]
    pub fn try_consume_value<T: Pod>(&self) -> Result<Option<T>, TryConsumeError> {
        let Some(frame) = self.next_frame() else {
            return Ok(None);
        };
        let expected = std::mem::size_of::<T>();
        if frame.len != expected {
            return Err(TryConsumeError::SizeMismatch {
                expected,
                found: frame.len,
            });
        }

        let mut value: T = bytemuck::Zeroable::zeroed();
        // Safety: as in try_consume; `T: Pod` accepts any byte pattern.
        unsafe {
            self.ring
                .storage
                .read(frame.offset, bytemuck::bytes_of_mut(&mut value));
        }
        self.release(frame);

        Ok(Some(value))
    }

    /// Length of the next record without consuming it.
    pub fn peek_len(&self) -> Option<usize> {
        self.next_frame().map(|frame| frame.len)
    }

    /// Reads one record into `out`, spinning while the ring is empty.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::BufferTooSmall`] as for [`Consumer::try_consume`].
    /// - [`ConsumeError::Cancelled`] if the cancel predicate fired first.
    /// - [`ConsumeError::Disconnected`] if the producer is gone and every
    ///   record it published has been read.
    pub fn consume(&self, out: &mut [u8]) -> Result<usize, ConsumeError> {
        self.spin(|| match self.try_consume(out)? {
            0 => Ok(None),
            n => Ok(Some(n)),
        })
    }

    /// Reads one typed record, spinning while the ring is empty.
    ///
    /// # Errors
    ///
    /// - [`ConsumeError::SizeMismatch`] as for [`Consumer::try_consume_value`].
    /// - [`ConsumeError::Cancelled`] / [`ConsumeError::Disconnected`] as for
    ///   [`Consumer::consume`].
    pub fn consume_value<T: Pod>(&self) -> Result<T, ConsumeError> {
        self.spin(|| Ok(self.try_consume_value()?))
    }

    /// Polls `attempt` until it yields, the producer goes away with the ring
    /// drained, or the cancel predicate fires.
    #[inline]
    fn spin<R>(
        &self,
        mut attempt: impl FnMut() -> Result<Option<R>, ConsumeError>,
    ) -> Result<R, ConsumeError> {
        let backoff = Backoff::new();
        loop {
            if let Some(value) = attempt()? {
                return Ok(value);
            }
            if self.ring.is_producer_gone() {
                // The producer's last publish happens before it flags itself
                // gone; one more look catches it.
                return attempt()?.ok_or(ConsumeError::Disconnected);
            }
            if self.ring.cancel.is_cancelled() {
                return Err(ConsumeError::Cancelled);
            }
            backoff.snooze();
        }
    }

    #[inline]
    fn next_frame(&self) -> Option<Frame> {
        let read = self.local_read.get();

        if read == self.cached_write.get() {
            let write = self.ring.load_write();
            self.cached_write.set(write);
            if read == write {
                return None;
            }
        }

        let ring = &*self.ring;
        let capacity = ring.capacity();
        let pos = read & ring.storage.mask();

        let mut prefix = [0u8; PREFIX_LEN];
        // Safety: a published frame starts at pos.
        unsafe { ring.storage.read(pos, &mut prefix) };
        let len = u32::from_ne_bytes(prefix) as usize;

        if pos + PREFIX_LEN + len <= capacity {
            Some(Frame {
                offset: pos + PREFIX_LEN,
                len,
                next: read.wrapping_add(round_up_to(PREFIX_LEN + len, CACHE_LINE)),
            })
        } else {
            // Skip marker: the payload was placed at the start of the buffer.
            Some(Frame {
                offset: 0,
                len,
                next: read.wrapping_add((capacity - pos) + round_up_to(len, CACHE_LINE)),
            })
        }
    }

    #[inline]
    fn release(&self, frame: Frame) {
        self.ring.publish_read(frame.next);
        self.local_read.set(frame.next);
    }
}

impl<C> Consumer<C> {
    /// Capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Largest record the producer may send. See [`max_record_len`].
    #[inline]
    pub fn max_record_len(&self) -> usize {
        max_record_len(self.ring.capacity())
    }

    /// Bytes currently occupied, framing included. A snapshot.
    pub fn len_bytes(&self) -> usize {
        self.ring.used()
    }

    /// Returns `true` if nothing is waiting to be read. A snapshot.
    pub fn is_empty(&self) -> bool {
        self.len_bytes() == 0
    }

    /// Returns `true` if the producer has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.ring.is_producer_gone()
    }
}

impl<C> Drop for Consumer<C> {
    fn drop(&mut self) {
        self.ring.set_consumer_gone();
    }
}

impl<C> fmt::Debug for Consumer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("read", &self.local_read.get())
            .field("disconnected", &self.is_disconnected())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for an SPSC byte channel.
///
/// ```
/// use nexus_ring::{CancelFlag, spsc::ByteRingBuilder};
///
/// let stop = CancelFlag::new();
/// let (tx, rx) = ByteRingBuilder::default()
///     .capacity(4096)
///     .cancel(stop.clone())
///     .build()
///     .unwrap();
///
/// stop.cancel();
/// let mut buf = [0u8; 64];
/// assert!(rx.consume(&mut buf).is_err());
/// # drop(tx);
/// ```
pub struct ByteRingBuilder<C = NeverCancel> {
    capacity: usize,
    placement: Placement,
    cancel: C,
}

impl Default for ByteRingBuilder {
    fn default() -> Self {
        Self {
            capacity: MIN_CAPACITY,
            placement: Placement::default(),
            cancel: NeverCancel,
        }
    }
}

impl<C: Cancel> ByteRingBuilder<C> {
    /// Minimum ring size in bytes. Rounded up to a power of two, and to at
    /// least [`MIN_CAPACITY`]. Default: [`MIN_CAPACITY`].
    #[must_use]
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.capacity = bytes;
        self
    }

    /// Back the ring with explicit huge pages (hugetlbfs). Default: false.
    #[must_use]
    pub fn huge_pages(mut self, enabled: bool) -> Self {
        self.placement.huge_pages = enabled;
        self
    }

    /// Lock the ring in RAM. Default: false.
    #[must_use]
    pub fn mlock(mut self, enabled: bool) -> Self {
        self.placement.mlock = enabled;
        self
    }

    /// Predicate polled by [`Producer::produce`] and [`Consumer::consume`].
    /// Default: [`NeverCancel`].
    #[must_use]
    pub fn cancel<C2: Cancel>(self, cancel: C2) -> ByteRingBuilder<C2> {
        ByteRingBuilder {
            capacity: self.capacity,
            placement: self.placement,
            cancel,
        }
    }

    /// Allocates the ring and splits it into its two halves.
    ///
    /// # Errors
    ///
    /// - [`RingError::ZeroCapacity`] if the capacity is zero.
    /// - [`RingError::CapacityOverflow`] if it does not fit in memory.
    /// - [`RingError::AllocationFailed`], [`RingError::HugePagesUnavailable`]
    ///   or [`RingError::MlockFailed`] if the memory could not be set up.
    pub fn build(self) -> Result<(Producer<C>, Consumer<C>), RingError> {
        let storage = ByteStorage::new(self.capacity, self.placement)?;

        trace::debug!(
            requested = self.capacity,
            capacity = storage.capacity(),
            max_record = max_record_len(storage.capacity()),
            "byte ring created"
        );

        let ring = Arc::new(ByteRing::new(storage, self.cancel));

        Ok((
            Producer {
                ring: Arc::clone(&ring),
                local_write: Cell::new(0),
                cached_read: Cell::new(0),
            },
            Consumer {
                ring,
                local_read: Cell::new(0),
                cached_write: Cell::new(0),
            },
        ))
    }
}

impl<C> fmt::Debug for ByteRingBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRingBuilder")
            .field("capacity", &self.capacity)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error returned by [`Producer::try_produce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryProduceError {
    /// The record was empty.
    #[error("record is empty")]
    Empty,
    /// The record exceeds the ring's maximum record length.
    #[error("record of {len} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Length of the rejected record.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },
    /// Not enough free space right now.
    #[error("ring is full")]
    Full,
    /// The ring is full and the consumer has been dropped.
    #[error("consumer disconnected")]
    Disconnected,
}

impl TryProduceError {
    /// Returns `true` if this error is the `Full` variant.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Returns `true` for errors caused by the record itself.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Empty | Self::TooLarge { .. })
    }
}

/// Error returned by [`Producer::produce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProduceError {
    /// The record was empty.
    #[error("record is empty")]
    Empty,
    /// The record exceeds the ring's maximum record length.
    #[error("record of {len} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Length of the rejected record.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },
    /// The cancel predicate fired while waiting for space.
    #[error("wait cancelled")]
    Cancelled,
    /// The consumer has been dropped.
    #[error("consumer disconnected")]
    Disconnected,
}

impl From<TryProduceError> for ProduceError {
    fn from(err: TryProduceError) -> Self {
        match err {
            TryProduceError::Empty => Self::Empty,
            TryProduceError::TooLarge { len, max } => Self::TooLarge { len, max },
            // Full is retried by produce and never converted.
            TryProduceError::Full | TryProduceError::Disconnected => Self::Disconnected,
        }
    }
}

/// Error returned by [`Consumer::try_consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryConsumeError {
    /// `out` is shorter than the next record.
    #[error("buffer too small: next record is {needed} bytes")]
    BufferTooSmall {
        /// Length of the next record.
        needed: usize,
    },
    /// The next record does not have the size of the requested type.
    #[error("record is {found} bytes, expected {expected}")]
    SizeMismatch {
        /// `size_of` the requested type.
        expected: usize,
        /// Length of the next record.
        found: usize,
    },
}

/// Error returned by [`Consumer::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsumeError {
    /// `out` is shorter than the next record.
    #[error("buffer too small: next record is {needed} bytes")]
    BufferTooSmall {
        /// Length of the next record.
        needed: usize,
    },
    /// The next record does not have the size of the requested type.
    #[error("record is {found} bytes, expected {expected}")]
    SizeMismatch {
        /// `size_of` the requested type.
        expected: usize,
        /// Length of the next record.
        found: usize,
    },
    /// The cancel predicate fired while waiting for a record.
    #[error("wait cancelled")]
    Cancelled,
    /// The producer is gone and the ring is drained.
    #[error("producer disconnected")]
    Disconnected,
}

impl From<TryConsumeError> for ConsumeError {
    fn from(err: TryConsumeError) -> Self {
        match err {
            TryConsumeError::BufferTooSmall { needed } => Self::BufferTooSmall { needed },
            TryConsumeError::SizeMismatch { expected, found } => {
                Self::SizeMismatch { expected, found }
            }
        }
    }
}
