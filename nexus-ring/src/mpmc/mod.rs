//! Multi-producer multi-consumer (MPMC) slot ring.
//!
//! Every call takes a ticket from one of two counters with a single
//! `fetch_add`: producers from the write counter, consumers from the read
//! counter. A ticket names a slot (`ticket & mask`) and a generation
//! (`ticket / capacity`). The slot's state counter says whose turn it is:
//!
//! ```text
//!   state = 2g      empty, waiting for the producer holding generation g
//!   state = 2g + 1  full, waiting for the consumer holding generation g
//!
//!   empty(g) ──produce──▶ full(g) ──consume──▶ empty(g+1) ──▶ ...
//! ```
//!
//! A caller spins on its slot until the state matches its ticket, then does
//! its half of the handshake and publishes the next state with `Release`.
//! The `Acquire` load on the other side is what guarantees a consumer sees a
//! fully written element.
//!
//! # Ordering
//!
//! Each slot is strictly FIFO across generations. Across slots nothing is
//! promised: with several producers, elements may be consumed in a different
//! order than they were produced.
//!
//! # Cancellation wedges the ring
//!
//! `produce` on a full ring and `consume` on an empty ring spin until their
//! slot is ready or the ring's [`Cancel`] predicate fires. A cancelled call has
//! already taken its ticket and does not give it back. The slot it was waiting
//! on now expects a generation nobody will ever deliver, so every later ticket
//! for that slot blocks forever. [`SlotQueue::is_wedged`] reports this. Treat
//! cancellation as shutdown and discard the ring afterwards.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use nexus_ring::{Produce, mpmc::SlotQueue};
//!
//! let queue = Arc::new(SlotQueue::<u64>::new(64).unwrap());
//!
//! let producers: Vec<_> = (0..2)
//!     .map(|p| {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 queue.produce(p * 1000 + i).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! let mut sum = 0;
//! for _ in 0..200 {
//!     sum += queue.consume().unwrap();
//! }
//!
//! for p in producers {
//!     p.join().unwrap();
//! }
//! assert_eq!(sum, (0..100).sum::<u64>() * 2 + 100 * 1000);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::cancel::{Cancel, Cancelled, NeverCancel};
use crate::error::RingError;
use crate::produce::{Produce, Staged};
use crate::storage::{Placement, Slot, SlotStorage};
use crate::{MIN_CAPACITY, trace};

/// Bounded MPMC ring of `T`.
///
/// Share it between threads with an `Arc`. Produce through the [`Produce`]
/// trait.
pub struct SlotQueue<T, C = NeverCancel> {
    /// Next write ticket.
    write: CachePadded<AtomicUsize>,
    /// Next read ticket.
    read: CachePadded<AtomicUsize>,
    storage: SlotStorage<T>,
    cancel: C,
    /// Set once any call abandons its ticket.
    wedged: AtomicBool,
}

impl<T> SlotQueue<T> {
    /// Creates a ring for at least `capacity` elements that never cancels.
    ///
    /// # Errors
    ///
    /// See [`SlotQueueBuilder::build`].
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::builder().capacity(capacity).build()
    }

    /// Starts a builder with default settings.
    #[must_use]
    pub fn builder() -> SlotQueueBuilder<T> {
        SlotQueueBuilder::default()
    }
}

impl<T, C: Cancel> SlotQueue<T, C> {
    /// Takes the next value, spinning while its slot is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the cancel predicate fired while waiting. The
    /// read ticket is lost and the ring is wedged.
    #[inline]
    pub fn consume(&self) -> Result<T, Cancelled> {
        // Slot states carry the synchronization; the counter only hands out
        // unique tickets.
        let ticket = self.read.fetch_add(1, Ordering::Relaxed);
        let slot = self.storage.slot(ticket);
        let full = 2 * self.storage.generation(ticket) + 1;

        if !self.wait_for(slot, full) {
            self.abandon(ticket, "consume");
            return Err(Cancelled);
        }

        // Safety: state == full for our generation, so the slot holds an
        // initialized value and no other ticket can touch it until we publish.
        let value = unsafe { slot.take() };
        slot.publish_state(full + 1);

        Ok(value)
    }

    /// Takes the next value into `out`. Returns `false` on cancellation, in
    /// which case `out` is untouched.
    #[inline]
    pub fn consume_into(&self, out: &mut T) -> bool {
        match self.consume() {
            Ok(value) => {
                *out = value;
                true
            }
            Err(Cancelled) => false,
        }
    }

    /// Spins until `slot` reaches `expected`. Returns `false` if cancelled
    /// first.
    #[inline]
    fn wait_for(&self, slot: &Slot<T>, expected: usize) -> bool {
        if slot.load_state() == expected {
            return true;
        }

        let backoff = Backoff::new();
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            backoff.snooze();
            if slot.load_state() == expected {
                return true;
            }
        }
    }

    #[cold]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn abandon(&self, ticket: usize, op: &'static str) {
        self.wedged.store(true, Ordering::Release);
        trace::warn!(
            op,
            ticket,
            slot = ticket & (self.capacity() - 1),
            "wait cancelled; ticket abandoned and slot wedged"
        );
    }
}

impl<T, C> SlotQueue<T, C> {
    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Write tickets issued minus read tickets issued, clamped to
    /// `[0, capacity]`.
    ///
    /// A snapshot: in-flight and abandoned tickets are counted too.
    pub fn len(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.saturating_sub(read).min(self.capacity())
    }

    /// Returns `true` if [`SlotQueue::len`] is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once any `produce` or `consume` was cancelled after
    /// taking its ticket. A wedged ring will eventually block every caller
    /// that lands on the abandoned slot.
    pub fn is_wedged(&self) -> bool {
        self.wedged.load(Ordering::Acquire)
    }

    /// Bytes of backing memory.
    pub fn footprint(&self) -> usize {
        self.storage.footprint()
    }
}

impl<T, C: Cancel> Produce<T> for SlotQueue<T, C> {
    #[inline]
    fn reserve(&self, staged: Staged<'_, T>) -> bool {
        let ticket = self.write.fetch_add(1, Ordering::Relaxed);
        let slot = self.storage.slot(ticket);
        let empty = 2 * self.storage.generation(ticket);

        if !self.wait_for(slot, empty) {
            self.abandon(ticket, "produce");
            return false;
        }

        // Safety: state == empty for our generation, so the storage is
        // uninitialized and reserved for this ticket alone.
        unsafe { ptr::write(slot.value_ptr(), staged.take()) };
        slot.publish_state(empty + 1);

        true
    }
}

impl<T, C> fmt::Debug for SlotQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("wedged", &self.is_wedged())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SlotQueue`].
///
/// ```
/// use nexus_ring::mpmc::SlotQueue;
///
/// let queue = SlotQueue::<[u8; 32]>::builder()
///     .capacity(1000)
///     .build()
///     .unwrap();
/// assert_eq!(queue.capacity(), 1024);
/// ```
pub struct SlotQueueBuilder<T, C = NeverCancel> {
    capacity: usize,
    placement: Placement,
    cancel: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for SlotQueueBuilder<T> {
    fn default() -> Self {
        Self {
            capacity: MIN_CAPACITY,
            placement: Placement::default(),
            cancel: NeverCancel,
            _marker: PhantomData,
        }
    }
}

impl<T, C: Cancel> SlotQueueBuilder<T, C> {
    /// Minimum number of slots. Rounded up to a power of two, and to at least
    /// [`MIN_CAPACITY`]. Default: [`MIN_CAPACITY`].
    #[must_use]
    pub fn capacity(mut self, slots: usize) -> Self {
        self.capacity = slots;
        self
    }

    /// Back the slots with explicit huge pages (hugetlbfs). Default: false.
    #[must_use]
    pub fn huge_pages(mut self, enabled: bool) -> Self {
        self.placement.huge_pages = enabled;
        self
    }

    /// Lock the slots in RAM. Default: false.
    #[must_use]
    pub fn mlock(mut self, enabled: bool) -> Self {
        self.placement.mlock = enabled;
        self
    }

    /// Predicate polled by blocking calls. Default: [`NeverCancel`].
    #[must_use]
    pub fn cancel<C2: Cancel>(self, cancel: C2) -> SlotQueueBuilder<T, C2> {
        SlotQueueBuilder {
            capacity: self.capacity,
            placement: self.placement,
            cancel,
            _marker: PhantomData,
        }
    }

    /// Allocates the ring.
    ///
    /// # Errors
    ///
    /// - [`RingError::ZeroCapacity`] if the capacity is zero.
    /// - [`RingError::CapacityOverflow`] if the slots do not fit in memory.
    /// - [`RingError::AllocationFailed`], [`RingError::HugePagesUnavailable`]
    ///   or [`RingError::MlockFailed`] if the memory could not be set up.
    pub fn build(self) -> Result<SlotQueue<T, C>, RingError> {
        let storage = SlotStorage::new(self.capacity, self.placement)?;

        trace::debug!(
            requested = self.capacity,
            capacity = storage.capacity(),
            slot_bytes = std::mem::size_of::<Slot<T>>(),
            footprint = storage.footprint(),
            "slot queue created"
        );

        Ok(SlotQueue {
            write: CachePadded::new(AtomicUsize::new(0)),
            read: CachePadded::new(AtomicUsize::new(0)),
            storage,
            cancel: self.cancel,
            wedged: AtomicBool::new(false),
        })
    }
}

impl<T, C> fmt::Debug for SlotQueueBuilder<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotQueueBuilder")
            .field("capacity", &self.capacity)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}
