//! Cache-line-aligned slot array for the MPMC ring.

use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Placement, capacity_for};
use crate::error::RingError;
use crate::sys::{PAGE_ALIGN, Pages};

/// One ring cell: a state counter and room for one `T`.
///
/// `state` is even while the slot is empty (writable for generation
/// `state / 2`) and odd while it holds a value (readable for generation
/// `(state - 1) / 2`).
#[repr(C, align(64))]
pub(crate) struct Slot<T> {
    state: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) fn load_state(&self) -> usize {
        self.state.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn publish_state(&self, state: usize) {
        self.state.store(state, Ordering::Release);
    }

    /// Pointer to the (possibly uninitialized) element storage.
    #[inline]
    pub(crate) fn value_ptr(&self) -> *mut T {
        self.value.get().cast::<T>()
    }

    /// Moves the element out, leaving the storage logically uninitialized.
    ///
    /// # Safety
    ///
    /// The slot must be full and owned by the caller's ticket.
    #[inline]
    pub(crate) unsafe fn take(&self) -> T {
        unsafe { ptr::read(self.value_ptr()) }
    }
}

/// A power-of-two array of [`Slot`]s in page-aligned memory.
///
/// Dropping the storage drops every element whose slot is still full.
pub(crate) struct SlotStorage<T> {
    pages: Pages,
    slots: *mut Slot<T>,
    capacity: usize,
    mask: usize,
    shift: u32,
}

// Safety: elements are only reached through the slot state handshake, which
// hands each one to exactly one thread at a time.
unsafe impl<T: Send> Send for SlotStorage<T> {}
unsafe impl<T: Send> Sync for SlotStorage<T> {}

impl<T> SlotStorage<T> {
    pub(crate) fn new(requested: usize, placement: Placement) -> Result<Self, RingError> {
        assert!(
            mem::align_of::<Slot<T>>() <= PAGE_ALIGN,
            "element alignment exceeds page alignment"
        );

        let capacity = capacity_for(requested)?;
        let bytes = mem::size_of::<Slot<T>>()
            .checked_mul(capacity)
            .ok_or(RingError::CapacityOverflow { requested })?;

        let pages = placement.alloc(bytes)?;
        let slots = pages.as_ptr().cast::<Slot<T>>();

        for i in 0..capacity {
            // Safety: i < capacity and the region holds `capacity` slots.
            unsafe {
                ptr::write(ptr::addr_of_mut!((*slots.add(i)).state), AtomicUsize::new(0));
            }
        }

        Ok(Self {
            pages,
            slots,
            capacity,
            mask: capacity - 1,
            shift: capacity.trailing_zeros(),
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot a ticket lands on.
    #[inline]
    pub(crate) fn slot(&self, ticket: usize) -> &Slot<T> {
        // Safety: masked index is always in bounds.
        unsafe { &*self.slots.add(ticket & self.mask) }
    }

    /// How many times the ring has wrapped by the time `ticket` is served.
    #[inline]
    pub(crate) fn generation(&self, ticket: usize) -> usize {
        ticket >> self.shift
    }

    /// Bytes of backing memory, including page rounding.
    pub(crate) fn footprint(&self) -> usize {
        self.pages.len()
    }
}

impl<T> Drop for SlotStorage<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }

        for i in 0..self.capacity {
            // Safety: in bounds; we have exclusive access during drop.
            let slot = unsafe { &mut *self.slots.add(i) };
            if *slot.state.get_mut() & 1 == 1 {
                unsafe { ptr::drop_in_place(slot.value_ptr()) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn slots_are_cache_line_aligned() {
        assert_eq!(mem::align_of::<Slot<u8>>(), crate::CACHE_LINE);
        assert_eq!(mem::size_of::<Slot<u64>>(), crate::CACHE_LINE);
        assert_eq!(mem::size_of::<Slot<[u64; 8]>>(), 2 * crate::CACHE_LINE);
    }

    #[test]
    fn states_start_empty_generation_zero() {
        let storage = SlotStorage::<u64>::new(100, Placement::default()).unwrap();
        assert_eq!(storage.capacity(), 128);
        for i in 0..storage.capacity() {
            assert_eq!(storage.slot(i).load_state(), 0);
        }
    }

    #[test]
    fn ticket_mapping() {
        let storage = SlotStorage::<u64>::new(64, Placement::default()).unwrap();
        assert!(ptr::eq(storage.slot(3), storage.slot(67)));
        assert_eq!(storage.generation(3), 0);
        assert_eq!(storage.generation(67), 1);
        assert_eq!(storage.generation(64 * 5 + 1), 5);
    }

    #[test]
    fn footprint_covers_all_slots() {
        let storage = SlotStorage::<[u8; 100]>::new(64, Placement::default()).unwrap();
        assert!(storage.footprint() >= 64 * mem::size_of::<Slot<[u8; 100]>>());
    }

    #[test]
    fn drop_drains_full_slots_only() {
        let marker = Arc::new(());
        {
            let storage = SlotStorage::<Arc<()>>::new(64, Placement::default()).unwrap();
            for i in [0usize, 5, 9] {
                let slot = storage.slot(i);
                unsafe { ptr::write(slot.value_ptr(), Arc::clone(&marker)) };
                slot.publish_state(1);
            }
            // A slot that was filled and then consumed must not be dropped again.
            let slot = storage.slot(9);
            drop(unsafe { slot.take() });
            slot.publish_state(2);

            assert_eq!(Arc::strong_count(&marker), 3);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }
}
