//! Page-aligned byte block for the SPSC ring.

use std::ptr;

use super::{Placement, capacity_for};
use crate::error::RingError;
use crate::sys::Pages;

/// A power-of-two byte block with raw offset access.
///
/// The block itself does no synchronization: callers must guarantee that a
/// range is never written while another thread reads it. The SPSC cursors
/// provide exactly that guarantee.
pub(crate) struct ByteStorage {
    pages: Pages,
    capacity: usize,
    mask: usize,
}

impl ByteStorage {
    pub(crate) fn new(requested: usize, placement: Placement) -> Result<Self, RingError> {
        let capacity = capacity_for(requested)?;
        let pages = placement.alloc(capacity)?;

        Ok(Self {
            pages,
            capacity,
            mask: capacity - 1,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.mask
    }

    /// Copies `src` into the block at `offset`.
    ///
    /// # Safety
    ///
    /// `offset + src.len() <= capacity`, and no other thread may access the
    /// range concurrently.
    #[inline]
    pub(crate) unsafe fn write(&self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.capacity);
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), self.pages.as_ptr().add(offset), src.len());
        }
    }

    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    ///
    /// # Safety
    ///
    /// `offset + dst.len() <= capacity`, and no other thread may write the
    /// range concurrently.
    #[inline]
    pub(crate) unsafe fn read(&self, offset: usize, dst: &mut [u8]) {
        debug_assert!(offset + dst.len() <= self.capacity);
        unsafe {
            ptr::copy_nonoverlapping(self.pages.as_ptr().add(offset), dst.as_mut_ptr(), dst.len());
        }
    }

    /// Borrows `len` bytes starting at `offset`.
    ///
    /// # Safety
    ///
    /// Same as [`ByteStorage::read`], for as long as the slice lives.
    #[inline]
    pub(crate) unsafe fn slice(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.capacity);
        unsafe { std::slice::from_raw_parts(self.pages.as_ptr().add(offset), len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::PAGE_ALIGN;

    #[test]
    fn capacity_is_power_of_two() {
        let storage = ByteStorage::new(146, Placement::default()).unwrap();
        assert_eq!(storage.capacity(), 256);
        assert_eq!(storage.mask(), 255);
    }

    #[test]
    fn block_is_page_aligned() {
        let storage = ByteStorage::new(64, Placement::default()).unwrap();
        assert_eq!(storage.pages.as_ptr() as usize % PAGE_ALIGN, 0);
    }

    #[test]
    fn write_then_read_at_offsets() {
        let storage = ByteStorage::new(128, Placement::default()).unwrap();
        let mut out = [0u8; 5];

        unsafe {
            storage.write(0, b"front");
            storage.write(123, b"tail!");

            storage.read(0, &mut out);
            assert_eq!(&out, b"front");
            storage.read(123, &mut out);
            assert_eq!(&out, b"tail!");
            assert_eq!(storage.slice(123, 5), b"tail!");
        }
    }

    #[test]
    fn starts_zeroed() {
        let storage = ByteStorage::new(256, Placement::default()).unwrap();
        let bytes = unsafe { storage.slice(0, 256) };
        assert!(bytes.iter().all(|&b| b == 0));
    }
}
