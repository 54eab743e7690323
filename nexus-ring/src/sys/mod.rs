//! Page-aligned backing memory (internal).
//!
//! Unix builds map anonymous pages directly; everything else, and Miri, goes
//! through `std::alloc` with a page-sized alignment.

#[cfg(any(not(unix), miri))]
mod alloc;

#[cfg(all(unix, not(miri)))]
mod unix;

use std::io;
use std::ptr::NonNull;

#[cfg(any(not(unix), miri))]
use alloc::{alloc_pages, drop_pages, mlock_impl};

#[cfg(all(unix, not(miri)))]
use unix::{alloc_pages, drop_pages, mlock_impl};

/// Alignment every [`Pages`] region is guaranteed to have.
pub(crate) const PAGE_ALIGN: usize = 4096;

/// A zeroed, page-aligned memory region.
///
/// Freed on drop. The mapped size may be larger than requested; [`Pages::len`]
/// reports what was actually mapped.
pub(crate) struct Pages {
    ptr: NonNull<u8>,
    size: usize,
}

impl Pages {
    /// Allocates at least `size` bytes of zeroed, prefaulted memory.
    pub(crate) fn alloc(size: usize) -> io::Result<Self> {
        alloc_pages(size, false)
    }

    /// Allocates from reserved huge pages (hugetlbfs). Linux only; other
    /// targets return [`io::ErrorKind::Unsupported`].
    pub(crate) fn alloc_huge(size: usize) -> io::Result<Self> {
        alloc_pages(size, true)
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.size
    }

    /// Locks the region in physical RAM.
    pub(crate) fn mlock(&self) -> io::Result<()> {
        mlock_impl(self.ptr, self.size)
    }
}

// Safety: Pages is a plain owned region; synchronization of its contents is
// the responsibility of the storage built on top.
unsafe impl Send for Pages {}
unsafe impl Sync for Pages {}

impl Drop for Pages {
    fn drop(&mut self) {
        // Safety: ptr/size came from alloc_pages and are dropped exactly once.
        unsafe { drop_pages(self.ptr, self.size) }
    }
}
