//! Fallback using `std::alloc` (non-unix targets and Miri).

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::io;
use std::ptr::NonNull;

use super::{PAGE_ALIGN, Pages};

pub(super) fn alloc_pages(size: usize, huge: bool) -> io::Result<Pages> {
    assert!(size > 0, "allocation size must be non-zero");

    if huge {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "huge pages require mmap",
        ));
    }

    let size = size
        .checked_add(PAGE_ALIGN - 1)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "size overflow"))?
        & !(PAGE_ALIGN - 1);

    let layout = Layout::from_size_align(size, PAGE_ALIGN)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // Safety: layout has non-zero size.
    let ptr = unsafe { alloc_zeroed(layout) };
    let ptr = NonNull::new(ptr)
        .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "allocation failed"))?;

    Ok(Pages { ptr, size })
}

pub(super) fn mlock_impl(_ptr: NonNull<u8>, _size: usize) -> io::Result<()> {
    #[cfg(miri)]
    {
        Ok(())
    }

    #[cfg(not(miri))]
    {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mlock is only available on unix",
        ))
    }
}

/// # Safety
/// ptr and size must be from a previous `alloc_pages` call.
pub(super) unsafe fn drop_pages(ptr: NonNull<u8>, size: usize) {
    // Safety: the same layout was validated at allocation time.
    unsafe {
        let layout = Layout::from_size_align_unchecked(size, PAGE_ALIGN);
        dealloc(ptr.as_ptr(), layout);
    }
}
