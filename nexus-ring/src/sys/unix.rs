//! Unix implementation using anonymous mmap.

use std::io;
use std::ptr::NonNull;
use std::sync::OnceLock;

use super::{PAGE_ALIGN, Pages};

fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| {
        // Safety: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        usize::try_from(size)
            .ok()
            .filter(|&s| s >= PAGE_ALIGN)
            .unwrap_or(PAGE_ALIGN)
    })
}

#[cfg(target_os = "linux")]
fn huge_page_size() -> usize {
    static HUGE_PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *HUGE_PAGE_SIZE.get_or_init(|| read_huge_page_size().unwrap_or(2 * 1024 * 1024))
}

#[cfg(target_os = "linux")]
fn read_huge_page_size() -> Option<usize> {
    let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
    let line = contents.lines().find(|l| l.starts_with("Hugepagesize:"))?;
    let size_kb: usize = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(size_kb * 1024)
}

fn round_to(size: usize, granule: usize) -> io::Result<usize> {
    size.checked_add(granule - 1)
        .map(|s| s & !(granule - 1))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "size overflow"))
}

pub(super) fn alloc_pages(size: usize, huge: bool) -> io::Result<Pages> {
    assert!(size > 0, "allocation size must be non-zero");

    let page_size = page_size();

    #[cfg(target_os = "linux")]
    let (size, flags) = if huge {
        (
            round_to(size, huge_page_size())?,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_HUGETLB,
        )
    } else {
        (
            round_to(size, page_size)?,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        )
    };

    #[cfg(not(target_os = "linux"))]
    let (size, flags) = {
        if huge {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "huge pages are only supported on linux",
            ));
        }
        (
            round_to(size, page_size)?,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        )
    };

    // Safety: anonymous private mapping, no file descriptor involved.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            flags,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    let ptr = NonNull::new(ptr.cast::<u8>())
        .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "mmap returned null"))?;

    #[cfg(target_os = "linux")]
    if !huge && size >= 2 * 1024 * 1024 {
        // Safety: the range was just mapped. THP is advisory; failure is ignored.
        unsafe {
            libc::madvise(ptr.as_ptr().cast::<libc::c_void>(), size, libc::MADV_HUGEPAGE);
        }
    }

    // Prefault so the first produce does not take a page fault.
    for offset in (0..size).step_by(page_size) {
        // Safety: offset < size, inside the mapping.
        unsafe {
            std::ptr::write_volatile(ptr.as_ptr().add(offset), 0);
        }
    }

    Ok(Pages { ptr, size })
}

pub(super) fn mlock_impl(ptr: NonNull<u8>, size: usize) -> io::Result<()> {
    // Safety: the range belongs to a live mapping.
    let result = unsafe { libc::mlock(ptr.as_ptr().cast::<libc::c_void>(), size) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// # Safety
/// ptr and size must be from a previous `alloc_pages` call.
pub(super) unsafe fn drop_pages(ptr: NonNull<u8>, size: usize) {
    // Safety: caller guarantees this is our mapping.
    unsafe {
        libc::munmap(ptr.as_ptr().cast::<libc::c_void>(), size);
    }
}
