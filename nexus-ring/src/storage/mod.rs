//! Aligned backing storage shared by both rings.
//!
//! - [`ByteStorage`]: one page-aligned power-of-two byte block.
//! - [`SlotStorage`]: a power-of-two array of cache-line-aligned slots, each a
//!   state counter plus room for one element.

mod bytes;
mod slots;

pub(crate) use bytes::ByteStorage;
pub(crate) use slots::{Slot, SlotStorage};

use crate::error::RingError;
use crate::sys::Pages;
use crate::trace;
use crate::util::pow2_at_least;
use crate::MIN_CAPACITY;

/// How ring memory is obtained. Filled in by the builders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Placement {
    pub huge_pages: bool,
    pub mlock: bool,
}

impl Placement {
    /// Maps `bytes` of zeroed memory according to this placement.
    pub(crate) fn alloc(self, bytes: usize) -> Result<Pages, RingError> {
        let pages = if self.huge_pages {
            Pages::alloc_huge(bytes).map_err(|e| {
                trace::warn!(bytes, error = %e, "huge page allocation failed");
                RingError::HugePagesUnavailable(e)
            })?
        } else {
            Pages::alloc(bytes).map_err(|source| {
                trace::warn!(bytes, error = %source, "ring allocation failed");
                RingError::AllocationFailed { bytes, source }
            })?
        };

        if self.mlock {
            pages.mlock().map_err(|e| {
                trace::warn!(bytes = pages.len(), error = %e, "mlock failed");
                RingError::MlockFailed(e)
            })?;
        }

        Ok(pages)
    }
}

/// Rounds a requested capacity to the ring's actual capacity.
pub(crate) fn capacity_for(requested: usize) -> Result<usize, RingError> {
    if requested == 0 {
        return Err(RingError::ZeroCapacity);
    }
    pow2_at_least(requested, MIN_CAPACITY).ok_or(RingError::CapacityOverflow { requested })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounding() {
        assert_eq!(capacity_for(1).unwrap(), MIN_CAPACITY);
        assert_eq!(capacity_for(64).unwrap(), 64);
        assert_eq!(capacity_for(65).unwrap(), 128);
        assert_eq!(capacity_for(146).unwrap(), 256);
        assert_eq!(capacity_for(4011).unwrap(), 4096);
    }

    #[test]
    fn capacity_rejects_zero_and_overflow() {
        assert!(matches!(capacity_for(0), Err(RingError::ZeroCapacity)));
        assert!(matches!(
            capacity_for(usize::MAX),
            Err(RingError::CapacityOverflow { requested: usize::MAX })
        ));
    }

    #[test]
    fn default_placement_allocates() {
        let pages = Placement::default().alloc(100).unwrap();
        assert!(pages.len() >= 100);
    }
}
