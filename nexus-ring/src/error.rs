//! Construction errors.
//!
//! Building a ring is the only place a hard failure can surface. Once a ring
//! exists, every operation reports through its own small error type
//! ([`crate::Rejected`], [`crate::cancel::Cancelled`], the [`crate::spsc`]
//! errors) and leaves the ring usable, except where noted for cancellation.

use std::io;

/// Error while building a ring.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// Requested capacity was zero.
    #[error("capacity cannot be zero")]
    ZeroCapacity,

    /// The rounded capacity, or the storage it needs, does not fit in `usize`.
    #[error("capacity {requested} overflows the addressable size")]
    CapacityOverflow {
        /// The capacity that was asked for.
        requested: usize,
    },

    /// The backing pages could not be allocated.
    #[error("failed to allocate {bytes} bytes of ring storage")]
    AllocationFailed {
        /// Size of the failed allocation.
        bytes: usize,
        /// Underlying OS or allocator error.
        #[source]
        source: io::Error,
    },

    /// Huge pages were requested but could not be mapped.
    #[error("huge pages unavailable")]
    HugePagesUnavailable(#[source] io::Error),

    /// `mlock` failed, most likely because `RLIMIT_MEMLOCK` is too low.
    #[error("mlock failed")]
    MlockFailed(#[source] io::Error),
}

impl RingError {
    /// Returns `true` for [`RingError::ZeroCapacity`] and
    /// [`RingError::CapacityOverflow`], the errors caused by the request itself
    /// rather than the environment.
    #[must_use]
    pub const fn is_invalid_capacity(&self) -> bool {
        matches!(self, Self::ZeroCapacity | Self::CapacityOverflow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(RingError::ZeroCapacity.to_string(), "capacity cannot be zero");
        assert_eq!(
            RingError::CapacityOverflow { requested: 7 }.to_string(),
            "capacity 7 overflows the addressable size"
        );
        let err = RingError::AllocationFailed {
            bytes: 4096,
            source: io::Error::from(io::ErrorKind::OutOfMemory),
        };
        assert_eq!(err.to_string(), "failed to allocate 4096 bytes of ring storage");
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error;

        let err = RingError::MlockFailed(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.source().is_some());
        assert!(RingError::ZeroCapacity.source().is_none());
    }

    #[test]
    fn invalid_capacity_classification() {
        assert!(RingError::ZeroCapacity.is_invalid_capacity());
        assert!(RingError::CapacityOverflow { requested: 1 }.is_invalid_capacity());
        assert!(
            !RingError::MlockFailed(io::Error::from(io::ErrorKind::Other)).is_invalid_capacity()
        );
    }
}
