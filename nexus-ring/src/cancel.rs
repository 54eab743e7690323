//! Cancellation predicates for spin-waits.
//!
//! A ring polls its predicate once per spin iteration. Returning `true` aborts
//! the waiting call. The predicate is fixed per ring at construction.
//!
//! ```
//! use nexus_ring::{CancelFlag, mpmc::SlotQueue};
//!
//! let stop = CancelFlag::new();
//! let queue = SlotQueue::<u32>::builder()
//!     .capacity(64)
//!     .cancel(stop.clone())
//!     .build()
//!     .unwrap();
//!
//! stop.cancel();
//! // Nothing was produced, so this would spin forever without the flag.
//! assert!(queue.consume().is_err());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A check polled from spin loops.
pub trait Cancel {
    /// Returns `true` once waiting calls should give up.
    fn is_cancelled(&self) -> bool;
}

impl<F> Cancel for F
where
    F: Fn() -> bool,
{
    #[inline]
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Never cancels. Blocking calls wait indefinitely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverCancel;

impl Cancel for NeverCancel {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A shared, one-way cancel switch.
///
/// Clones observe the same flag. Once [`CancelFlag::cancel`] is called every
/// ring holding a clone stops waiting.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` if [`CancelFlag::cancel`] has been called.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Cancel for CancelFlag {
    #[inline]
    fn is_cancelled(&self) -> bool {
        // The flag guards no data.
        self.0.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for CancelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelFlag").field(&self.is_set()).finish()
    }
}

/// A blocking call gave up because the ring's [`Cancel`] predicate fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wait cancelled")]
pub struct Cancelled;
