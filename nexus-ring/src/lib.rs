//! # nexus-ring
//!
//! Bounded lock-free rings for latency-sensitive pipelines.
//!
//! ## Queues
//!
//! - [`mpmc::SlotQueue`]: fixed-element multi-producer multi-consumer ring.
//!   Producers and consumers take tickets from two counters and rendezvous on
//!   per-slot generation states.
//! - [`spsc::channel`]: variable-length record ring for exactly one producer
//!   and one consumer. Records are length-prefixed and cache-line framed.
//!
//! Both queues size their storage once, at construction, to a power of two no
//! smaller than [`MIN_CAPACITY`], and never grow.
//!
//! ## Insertion
//!
//! Every slot-ring producer goes through [`Produce`]. Moving a `T` in hands the
//! caller's value straight to the ring; clones and constructor arguments are
//! built into an [`produce::Auxiliary`] first, whose storage is released
//! whether or not the ring accepted the value.
//!
//! ## Example
//!
//! ```
//! use nexus_ring::{Produce, mpmc::SlotQueue, spsc};
//!
//! let queue = SlotQueue::<u64>::new(128).unwrap();
//! queue.produce(7).unwrap();
//! assert_eq!(queue.consume().unwrap(), 7);
//!
//! let (tx, rx) = spsc::channel(256).unwrap();
//! tx.try_produce(b"hello").unwrap();
//!
//! let mut buf = [0u8; 64];
//! let n = rx.try_consume(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"hello");
//! ```
//!
//! ## Cancellation
//!
//! Blocking calls spin. Each ring carries a [`Cancel`] predicate, polled once
//! per spin iteration; when it fires the call returns an error. On the slot
//! ring this abandons a ticket and permanently wedges one slot, so the
//! predicate is meant for shutdown, not backpressure. See [`mpmc`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod sys;
mod trace;

pub mod cancel;
pub mod error;
pub mod mpmc;
pub mod produce;
pub mod spsc;
mod storage;
pub mod util;

pub use cancel::{Cancel, CancelFlag, NeverCancel};
pub use error::RingError;
pub use produce::{Produce, Rejected};
pub use trace::init_tracing;

/// Assumed cache-line size in bytes. Slots, cursors and byte-ring frames are
/// aligned to this.
pub const CACHE_LINE: usize = 64;

/// Smallest capacity either ring will be built with (elements for the slot
/// ring, bytes for the byte ring).
pub const MIN_CAPACITY: usize = CACHE_LINE;
