//! Small integer helpers used for sizing and framing.

/// Smallest power of two that is `>= max(n, min)`.
///
/// Returns `None` if the result does not fit in `usize`. `min` is expected to
/// be a power of two itself (every caller passes [`crate::MIN_CAPACITY`]).
///
/// ```
/// use nexus_ring::util::pow2_at_least;
///
/// assert_eq!(pow2_at_least(0, 64), Some(64));
/// assert_eq!(pow2_at_least(65, 64), Some(128));
/// assert_eq!(pow2_at_least(4096, 64), Some(4096));
/// ```
#[inline]
#[must_use]
pub const fn pow2_at_least(n: usize, min: usize) -> Option<usize> {
    let n = if n > min { n } else { min };
    n.checked_next_power_of_two()
}

/// Rounds `n` up to the next multiple of `to`, which must be a power of two.
///
/// ```
/// use nexus_ring::util::round_up_to;
///
/// assert_eq!(round_up_to(0, 64), 0);
/// assert_eq!(round_up_to(14, 64), 64);
/// assert_eq!(round_up_to(64, 64), 64);
/// assert_eq!(round_up_to(65, 64), 128);
/// ```
#[inline]
#[must_use]
pub const fn round_up_to(n: usize, to: usize) -> usize {
    debug_assert!(to.is_power_of_two());
    (n + to - 1) & !(to - 1)
}
