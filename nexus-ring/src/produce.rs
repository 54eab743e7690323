//! The insertion protocol shared by every element ring.
//!
//! A ring implements a single reservation routine, [`Produce::reserve`], which
//! receives the value as a [`Staged`] token. The routine must either
//! [`take`](Staged::take) the value into the ring and return `true`, or drop the
//! token untouched and return `false`.
//!
//! The provided methods route every argument shape through that routine:
//!
//! - [`Produce::produce`] moves the caller's value in directly. Nothing is
//!   built off to the side, and on failure the value comes back in
//!   [`Rejected`].
//! - [`Produce::produce_cloned`], [`Produce::emplace_with`] and
//!   [`Produce::emplace_from`] first build the value into an [`Auxiliary`].
//!   The auxiliary owns its heap cell for the whole call and releases it on
//!   return, whether the ring took the value or not. An untaken value is
//!   dropped in that same place.

use std::fmt;

/// A value handed to a reservation routine by address.
///
/// Taking it moves the value out of its owner. Dropping the token without
/// taking leaves the owner's value exactly as it was.
pub struct Staged<'a, T> {
    value: &'a mut Option<T>,
}

impl<'a, T> Staged<'a, T> {
    #[inline]
    fn new(value: &'a mut Option<T>) -> Self {
        debug_assert!(value.is_some());
        Self { value }
    }

    /// Moves the value out. Call only once the destination is reserved.
    #[inline]
    pub fn take(self) -> T {
        match self.value.take() {
            Some(value) => value,
            None => unreachable!("staged value is present until taken"),
        }
    }

    /// Borrows the staged value.
    #[inline]
    pub fn get(&self) -> &T {
        match self.value.as_ref() {
            Some(value) => value,
            None => unreachable!("staged value is present until taken"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Staged<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Staged").field(self.get()).finish()
    }
}

/// An owned temporary built off to the side of the ring.
///
/// The value lives in its own heap cell. Whatever happens to the value, the
/// cell is released exactly once, when the auxiliary goes out of scope.
pub struct Auxiliary<T> {
    cell: Box<Option<T>>,
}

impl<T> Auxiliary<T> {
    /// Builds `value` into a fresh cell.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: Box::new(Some(value)),
        }
    }

    /// Stages the value for a reservation routine.
    ///
    /// # Panics
    ///
    /// Panics if the value was already taken by an earlier staging.
    pub fn stage(&mut self) -> Staged<'_, T> {
        assert!(self.cell.is_some(), "auxiliary value already committed");
        Staged::new(&mut self.cell)
    }

    /// Returns `true` once a reservation routine has taken the value.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.cell.is_none()
    }
}

impl<T: fmt::Debug> fmt::Debug for Auxiliary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auxiliary")
            .field("value", &self.cell)
            .finish()
    }
}

/// A ring refused a value.
///
/// For the move path ([`Produce::produce`]) it carries the caller's value
/// back. For the auxiliary paths the value has already been dropped and the
/// payload is `()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected<T = ()>(pub T);

impl<T> Rejected<T> {
    /// Returns the value that was not accepted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring rejected the value")
    }
}

impl<T: fmt::Debug> std::error::Error for Rejected<T> {}

/// Producer side of an element ring.
pub trait Produce<T> {
    /// Reservation routine. Must either take `staged` and return `true`, or
    /// return `false` without taking it.
    fn reserve(&self, staged: Staged<'_, T>) -> bool;

    /// Moves `value` into the ring.
    ///
    /// # Errors
    ///
    /// Returns the value in [`Rejected`] if the ring refused it.
    #[inline]
    fn produce(&self, value: T) -> Result<(), Rejected<T>> {
        let mut value = Some(value);
        let accepted = self.reserve(Staged::new(&mut value));

        match value {
            None => {
                debug_assert!(accepted, "reserve took the value but reported failure");
                Ok(())
            }
            Some(value) => {
                debug_assert!(!accepted, "reserve reported success without taking the value");
                Err(Rejected(value))
            }
        }
    }

    /// Clones `value` into an auxiliary and produces the clone.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] if the ring refused the clone. The clone is
    /// dropped.
    #[inline]
    fn produce_cloned(&self, value: &T) -> Result<(), Rejected>
    where
        T: Clone,
    {
        self.emplace_with(|| value.clone())
    }

    /// Constructs a value with `make` into an auxiliary and produces it.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] if the ring refused the value. The value is
    /// dropped.
    fn emplace_with<F>(&self, make: F) -> Result<(), Rejected>
    where
        F: FnOnce() -> T,
    {
        let mut aux = Auxiliary::new(make());
        let accepted = self.reserve(aux.stage());
        debug_assert_eq!(accepted, aux.is_committed());

        if accepted { Ok(()) } else { Err(Rejected(())) }
    }

    /// Constructs a value from `args` into an auxiliary and produces it.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] if the ring refused the value. The value is
    /// dropped.
    #[inline]
    fn emplace_from<A>(&self, args: A) -> Result<(), Rejected>
    where
        T: From<A>,
    {
        self.emplace_with(|| T::from(args))
    }
}
