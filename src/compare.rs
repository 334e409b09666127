//! Pluggable key comparison for the ordered containers
//!
//! Every tree-based container in this crate makes its ordering decisions
//! through a single [`Comparator`] value supplied at construction. The
//! default is [`NaturalOrder`], which delegates to the key's [`Ord`]
//! implementation; callers that need a different ordering inject a
//! [`FnComparator`] or their own `Comparator` implementation, and
//! [`ReverseOrder`] inverts any of them.

use std::cmp::Ordering;

/// A total order over values of type `T`.
///
/// Implementations must be a strict weak ordering and must stay consistent
/// for the lifetime of any container using them: the containers cache
/// nothing about the comparator, but their internal structure encodes every
/// comparison ever made.
///
/// # Examples
///
/// ```
/// use ordena::compare::{Comparator, NaturalOrder};
/// use std::cmp::Ordering;
///
/// let cmp = NaturalOrder;
/// assert_eq!(cmp.compare(&1, &2), Ordering::Less);
/// assert_eq!(cmp.compare(&"b", &"b"), Ordering::Equal);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Compare two values, returning their relative order.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The natural ordering of `T` via its [`Ord`] implementation.
///
/// This is the default comparator for every container in the crate, making
/// "keys must be orderable" a compile-time requirement rather than a runtime
/// check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// A comparator wrapping an arbitrary ordering function.
///
/// # Examples
///
/// ```
/// use ordena::compare::{Comparator, FnComparator};
/// use std::cmp::Ordering;
///
/// // Order strings by length, ties broken lexicographically.
/// let by_len = FnComparator::new(|a: &&str, b: &&str| {
///     a.len().cmp(&b.len()).then_with(|| a.cmp(b))
/// });
/// assert_eq!(by_len.compare(&"xy", &"abc"), Ordering::Less);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnComparator<F> {
    f: F,
}

impl<F> FnComparator<F> {
    /// Wrap an ordering function as a comparator.
    #[inline]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T: ?Sized, F> Comparator<T> for FnComparator<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.f)(a, b)
    }
}

/// A comparator that reverses another comparator's order.
///
/// # Examples
///
/// ```
/// use ordena::compare::{Comparator, NaturalOrder, ReverseOrder};
/// use std::cmp::Ordering;
///
/// let desc = ReverseOrder::new(NaturalOrder);
/// assert_eq!(desc.compare(&1, &2), Ordering::Greater);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReverseOrder<C> {
    inner: C,
}

impl<C> ReverseOrder<C> {
    /// Wrap a comparator, inverting its order.
    #[inline]
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Return the wrapped comparator.
    #[inline]
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for ReverseOrder<C> {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.inner.compare(a, b).reverse()
    }
}
