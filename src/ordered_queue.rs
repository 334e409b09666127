//! FIFO queue over a growable circular buffer
//!
//! [`OrderedQueue`] preserves arrival order (that is all "ordered" means
//! here; there is no comparator involved). Storage is a ring of
//! `MaybeUninit` slots indexed by a head offset and a length, so enqueue
//! and dequeue are O(1) with no per-element allocation; the buffer is
//! recopied contiguous only when it grows or is trimmed.

use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;

use crate::error::{OrdenaError, Result};

/// Reinterpret a fully initialized `MaybeUninit` slice as a value slice.
///
/// # Safety
///
/// Every element of `slice` must be initialized.
unsafe fn slice_assume_init<T>(slice: &[MaybeUninit<T>]) -> &[T] {
    // SAFETY: caller guarantees initialization, and MaybeUninit<T> has the
    // same layout as T.
    unsafe { &*(slice as *const [MaybeUninit<T>] as *const [T]) }
}

/// A first-in first-out queue backed by a circular buffer.
///
/// The buffer grows on demand (doubling, with a minimum growth of four
/// slots) and can be shrunk back with
/// [`trim_excess`](OrderedQueue::trim_excess). An empty `new()` queue holds
/// no allocation at all until the first enqueue.
///
/// # Examples
///
/// ```
/// use ordena::OrderedQueue;
///
/// let mut queue = OrderedQueue::new();
/// queue.enqueue(1);
/// queue.enqueue(2);
/// queue.enqueue(3);
///
/// assert_eq!(queue.dequeue().unwrap(), 1);
/// assert_eq!(queue.peek().unwrap(), &2);
/// assert_eq!(queue.len(), 2);
/// ```
pub struct OrderedQueue<T> {
    buf: Box<[MaybeUninit<T>]>,
    head: usize,
    len: usize,
    version: u64,
}

impl<T> OrderedQueue<T> {
    /// Create an empty queue with no backing allocation.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty queue with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Self::alloc_buf(capacity),
            head: 0,
            len: 0,
            version: 0,
        }
    }

    fn alloc_buf(capacity: usize) -> Box<[MaybeUninit<T>]> {
        std::iter::repeat_with(MaybeUninit::uninit)
            .take(capacity)
            .collect()
    }

    /// Number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the buffer can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Physical slot of the element at logical offset `i` from the head.
    /// Callers must ensure the buffer is non-empty.
    #[inline]
    fn physical(&self, i: usize) -> usize {
        (self.head + i) % self.buf.len()
    }

    /// Move the live elements into a fresh buffer of exactly `new_cap`
    /// slots, head reset to zero. `new_cap` must be at least `len`.
    fn reallocate(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len);
        let mut new_buf = Self::alloc_buf(new_cap);
        for i in 0..self.len {
            let src = self.physical(i);
            // SAFETY: the first `len` logical slots are initialized and each
            // is moved out exactly once; the old buffer's slots are never
            // read again because MaybeUninit has no drop.
            unsafe {
                new_buf[i].write(self.buf[src].as_ptr().read());
            }
        }
        self.buf = new_buf;
        self.head = 0;
        self.version = self.version.wrapping_add(1);
    }

    fn grow(&mut self, needed: usize) {
        let cap = self.buf.len();
        let new_cap = needed.max(cap * 2).max(cap + 4);
        log::trace!("queue capacity grew from {} to {}", cap, new_cap);
        self.reallocate(new_cap);
    }

    /// Grow the buffer so that at least `min` elements fit without another
    /// reallocation. Never shrinks.
    pub fn ensure_capacity(&mut self, min: usize) {
        if min > self.buf.len() {
            self.grow(min);
        }
    }

    /// Shrink the buffer to exactly `len` slots, but only when the queue
    /// uses less than 90 percent of its capacity.
    pub fn trim_excess(&mut self) {
        let cap = self.buf.len();
        if self.len < cap * 9 / 10 {
            log::trace!("queue capacity trimmed from {} to {}", cap, self.len);
            self.reallocate(self.len);
        }
    }

    /// Append an element at the back. Amortized O(1).
    pub fn enqueue(&mut self, item: T) {
        if self.len == self.buf.len() {
            self.grow(self.len + 1);
        }
        let idx = self.physical(self.len);
        self.buf[idx].write(item);
        self.len += 1;
        self.version = self.version.wrapping_add(1);
    }

    /// Remove and return the front element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] when the queue is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedQueue;
    ///
    /// let mut queue: OrderedQueue<i32> = OrderedQueue::new();
    /// assert!(queue.dequeue().is_err());
    /// queue.enqueue(7);
    /// assert_eq!(queue.dequeue().unwrap(), 7);
    /// ```
    pub fn dequeue(&mut self) -> Result<T> {
        self.try_dequeue()
            .ok_or_else(|| OrdenaError::empty("dequeue on empty queue"))
    }

    /// Remove and return the front element, or `None` when empty.
    pub fn try_dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the head slot is initialized while len > 0; advancing the
        // head retires the slot so the value is moved out exactly once.
        let value = unsafe { self.buf[self.head].as_ptr().read() };
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        self.version = self.version.wrapping_add(1);
        Some(value)
    }

    /// Borrow the front element without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] when the queue is empty.
    pub fn peek(&self) -> Result<&T> {
        self.try_peek()
            .ok_or_else(|| OrdenaError::empty("peek on empty queue"))
    }

    /// Borrow the front element, or `None` when empty.
    pub fn try_peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the head slot is initialized while len > 0.
        Some(unsafe { self.buf[self.head].assume_init_ref() })
    }

    /// Drop every queued element. Capacity is kept.
    pub fn clear(&mut self) {
        for i in 0..self.len {
            let idx = self.physical(i);
            // SAFETY: the first `len` logical slots are initialized; each is
            // dropped exactly once before len is reset.
            unsafe { ptr::drop_in_place(self.buf[idx].as_mut_ptr()) };
        }
        self.head = 0;
        self.len = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// The queued elements as up to two contiguous segments, front first.
    ///
    /// The second segment is empty unless the ring is currently wrapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedQueue;
    ///
    /// let mut queue = OrderedQueue::with_capacity(4);
    /// for i in 0..4 {
    ///     queue.enqueue(i);
    /// }
    /// queue.try_dequeue();
    /// queue.try_dequeue();
    /// queue.enqueue(4);
    ///
    /// let (front, back) = queue.as_slices();
    /// assert_eq!(front, &[2, 3]);
    /// assert_eq!(back, &[4]);
    /// ```
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.len == 0 {
            return (&[], &[]);
        }
        let cap = self.buf.len();
        if self.head + self.len <= cap {
            let seg = &self.buf[self.head..self.head + self.len];
            // SAFETY: exactly the `len` logical slots, all initialized.
            (unsafe { slice_assume_init(seg) }, &[])
        } else {
            let first = &self.buf[self.head..];
            let second = &self.buf[..self.head + self.len - cap];
            // SAFETY: the two segments cover exactly the `len` logical
            // slots, all initialized.
            unsafe { (slice_assume_init(first), slice_assume_init(second)) }
        }
    }

    /// Returns `true` if an equal element is queued.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let (front, back) = self.as_slices();
        front.contains(item) || back.contains(item)
    }

    /// Copy the queued elements into a `Vec`, front first.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let (front, back) = self.as_slices();
        let mut out = Vec::with_capacity(self.len);
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }

    /// Borrowing iterator from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        let (front, back) = self.as_slices();
        Iter {
            inner: front.iter().chain(back.iter()),
        }
    }

    /// Detached version-stamped cursor from front to back.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedQueue;
    ///
    /// let mut queue = OrderedQueue::new();
    /// queue.enqueue(1);
    ///
    /// let mut cursor = queue.cursor();
    /// queue.enqueue(2);
    /// assert!(cursor.next(&queue).is_err());
    /// ```
    pub fn cursor(&self) -> QueueCursor {
        QueueCursor {
            next: 0,
            version: self.version,
        }
    }
}

impl<T> Default for OrderedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for OrderedQueue<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for OrderedQueue<T> {
    fn clone(&self) -> Self {
        let mut queue = Self::with_capacity(self.len);
        for item in self.iter() {
            queue.enqueue(item.clone());
        }
        queue
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for OrderedQueue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for OrderedQueue<T> {}

impl<T> FromIterator<T> for OrderedQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut queue = Self::with_capacity(iter.size_hint().0);
        for item in iter {
            queue.enqueue(item);
        }
        queue
    }
}

impl<T> Extend<T> for OrderedQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.enqueue(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a OrderedQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Borrowing iterator over an [`OrderedQueue`], front to back.
pub struct Iter<'a, T> {
    inner: std::iter::Chain<std::slice::Iter<'a, T>, std::slice::Iter<'a, T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Detached, version-stamped cursor over an [`OrderedQueue`].
///
/// Holds no borrow of the queue; every advance revalidates the version
/// captured at creation and fails once the queue has been mutated.
#[derive(Debug, Clone)]
pub struct QueueCursor {
    next: usize,
    version: u64,
}

impl QueueCursor {
    /// Advance to the next element, front to back.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ConcurrentModification`] if the queue was
    /// mutated (enqueue, dequeue, clear, or a capacity change) after this
    /// cursor was created.
    pub fn next<'a, T>(&mut self, queue: &'a OrderedQueue<T>) -> Result<Option<&'a T>> {
        if self.version != queue.version {
            return Err(OrdenaError::concurrent_modification(
                "queue modified during cursor enumeration",
            ));
        }
        if self.next >= queue.len {
            return Ok(None);
        }
        let idx = queue.physical(self.next);
        self.next += 1;
        // SAFETY: logical offsets below len index initialized slots.
        Ok(Some(unsafe { queue.buf[idx].assume_init_ref() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_new_and_capacity() {
        let queue: OrderedQueue<i32> = OrderedQueue::new();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.capacity(), 0);
        assert!(queue.is_empty());

        let queue: OrderedQueue<i32> = OrderedQueue::with_capacity(10);
        assert_eq!(queue.capacity(), 10);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = OrderedQueue::new();
        for i in 0..10 {
            queue.enqueue(i);
        }
        for i in 0..10 {
            assert_eq!(queue.dequeue().unwrap(), i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_errors() {
        let mut queue: OrderedQueue<i32> = OrderedQueue::new();
        let err = queue.dequeue().unwrap_err();
        assert!(matches!(err, OrdenaError::Empty { .. }));
        assert_eq!(err.category(), "state");
        assert!(queue.peek().is_err());
        assert_eq!(queue.try_dequeue(), None);
        assert_eq!(queue.try_peek(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut queue = OrderedQueue::new();
        queue.enqueue(5);
        assert_eq!(queue.peek().unwrap(), &5);
        assert_eq!(queue.try_peek(), Some(&5));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_wraparound() {
        let mut queue = OrderedQueue::with_capacity(4);
        for i in 0..4 {
            queue.enqueue(i);
        }
        assert_eq!(queue.try_dequeue(), Some(0));
        assert_eq!(queue.try_dequeue(), Some(1));
        queue.enqueue(4);
        queue.enqueue(5);
        assert_eq!(queue.capacity(), 4);

        let (front, back) = queue.as_slices();
        assert_eq!(front, &[2, 3]);
        assert_eq!(back, &[4, 5]);
        assert!(queue.contains(&4));
        assert!(!queue.contains(&0));
        assert_eq!(queue.to_vec(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_growth_preserves_order() {
        let mut queue = OrderedQueue::with_capacity(4);
        for i in 0..3 {
            queue.enqueue(i);
        }
        queue.try_dequeue();
        queue.try_dequeue();
        // Head is now mid-buffer; push through several growth steps.
        for i in 3..50 {
            queue.enqueue(i);
        }
        assert!(queue.capacity() >= 48);
        for i in 2..50 {
            assert_eq!(queue.dequeue().unwrap(), i);
        }
    }

    #[test]
    fn test_growth_minimum_step() {
        let mut queue: OrderedQueue<i32> = OrderedQueue::new();
        queue.enqueue(1);
        // From an unallocated queue the first growth lands on the minimum.
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn test_ensure_capacity() {
        let mut queue: OrderedQueue<i32> = OrderedQueue::new();
        queue.ensure_capacity(100);
        assert!(queue.capacity() >= 100);
        let cap = queue.capacity();
        queue.ensure_capacity(10);
        assert_eq!(queue.capacity(), cap);
    }

    #[test]
    fn test_trim_excess() {
        let mut queue = OrderedQueue::with_capacity(100);
        for i in 0..10 {
            queue.enqueue(i);
        }
        queue.trim_excess();
        assert_eq!(queue.capacity(), 10);
        assert_eq!(queue.to_vec(), (0..10).collect::<Vec<_>>());

        // At or above 90 percent occupancy nothing happens.
        let mut full = OrderedQueue::with_capacity(10);
        for i in 0..9 {
            full.enqueue(i);
        }
        full.trim_excess();
        assert_eq!(full.capacity(), 10);
    }

    #[test]
    fn test_clear_keeps_capacity_and_drops() {
        let marker = Rc::new(());
        let mut queue = OrderedQueue::new();
        for _ in 0..5 {
            queue.enqueue(Rc::clone(&marker));
        }
        assert_eq!(Rc::strong_count(&marker), 6);
        let cap = queue.capacity();
        queue.clear();
        assert_eq!(Rc::strong_count(&marker), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), cap);

        queue.enqueue(Rc::clone(&marker));
        drop(queue);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn test_iter() {
        let queue: OrderedQueue<i32> = (0..6).collect();
        let items: Vec<i32> = queue.iter().copied().collect();
        assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(queue.iter().len(), 6);
        let for_loop: Vec<i32> = (&queue).into_iter().copied().collect();
        assert_eq!(for_loop, items);
    }

    #[test]
    fn test_cursor_walks_and_fails_fast() {
        let mut queue: OrderedQueue<i32> = (0..3).collect();
        let mut cursor = queue.cursor();
        assert_eq!(cursor.next(&queue).unwrap(), Some(&0));
        assert_eq!(cursor.next(&queue).unwrap(), Some(&1));
        assert_eq!(cursor.next(&queue).unwrap(), Some(&2));
        assert_eq!(cursor.next(&queue).unwrap(), None);
        assert_eq!(cursor.next(&queue).unwrap(), None);

        let mut cursor = queue.cursor();
        queue.enqueue(3);
        let err = cursor.next(&queue).unwrap_err();
        assert_eq!(err.category(), "concurrency");
        assert!(!err.is_recoverable());

        let mut cursor = queue.cursor();
        queue.try_dequeue();
        assert!(cursor.next(&queue).is_err());
    }

    #[test]
    fn test_clone_and_eq() {
        let mut queue = OrderedQueue::with_capacity(4);
        for i in 0..4 {
            queue.enqueue(i);
        }
        queue.try_dequeue();
        queue.enqueue(4);

        let copy = queue.clone();
        assert_eq!(queue, copy);
        assert_eq!(copy.to_vec(), vec![1, 2, 3, 4]);

        let mut other = queue.clone();
        other.try_dequeue();
        assert_ne!(queue, other);
    }

    #[test]
    fn test_extend_and_debug() {
        let mut queue = OrderedQueue::new();
        queue.extend(vec![1, 2]);
        queue.extend(vec![3]);
        assert_eq!(queue.to_vec(), vec![1, 2, 3]);
        assert_eq!(format!("{:?}", queue), "[1, 2, 3]");
    }
}
