//! Double-ended queue over an index-linked arena
//!
//! [`Deque`] stores its nodes in a dense `Vec` and links them with `u32`
//! indices instead of pointers, so the whole structure is a single
//! allocation that grows amortized-O(1) and moves freely. Removing a node
//! swap-removes its slot and repatches the two neighbors of whichever node
//! got moved, keeping the arena dense without a free list.
//!
//! [`SynchronizedDeque`] wraps a `Deque` in a [`parking_lot::Mutex`] for
//! callers that need to share one across threads.

use std::fmt;

use parking_lot::Mutex;

use crate::error::{OrdenaError, Result};

const NIL: u32 = u32::MAX;

#[derive(Clone)]
struct Node<T> {
    value: T,
    prev: u32,
    next: u32,
}

/// A double-ended queue with O(1) push and pop at both ends.
///
/// # Examples
///
/// ```
/// use ordena::Deque;
///
/// let mut deque = Deque::new();
/// deque.push_back(2);
/// deque.push_back(3);
/// deque.push_front(1);
///
/// assert_eq!(deque.pop_front(), Ok(1));
/// assert_eq!(deque.pop_back(), Ok(3));
/// assert_eq!(deque.len(), 1);
/// ```
pub struct Deque<T> {
    nodes: Vec<Node<T>>,
    front: u32,
    back: u32,
    version: u64,
}

impl<T> Deque<T> {
    /// Create an empty deque. Does not allocate.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            front: NIL,
            back: NIL,
            version: 0,
        }
    }

    /// Create an empty deque with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            front: NIL,
            back: NIL,
            version: 0,
        }
    }

    /// Number of elements in the deque.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the deque contains no elements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a value at the front of the deque.
    pub fn push_front(&mut self, value: T) {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            value,
            prev: NIL,
            next: self.front,
        });
        if self.front == NIL {
            self.back = index;
        } else {
            self.nodes[self.front as usize].prev = index;
        }
        self.front = index;
        self.version = self.version.wrapping_add(1);
    }

    /// Insert a value at the back of the deque.
    pub fn push_back(&mut self, value: T) {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            value,
            prev: self.back,
            next: NIL,
        });
        if self.back == NIL {
            self.front = index;
        } else {
            self.nodes[self.back as usize].next = index;
        }
        self.back = index;
        self.version = self.version.wrapping_add(1);
    }

    /// Remove and return the front element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn pop_front(&mut self) -> Result<T> {
        self.try_pop_front()
            .ok_or_else(|| OrdenaError::empty("pop_front on an empty deque"))
    }

    /// Remove and return the back element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn pop_back(&mut self) -> Result<T> {
        self.try_pop_back()
            .ok_or_else(|| OrdenaError::empty("pop_back on an empty deque"))
    }

    /// Remove and return the front element, or `None` if the deque is
    /// empty.
    pub fn try_pop_front(&mut self) -> Option<T> {
        if self.front == NIL {
            return None;
        }
        let value = self.detach(self.front);
        self.version = self.version.wrapping_add(1);
        Some(value)
    }

    /// Remove and return the back element, or `None` if the deque is
    /// empty.
    pub fn try_pop_back(&mut self) -> Option<T> {
        if self.back == NIL {
            return None;
        }
        let value = self.detach(self.back);
        self.version = self.version.wrapping_add(1);
        Some(value)
    }

    /// Borrow the front element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn peek_front(&self) -> Result<&T> {
        self.try_peek_front()
            .ok_or_else(|| OrdenaError::empty("peek_front on an empty deque"))
    }

    /// Borrow the back element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn peek_back(&self) -> Result<&T> {
        self.try_peek_back()
            .ok_or_else(|| OrdenaError::empty("peek_back on an empty deque"))
    }

    /// Borrow the front element, or `None` if the deque is empty.
    pub fn try_peek_front(&self) -> Option<&T> {
        if self.front == NIL {
            None
        } else {
            Some(&self.nodes[self.front as usize].value)
        }
    }

    /// Borrow the back element, or `None` if the deque is empty.
    pub fn try_peek_back(&self) -> Option<&T> {
        if self.back == NIL {
            None
        } else {
            Some(&self.nodes[self.back as usize].value)
        }
    }

    /// Remove all elements. Keeps the arena's allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.front = NIL;
        self.back = NIL;
        self.version = self.version.wrapping_add(1);
    }

    /// Returns `true` if an equal element is in the deque. O(n).
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }

    /// Copy the elements into a `Vec`, front to back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Iterate front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            deque: self,
            next: self.front,
            remaining: self.len(),
        }
    }

    /// Iterate back to front.
    pub fn iter_rev(&self) -> RevIter<'_, T> {
        RevIter {
            deque: self,
            next: self.back,
            remaining: self.len(),
        }
    }

    /// A detached front-to-back cursor. Unlike [`iter`](Self::iter) it does
    /// not borrow the deque; each advance revalidates against the deque's
    /// version and fails after any structural change.
    pub fn cursor(&self) -> DequeCursor {
        DequeCursor {
            next: self.front,
            version: self.version,
        }
    }

    /// Verify the arena's link structure.
    ///
    /// Walks the chain in both directions and checks that the walks agree
    /// with `len`, with each other, and with the `front`/`back` anchors.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ContractViolation`] describing the first
    /// broken link found.
    pub fn check_invariants(&self) -> Result<()> {
        if self.is_empty() {
            if self.front != NIL || self.back != NIL {
                return Err(OrdenaError::contract_violation(
                    "empty deque has a dangling front or back anchor",
                ));
            }
            return Ok(());
        }
        if self.front == NIL || self.back == NIL {
            return Err(OrdenaError::contract_violation(
                "non-empty deque is missing a front or back anchor",
            ));
        }
        let mut visited = 0usize;
        let mut prev = NIL;
        let mut current = self.front;
        while current != NIL {
            visited += 1;
            if visited > self.nodes.len() {
                return Err(OrdenaError::contract_violation(
                    "forward walk does not terminate",
                ));
            }
            let node = &self.nodes[current as usize];
            if node.prev != prev {
                return Err(OrdenaError::contract_violation(format!(
                    "slot {current} back-links to {} instead of {prev}",
                    node.prev
                )));
            }
            prev = current;
            current = node.next;
        }
        if visited != self.len() {
            return Err(OrdenaError::contract_violation(format!(
                "forward walk visited {visited} of {} nodes",
                self.len()
            )));
        }
        if prev != self.back {
            return Err(OrdenaError::contract_violation(format!(
                "forward walk ends at slot {prev}, back anchor is {}",
                self.back
            )));
        }
        Ok(())
    }

    /// Unlink the node at `index` and return its value. The slot is
    /// swap-removed, so the node that previously occupied the arena's last
    /// slot (if any) moves into `index` and its neighbors are repatched.
    fn detach(&mut self, index: u32) -> T {
        let (prev, next) = {
            let node = &self.nodes[index as usize];
            (node.prev, node.next)
        };
        if prev == NIL {
            self.front = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.back = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }

        let last = (self.nodes.len() - 1) as u32;
        let node = self.nodes.swap_remove(index as usize);
        if index != last {
            // The old last node now lives at `index`; its neighbors and the
            // anchors still name the old slot.
            let (moved_prev, moved_next) = {
                let moved = &self.nodes[index as usize];
                (moved.prev, moved.next)
            };
            if moved_prev == NIL {
                self.front = index;
            } else {
                self.nodes[moved_prev as usize].next = index;
            }
            if moved_next == NIL {
                self.back = index;
            } else {
                self.nodes[moved_next as usize].prev = index;
            }
        }
        node.value
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Deque<T> {
    fn clone(&self) -> Self {
        let mut clone = Self::with_capacity(self.len());
        for value in self.iter() {
            clone.push_back(value.clone());
        }
        clone
    }
}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Deque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Deque<T> {}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut deque = Deque::with_capacity(iter.size_hint().0);
        for value in iter {
            deque.push_back(value);
        }
        deque
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing front-to-back iterator over a [`Deque`].
pub struct Iter<'a, T> {
    deque: &'a Deque<T>,
    next: u32,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next == NIL {
            return None;
        }
        let node = &self.deque.nodes[self.next as usize];
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Borrowing back-to-front iterator over a [`Deque`].
pub struct RevIter<'a, T> {
    deque: &'a Deque<T>,
    next: u32,
    remaining: usize,
}

impl<'a, T> Iterator for RevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next == NIL {
            return None;
        }
        let node = &self.deque.nodes[self.next as usize];
        self.next = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RevIter<'_, T> {}

/// Detached fail-fast cursor over a [`Deque`], front to back.
#[derive(Debug, Clone)]
pub struct DequeCursor {
    next: u32,
    version: u64,
}

impl DequeCursor {
    /// Advance and return the next element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ConcurrentModification`] if the deque was
    /// structurally modified after this cursor was created.
    pub fn next<'a, T>(&mut self, deque: &'a Deque<T>) -> Result<Option<&'a T>> {
        if self.version != deque.version {
            return Err(OrdenaError::concurrent_modification(
                "deque modified during cursor enumeration",
            ));
        }
        if self.next == NIL {
            return Ok(None);
        }
        if self.next as usize >= deque.nodes.len() {
            return Err(OrdenaError::concurrent_modification(
                "cursor does not belong to this deque",
            ));
        }
        let node = &deque.nodes[self.next as usize];
        self.next = node.next;
        Ok(Some(&node.value))
    }
}

/// A [`Deque`] behind a coarse lock.
///
/// Every operation takes `&self`, acquires the internal
/// [`parking_lot::Mutex`], and delegates. Reads that would hand out a
/// reference return a clone instead, since a borrow cannot outlive the
/// lock. Compound operations that must see one consistent state go through
/// [`with`](Self::with).
///
/// # Examples
///
/// ```
/// use ordena::SynchronizedDeque;
///
/// let deque = SynchronizedDeque::new();
/// std::thread::scope(|scope| {
///     for worker in 0..4 {
///         let deque = &deque;
///         scope.spawn(move || deque.push_back(worker));
///     }
/// });
/// assert_eq!(deque.len(), 4);
/// ```
pub struct SynchronizedDeque<T> {
    inner: Mutex<Deque<T>>,
}

impl<T> SynchronizedDeque<T> {
    /// Create an empty synchronized deque.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Deque::new()),
        }
    }

    /// Wrap an existing deque.
    pub fn from_deque(deque: Deque<T>) -> Self {
        Self {
            inner: Mutex::new(deque),
        }
    }

    /// Unwrap the inner deque.
    pub fn into_inner(self) -> Deque<T> {
        self.inner.into_inner()
    }

    /// Number of elements in the deque.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the deque contains no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Insert a value at the front of the deque.
    pub fn push_front(&self, value: T) {
        self.inner.lock().push_front(value);
    }

    /// Insert a value at the back of the deque.
    pub fn push_back(&self, value: T) {
        self.inner.lock().push_back(value);
    }

    /// Remove and return the front element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn pop_front(&self) -> Result<T> {
        self.inner.lock().pop_front()
    }

    /// Remove and return the back element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn pop_back(&self) -> Result<T> {
        self.inner.lock().pop_back()
    }

    /// Remove and return the front element, or `None` if the deque is
    /// empty.
    pub fn try_pop_front(&self) -> Option<T> {
        self.inner.lock().try_pop_front()
    }

    /// Remove and return the back element, or `None` if the deque is
    /// empty.
    pub fn try_pop_back(&self) -> Option<T> {
        self.inner.lock().try_pop_back()
    }

    /// Remove all elements.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Run `f` with exclusive access to the deque. The lock is held for
    /// the duration of the call.
    pub fn with<R>(&self, f: impl FnOnce(&mut Deque<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T: Clone> SynchronizedDeque<T> {
    /// Copy of the front element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn peek_front(&self) -> Result<T> {
        self.inner.lock().peek_front().cloned()
    }

    /// Copy of the back element.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::Empty`] if the deque has no elements.
    pub fn peek_back(&self) -> Result<T> {
        self.inner.lock().peek_back().cloned()
    }

    /// Copy of the front element, or `None` if the deque is empty.
    pub fn try_peek_front(&self) -> Option<T> {
        self.inner.lock().try_peek_front().cloned()
    }

    /// Copy of the back element, or `None` if the deque is empty.
    pub fn try_peek_back(&self) -> Option<T> {
        self.inner.lock().try_peek_back().cloned()
    }

    /// A consistent copy of the elements, front to back.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().to_vec()
    }
}

impl<T: PartialEq> SynchronizedDeque<T> {
    /// Returns `true` if an equal element is in the deque. O(n).
    pub fn contains(&self, value: &T) -> bool {
        self.inner.lock().contains(value)
    }
}

impl<T> Default for SynchronizedDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Deque<T>> for SynchronizedDeque<T> {
    fn from(deque: Deque<T>) -> Self {
        Self::from_deque(deque)
    }
}

impl<T: fmt::Debug> fmt::Debug for SynchronizedDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_tuple("SynchronizedDeque").field(&*inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_both_ends() {
        let mut deque = Deque::new();
        deque.push_back(2);
        deque.push_back(3);
        deque.push_front(1);
        deque.push_front(0);

        assert_eq!(deque.to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(deque.pop_front(), Ok(0));
        assert_eq!(deque.pop_back(), Ok(3));
        assert_eq!(deque.to_vec(), vec![1, 2]);
        assert_eq!(deque.len(), 2);
        deque.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_deque_errors() {
        let mut deque: Deque<i32> = Deque::new();
        let err = deque.pop_front().unwrap_err();
        assert!(matches!(err, OrdenaError::Empty { .. }));
        assert_eq!(err.category(), "state");
        assert!(deque.pop_back().is_err());
        assert!(deque.peek_front().is_err());
        assert!(deque.peek_back().is_err());
        assert_eq!(deque.try_pop_front(), None);
        assert_eq!(deque.try_peek_back(), None);
        deque.check_invariants().unwrap();
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        assert_eq!(deque.peek_front(), Ok(&1));
        assert_eq!(deque.peek_back(), Ok(&3));
        assert_eq!(deque.len(), 3);
        assert_eq!(deque.pop_front(), Ok(1));
    }

    // pop_front swap-removes slot 0 while the back occupies the last slot,
    // which exercises the neighbor repatching in detach.
    #[test]
    fn test_detach_repatches_moved_node() {
        let mut deque = Deque::new();
        for i in 1..=5 {
            deque.push_back(i);
        }
        assert_eq!(deque.pop_front(), Ok(1));
        deque.check_invariants().unwrap();
        assert_eq!(deque.to_vec(), vec![2, 3, 4, 5]);

        assert_eq!(deque.pop_back(), Ok(5));
        deque.check_invariants().unwrap();
        assert_eq!(deque.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_iter_directions_agree() {
        let deque: Deque<i32> = (0..10).collect();
        let forward: Vec<i32> = deque.iter().copied().collect();
        let mut backward: Vec<i32> = deque.iter_rev().copied().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(deque.iter().len(), 10);
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut deque: Deque<i32> = (0..10).collect();
        deque.clear();
        assert!(deque.is_empty());
        deque.check_invariants().unwrap();
        deque.push_front(7);
        assert_eq!(deque.to_vec(), vec![7]);
    }

    #[test]
    fn test_contains() {
        let deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        assert!(deque.contains(&2));
        assert!(!deque.contains(&9));
    }

    #[test]
    fn test_cursor_fail_fast() {
        let mut deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        let mut cursor = deque.cursor();
        assert_eq!(cursor.next(&deque).unwrap(), Some(&1));

        deque.push_back(4);
        let err = cursor.next(&deque).unwrap_err();
        assert!(matches!(err, OrdenaError::ConcurrentModification { .. }));
        assert!(!err.is_recoverable());

        let mut cursor = deque.cursor();
        assert_eq!(cursor.next(&deque).unwrap(), Some(&1));
        deque.pop_back().unwrap();
        assert!(cursor.next(&deque).is_err());

        let mut cursor = deque.cursor();
        deque.clear();
        assert!(cursor.next(&deque).is_err());
    }

    #[test]
    fn test_cursor_runs_to_end() {
        let deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        let mut cursor = deque.cursor();
        let mut seen = Vec::new();
        while let Some(value) = cursor.next(&deque).unwrap() {
            seen.push(*value);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(cursor.next(&deque).unwrap(), None);
    }

    #[test]
    fn test_clone_and_eq() {
        let deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        let mut clone = deque.clone();
        assert_eq!(deque, clone);
        clone.push_back(4);
        assert_ne!(deque, clone);
        assert_eq!(deque.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_extend_and_debug() {
        let mut deque: Deque<i32> = Deque::new();
        deque.extend([1, 2]);
        deque.extend([3]);
        assert_eq!(format!("{:?}", deque), "[1, 2, 3]");
    }

    #[test]
    fn test_matches_std_vecdeque() {
        use std::collections::VecDeque;

        let mut ours: Deque<u64> = Deque::new();
        let mut model: VecDeque<u64> = VecDeque::new();
        let mut state = 0xdeadbeefu64;
        for _ in 0..2000 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let value = state >> 33;
            match state % 4 {
                0 => {
                    ours.push_front(value);
                    model.push_front(value);
                }
                1 => {
                    ours.push_back(value);
                    model.push_back(value);
                }
                2 => assert_eq!(ours.try_pop_front(), model.pop_front()),
                _ => assert_eq!(ours.try_pop_back(), model.pop_back()),
            }
            assert_eq!(ours.len(), model.len());
        }
        ours.check_invariants().unwrap();
        let contents: Vec<u64> = ours.iter().copied().collect();
        let expected: Vec<u64> = model.iter().copied().collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_synchronized_basic_ops() {
        let deque = SynchronizedDeque::new();
        deque.push_back(2);
        deque.push_front(1);
        deque.push_back(3);

        assert_eq!(deque.len(), 3);
        assert_eq!(deque.peek_front(), Ok(1));
        assert_eq!(deque.peek_back(), Ok(3));
        assert_eq!(deque.snapshot(), vec![1, 2, 3]);
        assert!(deque.contains(&2));

        assert_eq!(deque.pop_front(), Ok(1));
        assert_eq!(deque.pop_back(), Ok(3));
        deque.clear();
        assert!(deque.is_empty());
        assert!(deque.pop_front().is_err());
    }

    #[test]
    fn test_synchronized_with_compound_op() {
        let deque: SynchronizedDeque<i32> = Deque::from_iter([1, 2, 3, 4]).into();
        // Drain under a single lock acquisition.
        let drained = deque.with(|d| {
            let mut out = Vec::new();
            while let Some(v) = d.try_pop_front() {
                out.push(v);
            }
            out
        });
        assert_eq!(drained, vec![1, 2, 3, 4]);
        assert!(deque.is_empty());
    }

    #[test]
    fn test_synchronized_across_threads() {
        let deque = SynchronizedDeque::new();
        std::thread::scope(|scope| {
            for worker in 0..4u32 {
                let deque = &deque;
                scope.spawn(move || {
                    for i in 0..100 {
                        deque.push_back(worker * 1000 + i);
                    }
                });
            }
        });
        assert_eq!(deque.len(), 400);

        let mut per_worker = [0u32; 4];
        let mut last_seen = [None::<u32>; 4];
        for value in deque.snapshot() {
            let worker = (value / 1000) as usize;
            per_worker[worker] += 1;
            // FIFO order is preserved per producer.
            if let Some(previous) = last_seen[worker] {
                assert!(previous < value);
            }
            last_seen[worker] = Some(value);
        }
        assert_eq!(per_worker, [100; 4]);
    }

    #[test]
    fn test_into_inner_round_trip() {
        let deque: Deque<i32> = [1, 2, 3].into_iter().collect();
        let synced = SynchronizedDeque::from_deque(deque);
        synced.push_back(4);
        let inner = synced.into_inner();
        assert_eq!(inner.to_vec(), vec![1, 2, 3, 4]);
    }
}
