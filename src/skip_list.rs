//! Probabilistic ordered map
//!
//! [`SkipList`] keeps key-value pairs sorted by a [`Comparator`] in a
//! classic multi-level linked structure: every node is on level 0, and each
//! higher level is an express lane over the one below it. Level membership
//! is decided by coin flips at insert time, so expected insert, lookup, and
//! removal are O(log n) with no rebalancing step at all.
//!
//! Nodes live in an internal slab (a `Vec` of optional slots with a free
//! list), linked by `u32` indices. The head of each level is a plain index
//! array; an index of `u32::MAX` means "end of level".

use std::cmp::Ordering;
use std::fmt;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{OrdenaError, Result};

/// Hard cap on express-lane levels; comfortable for billions of entries.
const MAX_LEVEL: usize = 32;

const NIL: u32 = u32::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    /// Next node at each level this node is on; length is `level + 1`.
    forward: Vec<u32>,
}

impl<K, V> Node<K, V> {
    #[inline]
    fn level(&self) -> usize {
        self.forward.len() - 1
    }
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            forward: self.forward.clone(),
        }
    }
}

/// A sorted map over a probabilistic skip list.
///
/// Keys are unique under the configured comparator and iteration is in
/// ascending key order. The level generator is a [`SmallRng`] owned by the
/// list, seeded from entropy by default; [`with_seed`](SkipList::with_seed)
/// pins it for reproducible structure in tests. There is no global or
/// thread-local generator state.
///
/// # Examples
///
/// ```
/// use ordena::SkipList;
///
/// let mut list = SkipList::new();
/// list.insert(50, "fifty");
/// list.insert(10, "ten");
/// list.insert(90, "ninety");
///
/// assert_eq!(list.get(&10), Some(&"ten"));
/// let keys: Vec<i32> = list.keys().copied().collect();
/// assert_eq!(keys, vec![10, 50, 90]);
/// assert_eq!(list.remove(&50), Some("fifty"));
/// ```
pub struct SkipList<K, V, C = NaturalOrder> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<u32>,
    head: [u32; MAX_LEVEL],
    tail: u32,
    /// Highest level currently in use, 0-based.
    level: usize,
    len: usize,
    version: u64,
    rng: SmallRng,
    comparator: C,
}

impl<K, V> SkipList<K, V, NaturalOrder> {
    /// Create an empty list ordered by the key type's natural ordering,
    /// with an entropy-seeded level generator.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Create an empty natural-order list with a deterministic level
    /// generator. Two lists built from the same seed and the same operation
    /// sequence have identical structure.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_comparator_and_seed(NaturalOrder, seed)
    }
}

impl<K, V, C> SkipList<K, V, C> {
    /// Create an empty list ordered by an explicit key comparator.
    pub fn with_comparator(comparator: C) -> Self {
        Self::build(comparator, SmallRng::from_entropy())
    }

    /// Create an empty list with an explicit comparator and a deterministic
    /// level generator.
    pub fn with_comparator_and_seed(comparator: C, seed: u64) -> Self {
        Self::build(comparator, SmallRng::seed_from_u64(seed))
    }

    fn build(comparator: C, rng: SmallRng) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: [NIL; MAX_LEVEL],
            tail: NIL,
            level: 0,
            len: 0,
            version: 0,
            rng,
            comparator,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The key comparator this list orders by.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    #[inline]
    fn node(&self, id: u32) -> &Node<K, V> {
        self.slots[id as usize].as_ref().expect("invalid skip list index")
    }

    #[inline]
    fn node_mut(&mut self, id: u32) -> &mut Node<K, V> {
        self.slots[id as usize].as_mut().expect("invalid skip list index")
    }

    fn alloc(&mut self, node: Node<K, V>) -> u32 {
        match self.free.pop() {
            Some(id) => {
                self.slots[id as usize] = Some(node);
                id
            }
            None => {
                let id = self.slots.len() as u32;
                self.slots.push(Some(node));
                id
            }
        }
    }

    fn dealloc(&mut self, id: u32) -> Node<K, V> {
        self.free.push(id);
        self.slots[id as usize].take().expect("invalid skip list index")
    }

    /// Roll the level for a fresh node: geometric with p = 1/2, capped one
    /// above the current list level and by the hard maximum.
    fn random_level(&mut self) -> usize {
        let rolled = self.rng.next_u32().trailing_ones() as usize;
        rolled.min(self.level + 1).min(MAX_LEVEL - 1)
    }

    /// The entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        if self.head[0] == NIL {
            return None;
        }
        let node = self.node(self.head[0]);
        Some((&node.key, &node.value))
    }

    /// The entry with the largest key. O(1) via the maintained tail index.
    pub fn last(&self) -> Option<(&K, &V)> {
        if self.tail == NIL {
            return None;
        }
        let node = self.node(self.tail);
        Some((&node.key, &node.value))
    }

    /// Remove every entry. Invalidates live cursors.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = [NIL; MAX_LEVEL];
        self.tail = NIL;
        self.level = 0;
        self.len = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// Borrowing iterator in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter {
            list: self,
            next: self.head[0],
            remaining: self.len,
        }
    }

    /// Borrowing iterator over keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys { inner: self.iter() }
    }

    /// Borrowing iterator over values in ascending key order.
    pub fn values(&self) -> Values<'_, K, V, C> {
        Values { inner: self.iter() }
    }

    /// Detached version-stamped cursor from the smallest key upward.
    pub fn cursor(&self) -> SkipListCursor {
        SkipListCursor {
            next: self.head[0],
            version: self.version,
        }
    }
}

impl<K, V, C: Comparator<K>> SkipList<K, V, C> {
    /// Walk toward `key`, recording the rightmost node strictly before it
    /// at every level (`NIL` meaning the level head). Returns the matching
    /// node if the key is present.
    fn search(&self, key: &K, update: &mut [u32; MAX_LEVEL]) -> Option<u32> {
        let mut current = NIL;
        for i in (0..=self.level).rev() {
            let mut next = if current == NIL {
                self.head[i]
            } else {
                self.node(current).forward[i]
            };
            while next != NIL {
                let node = self.node(next);
                if self.comparator.compare(&node.key, key) != Ordering::Less {
                    break;
                }
                current = next;
                next = node.forward[i];
            }
            update[i] = current;
        }
        self.check_candidate(current, key)
    }

    /// Same walk as [`search`](Self::search) without the predecessor
    /// bookkeeping; for read paths.
    fn find(&self, key: &K) -> Option<u32> {
        let mut current = NIL;
        for i in (0..=self.level).rev() {
            let mut next = if current == NIL {
                self.head[i]
            } else {
                self.node(current).forward[i]
            };
            while next != NIL {
                let node = self.node(next);
                if self.comparator.compare(&node.key, key) != Ordering::Less {
                    break;
                }
                current = next;
                next = node.forward[i];
            }
        }
        self.check_candidate(current, key)
    }

    fn check_candidate(&self, before: u32, key: &K) -> Option<u32> {
        let candidate = if before == NIL {
            self.head[0]
        } else {
            self.node(before).forward[0]
        };
        if candidate != NIL
            && self.comparator.compare(&self.node(candidate).key, key) == Ordering::Equal
        {
            Some(candidate)
        } else {
            None
        }
    }

    /// Insert or overwrite, returning the displaced value if the key was
    /// already present. Invalidates live cursors.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::SkipList;
    ///
    /// let mut list = SkipList::new();
    /// assert_eq!(list.insert(1, "a"), None);
    /// assert_eq!(list.insert(1, "b"), Some("a"));
    /// assert_eq!(list.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut update = [NIL; MAX_LEVEL];
        if let Some(found) = self.search(&key, &mut update) {
            let old = std::mem::replace(&mut self.node_mut(found).value, value);
            self.version = self.version.wrapping_add(1);
            return Some(old);
        }

        let level = self.random_level();
        if level > self.level {
            // The new levels are empty, so their predecessors are the head;
            // update was initialized to NIL which says exactly that.
            self.level = level;
        }

        let id = self.alloc(Node {
            key,
            value,
            forward: vec![NIL; level + 1],
        });
        for i in 0..=level {
            let next = if update[i] == NIL {
                self.head[i]
            } else {
                self.node(update[i]).forward[i]
            };
            self.node_mut(id).forward[i] = next;
            if update[i] == NIL {
                self.head[i] = id;
            } else {
                self.node_mut(update[i]).forward[i] = id;
            }
        }
        if self.node(id).forward[0] == NIL {
            self.tail = id;
        }

        self.len += 1;
        self.version = self.version.wrapping_add(1);
        None
    }

    /// Remove an entry, returning its value. Invalidates live cursors.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut update = [NIL; MAX_LEVEL];
        let id = self.search(key, &mut update)?;

        let node_level = self.node(id).level();
        for i in 0..=node_level {
            let next = self.node(id).forward[i];
            if update[i] == NIL {
                self.head[i] = next;
            } else {
                self.node_mut(update[i]).forward[i] = next;
            }
        }
        if self.node(id).forward[0] == NIL {
            self.tail = update[0];
        }
        while self.level > 0 && self.head[self.level] == NIL {
            self.level -= 1;
        }

        let node = self.dealloc(id);
        self.len -= 1;
        self.version = self.version.wrapping_add(1);
        Some(node.value)
    }

    /// Borrow the value for a key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|id| &self.node(id).value)
    }

    /// Mutably borrow the value for a key. Not a structural change; live
    /// cursors stay valid.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(&mut self.node_mut(id).value)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }
}

impl<K, V, C: Default> Default for SkipList<K, V, C> {
    fn default() -> Self {
        Self::build(C::default(), SmallRng::from_entropy())
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for SkipList<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free: self.free.clone(),
            head: self.head,
            tail: self.tail,
            level: self.level,
            len: self.len,
            version: self.version,
            rng: self.rng.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for SkipList<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for SkipList<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for SkipList<K, V, C> {}

impl<K: Ord, V> FromIterator<(K, V)> for SkipList<K, V, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = SkipList::new();
        list.extend(iter);
        list
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for SkipList<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a SkipList<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Iter<'a, K, V, C> {
        self.iter()
    }
}

/// Borrowing iterator over a [`SkipList`] in ascending key order.
pub struct Iter<'a, K, V, C> {
    list: &'a SkipList<K, V, C>,
    next: u32,
    remaining: usize,
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NIL {
            return None;
        }
        let node = self.list.node(self.next);
        self.next = node.forward[0];
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C> ExactSizeIterator for Iter<'_, K, V, C> {}

/// Borrowing iterator over skip list keys in ascending order.
pub struct Keys<'a, K, V, C> {
    inner: Iter<'a, K, V, C>,
}

impl<'a, K, V, C> Iterator for Keys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C> ExactSizeIterator for Keys<'_, K, V, C> {}

/// Borrowing iterator over skip list values in ascending key order.
pub struct Values<'a, K, V, C> {
    inner: Iter<'a, K, V, C>,
}

impl<'a, K, V, C> Iterator for Values<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C> ExactSizeIterator for Values<'_, K, V, C> {}

/// Detached, version-stamped cursor over a [`SkipList`].
///
/// Holds no borrow of the list; every advance revalidates the version
/// captured at creation.
#[derive(Debug, Clone)]
pub struct SkipListCursor {
    next: u32,
    version: u64,
}

impl SkipListCursor {
    /// Advance to the next entry in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ConcurrentModification`] if the list was
    /// structurally modified after this cursor was created.
    pub fn next<'a, K, V, C>(&mut self, list: &'a SkipList<K, V, C>) -> Result<Option<(&'a K, &'a V)>> {
        if self.version != list.version {
            return Err(OrdenaError::concurrent_modification(
                "skip list modified during cursor enumeration",
            ));
        }
        if self.next == NIL {
            return Ok(None);
        }
        // Out of bounds and vacated slots both mean a foreign cursor: this
        // list never handed out that index at the captured version.
        let node = match list.slots.get(self.next as usize).and_then(Option::as_ref) {
            Some(node) => node,
            None => {
                return Err(OrdenaError::concurrent_modification(
                    "cursor does not belong to this skip list",
                ))
            }
        };
        self.next = node.forward[0];
        Ok(Some((&node.key, &node.value)))
    }
}
