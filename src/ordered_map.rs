//! Ordered dictionary over the red-black tree
//!
//! [`OrderedMap`] keys a unique-key map by a [`Comparator`] and iterates in
//! key order. On top of the plain dictionary surface it offers live range
//! views ([`RangeView`]) and detached fail-fast cursors ([`MapCursor`]).
//!
//! Views deliberately hold no borrow of the map. A view is a pair of owned
//! bounds plus a direction flag; every accessor takes the backing map as an
//! argument. That is what makes views live: mutate the map directly and a
//! previously constructed view reflects the change on its next use, with no
//! reconstruction and no interior mutability.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{OrdenaError, Result};
use crate::rb_tree::{DuplicatePolicy, InsertOutcome, RangePosition, RbTree, NIL};

/// One key-value pair in the backing tree.
#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Orders entries by key alone, through the map's key comparator.
#[derive(Debug, Clone, Default)]
struct EntryComparator<C> {
    key_cmp: C,
}

impl<K, V, C: Comparator<K>> Comparator<Entry<K, V>> for EntryComparator<C> {
    #[inline]
    fn compare(&self, a: &Entry<K, V>, b: &Entry<K, V>) -> Ordering {
        self.key_cmp.compare(&a.key, &b.key)
    }
}

/// Classify `key` against a pair of range bounds.
fn classify_key<K, C>(cmp: &C, lower: &Bound<K>, upper: &Bound<K>, key: &K) -> RangePosition
where
    C: Comparator<K>,
{
    match lower {
        Bound::Included(lo) => {
            if cmp.compare(key, lo) == Ordering::Less {
                return RangePosition::Below;
            }
        }
        Bound::Excluded(lo) => {
            if cmp.compare(key, lo) != Ordering::Greater {
                return RangePosition::Below;
            }
        }
        Bound::Unbounded => {}
    }
    match upper {
        Bound::Included(hi) => {
            if cmp.compare(key, hi) == Ordering::Greater {
                return RangePosition::Above;
            }
        }
        Bound::Excluded(hi) => {
            if cmp.compare(key, hi) != Ordering::Less {
                return RangePosition::Above;
            }
        }
        Bound::Unbounded => {}
    }
    RangePosition::Inside
}

/// A sorted map with unique keys, range views, and fail-fast cursors.
///
/// Keys are unique under the configured comparator; iteration yields entries
/// in ascending key order (insertion order is not preserved). All lookups
/// and single-entry mutations are O(log n).
///
/// # Examples
///
/// ```
/// use ordena::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.insert(3, "three");
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// let keys: Vec<i32> = map.keys().copied().collect();
/// assert_eq!(keys, vec![1, 2, 3]);
/// assert_eq!(map.get(&2), Some(&"two"));
/// assert_eq!(map.remove(&1), Some("one"));
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V, C = NaturalOrder> {
    tree: RbTree<Entry<K, V>, EntryComparator<C>>,
}

impl<K, V> OrderedMap<K, V, NaturalOrder> {
    /// Create an empty map ordered by the key type's natural ordering.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> OrderedMap<K, V, C> {
    /// Create an empty map ordered by an explicit key comparator.
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            tree: RbTree::with_comparator(EntryComparator { key_cmp: comparator }),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The key comparator this map orders by.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.tree.comparator().key_cmp
    }

    /// Remove every entry.
    ///
    /// Live cursors are invalidated first, then the backing tree is
    /// discarded, mirroring a stop-enumerations-then-replace reset.
    pub fn clear(&mut self) {
        self.tree.stop_enumerations();
        self.tree.clear();
    }

    /// The entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|e| (&e.key, &e.value))
    }

    /// The entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|e| (&e.key, &e.value))
    }

    /// Borrowing iterator in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { inner: self.tree.iter() }
    }

    /// Borrowing iterator in descending key order.
    pub fn iter_rev(&self) -> RevIter<'_, K, V> {
        RevIter { inner: self.tree.iter_rev() }
    }

    /// Borrowing iterator over keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.tree.iter() }
    }

    /// Borrowing iterator over values in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.tree.iter() }
    }

    /// Detached forward cursor over the whole map.
    ///
    /// See [`MapCursor::next`] for the fail-fast contract.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// map.insert(1, "a");
    ///
    /// let mut cursor = map.cursor();
    /// map.insert(2, "b");
    /// assert!(cursor.next(&map).is_err());
    /// ```
    pub fn cursor(&self) -> MapCursor<K> {
        MapCursor {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            reversed: false,
            next: self.tree.first_index().unwrap_or(NIL),
            version: self.tree.version(),
        }
    }

    /// Detached reverse cursor over the whole map.
    pub fn cursor_rev(&self) -> MapCursor<K> {
        MapCursor {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            reversed: true,
            next: self.tree.last_index().unwrap_or(NIL),
            version: self.tree.version(),
        }
    }

    /// A view over the whole map that iterates in descending key order.
    pub fn reversed(&self) -> RangeView<K> {
        RangeView {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            reversed: true,
        }
    }
}

impl<K, V, C: Comparator<K>> OrderedMap<K, V, C> {
    #[inline]
    fn cmp_key(&self, a: &K, b: &K) -> Ordering {
        self.comparator().compare(a, b)
    }

    fn find_index(&self, key: &K) -> Option<u32> {
        let cmp = self.comparator();
        self.tree.find_index_by(|e| cmp.compare(key, &e.key))
    }

    /// Insert or overwrite, returning the displaced value if the key was
    /// already present. This is the upsert flavor;
    /// [`try_insert`](OrderedMap::try_insert) is the erroring one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.insert(Entry { key, value }, DuplicatePolicy::ReplaceLast) {
            InsertOutcome::Replaced(old) => Some(old.value),
            _ => None,
        }
    }

    /// Insert a new entry, failing if the key is already present.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::DuplicateKey`] when an equal key exists; the
    /// map is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// map.try_insert(1, "a").unwrap();
    /// assert!(map.try_insert(1, "b").is_err());
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<()> {
        match self.tree.insert(Entry { key, value }, DuplicatePolicy::DoNothing) {
            InsertOutcome::Added => Ok(()),
            InsertOutcome::Rejected(_) | InsertOutcome::Replaced(_) => {
                Err(OrdenaError::duplicate_key("key already present in map"))
            }
        }
    }

    /// Replace the value of an existing entry, returning the old value.
    ///
    /// Unlike [`insert`](OrderedMap::insert) this never adds an entry.
    /// Replacing a value is not a structural modification and does not
    /// invalidate live cursors; a cursor that later reaches the key
    /// observes the new value.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::KeyNotFound`] when the key is absent.
    pub fn replace(&mut self, key: &K, value: V) -> Result<V> {
        let id = self
            .find_index(key)
            .ok_or_else(|| OrdenaError::key_not_found("replace: key not present in map"))?;
        Ok(std::mem::replace(&mut self.tree.item_mut(id).value, value))
    }

    /// Look up a value, or insert the offered one if the key is absent.
    ///
    /// Returns `(existed, value)` where `existed` tells whether the key was
    /// already present; in that case the offered value is dropped and the
    /// stored one returned. A single tree descent either way.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// let (existed, v) = map.get_or_insert("k", 1);
    /// assert!(!existed);
    /// *v += 10;
    /// let (existed, v) = map.get_or_insert("k", 99);
    /// assert!(existed);
    /// assert_eq!(*v, 11);
    /// ```
    pub fn get_or_insert(&mut self, key: K, value: V) -> (bool, &mut V) {
        let (outcome, id) = self
            .tree
            .insert_indexed(Entry { key, value }, DuplicatePolicy::DoNothing);
        let existed = matches!(outcome, InsertOutcome::Rejected(_));
        (existed, &mut self.tree.item_mut(id).value)
    }

    /// Borrow the value for a key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let cmp = self.comparator();
        self.tree
            .find_by(|e| cmp.compare(key, &e.key))
            .map(|e| &e.value)
    }

    /// Mutably borrow the value for a key.
    ///
    /// Value edits through the returned reference are not structural
    /// modifications and do not invalidate cursors.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_index(key)?;
        Some(&mut self.tree.item_mut(id).value)
    }

    /// Borrow the value for a key, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::KeyNotFound`] when the key is absent.
    pub fn try_get(&self, key: &K) -> Result<&V> {
        self.get(key)
            .ok_or_else(|| OrdenaError::key_not_found("key not present in map"))
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    /// Remove an entry, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.find_index(key)?;
        Some(self.tree.delete_node(id).value)
    }

    /// Upsert every pair from a sequence.
    pub fn insert_many<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    /// Remove every listed key, returning how many were present.
    pub fn remove_many<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let mut removed = 0;
        for key in keys {
            if self.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// A view over the keys in `[from, to]` with per-bound inclusivity.
    ///
    /// O(1): the view is a detached pair of owned bounds; see [`RangeView`].
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::InvalidArgument`] when `from` sorts after
    /// `to`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// for k in [1, 3, 5, 7, 9] {
    ///     map.insert(k, ());
    /// }
    /// let view = map.range(3, false, 7, true).unwrap();
    /// let keys: Vec<i32> = view.iter(&map).map(|(k, _)| *k).collect();
    /// assert_eq!(keys, vec![5, 7]);
    /// ```
    pub fn range(
        &self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> Result<RangeView<K>> {
        if self.cmp_key(&from, &to) == Ordering::Greater {
            return Err(OrdenaError::invalid_argument(
                "range lower bound sorts after upper bound",
            ));
        }
        Ok(RangeView {
            lower: if from_inclusive { Bound::Included(from) } else { Bound::Excluded(from) },
            upper: if to_inclusive { Bound::Included(to) } else { Bound::Excluded(to) },
            reversed: false,
        })
    }

    /// A view over the keys from `from` to the end of the map.
    pub fn range_from(&self, from: K, inclusive: bool) -> RangeView<K> {
        RangeView {
            lower: if inclusive { Bound::Included(from) } else { Bound::Excluded(from) },
            upper: Bound::Unbounded,
            reversed: false,
        }
    }

    /// A view over the keys from the start of the map up to `to`.
    pub fn range_to(&self, to: K, inclusive: bool) -> RangeView<K> {
        RangeView {
            lower: Bound::Unbounded,
            upper: if inclusive { Bound::Included(to) } else { Bound::Excluded(to) },
            reversed: false,
        }
    }
}

impl<K, V, C: Default> Default for OrderedMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for OrderedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for OrderedMap<K, V, C> {}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        map.insert_many(iter);
        map
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for OrderedMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_many(iter);
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrderedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Borrowing iterator over map entries in ascending key order.
pub struct Iter<'a, K, V> {
    inner: crate::rb_tree::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Borrowing iterator over map entries in descending key order.
pub struct RevIter<'a, K, V> {
    inner: crate::rb_tree::RevIter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for RevIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for RevIter<'_, K, V> {}

/// Borrowing iterator over map keys in ascending order.
pub struct Keys<'a, K, V> {
    inner: crate::rb_tree::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| &e.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Borrowing iterator over map values in ascending key order.
pub struct Values<'a, K, V> {
    inner: crate::rb_tree::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| &e.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A live, non-copying window over a subset of an [`OrderedMap`].
///
/// A view stores owned bounds and a direction flag; it does not borrow or
/// reference the map it was created from, so it stays valid across any
/// amount of direct map mutation and simply reflects the map's current
/// contents whenever it is next used. Writes through the view are
/// restricted to its range. Passing a view a map other than the one whose
/// key ordering it was built for is a logic error (the bounds are
/// interpreted under whatever comparator that map carries).
///
/// # Examples
///
/// ```
/// use ordena::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// for k in [1, 3, 5, 7, 9] {
///     map.insert(k, k * 10);
/// }
///
/// let view = map.range_from(3, true);
/// assert_eq!(view.len(&map), 4);
///
/// // Views are live: direct mutations show up without rebuilding.
/// map.remove(&5);
/// assert_eq!(view.len(&map), 3);
/// let keys: Vec<i32> = view.iter(&map).map(|(k, _)| *k).collect();
/// assert_eq!(keys, vec![3, 7, 9]);
/// ```
#[derive(Debug, Clone)]
pub struct RangeView<K> {
    lower: Bound<K>,
    upper: Bound<K>,
    reversed: bool,
}

impl<K> RangeView<K> {
    /// Flip the iteration direction, consuming the view.
    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Returns `true` if the view iterates in descending key order.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// The view's lower and upper bounds.
    pub fn bounds(&self) -> (&Bound<K>, &Bound<K>) {
        (&self.lower, &self.upper)
    }

    /// Classify a key against this view's bounds under the map's
    /// comparator.
    pub fn classify<V, C>(&self, map: &OrderedMap<K, V, C>, key: &K) -> RangePosition
    where
        C: Comparator<K>,
    {
        classify_key(map.comparator(), &self.lower, &self.upper, key)
    }

    /// Returns `true` if `key` lies inside the view's bounds.
    pub fn key_in_view<V, C>(&self, map: &OrderedMap<K, V, C>, key: &K) -> bool
    where
        C: Comparator<K>,
    {
        self.classify(map, key) == RangePosition::Inside
    }

    /// Number of map entries inside the view. O(log n) via subtree counts.
    pub fn len<V, C>(&self, map: &OrderedMap<K, V, C>) -> usize
    where
        C: Comparator<K>,
    {
        if matches!(self.lower, Bound::Unbounded) && matches!(self.upper, Bound::Unbounded) {
            return map.len();
        }
        let cmp = map.comparator();
        map.tree
            .count_range(|e| classify_key(cmp, &self.lower, &self.upper, &e.key))
    }

    /// Returns `true` if no map entry lies inside the view.
    pub fn is_empty<V, C>(&self, map: &OrderedMap<K, V, C>) -> bool
    where
        C: Comparator<K>,
    {
        self.first(map).is_none()
    }

    /// Returns `true` if the view contains `key` (in bounds and present).
    pub fn contains_key<V, C>(&self, map: &OrderedMap<K, V, C>, key: &K) -> bool
    where
        C: Comparator<K>,
    {
        self.key_in_view(map, key) && map.contains_key(key)
    }

    /// Borrow the value for `key`, or `None` when the key is absent or out
    /// of bounds.
    pub fn get<'a, V, C>(&self, map: &'a OrderedMap<K, V, C>, key: &K) -> Option<&'a V>
    where
        C: Comparator<K>,
    {
        if !self.key_in_view(map, key) {
            return None;
        }
        map.get(key)
    }

    /// The first entry in the view's iteration order.
    pub fn first<'a, V, C>(&self, map: &'a OrderedMap<K, V, C>) -> Option<(&'a K, &'a V)>
    where
        C: Comparator<K>,
    {
        let cmp = map.comparator();
        let tester = |e: &Entry<K, V>| classify_key(cmp, &self.lower, &self.upper, &e.key);
        let id = if self.reversed {
            map.tree.last_in_range_index(&tester)
        } else {
            map.tree.first_in_range_index(&tester)
        }?;
        let entry = map.tree.item(id);
        Some((&entry.key, &entry.value))
    }

    /// The last entry in the view's iteration order.
    pub fn last<'a, V, C>(&self, map: &'a OrderedMap<K, V, C>) -> Option<(&'a K, &'a V)>
    where
        C: Comparator<K>,
    {
        let cmp = map.comparator();
        let tester = |e: &Entry<K, V>| classify_key(cmp, &self.lower, &self.upper, &e.key);
        let id = if self.reversed {
            map.tree.first_in_range_index(&tester)
        } else {
            map.tree.last_in_range_index(&tester)
        }?;
        let entry = map.tree.item(id);
        Some((&entry.key, &entry.value))
    }

    /// Borrowing iterator over the entries inside the view, honoring its
    /// direction.
    pub fn iter<'a, V, C>(&'a self, map: &'a OrderedMap<K, V, C>) -> ViewIter<'a, K, V, C>
    where
        C: Comparator<K>,
    {
        let cmp = map.comparator();
        let tester = |e: &Entry<K, V>| classify_key(cmp, &self.lower, &self.upper, &e.key);
        let next = if self.reversed {
            map.tree.last_in_range_index(&tester)
        } else {
            map.tree.first_in_range_index(&tester)
        };
        ViewIter { view: self, map, next }
    }

    /// Detached version-stamped cursor over the view's entries.
    pub fn cursor<V, C>(&self, map: &OrderedMap<K, V, C>) -> MapCursor<K>
    where
        K: Clone,
        C: Comparator<K>,
    {
        let cmp = map.comparator();
        let tester = |e: &Entry<K, V>| classify_key(cmp, &self.lower, &self.upper, &e.key);
        let next = if self.reversed {
            map.tree.last_in_range_index(&tester)
        } else {
            map.tree.first_in_range_index(&tester)
        };
        MapCursor {
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            reversed: self.reversed,
            next: next.unwrap_or(NIL),
            version: map.tree.version(),
        }
    }

    /// Insert through the view. The key must lie inside the view's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::OutOfViewRange`] when the key is outside the
    /// bounds; the map is left unchanged.
    pub fn insert<V, C>(&self, map: &mut OrderedMap<K, V, C>, key: K, value: V) -> Result<Option<V>>
    where
        C: Comparator<K>,
    {
        if !self.key_in_view(map, &key) {
            return Err(OrdenaError::out_of_view_range(
                "insert through view rejected: key outside view bounds",
            ));
        }
        Ok(map.insert(key, value))
    }

    /// Remove through the view.
    ///
    /// Keys outside the bounds report `None` even when present in the
    /// backing map; the map is never touched outside the view's range.
    pub fn remove<V, C>(&self, map: &mut OrderedMap<K, V, C>, key: &K) -> Option<V>
    where
        C: Comparator<K>,
    {
        if !self.key_in_view(map, key) {
            return None;
        }
        map.remove(key)
    }

    /// Remove every entry inside the view, returning how many were removed.
    ///
    /// Entries outside the view's bounds are untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::OrderedMap;
    ///
    /// let mut map: ordena::OrderedMap<i32, ()> = (1..=9).map(|k| (k, ())).collect();
    /// let view = map.range(3, true, 6, true).unwrap();
    /// assert_eq!(view.clear(&mut map), 4);
    /// let keys: Vec<i32> = map.keys().copied().collect();
    /// assert_eq!(keys, vec![1, 2, 7, 8, 9]);
    /// ```
    pub fn clear<V, C>(&self, map: &mut OrderedMap<K, V, C>) -> usize
    where
        C: Comparator<K>,
    {
        let mut removed = 0;
        loop {
            let id = {
                let cmp = map.comparator();
                let tester = |e: &Entry<K, V>| classify_key(cmp, &self.lower, &self.upper, &e.key);
                match map.tree.first_in_range_index(&tester) {
                    Some(id) => id,
                    None => break,
                }
            };
            map.tree.delete_node(id);
            removed += 1;
        }
        removed
    }
}

/// Borrowing iterator over the entries of a [`RangeView`].
pub struct ViewIter<'a, K, V, C> {
    view: &'a RangeView<K>,
    map: &'a OrderedMap<K, V, C>,
    next: Option<u32>,
}

impl<'a, K, V, C: Comparator<K>> Iterator for ViewIter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.map.tree.item(id);
        let adv = if self.view.reversed {
            self.map.tree.predecessor(id)
        } else {
            self.map.tree.successor(id)
        };
        self.next = if adv == NIL {
            None
        } else {
            let key = &self.map.tree.item(adv).key;
            let pos = classify_key(self.map.comparator(), &self.view.lower, &self.view.upper, key);
            if pos == RangePosition::Inside {
                Some(adv)
            } else {
                None
            }
        };
        Some((&entry.key, &entry.value))
    }
}

/// Detached, version-stamped cursor over an [`OrderedMap`] or one of its
/// views.
///
/// Created by [`OrderedMap::cursor`], [`OrderedMap::cursor_rev`], or
/// [`RangeView::cursor`]. Holds no borrow of the map; every advance
/// revalidates the version captured at creation, which is the map's
/// concurrent-modification detection contract.
#[derive(Debug, Clone)]
pub struct MapCursor<K> {
    lower: Bound<K>,
    upper: Bound<K>,
    reversed: bool,
    next: u32,
    version: u64,
}

impl<K> MapCursor<K> {
    /// Advance to the next entry in the cursor's direction.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ConcurrentModification`] if the map was
    /// structurally modified (insert, remove, clear, or a stop-enumerations
    /// reset) after this cursor was created.
    pub fn next<'a, V, C>(&mut self, map: &'a OrderedMap<K, V, C>) -> Result<Option<(&'a K, &'a V)>>
    where
        C: Comparator<K>,
    {
        if self.version != map.tree.version() {
            return Err(OrdenaError::concurrent_modification(
                "map modified during cursor enumeration",
            ));
        }
        if self.next == NIL {
            return Ok(None);
        }
        if self.next as usize >= map.tree.node_slot_count() {
            return Err(OrdenaError::concurrent_modification(
                "cursor does not belong to this map",
            ));
        }
        let id = self.next;
        let adv = if self.reversed {
            map.tree.predecessor(id)
        } else {
            map.tree.successor(id)
        };
        self.next = if adv == NIL {
            NIL
        } else {
            let key = &map.tree.item(adv).key;
            let pos = classify_key(map.comparator(), &self.lower, &self.upper, key);
            if pos == RangePosition::Inside {
                adv
            } else {
                NIL
            }
        };
        let entry = map.tree.item(id);
        Ok(Some((&entry.key, &entry.value)))
    }
}
