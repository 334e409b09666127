//! Arena-backed red-black tree with subtree counts
//!
//! [`RbTree`] is the balanced search tree underneath
//! [`OrderedMap`](crate::OrderedMap) and is usable on its own as an ordered set of
//! arbitrary elements under a pluggable [`Comparator`]. Nodes live in a dense
//! `Vec` arena addressed by `u32` indices, which sidesteps the ownership
//! cycles a parent-pointer tree would otherwise create; `u32::MAX` is the
//! null index. Every node carries the size of its subtree, giving O(log n)
//! range counting without full scans.
//!
//! Structural mutations increment a version counter. Borrowing iterators do
//! not need it (the borrow checker already excludes mutation while they
//! live), but detached [`TreeCursor`]s capture the version and fail fast
//! with [`OrdenaError::ConcurrentModification`] if the tree changed under
//! them.

use std::cmp::Ordering;
use std::fmt;

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{OrdenaError, Result};

/// Null node index.
pub(crate) const NIL: u32 = u32::MAX;

/// Behavior of [`RbTree::insert`] when an equal element already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the existing element; the offered one is handed back.
    DoNothing,
    /// Overwrite the existing element with the offered one.
    ReplaceLast,
}

/// Outcome of an [`RbTree::insert`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// No equal element existed; the offered element was added.
    Added,
    /// An equal element existed and was overwritten; here is the old one.
    Replaced(T),
    /// An equal element existed; the tree is unchanged and the offered
    /// element is returned.
    Rejected(T),
}

/// Classification of an element relative to a queried range.
///
/// Range testers must be monotone along the comparator order: once an
/// element classifies [`Above`](RangePosition::Above), every larger element
/// must too, and symmetrically for [`Below`](RangePosition::Below). The
/// range operations rely on this to terminate early and to count via
/// subtree sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    /// The element sorts before the range.
    Below,
    /// The element is inside the range.
    Inside,
    /// The element sorts after the range.
    Above,
}

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    parent: u32,
    left: u32,
    right: u32,
    color: Color,
    /// Number of elements in the subtree rooted here, inclusive.
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// A self-balancing binary search tree over elements of type `T`.
///
/// Ordering decisions go through the comparator `C`; [`NaturalOrder`] (the
/// default) uses `T`'s own [`Ord`]. Duplicates are controlled per insert by
/// [`DuplicatePolicy`]. All single-element operations are O(log n);
/// [`count_range`](RbTree::count_range) is O(log n) via subtree counts.
///
/// # Examples
///
/// ```
/// use ordena::rb_tree::{DuplicatePolicy, InsertOutcome, RbTree};
///
/// let mut tree = RbTree::new();
/// assert_eq!(tree.insert(3, DuplicatePolicy::DoNothing), InsertOutcome::Added);
/// assert_eq!(tree.insert(1, DuplicatePolicy::DoNothing), InsertOutcome::Added);
/// assert_eq!(tree.insert(3, DuplicatePolicy::DoNothing), InsertOutcome::Rejected(3));
///
/// let items: Vec<i32> = tree.iter().copied().collect();
/// assert_eq!(items, vec![1, 3]);
/// assert_eq!(tree.delete(&1), Some(1));
/// assert_eq!(tree.len(), 1);
/// ```
#[derive(Clone)]
pub struct RbTree<T, C = NaturalOrder> {
    nodes: Vec<Node<T>>,
    root: u32,
    version: u64,
    comparator: C,
}

impl<T> RbTree<T, NaturalOrder> {
    /// Create an empty tree ordered by `T`'s natural ordering.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Create an empty tree with room for `capacity` elements before the
    /// arena reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut tree = Self::new();
        tree.nodes.reserve(capacity);
        tree
    }
}

impl<T, C> RbTree<T, C> {
    /// Create an empty tree ordered by an explicit comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::compare::{NaturalOrder, ReverseOrder};
    /// use ordena::rb_tree::{DuplicatePolicy, RbTree};
    ///
    /// let mut tree = RbTree::with_comparator(ReverseOrder::new(NaturalOrder));
    /// for k in [2, 9, 4] {
    ///     tree.insert(k, DuplicatePolicy::DoNothing);
    /// }
    /// let descending: Vec<i32> = tree.iter().copied().collect();
    /// assert_eq!(descending, vec![9, 4, 2]);
    /// ```
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
            version: 0,
            comparator,
        }
    }

    /// Number of elements in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The comparator this tree orders by.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Remove every element. Invalidates live cursors.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
        self.version = self.version.wrapping_add(1);
    }

    /// Invalidate all detached cursors without touching the contents.
    ///
    /// Used when the tree is about to be discarded or replaced wholesale so
    /// that cursors created against it cannot silently keep walking.
    pub fn stop_enumerations(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// The smallest element, or `None` if the tree is empty.
    pub fn first(&self) -> Option<&T> {
        if self.root == NIL {
            None
        } else {
            Some(&self.node(self.subtree_min(self.root)).item)
        }
    }

    /// The largest element, or `None` if the tree is empty.
    pub fn last(&self) -> Option<&T> {
        if self.root == NIL {
            None
        } else {
            Some(&self.node(self.subtree_max(self.root)).item)
        }
    }

    /// In-order borrowing iterator over all elements.
    pub fn iter(&self) -> Iter<'_, T> {
        let start = if self.root == NIL { NIL } else { self.subtree_min(self.root) };
        Iter {
            nodes: &self.nodes,
            next: start,
            remaining: self.len(),
        }
    }

    /// Reverse in-order borrowing iterator over all elements.
    pub fn iter_rev(&self) -> RevIter<'_, T> {
        let start = if self.root == NIL { NIL } else { self.subtree_max(self.root) };
        RevIter {
            nodes: &self.nodes,
            next: start,
            remaining: self.len(),
        }
    }

    /// Lazy in-order sequence of the elements a range tester classifies as
    /// [`RangePosition::Inside`].
    ///
    /// The walk starts at the first in-range element and short-circuits as
    /// soon as an element classifies `Above`, so a narrow range near the
    /// middle of a large tree never scans the whole tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::rb_tree::{DuplicatePolicy, RangePosition, RbTree};
    ///
    /// let mut tree = RbTree::new();
    /// for k in [1, 3, 5, 7, 9] {
    ///     tree.insert(k, DuplicatePolicy::DoNothing);
    /// }
    /// let tester = |k: &i32| match *k {
    ///     k if k < 3 => RangePosition::Below,
    ///     k if k > 7 => RangePosition::Above,
    ///     _ => RangePosition::Inside,
    /// };
    /// let inside: Vec<i32> = tree.iter_range(tester).copied().collect();
    /// assert_eq!(inside, vec![3, 5, 7]);
    /// ```
    pub fn iter_range<F>(&self, tester: F) -> RangeIter<'_, T, F>
    where
        F: Fn(&T) -> RangePosition,
    {
        let start = self.first_in_range(&tester);
        RangeIter {
            nodes: &self.nodes,
            next: start,
            tester,
        }
    }

    /// Reverse in-order counterpart of [`iter_range`](RbTree::iter_range).
    pub fn iter_range_rev<F>(&self, tester: F) -> RevRangeIter<'_, T, F>
    where
        F: Fn(&T) -> RangePosition,
    {
        let start = self.last_in_range(&tester);
        RevRangeIter {
            nodes: &self.nodes,
            next: start,
            tester,
        }
    }

    /// Count the elements inside a range in O(log n).
    ///
    /// Descends to the topmost in-range node, then runs one boundary walk
    /// down each side adding whole-subtree counts, so the cost is two root
    /// to leaf paths regardless of how many elements the range contains.
    pub fn count_range<F>(&self, tester: F) -> usize
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut cur = self.root;
        loop {
            if cur == NIL {
                return 0;
            }
            match tester(&self.node(cur).item) {
                RangePosition::Below => cur = self.node(cur).right,
                RangePosition::Above => cur = self.node(cur).left,
                RangePosition::Inside => break,
            }
        }
        // cur is in range, so its left subtree holds nothing Above and its
        // right subtree nothing Below.
        1 + self.count_from_lower(self.node(cur).left, &tester)
            + self.count_to_upper(self.node(cur).right, &tester)
    }

    /// Delete every element inside a range, returning how many were removed.
    ///
    /// Implemented as repeated first-in-range lookup plus single deletion,
    /// O(k log n) for k removed elements.
    pub fn delete_range<F>(&mut self, tester: F) -> usize
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut removed = 0;
        loop {
            let id = self.first_in_range(&tester);
            if id == NIL {
                return removed;
            }
            self.delete_node(id);
            removed += 1;
        }
    }

    /// Detached forward cursor positioned before the first element.
    ///
    /// Unlike [`iter`](RbTree::iter), a cursor holds no borrow: each
    /// [`TreeCursor::next`] call takes the tree and revalidates the version
    /// captured here, failing with
    /// [`OrdenaError::ConcurrentModification`] if the tree mutated in
    /// between. Using a cursor with a tree other than the one that created
    /// it is a logic error and yields unspecified (but memory-safe)
    /// results.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::rb_tree::{DuplicatePolicy, RbTree};
    ///
    /// let mut tree = RbTree::new();
    /// tree.insert("a", DuplicatePolicy::DoNothing);
    ///
    /// let mut cursor = tree.cursor();
    /// assert_eq!(cursor.next(&tree).unwrap(), Some(&"a"));
    /// assert_eq!(cursor.next(&tree).unwrap(), None);
    ///
    /// let mut cursor = tree.cursor();
    /// tree.insert("b", DuplicatePolicy::DoNothing);
    /// assert!(cursor.next(&tree).is_err());
    /// ```
    pub fn cursor(&self) -> TreeCursor {
        let start = if self.root == NIL { NIL } else { self.subtree_min(self.root) };
        TreeCursor {
            next: start,
            version: self.version,
            reversed: false,
        }
    }

    /// Detached reverse cursor positioned before the last element.
    pub fn cursor_rev(&self) -> TreeCursor {
        let start = if self.root == NIL { NIL } else { self.subtree_max(self.root) };
        TreeCursor {
            next: start,
            version: self.version,
            reversed: true,
        }
    }

    // ---- crate-internal access for the map layer ----

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub(crate) fn item(&self, id: u32) -> &T {
        &self.node(id).item
    }

    #[inline]
    pub(crate) fn item_mut(&mut self, id: u32) -> &mut T {
        &mut self.nodes[id as usize].item
    }

    #[inline]
    pub(crate) fn node_slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Search with a caller-supplied ordering probe (`Less` = target sorts
    /// before the probed element). The probe must be monotone with respect
    /// to the tree's comparator order.
    pub(crate) fn find_index_by<F>(&self, probe: F) -> Option<u32>
    where
        F: Fn(&T) -> Ordering,
    {
        let mut cur = self.root;
        while cur != NIL {
            match probe(&self.node(cur).item) {
                Ordering::Less => cur = self.node(cur).left,
                Ordering::Greater => cur = self.node(cur).right,
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    pub(crate) fn find_by<F>(&self, probe: F) -> Option<&T>
    where
        F: Fn(&T) -> Ordering,
    {
        self.find_index_by(probe).map(|id| &self.node(id).item)
    }

    pub(crate) fn find_by_mut<F>(&mut self, probe: F) -> Option<&mut T>
    where
        F: Fn(&T) -> Ordering,
    {
        let id = self.find_index_by(probe)?;
        Some(self.item_mut(id))
    }

    pub(crate) fn delete_by<F>(&mut self, probe: F) -> Option<T>
    where
        F: Fn(&T) -> Ordering,
    {
        let id = self.find_index_by(probe)?;
        Some(self.delete_node(id))
    }

    pub(crate) fn first_in_range_index<F>(&self, tester: &F) -> Option<u32>
    where
        F: Fn(&T) -> RangePosition,
    {
        let id = self.first_in_range(tester);
        if id == NIL {
            None
        } else {
            Some(id)
        }
    }

    pub(crate) fn last_in_range_index<F>(&self, tester: &F) -> Option<u32>
    where
        F: Fn(&T) -> RangePosition,
    {
        let id = self.last_in_range(tester);
        if id == NIL {
            None
        } else {
            Some(id)
        }
    }

    pub(crate) fn first_index(&self) -> Option<u32> {
        if self.root == NIL {
            None
        } else {
            Some(self.subtree_min(self.root))
        }
    }

    pub(crate) fn last_index(&self) -> Option<u32> {
        if self.root == NIL {
            None
        } else {
            Some(self.subtree_max(self.root))
        }
    }

    #[inline]
    pub(crate) fn successor(&self, id: u32) -> u32 {
        successor_of(&self.nodes, id)
    }

    #[inline]
    pub(crate) fn predecessor(&self, id: u32) -> u32 {
        predecessor_of(&self.nodes, id)
    }

    // ---- node plumbing ----

    #[inline]
    fn node(&self, id: u32) -> &Node<T> {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: u32) -> &mut Node<T> {
        &mut self.nodes[id as usize]
    }

    #[inline]
    fn is_red(&self, id: u32) -> bool {
        id != NIL && self.node(id).color == Color::Red
    }

    #[inline]
    fn count_of(&self, id: u32) -> u32 {
        if id == NIL {
            0
        } else {
            self.node(id).count
        }
    }

    fn subtree_min(&self, mut id: u32) -> u32 {
        while self.node(id).left != NIL {
            id = self.node(id).left;
        }
        id
    }

    fn subtree_max(&self, mut id: u32) -> u32 {
        while self.node(id).right != NIL {
            id = self.node(id).right;
        }
        id
    }

    fn first_in_range<F>(&self, tester: &F) -> u32
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut cur = self.root;
        let mut candidate = NIL;
        while cur != NIL {
            match tester(&self.node(cur).item) {
                RangePosition::Below => cur = self.node(cur).right,
                RangePosition::Inside => {
                    candidate = cur;
                    cur = self.node(cur).left;
                }
                RangePosition::Above => cur = self.node(cur).left,
            }
        }
        candidate
    }

    fn last_in_range<F>(&self, tester: &F) -> u32
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut cur = self.root;
        let mut candidate = NIL;
        while cur != NIL {
            match tester(&self.node(cur).item) {
                RangePosition::Above => cur = self.node(cur).left,
                RangePosition::Inside => {
                    candidate = cur;
                    cur = self.node(cur).right;
                }
                RangePosition::Below => cur = self.node(cur).right,
            }
        }
        candidate
    }

    /// Count elements not `Below` in a subtree known to contain nothing
    /// `Above`.
    fn count_from_lower<F>(&self, mut id: u32, tester: &F) -> usize
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut total = 0usize;
        while id != NIL {
            match tester(&self.node(id).item) {
                RangePosition::Below => id = self.node(id).right,
                _ => {
                    total += 1 + self.count_of(self.node(id).right) as usize;
                    id = self.node(id).left;
                }
            }
        }
        total
    }

    /// Count elements not `Above` in a subtree known to contain nothing
    /// `Below`.
    fn count_to_upper<F>(&self, mut id: u32, tester: &F) -> usize
    where
        F: Fn(&T) -> RangePosition,
    {
        let mut total = 0usize;
        while id != NIL {
            match tester(&self.node(id).item) {
                RangePosition::Above => id = self.node(id).left,
                _ => {
                    total += 1 + self.count_of(self.node(id).left) as usize;
                    id = self.node(id).right;
                }
            }
        }
        total
    }

    #[inline]
    fn refresh_count(&mut self, id: u32) {
        let c = self.count_of(self.node(id).left) + self.count_of(self.node(id).right) + 1;
        self.node_mut(id).count = c;
    }

    fn rotate_left(&mut self, x: u32) {
        let y = self.node(x).right;
        let y_left = self.node(y).left;
        self.node_mut(x).right = y_left;
        if y_left != NIL {
            self.node_mut(y_left).parent = x;
        }
        let xp = self.node(x).parent;
        self.node_mut(y).parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.node(xp).left == x {
            self.node_mut(xp).left = y;
        } else {
            self.node_mut(xp).right = y;
        }
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
        // y now spans x's old subtree; x shrank to its new children.
        let span = self.node(x).count;
        self.node_mut(y).count = span;
        self.refresh_count(x);
    }

    fn rotate_right(&mut self, x: u32) {
        let y = self.node(x).left;
        let y_right = self.node(y).right;
        self.node_mut(x).left = y_right;
        if y_right != NIL {
            self.node_mut(y_right).parent = x;
        }
        let xp = self.node(x).parent;
        self.node_mut(y).parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.node(xp).left == x {
            self.node_mut(xp).left = y;
        } else {
            self.node_mut(xp).right = y;
        }
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;
        let span = self.node(x).count;
        self.node_mut(y).count = span;
        self.refresh_count(x);
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v` in u's
    /// parent (or at the root).
    fn transplant(&mut self, u: u32, v: u32) {
        let up = self.node(u).parent;
        if up == NIL {
            self.root = v;
        } else if self.node(up).left == u {
            self.node_mut(up).left = v;
        } else {
            self.node_mut(up).right = v;
        }
        if v != NIL {
            self.node_mut(v).parent = up;
        }
    }

    fn alloc(&mut self, item: T, parent: u32) -> u32 {
        assert!(self.nodes.len() < NIL as usize, "red-black tree arena is full");
        let id = self.nodes.len() as u32;
        self.nodes.push(Node {
            item,
            parent,
            left: NIL,
            right: NIL,
            color: Color::Red,
            count: 1,
        });
        id
    }

    /// Release node `id`'s arena slot, relocating the last slot into the
    /// hole. The node must already be unlinked from the tree.
    fn release(&mut self, id: u32) -> T {
        let last = (self.nodes.len() - 1) as u32;
        let node = self.nodes.swap_remove(id as usize);
        if id != last {
            // The node formerly at `last` now lives at `id`; repoint its
            // neighbors.
            let (p, l, r) = {
                let moved = &self.nodes[id as usize];
                (moved.parent, moved.left, moved.right)
            };
            if p == NIL {
                self.root = id;
            } else if self.node(p).left == last {
                self.node_mut(p).left = id;
            } else {
                self.node_mut(p).right = id;
            }
            if l != NIL {
                self.node_mut(l).parent = id;
            }
            if r != NIL {
                self.node_mut(r).parent = id;
            }
        }
        node.item
    }

    fn insert_fixup(&mut self, mut z: u32) {
        while self.is_red(self.node(z).parent) {
            let p = self.node(z).parent;
            // p is red, so it cannot be the root and the grandparent exists.
            let g = self.node(p).parent;
            if p == self.node(g).left {
                let uncle = self.node(g).right;
                if self.is_red(uncle) {
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    z = g;
                } else {
                    if z == self.node(p).right {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p2 = self.node(z).parent;
                    let g2 = self.node(p2).parent;
                    self.node_mut(p2).color = Color::Black;
                    self.node_mut(g2).color = Color::Red;
                    self.rotate_right(g2);
                }
            } else {
                let uncle = self.node(g).left;
                if self.is_red(uncle) {
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    z = g;
                } else {
                    if z == self.node(p).left {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p2 = self.node(z).parent;
                    let g2 = self.node(p2).parent;
                    self.node_mut(p2).color = Color::Black;
                    self.node_mut(g2).color = Color::Red;
                    self.rotate_left(g2);
                }
            }
        }
        let root = self.root;
        self.node_mut(root).color = Color::Black;
    }

    /// Unlink and release node `z`, rebalancing afterwards. Bumps the
    /// version.
    pub(crate) fn delete_node(&mut self, z: u32) -> T {
        // y is the node physically spliced out (it has at most one child);
        // x is y's single child and x_parent its parent after the splice.
        let mut y = z;
        if self.node(z).left != NIL && self.node(z).right != NIL {
            y = self.subtree_min(self.node(z).right);
        }

        // Every proper ancestor of y loses exactly one element.
        let mut a = self.node(y).parent;
        while a != NIL {
            self.node_mut(a).count -= 1;
            a = self.node(a).parent;
        }

        let y_color = self.node(y).color;
        let x;
        let mut x_parent;

        if y == z {
            x = if self.node(z).left != NIL {
                self.node(z).left
            } else {
                self.node(z).right
            };
            x_parent = self.node(z).parent;
            self.transplant(z, x);
        } else {
            x = self.node(y).right;
            if self.node(y).parent == z {
                x_parent = y;
            } else {
                x_parent = self.node(y).parent;
                self.transplant(y, x);
                let zr = self.node(z).right;
                self.node_mut(y).right = zr;
                self.node_mut(zr).parent = y;
            }
            self.transplant(z, y);
            let zl = self.node(z).left;
            self.node_mut(y).left = zl;
            if zl != NIL {
                self.node_mut(zl).parent = y;
            }
            let z_color = self.node(z).color;
            self.node_mut(y).color = z_color;
            self.refresh_count(y);
        }

        if y_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }

        self.version = self.version.wrapping_add(1);
        self.release(z)
    }

    fn delete_fixup(&mut self, mut x: u32, mut x_parent: u32) {
        while x != self.root && !self.is_red(x) {
            if self.node(x_parent).left == x {
                // The sibling is a real node: x is doubly black, so the
                // other side of x_parent carries at least one black node.
                let mut w = self.node(x_parent).right;
                if self.is_red(w) {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(x_parent).color = Color::Red;
                    self.rotate_left(x_parent);
                    w = self.node(x_parent).right;
                }
                if !self.is_red(self.node(w).left) && !self.is_red(self.node(w).right) {
                    self.node_mut(w).color = Color::Red;
                    x = x_parent;
                    x_parent = self.node(x).parent;
                } else {
                    if !self.is_red(self.node(w).right) {
                        let wl = self.node(w).left;
                        if wl != NIL {
                            self.node_mut(wl).color = Color::Black;
                        }
                        self.node_mut(w).color = Color::Red;
                        self.rotate_right(w);
                        w = self.node(x_parent).right;
                    }
                    let pc = self.node(x_parent).color;
                    self.node_mut(w).color = pc;
                    self.node_mut(x_parent).color = Color::Black;
                    let wr = self.node(w).right;
                    if wr != NIL {
                        self.node_mut(wr).color = Color::Black;
                    }
                    self.rotate_left(x_parent);
                    x = self.root;
                    break;
                }
            } else {
                let mut w = self.node(x_parent).left;
                if self.is_red(w) {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(x_parent).color = Color::Red;
                    self.rotate_right(x_parent);
                    w = self.node(x_parent).left;
                }
                if !self.is_red(self.node(w).left) && !self.is_red(self.node(w).right) {
                    self.node_mut(w).color = Color::Red;
                    x = x_parent;
                    x_parent = self.node(x).parent;
                } else {
                    if !self.is_red(self.node(w).left) {
                        let wr = self.node(w).right;
                        if wr != NIL {
                            self.node_mut(wr).color = Color::Black;
                        }
                        self.node_mut(w).color = Color::Red;
                        self.rotate_left(w);
                        w = self.node(x_parent).left;
                    }
                    let pc = self.node(x_parent).color;
                    self.node_mut(w).color = pc;
                    self.node_mut(x_parent).color = Color::Black;
                    let wl = self.node(w).left;
                    if wl != NIL {
                        self.node_mut(wl).color = Color::Black;
                    }
                    self.rotate_right(x_parent);
                    x = self.root;
                    break;
                }
            }
        }
        if x != NIL {
            self.node_mut(x).color = Color::Black;
        }
    }
}

impl<T, C: Comparator<T>> RbTree<T, C> {
    /// Insert an element under the given duplicate policy.
    ///
    /// Returns [`InsertOutcome::Added`] when no equal element existed.
    /// Otherwise the policy decides: `DoNothing` leaves the tree untouched
    /// and hands the offered element back as
    /// [`Rejected`](InsertOutcome::Rejected); `ReplaceLast` overwrites and
    /// returns the previous element as [`Replaced`](InsertOutcome::Replaced).
    /// O(log n).
    pub fn insert(&mut self, item: T, policy: DuplicatePolicy) -> InsertOutcome<T> {
        self.insert_indexed(item, policy).0
    }

    /// Insert, additionally reporting the arena index of the affected node
    /// (new, replaced, or rejected-against). Lets the map layer finish an
    /// upsert-or-read in a single descent.
    pub(crate) fn insert_indexed(
        &mut self,
        item: T,
        policy: DuplicatePolicy,
    ) -> (InsertOutcome<T>, u32) {
        let mut parent = NIL;
        let mut went_left = false;
        let mut cur = self.root;
        while cur != NIL {
            match self.comparator.compare(&item, &self.node(cur).item) {
                Ordering::Less => {
                    parent = cur;
                    went_left = true;
                    cur = self.node(cur).left;
                }
                Ordering::Greater => {
                    parent = cur;
                    went_left = false;
                    cur = self.node(cur).right;
                }
                Ordering::Equal => {
                    return match policy {
                        DuplicatePolicy::DoNothing => (InsertOutcome::Rejected(item), cur),
                        DuplicatePolicy::ReplaceLast => {
                            let old = std::mem::replace(&mut self.node_mut(cur).item, item);
                            self.version = self.version.wrapping_add(1);
                            (InsertOutcome::Replaced(old), cur)
                        }
                    };
                }
            }
        }

        let id = self.alloc(item, parent);
        if parent == NIL {
            self.root = id;
        } else if went_left {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }

        let mut a = parent;
        while a != NIL {
            self.node_mut(a).count += 1;
            a = self.node(a).parent;
        }

        self.insert_fixup(id);
        self.version = self.version.wrapping_add(1);
        (InsertOutcome::Added, id)
    }

    /// Remove the element comparing equal to `item`, returning it.
    /// O(log n).
    pub fn delete(&mut self, item: &T) -> Option<T> {
        let id = self.find_index(item)?;
        Some(self.delete_node(id))
    }

    /// Borrow the element comparing equal to `item`.
    pub fn find(&self, item: &T) -> Option<&T> {
        self.find_index(item).map(|id| &self.node(id).item)
    }

    /// Returns `true` if an element comparing equal to `item` exists.
    pub fn contains(&self, item: &T) -> bool {
        self.find_index(item).is_some()
    }

    /// The smallest element `>= item`, or `None` if every element is
    /// smaller. This is the inexact lookup the range boundaries use.
    pub fn ceiling(&self, item: &T) -> Option<&T> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            match self.comparator.compare(item, &self.node(cur).item) {
                Ordering::Less => {
                    best = cur;
                    cur = self.node(cur).left;
                }
                Ordering::Equal => return Some(&self.node(cur).item),
                Ordering::Greater => cur = self.node(cur).right,
            }
        }
        if best == NIL {
            None
        } else {
            Some(&self.node(best).item)
        }
    }

    /// The largest element `<= item`, or `None` if every element is larger.
    pub fn floor(&self, item: &T) -> Option<&T> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            match self.comparator.compare(item, &self.node(cur).item) {
                Ordering::Greater => {
                    best = cur;
                    cur = self.node(cur).right;
                }
                Ordering::Equal => return Some(&self.node(cur).item),
                Ordering::Less => cur = self.node(cur).left,
            }
        }
        if best == NIL {
            None
        } else {
            Some(&self.node(best).item)
        }
    }

    fn find_index(&self, item: &T) -> Option<u32> {
        let mut cur = self.root;
        while cur != NIL {
            match self.comparator.compare(item, &self.node(cur).item) {
                Ordering::Less => cur = self.node(cur).left,
                Ordering::Greater => cur = self.node(cur).right,
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    /// Verify every structural invariant, panicking with a description of
    /// the first violation found. Intended for tests and debugging.
    ///
    /// Checked: root blackness, no red node with a red child, equal black
    /// height on every root-to-leaf path, parent back-links, subtree
    /// counts, and strictly ascending in-order traversal.
    pub fn check_invariants(&self) {
        if self.root != NIL {
            assert_eq!(self.node(self.root).parent, NIL, "root has a parent");
            assert_eq!(self.node(self.root).color, Color::Black, "root is red");
        }
        let (total, _) = self.check_subtree(self.root);
        assert_eq!(total, self.len(), "reachable node count != arena length");

        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for item in iter {
                assert_eq!(
                    self.comparator.compare(prev, item),
                    Ordering::Less,
                    "in-order traversal is not strictly ascending"
                );
                prev = item;
            }
        }
    }

    fn check_subtree(&self, id: u32) -> (usize, usize) {
        if id == NIL {
            return (0, 1);
        }
        let node = self.node(id);
        if node.color == Color::Red {
            assert!(!self.is_red(node.left), "red node {id} has a red left child");
            assert!(!self.is_red(node.right), "red node {id} has a red right child");
        }
        if node.left != NIL {
            assert_eq!(self.node(node.left).parent, id, "left child parent link broken");
        }
        if node.right != NIL {
            assert_eq!(self.node(node.right).parent, id, "right child parent link broken");
        }
        let (lc, lbh) = self.check_subtree(node.left);
        let (rc, rbh) = self.check_subtree(node.right);
        assert_eq!(lbh, rbh, "black height differs between children of {id}");
        assert_eq!(
            node.count as usize,
            lc + rc + 1,
            "stale subtree count at {id}"
        );
        let bh = lbh + usize::from(node.color == Color::Black);
        (lc + rc + 1, bh)
    }
}

impl<T, C: Default> Default for RbTree<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for RbTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C> PartialEq for RbTree<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for RbTree<T, C> {}

impl<T: Ord> FromIterator<T> for RbTree<T, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = RbTree::new();
        for item in iter {
            tree.insert(item, DuplicatePolicy::ReplaceLast);
        }
        tree
    }
}

impl<'a, T, C> IntoIterator for &'a RbTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

fn successor_of<T>(nodes: &[Node<T>], id: u32) -> u32 {
    let right = nodes[id as usize].right;
    if right != NIL {
        let mut cur = right;
        loop {
            let left = nodes[cur as usize].left;
            if left == NIL {
                return cur;
            }
            cur = left;
        }
    }
    let mut cur = id;
    let mut p = nodes[cur as usize].parent;
    while p != NIL && nodes[p as usize].right == cur {
        cur = p;
        p = nodes[p as usize].parent;
    }
    p
}

fn predecessor_of<T>(nodes: &[Node<T>], id: u32) -> u32 {
    let left = nodes[id as usize].left;
    if left != NIL {
        let mut cur = left;
        loop {
            let right = nodes[cur as usize].right;
            if right == NIL {
                return cur;
            }
            cur = right;
        }
    }
    let mut cur = id;
    let mut p = nodes[cur as usize].parent;
    while p != NIL && nodes[p as usize].left == cur {
        cur = p;
        p = nodes[p as usize].parent;
    }
    p
}

/// In-order borrowing iterator over an [`RbTree`].
pub struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    next: u32,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next == NIL {
            return None;
        }
        let id = self.next;
        self.next = successor_of(self.nodes, id);
        self.remaining -= 1;
        Some(&self.nodes[id as usize].item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Reverse in-order borrowing iterator over an [`RbTree`].
pub struct RevIter<'a, T> {
    nodes: &'a [Node<T>],
    next: u32,
    remaining: usize,
}

impl<'a, T> Iterator for RevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next == NIL {
            return None;
        }
        let id = self.next;
        self.next = predecessor_of(self.nodes, id);
        self.remaining -= 1;
        Some(&self.nodes[id as usize].item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RevIter<'_, T> {}

/// In-order iterator over the elements inside a range.
pub struct RangeIter<'a, T, F> {
    nodes: &'a [Node<T>],
    next: u32,
    tester: F,
}

impl<'a, T, F> Iterator for RangeIter<'a, T, F>
where
    F: Fn(&T) -> RangePosition,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if self.next == NIL {
                return None;
            }
            let id = self.next;
            self.next = successor_of(self.nodes, id);
            let item = &self.nodes[id as usize].item;
            match (self.tester)(item) {
                RangePosition::Inside => return Some(item),
                RangePosition::Above => {
                    self.next = NIL;
                    return None;
                }
                RangePosition::Below => continue,
            }
        }
    }
}

/// Reverse in-order iterator over the elements inside a range.
pub struct RevRangeIter<'a, T, F> {
    nodes: &'a [Node<T>],
    next: u32,
    tester: F,
}

impl<'a, T, F> Iterator for RevRangeIter<'a, T, F>
where
    F: Fn(&T) -> RangePosition,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if self.next == NIL {
                return None;
            }
            let id = self.next;
            self.next = predecessor_of(self.nodes, id);
            let item = &self.nodes[id as usize].item;
            match (self.tester)(item) {
                RangePosition::Inside => return Some(item),
                RangePosition::Below => {
                    self.next = NIL;
                    return None;
                }
                RangePosition::Above => continue,
            }
        }
    }
}

/// Detached, version-stamped cursor over an [`RbTree`].
///
/// Created by [`RbTree::cursor`] / [`RbTree::cursor_rev`]. Holds no borrow
/// of the tree; every advance revalidates the version captured at creation.
#[derive(Debug, Clone)]
pub struct TreeCursor {
    next: u32,
    version: u64,
    reversed: bool,
}

impl TreeCursor {
    /// Advance to the next element in the cursor's direction.
    ///
    /// # Errors
    ///
    /// Returns [`OrdenaError::ConcurrentModification`] if the tree was
    /// structurally modified (or its enumerations stopped) after this
    /// cursor was created.
    pub fn next<'a, T, C>(&mut self, tree: &'a RbTree<T, C>) -> Result<Option<&'a T>> {
        if self.version != tree.version {
            return Err(OrdenaError::concurrent_modification(
                "tree modified during cursor enumeration",
            ));
        }
        if self.next == NIL {
            return Ok(None);
        }
        if self.next as usize >= tree.node_slot_count() {
            return Err(OrdenaError::concurrent_modification(
                "cursor does not belong to this tree",
            ));
        }
        let id = self.next;
        self.next = if self.reversed {
            tree.predecessor(id)
        } else {
            tree.successor(id)
        };
        Ok(Some(tree.item(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ReverseOrder;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn tree_of(items: &[i32]) -> RbTree<i32> {
        let mut tree = RbTree::new();
        for &k in items {
            tree.insert(k, DuplicatePolicy::DoNothing);
        }
        tree
    }

    fn between(lo: i32, hi: i32) -> impl Fn(&i32) -> RangePosition + Copy {
        move |k: &i32| {
            if *k < lo {
                RangePosition::Below
            } else if *k > hi {
                RangePosition::Above
            } else {
                RangePosition::Inside
            }
        }
    }

    #[test]
    fn test_insert_and_find() {
        let tree = tree_of(&[5, 2, 8, 1, 9]);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.find(&8), Some(&8));
        assert_eq!(tree.find(&7), None);
        assert!(tree.contains(&1));
        assert!(!tree.contains(&0));
    }

    #[test]
    fn test_duplicate_policies() {
        // Key on the first tuple field so differing payloads count as
        // duplicates.
        let mut tree = RbTree::with_comparator(crate::compare::FnComparator::new(
            |a: &(i32, &str), b: &(i32, &str)| a.0.cmp(&b.0),
        ));
        assert_eq!(tree.insert((1, "a"), DuplicatePolicy::DoNothing), InsertOutcome::Added);
        assert_eq!(
            tree.insert((1, "b"), DuplicatePolicy::DoNothing),
            InsertOutcome::Rejected((1, "b"))
        );
        assert_eq!(
            tree.insert((1, "c"), DuplicatePolicy::ReplaceLast),
            InsertOutcome::Replaced((1, "a"))
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.iter().next(), Some(&(1, "c")));
    }

    #[test]
    fn test_sorted_iteration() {
        let mut tree = RbTree::new();
        let mut keys: Vec<i32> = (0..100).collect();
        // Deterministic shuffle.
        let mut rng = SmallRng::seed_from_u64(7);
        for i in (1..keys.len()).rev() {
            keys.swap(i, rng.gen_range(0..=i));
        }
        for k in keys {
            tree.insert(k, DuplicatePolicy::DoNothing);
        }
        let seen: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        let rev: Vec<i32> = tree.iter_rev().copied().collect();
        assert_eq!(rev, (0..100).rev().collect::<Vec<_>>());
        tree.check_invariants();
    }

    #[test]
    fn test_delete_all_shapes() {
        // Covers leaf, one-child, and two-child deletions.
        let mut tree = tree_of(&[50, 25, 75, 10, 30, 60, 90, 5, 28, 35]);
        for k in [50, 10, 90, 25, 5, 35, 75, 30, 60, 28] {
            assert_eq!(tree.delete(&k), Some(k), "failed deleting {k}");
            tree.check_invariants();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.delete(&50), None);
    }

    #[test]
    fn test_first_last_ceiling_floor() {
        let tree = tree_of(&[10, 20, 30]);
        assert_eq!(tree.first(), Some(&10));
        assert_eq!(tree.last(), Some(&30));
        assert_eq!(tree.ceiling(&15), Some(&20));
        assert_eq!(tree.ceiling(&20), Some(&20));
        assert_eq!(tree.ceiling(&31), None);
        assert_eq!(tree.floor(&15), Some(&10));
        assert_eq!(tree.floor(&10), Some(&10));
        assert_eq!(tree.floor(&9), None);

        let empty: RbTree<i32> = RbTree::new();
        assert_eq!(empty.first(), None);
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn test_range_iteration() {
        let tree = tree_of(&[1, 3, 5, 7, 9, 11]);
        let inside: Vec<i32> = tree.iter_range(between(4, 9)).copied().collect();
        assert_eq!(inside, vec![5, 7, 9]);
        let inside_rev: Vec<i32> = tree.iter_range_rev(between(4, 9)).copied().collect();
        assert_eq!(inside_rev, vec![9, 7, 5]);
        let none: Vec<i32> = tree.iter_range(between(100, 200)).copied().collect();
        assert!(none.is_empty());
        let all: Vec<i32> = tree.iter_range(between(i32::MIN, i32::MAX)).copied().collect();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_count_range_matches_scan() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut tree = RbTree::new();
        for _ in 0..500 {
            tree.insert(rng.gen_range(0..1000), DuplicatePolicy::DoNothing);
        }
        for _ in 0..100 {
            let a = rng.gen_range(0..1000);
            let b = rng.gen_range(0..1000);
            let (lo, hi) = (a.min(b), a.max(b));
            let tester = between(lo, hi);
            let counted = tree.count_range(tester);
            let scanned = tree.iter().filter(|k| tester(k) == RangePosition::Inside).count();
            assert_eq!(counted, scanned, "range [{lo}, {hi}]");
        }
    }

    #[test]
    fn test_delete_range() {
        let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let removed = tree.delete_range(between(3, 6));
        assert_eq!(removed, 4);
        let left: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(left, vec![1, 2, 7, 8]);
        tree.check_invariants();
        assert_eq!(tree.delete_range(between(100, 200)), 0);
    }

    #[test]
    fn test_cursor_walks_and_fails_fast() {
        let mut tree = tree_of(&[2, 1, 3]);
        let mut cursor = tree.cursor();
        assert_eq!(cursor.next(&tree).unwrap(), Some(&1));
        assert_eq!(cursor.next(&tree).unwrap(), Some(&2));
        assert_eq!(cursor.next(&tree).unwrap(), Some(&3));
        assert_eq!(cursor.next(&tree).unwrap(), None);

        let mut cursor = tree.cursor();
        assert_eq!(cursor.next(&tree).unwrap(), Some(&1));
        tree.insert(4, DuplicatePolicy::DoNothing);
        let err = cursor.next(&tree).unwrap_err();
        assert_eq!(err.category(), "concurrency");
        assert!(!err.is_recoverable());

        let mut rev = tree.cursor_rev();
        assert_eq!(rev.next(&tree).unwrap(), Some(&4));
        tree.stop_enumerations();
        assert!(rev.next(&tree).is_err());
    }

    #[test]
    fn test_rejected_insert_keeps_cursors_valid() {
        let mut tree = tree_of(&[1, 2]);
        let mut cursor = tree.cursor();
        assert_eq!(
            tree.insert(1, DuplicatePolicy::DoNothing),
            InsertOutcome::Rejected(1)
        );
        // Nothing changed, so the cursor is still good.
        assert_eq!(cursor.next(&tree).unwrap(), Some(&1));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut tree = tree_of(&[1, 2, 3]);
        let snapshot = tree.clone();
        tree.delete(&2);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(tree.len(), 2);
        assert_eq!(snapshot.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        snapshot.check_invariants();
    }

    #[test]
    fn test_equality() {
        let a = tree_of(&[3, 1, 2]);
        let b = tree_of(&[2, 3, 1]);
        assert_eq!(a, b);
        let c = tree_of(&[1, 2]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_clear_and_stop_enumerations() {
        let mut tree = tree_of(&[1, 2, 3]);
        let mut cursor = tree.cursor();
        tree.clear();
        assert!(tree.is_empty());
        assert!(cursor.next(&tree).is_err());
        // Reusable after clear.
        tree.insert(9, DuplicatePolicy::DoNothing);
        assert_eq!(tree.first(), Some(&9));
    }

    #[test]
    fn test_randomized_invariants() {
        let mut rng = SmallRng::seed_from_u64(1234);
        let mut tree = RbTree::new();
        let mut model = std::collections::BTreeSet::new();
        for step in 0..4000 {
            let k = rng.gen_range(0..600);
            if rng.gen_bool(0.6) {
                tree.insert(k, DuplicatePolicy::DoNothing);
                model.insert(k);
            } else {
                assert_eq!(tree.delete(&k).is_some(), model.remove(&k));
            }
            if step % 257 == 0 {
                tree.check_invariants();
                assert_eq!(tree.len(), model.len());
            }
        }
        tree.check_invariants();
        let ours: Vec<i32> = tree.iter().copied().collect();
        let theirs: Vec<i32> = model.iter().copied().collect();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn test_reverse_comparator() {
        let mut tree = RbTree::with_comparator(ReverseOrder::new(NaturalOrder));
        for k in [5, 1, 3] {
            tree.insert(k, DuplicatePolicy::DoNothing);
        }
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![5, 3, 1]);
        assert_eq!(tree.first(), Some(&5));
        assert_eq!(tree.last(), Some(&1));
        tree.check_invariants();
    }
}
