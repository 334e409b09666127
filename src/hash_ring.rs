//! Consistent-hash ring
//!
//! [`HashRing`] places members on a circle of `u32` hash positions and
//! answers "who is responsible for this hash" by walking clockwise: the
//! first member at or past the queried position owns it, wrapping to the
//! first member on the ring when the query lies past them all.
//!
//! The ring is the one internally locked structure in this crate: all
//! operations take `&self` and synchronize on a [`parking_lot::Mutex`], so
//! a ring can be shared across threads (membership changes race with
//! lookups in arbitrary order, which is the intended model).

use std::fmt;

use parking_lot::Mutex;

use crate::jenkins;

/// A member that can be placed on a [`HashRing`].
///
/// `uniform_hash` must be stable for the lifetime of the member and should
/// be uniformly distributed over `u32` (hash an identifier with
/// [`jenkins::hash_bytes`] rather than inventing positions). Equality
/// decides membership for [`add`](HashRing::add) and
/// [`remove`](HashRing::remove); two distinct members may share a hash
/// position.
pub trait RingMember: PartialEq {
    /// This member's fixed position on the ring.
    fn uniform_hash(&self) -> u32;
}

/// A thread-safe ring of members sorted by their uniform hash.
///
/// # Examples
///
/// ```
/// use ordena::{HashRing, RingMember};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Silo(&'static str);
///
/// impl RingMember for Silo {
///     fn uniform_hash(&self) -> u32 {
///         ordena::jenkins::hash_str(self.0)
///     }
/// }
///
/// let ring = HashRing::new();
/// ring.add(Silo("silo-a"));
/// ring.add(Silo("silo-b"));
///
/// let owner = ring.responsible_for_key(b"grain-17").unwrap();
/// assert!(ring.members().contains(&owner));
/// ```
pub struct HashRing<T> {
    ring: Mutex<Vec<T>>,
}

impl<T> HashRing<T> {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(Vec::new()),
        }
    }

    /// Number of members on the ring.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Returns `true` if the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }
}

impl<T: RingMember> HashRing<T> {
    /// Add a member, keeping the ring sorted by hash.
    ///
    /// Returns `false` without touching the ring when an equal member is
    /// already present. A new member lands before any existing members that
    /// share its hash position.
    pub fn add(&self, member: T) -> bool {
        let mut ring = self.ring.lock();
        if ring.contains(&member) {
            return false;
        }
        let hash = member.uniform_hash();
        let index = ring.partition_point(|m| m.uniform_hash() < hash);
        ring.insert(index, member);
        log::debug!(
            "ring member added at {:#010x}, {} member(s) on ring",
            hash,
            ring.len()
        );
        true
    }

    /// Remove the member equal to `member`.
    ///
    /// Returns `false` when no such member is on the ring.
    pub fn remove(&self, member: &T) -> bool {
        let mut ring = self.ring.lock();
        match ring.iter().position(|m| m == member) {
            Some(index) => {
                let removed = ring.remove(index);
                log::debug!(
                    "ring member removed from {:#010x}, {} member(s) on ring",
                    removed.uniform_hash(),
                    ring.len()
                );
                true
            }
            None => false,
        }
    }

    /// The member responsible for `hash`: the first member clockwise at or
    /// past it, wrapping to the ring's first member. `None` on an empty
    /// ring.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordena::{HashRing, RingMember};
    ///
    /// #[derive(Debug, Clone, PartialEq)]
    /// struct At(u32);
    /// impl RingMember for At {
    ///     fn uniform_hash(&self) -> u32 {
    ///         self.0
    ///     }
    /// }
    ///
    /// let ring: HashRing<At> = [At(10), At(50), At(90)].into_iter().collect();
    /// assert_eq!(ring.responsible_for(30), Some(At(50)));
    /// assert_eq!(ring.responsible_for(95), Some(At(10)));
    /// ```
    pub fn responsible_for(&self, hash: u32) -> Option<T>
    where
        T: Clone,
    {
        let ring = self.ring.lock();
        if ring.is_empty() {
            return None;
        }
        let index = ring.partition_point(|m| m.uniform_hash() < hash);
        if index == ring.len() {
            // Past every member: the ring wraps around to the first one.
            ring.first().cloned()
        } else {
            Some(ring[index].clone())
        }
    }

    /// The member responsible for a key, placed via
    /// [`jenkins::hash_bytes`].
    pub fn responsible_for_key(&self, key: &[u8]) -> Option<T>
    where
        T: Clone,
    {
        self.responsible_for(jenkins::hash_bytes(key))
    }

    /// A snapshot of the members in ascending hash order.
    pub fn members(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.ring.lock().clone()
    }
}

impl<T> Default for HashRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RingMember> FromIterator<T> for HashRing<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let ring = HashRing::new();
        for member in iter {
            ring.add(member);
        }
        ring
    }
}

impl<T: RingMember + fmt::Debug> fmt::Debug for HashRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.lock();
        f.debug_list()
            .entries(
                ring.iter()
                    .map(|m| format!("{:?}/{:#010x}", m, m.uniform_hash())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Silo {
        name: &'static str,
        hash: u32,
    }

    impl Silo {
        fn at(name: &'static str, hash: u32) -> Self {
            Self { name, hash }
        }
    }

    impl RingMember for Silo {
        fn uniform_hash(&self) -> u32 {
            self.hash
        }
    }

    fn three_member_ring() -> HashRing<Silo> {
        [
            Silo::at("a", 50),
            Silo::at("b", 10),
            Silo::at("c", 90),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_members_sorted_by_hash() {
        let ring = three_member_ring();
        let names: Vec<&str> = ring.members().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(ring.len(), 3);
        assert!(!ring.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates_silently() {
        let ring = three_member_ring();
        assert!(!ring.add(Silo::at("a", 50)));
        assert_eq!(ring.len(), 3);
        // Same position, different member: accepted.
        assert!(ring.add(Silo::at("a2", 50)));
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_responsible_for_clockwise() {
        let ring = three_member_ring();
        assert_eq!(ring.responsible_for(10).unwrap().name, "b");
        assert_eq!(ring.responsible_for(11).unwrap().name, "a");
        assert_eq!(ring.responsible_for(30).unwrap().name, "a");
        assert_eq!(ring.responsible_for(50).unwrap().name, "a");
        assert_eq!(ring.responsible_for(90).unwrap().name, "c");
        assert_eq!(ring.responsible_for(0).unwrap().name, "b");
    }

    #[test]
    fn test_responsible_for_wraps_around() {
        let ring = three_member_ring();
        assert_eq!(ring.responsible_for(91).unwrap().name, "b");
        assert_eq!(ring.responsible_for(95).unwrap().name, "b");
        assert_eq!(ring.responsible_for(u32::MAX).unwrap().name, "b");
    }

    #[test]
    fn test_empty_ring() {
        let ring: HashRing<Silo> = HashRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.responsible_for(123), None);
        assert_eq!(ring.responsible_for_key(b"anything"), None);
        assert!(ring.members().is_empty());
    }

    #[test]
    fn test_remove() {
        let ring = three_member_ring();
        assert!(ring.remove(&Silo::at("a", 50)));
        assert!(!ring.remove(&Silo::at("a", 50)));
        assert_eq!(ring.len(), 2);
        // Ownership of the removed arc moves clockwise.
        assert_eq!(ring.responsible_for(30).unwrap().name, "c");
        let names: Vec<&str> = ring.members().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_responsible_for_key_is_stable() {
        let ring = three_member_ring();
        let first = ring.responsible_for_key(b"grain-17").unwrap();
        let second = ring.responsible_for_key(b"grain-17").unwrap();
        assert_eq!(first, second);
        assert!(ring.members().contains(&first));

        let solo: HashRing<Silo> = [Silo::at("only", 7)].into_iter().collect();
        assert_eq!(solo.responsible_for_key(b"anything").unwrap().name, "only");
    }

    #[test]
    fn test_single_member_owns_everything() {
        let ring: HashRing<Silo> = [Silo::at("only", 1000)].into_iter().collect();
        for hash in [0, 999, 1000, 1001, u32::MAX] {
            assert_eq!(ring.responsible_for(hash).unwrap().name, "only");
        }
    }

    #[test]
    fn test_debug_shows_positions() {
        let ring: HashRing<Silo> = [Silo::at("a", 0x10)].into_iter().collect();
        let rendered = format!("{:?}", ring);
        assert!(rendered.contains("0x00000010"), "got {rendered}");
    }
}
