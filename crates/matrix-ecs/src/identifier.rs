//! Sparse/dense identifier sets.
//!
//! An [`IdentifierAllocator`] tracks which ids in `0..capacity` are in use.
//! It keeps two arrays:
//!
//! - `sparse[id]`: position of `id` inside `dense` (garbage when absent)
//! - `dense[..len]`: the occupied ids, packed
//!
//! Membership is `sparse[id] < len && dense[sparse[id]] == id`, so neither
//! array needs clearing on delete. Removal swaps the last dense slot into the
//! hole, which reorders enumeration.

use std::fmt;

/// Backing array whose element width is chosen from the declared capacity.
///
/// Every stored value (an id or a dense position) is `< capacity`, so a
/// capacity of 256 fits in `u8` and 65536 in `u16`.
#[derive(Clone)]
enum Lanes {
    Narrow(Vec<u8>),
    Medium(Vec<u16>),
    Wide(Vec<u32>),
}

impl Lanes {
    fn for_capacity(capacity: usize) -> Self {
        if capacity <= usize::from(u8::MAX) + 1 {
            Self::Narrow(vec![0; capacity])
        } else if capacity <= usize::from(u16::MAX) + 1 {
            Self::Medium(vec![0; capacity])
        } else {
            Self::Wide(vec![0; capacity])
        }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        match self {
            Self::Narrow(lanes) => usize::from(lanes[index]),
            Self::Medium(lanes) => usize::from(lanes[index]),
            Self::Wide(lanes) => lanes[index] as usize,
        }
    }

    #[inline]
    fn set(&mut self, index: usize, value: usize) {
        match self {
            Self::Narrow(lanes) => lanes[index] = value as u8,
            Self::Medium(lanes) => lanes[index] = value as u16,
            Self::Wide(lanes) => lanes[index] = value as u32,
        }
    }

    const fn width(&self) -> usize {
        match self {
            Self::Narrow(_) => 1,
            Self::Medium(_) => 2,
            Self::Wide(_) => 4,
        }
    }
}

/// Fixed-capacity set of small integer ids with O(1) insert, delete and
/// membership, plus dense enumeration.
#[derive(Clone)]
pub struct IdentifierAllocator {
    /// Number of addressable ids.
    capacity: usize,
    /// Number of occupied ids.
    len: usize,
    /// Every id below the cursor is occupied.
    cursor: usize,
    sparse: Lanes,
    dense: Lanes,
}

impl IdentifierAllocator {
    /// Create an empty allocator over `0..capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity <= u32::MAX as usize,
            "identifier capacity must fit in u32"
        );
        Self {
            capacity,
            len: 0,
            cursor: 0,
            sparse: Lanes::for_capacity(capacity),
            dense: Lanes::for_capacity(capacity),
        }
    }

    /// Number of addressable ids.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied ids.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every id is occupied.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Bytes per stored id (1, 2 or 4).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.dense.width()
    }

    /// Check if `id` is occupied. Ids outside the capacity never are.
    #[inline]
    #[must_use]
    pub fn has(&self, id: usize) -> bool {
        if id >= self.capacity {
            return false;
        }
        let slot = self.sparse.get(id);
        slot < self.len && self.dense.get(slot) == id
    }

    /// Mark `id` as occupied.
    ///
    /// Returns `true` if the id was newly inserted, `false` if it was already
    /// present or lies outside the capacity.
    pub fn add(&mut self, id: usize) -> bool {
        if id >= self.capacity || self.has(id) {
            return false;
        }
        self.dense.set(self.len, id);
        self.sparse.set(id, self.len);
        self.len += 1;
        true
    }

    /// Free `id`, moving the last dense entry into its slot.
    ///
    /// Returns `true` if the id was present.
    pub fn delete(&mut self, id: usize) -> bool {
        if !self.has(id) {
            return false;
        }

        let slot = self.sparse.get(id);
        let last = self.len - 1;
        let moved = self.dense.get(last);

        self.dense.set(slot, moved);
        self.sparse.set(moved, slot);
        self.len = last;

        if id < self.cursor {
            self.cursor = id;
        }
        true
    }

    /// Smallest free id, or `None` when full.
    ///
    /// Does not reserve the id; call [`add`](Self::add) to take it. The
    /// scan resumes from where the previous call stopped, so repeated
    /// allocation is amortized O(1).
    pub fn next(&mut self) -> Option<usize> {
        while self.cursor < self.capacity && self.has(self.cursor) {
            self.cursor += 1;
        }
        (self.cursor < self.capacity).then_some(self.cursor)
    }

    /// Free every id.
    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }

    /// Resize to `capacity`, keeping ids below it and dropping the rest.
    ///
    /// Surviving ids keep their relative enumeration order. Returns the
    /// number of dropped ids.
    pub fn reallocate(&mut self, capacity: usize) -> usize {
        let mut resized = Self::new(capacity);
        for id in self.iter() {
            resized.add(id);
        }
        resized.cursor = self.cursor.min(capacity);

        let dropped = self.len - resized.len;
        *self = resized;
        dropped
    }

    /// Iterate over occupied ids in dense order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            dense: &self.dense,
            front: 0,
            back: self.len,
        }
    }
}

impl<'a> IntoIterator for &'a IdentifierAllocator {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for IdentifierAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierAllocator")
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .field("width", &self.width())
            .finish_non_exhaustive()
    }
}

static NO_LANES: Lanes = Lanes::Narrow(Vec::new());

/// Iterator over the occupied ids of an [`IdentifierAllocator`].
#[derive(Clone)]
pub struct Iter<'a> {
    dense: &'a Lanes,
    front: usize,
    back: usize,
}

impl Default for Iter<'_> {
    fn default() -> Self {
        Self {
            dense: &NO_LANES,
            front: 0,
            back: 0,
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let id = self.dense.get(self.front);
        self.front += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.dense.get(self.back))
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(set: &IdentifierAllocator) -> Vec<usize> {
        let mut ids: Vec<usize> = set.iter().collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_add_has_delete() {
        let mut set = IdentifierAllocator::new(8);

        assert!(set.add(3));
        assert!(set.add(5));
        assert!(set.has(3));
        assert!(set.has(5));
        assert!(!set.has(4));
        assert_eq!(set.len(), 2);

        assert!(set.delete(3));
        assert!(!set.has(3));
        assert!(set.has(5));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_add_and_delete_are_idempotent() {
        let mut set = IdentifierAllocator::new(4);

        assert!(set.add(1));
        assert!(!set.add(1));
        assert_eq!(set.len(), 1);

        assert!(set.delete(1));
        assert!(!set.delete(1));
        assert!(set.is_empty());
    }

    #[test]
    fn test_out_of_range_ids_are_rejected() {
        let mut set = IdentifierAllocator::new(4);

        assert!(!set.add(4));
        assert!(!set.has(4));
        assert!(!set.delete(100));
        assert!(set.is_empty());
    }

    #[test]
    fn test_stale_sparse_entries_do_not_alias() {
        let mut set = IdentifierAllocator::new(4);

        set.add(0);
        set.add(1);
        set.delete(0);
        // sparse[0] still points at slot 0, which now holds id 1
        assert!(!set.has(0));
        assert!(set.has(1));
    }

    #[test]
    fn test_delete_swaps_last_into_hole() {
        let mut set = IdentifierAllocator::new(8);
        for id in [2, 4, 6] {
            set.add(id);
        }

        set.delete(2);

        assert_eq!(set.iter().collect::<Vec<_>>(), vec![6, 4]);
    }

    #[test]
    fn test_next_returns_smallest_free_id() {
        let mut set = IdentifierAllocator::new(4);

        assert_eq!(set.next(), Some(0));
        // next() does not reserve
        assert_eq!(set.next(), Some(0));

        set.add(0);
        set.add(1);
        assert_eq!(set.next(), Some(2));

        set.add(2);
        set.delete(0);
        assert_eq!(set.next(), Some(0));
    }

    #[test]
    fn test_next_when_full() {
        let mut set = IdentifierAllocator::new(2);
        set.add(0);
        set.add(1);

        assert!(set.is_full());
        assert_eq!(set.next(), None);

        set.delete(1);
        assert_eq!(set.next(), Some(1));
    }

    #[test]
    fn test_next_skips_explicitly_added_ids() {
        let mut set = IdentifierAllocator::new(8);
        set.add(0);
        set.add(1);
        set.add(3);

        assert_eq!(set.next(), Some(2));
        set.add(2);
        assert_eq!(set.next(), Some(4));
    }

    #[test]
    fn test_width_follows_capacity() {
        assert_eq!(IdentifierAllocator::new(16).width(), 1);
        assert_eq!(IdentifierAllocator::new(256).width(), 1);
        assert_eq!(IdentifierAllocator::new(257).width(), 2);
        assert_eq!(IdentifierAllocator::new(65_536).width(), 2);
        assert_eq!(IdentifierAllocator::new(65_537).width(), 4);
    }

    #[test]
    fn test_behavior_is_width_independent() {
        for capacity in [256, 300, 70_000] {
            let mut set = IdentifierAllocator::new(capacity);
            let last = capacity - 1;

            assert!(set.add(last));
            assert!(set.add(0));
            assert!(set.has(last));
            assert!(set.delete(0));
            assert!(set.has(last));
            assert_eq!(set.iter().collect::<Vec<_>>(), vec![last]);
        }
    }

    #[test]
    fn test_reallocate_grow_preserves_ids_and_order() {
        let mut set = IdentifierAllocator::new(4);
        for id in [3, 0, 2] {
            set.add(id);
        }
        let before: Vec<usize> = set.iter().collect();

        assert_eq!(set.reallocate(1_000), 0);

        assert_eq!(set.capacity(), 1_000);
        assert_eq!(set.width(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), before);
        assert_eq!(set.next(), Some(1));
    }

    #[test]
    fn test_reallocate_shrink_drops_high_ids() {
        let mut set = IdentifierAllocator::new(10);
        for id in [1, 5, 9, 2] {
            set.add(id);
        }

        assert_eq!(set.reallocate(5), 2);

        assert_eq!(sorted(&set), vec![1, 2]);
        assert!(!set.has(5));
        assert!(!set.has(9));
        assert_eq!(set.next(), Some(0));
    }

    #[test]
    fn test_clear() {
        let mut set = IdentifierAllocator::new(4);
        set.add(0);
        set.add(1);

        set.clear();

        assert!(set.is_empty());
        assert!(!set.has(0));
        assert_eq!(set.next(), Some(0));
    }

    #[test]
    fn test_iter_is_exact_size_and_reversible() {
        let mut set = IdentifierAllocator::new(8);
        for id in [7, 1, 4] {
            set.add(id);
        }

        let iter = set.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(set.iter().rev().collect::<Vec<_>>(), vec![4, 1, 7]);
        assert_eq!((&set).into_iter().count(), 3);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "identifier capacity must fit in u32")]
    fn test_new_rejects_capacity_beyond_u32() {
        let _ = IdentifierAllocator::new(u32::MAX as usize + 1);
    }
}
