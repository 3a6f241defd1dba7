//! Fixed-width subset bitmask.

use std::fmt;

/// A subset of candidate positions `0..64`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitMask(u64);

impl BitMask {
    /// Largest number of positions a mask can address.
    pub const CAPACITY: usize = 64;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// A copy of this mask with `pos` set.
    pub fn with(self, pos: usize) -> Self {
        debug_assert!(pos < Self::CAPACITY);
        Self(self.0 | (1u64 << pos))
    }

    pub fn contains(self, pos: usize) -> bool {
        pos < Self::CAPACITY && self.0 & (1u64 << pos) != 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set positions in ascending order.
    pub fn positions(self) -> impl Iterator<Item = usize> {
        (0..Self::CAPACITY).filter(move |p| self.contains(*p))
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.positions()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_query() {
        let m = BitMask::empty().with(0).with(5).with(63);
        assert!(m.contains(5));
        assert!(!m.contains(4));
        assert!(!m.contains(64));
        assert_eq!(m.count(), 3);
        assert_eq!(m.positions().collect::<Vec<_>>(), vec![0, 5, 63]);
    }

    #[test]
    fn empty_mask() {
        assert!(BitMask::empty().is_empty());
        assert_eq!(BitMask::default(), BitMask::empty());
    }
}
