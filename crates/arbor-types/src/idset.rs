//! Compressed id bitsets.
//!
//! [`IdSet`] wraps a [`RoaringTreemap`] so descendant-leaf sets with hundreds
//! of thousands of members stay cheap to intersect. All overlap tests during
//! synthesis go through this type.

use std::fmt;

use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};

/// A set of `u64` ids (leaf ids or node ids).
///
/// Serialized as a sorted list of integers.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct IdSet(RoaringTreemap);

impl IdSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(RoaringTreemap::new())
    }

    /// A set holding exactly one id.
    pub fn singleton(id: u64) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// Add an id. Returns `true` if it was not already present.
    pub fn insert(&mut self, id: u64) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(id)
    }

    /// Number of ids in the set.
    pub fn len(&self) -> u64 {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the two sets share at least one id.
    pub fn intersects(&self, other: &IdSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Returns `true` if every id of `self` is also in `other`.
    pub fn is_subset(&self, other: &IdSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Number of ids shared with `other`.
    pub fn intersection_len(&self, other: &IdSet) -> u64 {
        self.0.intersection_len(&other.0)
    }

    /// Ids present in both sets.
    pub fn intersection(&self, other: &IdSet) -> IdSet {
        Self(&self.0 & &other.0)
    }

    /// Add every id of `other` to `self`.
    pub fn union_with(&mut self, other: &IdSet) {
        self.0 |= &other.0;
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.0.iter().collect()
    }
}

impl Default for IdSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for IdSet {}

impl fmt::Debug for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl FromIterator<u64> for IdSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u64> for IdSet {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl From<Vec<u64>> for IdSet {
    fn from(ids: Vec<u64>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<IdSet> for Vec<u64> {
    fn from(set: IdSet) -> Self {
        set.to_vec()
    }
}
