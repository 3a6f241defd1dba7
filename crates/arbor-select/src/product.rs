//! Prunable Cartesian product with missing elements.
//!
//! Enumerates every way of drawing at most one element from each column,
//! smallest combinations first, starting with the empty combination. After
//! a combination is returned the caller may [`prune`](PrunableProduct::prune)
//! it, which drops every combination that would have been derived from it by
//! adding elements of later columns.
//!
//! Each combination is derived from exactly one parent (itself minus its
//! highest column), so every combination is produced at most once.

use std::collections::VecDeque;

/// One partial selection: chosen element per column plus the first column
/// still free to extend.
#[derive(Clone, Debug)]
struct Selection {
    picks: Vec<Option<usize>>,
    next_column: usize,
}

/// Breadth-first combination enumerator over columns of given sizes.
#[derive(Clone, Debug)]
pub struct PrunableProduct {
    sizes: Vec<usize>,
    queue: VecDeque<Selection>,
    /// Derivatives of the last returned selection, enqueued on the next
    /// call unless pruned.
    proposed: Vec<Selection>,
}

impl PrunableProduct {
    /// A product over columns with the given element counts.
    pub fn new(sizes: Vec<usize>) -> Self {
        let start = Selection {
            picks: vec![None; sizes.len()],
            next_column: 0,
        };
        Self {
            sizes,
            queue: VecDeque::from([start]),
            proposed: Vec::new(),
        }
    }

    /// Total number of combinations, empty one included, saturating at
    /// `u64::MAX`.
    pub fn combination_count(&self) -> u64 {
        self.sizes
            .iter()
            .fold(1u64, |acc, s| acc.saturating_mul((*s as u64).saturating_add(1)))
    }

    /// Drop every extension of the combination most recently returned.
    pub fn prune(&mut self) {
        self.proposed.clear();
    }
}

impl Iterator for PrunableProduct {
    /// `(column, element)` pairs of the combination, by ascending column.
    type Item = Vec<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.extend(self.proposed.drain(..));
        let current = self.queue.pop_front()?;

        for column in current.next_column..self.sizes.len() {
            for element in 0..self.sizes[column] {
                let mut picks = current.picks.clone();
                picks[column] = Some(element);
                self.proposed.push(Selection {
                    picks,
                    next_column: column + 1,
                });
            }
        }

        Some(
            current
                .picks
                .iter()
                .enumerate()
                .filter_map(|(column, pick)| pick.map(|element| (column, element)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use proptest::prelude::*;

    #[test]
    fn enumerates_every_combination_once() {
        let all: Vec<_> = PrunableProduct::new(vec![2, 1, 3]).collect();
        assert_eq!(all.len(), 3 * 2 * 4);
        let unique: BTreeSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn smallest_combinations_come_first() {
        let all: Vec<_> = PrunableProduct::new(vec![2, 2]).collect();
        assert!(all[0].is_empty());
        let sizes: Vec<usize> = all.iter().map(Vec::len).collect();
        let mut sorted = sizes.clone();
        sorted.sort();
        assert_eq!(sizes, sorted);
    }

    #[test]
    fn pruning_drops_extensions() {
        let mut product = PrunableProduct::new(vec![1, 1, 1]);
        let mut seen = Vec::new();
        while let Some(combo) = product.next() {
            if combo == vec![(0, 0)] {
                product.prune();
            }
            seen.push(combo);
        }
        assert!(seen.contains(&vec![(0, 0)]));
        assert!(seen.contains(&vec![(1, 0), (2, 0)]));
        assert!(!seen.iter().any(|c| c.len() > 1 && c[0] == (0, 0)));
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn pruning_the_empty_combination_ends_the_walk() {
        let mut product = PrunableProduct::new(vec![3, 3]);
        assert_eq!(product.next(), Some(vec![]));
        product.prune();
        assert_eq!(product.next(), None);
    }

    #[test]
    fn count_includes_missing_elements() {
        assert_eq!(PrunableProduct::new(vec![2, 3]).combination_count(), 12);
        assert_eq!(PrunableProduct::new(vec![]).combination_count(), 1);
        assert_eq!(
            PrunableProduct::new(vec![usize::MAX; 4]).combination_count(),
            u64::MAX
        );
    }

    proptest! {
        #[test]
        fn unpruned_walk_matches_the_count(sizes in prop::collection::vec(0usize..4, 0..5)) {
            let product = PrunableProduct::new(sizes);
            let expected = product.combination_count();
            prop_assert_eq!(product.count() as u64, expected);
        }
    }
}
