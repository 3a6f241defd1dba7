//! Rank-ordered augmenting search.
//!
//! The primary selection procedure. Ranks are visited from most to least
//! trusted while a best selection is carried forward:
//!
//! 1. Edge sets of the current rank that overlap the best selection are
//!    combined through a [`PrunableProduct`]. A combination may replace
//!    saved edges it fully contains; a partial overlap rejects it. The
//!    result replaces the best selection only if it
//!    [improves upon](SubtreeInfo::improves_upon) it.
//! 2. Edge sets that start overlapping after an update join the next round.
//! 3. Edge sets that never overlap are clustered with [`UnionFind`] and each
//!    cluster contributes its best internally disjoint combination.
//!
//! Taxonomy singletons not covered by the result are attached last.
//!
//! # Invariants
//!
//! - The selection carried between steps is always internally disjoint.
//! - Products too large to enumerate, whether over an overlapping pool or a
//!   cluster, fall back to the MWIS solver, so no more than
//!   `max_product_size` combinations are visited per product.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use arbor_mwis::{solve, MwisConfig, WeightedCandidate};
use arbor_types::{CandidateEdge, Rank, TAXONOMY_RANK};

use crate::classify::{classify, CandidateRelSet, Classification, EdgeSet};
use crate::error::SelectResult;
use crate::product::PrunableProduct;
use crate::strategy::{NodeInput, NodeSelection, NodeSelectionStrategy};
use crate::union_find::UnionFind;

/// Default bound on the combinations enumerated for one product.
pub const DEFAULT_MAX_PRODUCT_SIZE: u64 = 1 << 16;

/// Selection by rank-ordered augmenting search.
#[derive(Clone, Debug)]
pub struct RankedAugmentingSearch {
    max_product_size: u64,
    mwis: MwisConfig,
}

impl Default for RankedAugmentingSearch {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PRODUCT_SIZE, MwisConfig::default())
    }
}

impl RankedAugmentingSearch {
    pub fn new(max_product_size: u64, mwis: MwisConfig) -> Self {
        Self {
            max_product_size,
            mwis,
        }
    }

    pub fn max_product_size(&self) -> u64 {
        self.max_product_size
    }

    /// Run the search for one node and return the chosen edges.
    pub fn search<'a>(&self, input: &NodeInput<'a>) -> SelectResult<CandidateRelSet<'a>> {
        let mut classes = classify(input)?;
        let mut best = CandidateRelSet::new(input.node);

        for rank in classes.ranks_descending() {
            let sets = classes.take_rank(rank);
            let (mut overlapping, mut waiting): (Vec<EdgeSet<'a>>, Vec<EdgeSet<'a>>) = sets
                .into_iter()
                .partition(|s| best.info().overlaps_with(&s.info, rank));

            while !overlapping.is_empty() {
                best = self.improve_with(&classes, &overlapping, best, rank)?;
                (overlapping, waiting) = waiting
                    .into_iter()
                    .partition(|s| best.info().overlaps_with(&s.info, rank));
            }

            if !waiting.is_empty() {
                best = self.augment_from_non_overlapping(&classes, &waiting, best, rank)?;
            }
            debug!(node = %input.node, rank, selected = best.len(), "finished rank");
        }

        for edge in &classes.singletons {
            let immediate = classes.immediate(edge.child)?;
            if !best.info().overlaps_with(immediate, TAXONOMY_RANK) {
                best.add(*edge, immediate)?;
            }
        }
        Ok(best)
    }

    /// Try every internally disjoint combination of `sets` against `best`.
    ///
    /// An oversize product is replaced by the single combination chosen by
    /// weight.
    fn improve_with<'a>(
        &self,
        classes: &Classification<'a>,
        sets: &[EdgeSet<'a>],
        mut best: CandidateRelSet<'a>,
        rank: Rank,
    ) -> SelectResult<CandidateRelSet<'a>> {
        let mut product = PrunableProduct::new(sets.iter().map(EdgeSet::len).collect());
        if product.combination_count() > self.max_product_size {
            let pool: Vec<&EdgeSet<'a>> = sets.iter().collect();
            let mut proposed = CandidateRelSet::new(classes.node);
            for edge in self.best_by_weight(classes, &pool)? {
                proposed.add(edge, classes.immediate(edge.child)?)?;
            }
            if let Some(candidate) = update_set(classes, proposed, &best, rank)? {
                if candidate.info().improves_upon(best.info(), rank) {
                    best = candidate;
                }
            }
            return Ok(best);
        }

        while let Some(combination) = product.next() {
            if combination.is_empty() {
                continue;
            }
            let proposed = propose(classes, sets, &combination)?;
            if !proposed.is_internally_disjoint() {
                product.prune();
                continue;
            }
            match update_set(classes, proposed, &best, rank)? {
                // Supersets overlap the same saved edge.
                None => product.prune(),
                Some(candidate) => {
                    if candidate.info().improves_upon(best.info(), rank) {
                        best = candidate;
                    }
                }
            }
        }
        Ok(best)
    }

    /// Add the best combination of every cluster of mutually overlapping
    /// edge sets. None of `sets` overlaps `best`.
    fn augment_from_non_overlapping<'a>(
        &self,
        classes: &Classification<'a>,
        sets: &[EdgeSet<'a>],
        mut best: CandidateRelSet<'a>,
        rank: Rank,
    ) -> SelectResult<CandidateRelSet<'a>> {
        let mut clusters = UnionFind::new(sets.len());
        for i in 0..sets.len() {
            for j in 0..i {
                if sets[i].info.included_ids().intersects(sets[j].info.included_ids()) {
                    clusters.union(i, j);
                }
            }
        }

        for group in clusters.groups() {
            let cluster: Vec<&EdgeSet<'a>> = group.iter().map(|i| &sets[*i]).collect();
            for edge in self.best_in_cluster(classes, &cluster, rank)? {
                best.add(edge, classes.immediate(edge.child)?)?;
            }
        }
        Ok(best)
    }

    fn best_in_cluster<'a>(
        &self,
        classes: &Classification<'a>,
        cluster: &[&EdgeSet<'a>],
        rank: Rank,
    ) -> SelectResult<Vec<&'a CandidateEdge>> {
        if cluster.len() == 1 && cluster[0].len() == 1 {
            return Ok(cluster[0].members.clone());
        }

        let mut product = PrunableProduct::new(cluster.iter().map(|s| s.len()).collect());
        if product.combination_count() > self.max_product_size {
            return self.best_by_weight(classes, cluster);
        }

        let mut winner: Option<CandidateRelSet<'a>> = None;
        while let Some(combination) = product.next() {
            if combination.is_empty() {
                continue;
            }
            let mut candidate = CandidateRelSet::new(classes.node);
            for (column, element) in combination {
                let edge = cluster[column].members[element];
                candidate.add(edge, classes.immediate(edge.child)?)?;
            }
            if !candidate.is_internally_disjoint() {
                product.prune();
                continue;
            }
            let better = winner
                .as_ref()
                .map_or(true, |w| candidate.info().improves_upon(w.info(), rank));
            if better {
                winner = Some(candidate);
            }
        }
        Ok(winner.map(|w| w.edges().to_vec()).unwrap_or_default())
    }

    /// Resolve an oversize product by node count: one representative per
    /// edge set (the member with the largest subtree), then MWIS.
    fn best_by_weight<'a>(
        &self,
        classes: &Classification<'a>,
        cluster: &[&EdgeSet<'a>],
    ) -> SelectResult<Vec<&'a CandidateEdge>> {
        let mut candidates = Vec::with_capacity(cluster.len());
        let mut by_id = HashMap::new();
        for set in cluster {
            let mut representative: Option<(&'a CandidateEdge, u64)> = None;
            for member in &set.members {
                let size = classes.immediate(member.child)?.included_ids().len();
                if representative.map_or(true, |(_, best)| size > best) {
                    representative = Some((*member, size));
                }
            }
            let Some((edge, _)) = representative else {
                continue;
            };
            let immediate = classes.immediate(edge.child)?;
            candidates.push(WeightedCandidate::new(
                edge.id,
                immediate.included_ids().len() as f64,
                immediate.included_ids().clone(),
                immediate.tip_ids().clone(),
            ));
            by_id.insert(edge.id, edge);
        }

        let solution = solve(&candidates, &self.mwis)?;
        debug!(
            node = %classes.node,
            candidates = candidates.len(),
            chosen = solution.chosen.len(),
            method = %solution.method,
            "product exceeded bound, solved by weight"
        );
        Ok(solution
            .chosen
            .iter()
            .filter_map(|id| by_id.get(id).copied())
            .collect())
    }
}

/// Build the candidate set for one product combination.
fn propose<'a>(
    classes: &Classification<'a>,
    sets: &[EdgeSet<'a>],
    combination: &[(usize, usize)],
) -> SelectResult<CandidateRelSet<'a>> {
    let mut proposed = CandidateRelSet::new(classes.node);
    for (column, element) in combination {
        let edge = sets[*column].members[*element];
        proposed.add(edge, classes.immediate(edge.child)?)?;
    }
    Ok(proposed)
}

/// Fold `proposed` into `saved`.
///
/// Saved edges the proposal fully contains are replaced by it; saved edges
/// it does not touch are kept. Returns `None` when the proposal partially
/// overlaps a saved edge.
fn update_set<'a>(
    classes: &Classification<'a>,
    proposed: CandidateRelSet<'a>,
    saved: &CandidateRelSet<'a>,
    rank: Rank,
) -> SelectResult<Option<CandidateRelSet<'a>>> {
    let mut replaced = BTreeSet::new();
    for edge in saved.edges() {
        let info = classes.immediate(edge.child)?;
        if !proposed.info().overlaps_with(info, rank) {
            continue;
        }
        if !proposed.info().contains_all_stree_elements_of(info, rank) {
            return Ok(None);
        }
        replaced.insert(edge.id);
    }

    let mut updated = proposed;
    for edge in saved.edges() {
        if !replaced.contains(&edge.id) {
            updated.add(*edge, classes.immediate(edge.child)?)?;
        }
    }
    Ok(Some(updated))
}

impl NodeSelectionStrategy for RankedAugmentingSearch {
    fn name(&self) -> &str {
        "ranked-augmenting-search"
    }

    fn description(&self) -> String {
        format!(
            "Visits source ranks from highest to lowest, keeping the combination of \
             non-overlapping edges that represents the most source branches at the \
             highest differing rank, then the most nodes. Clusters above {} \
             combinations are resolved by maximum-weight independent set.",
            self.max_product_size
        )
    }

    fn select(&self, input: &NodeInput<'_>) -> SelectResult<NodeSelection> {
        Ok(self.search(input)?.into_selection())
    }
}
