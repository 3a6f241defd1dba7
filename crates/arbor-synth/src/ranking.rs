//! Source ranks from source metadata.
//!
//! A [`RankingCriterion`] orders the source hierarchies of a graph best
//! first. Of `n` sources the best receives rank `n` and the worst rank `1`;
//! taxonomy edges keep rank 0 and are never re-ranked.
//!
//! # Invariants
//!
//! - Every source receives a distinct rank in `1..=n`.
//! - Sources lacking the ranking property come after every source that has
//!   it, in their original order.
//! - Values of different types are never compared; meeting one is an error.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_graph::{MemoryGraph, SourceRecord};
use arbor_types::{PropertyValue, Rank};

use crate::error::{RankingError, RankingResult};

// ---------------------------------------------------------------------------
// Criterion
// ---------------------------------------------------------------------------

/// Direction of a property ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest value first.
    #[default]
    Increasing,
    /// Largest value first.
    Decreasing,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => f.write_str("increasing"),
            Self::Decreasing => f.write_str("decreasing"),
        }
    }
}

/// How sources are ordered before ranks are handed out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingCriterion {
    /// Order by the value of `property`.
    Property {
        property: String,
        #[serde(default)]
        order: SortOrder,
    },
    /// Order by where a source's value of `property` appears in `values`.
    /// Unlisted values rank with the sources lacking the property.
    PriorityList {
        property: String,
        values: Vec<PropertyValue>,
    },
}

impl RankingCriterion {
    /// Order sources by `property`, smallest or largest first.
    pub fn by_property(property: impl Into<String>, order: SortOrder) -> Self {
        Self::Property {
            property: property.into(),
            order,
        }
    }

    /// Order sources by a list of preferred values.
    pub fn by_priority(property: impl Into<String>, values: Vec<PropertyValue>) -> Self {
        Self::PriorityList {
            property: property.into(),
            values,
        }
    }

    /// The property this criterion reads.
    pub fn property(&self) -> &str {
        match self {
            Self::Property { property, .. } | Self::PriorityList { property, .. } => property,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Property { property, order } => {
                format!("sources ordered by {property:?} ({order}), sources without it last")
            }
            Self::PriorityList { property, values } => {
                let listed: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!(
                    "sources ordered by {property:?} in the order [{}], unlisted sources last",
                    listed.join(", ")
                )
            }
        }
    }

    /// Sort `sources` best first.
    pub fn order<'a>(&self, sources: &'a [SourceRecord]) -> RankingResult<Vec<&'a SourceRecord>> {
        match self {
            Self::Property { property, order } => order_by_value(property, *order, sources),
            Self::PriorityList { property, values } => order_by_priority(property, values, sources),
        }
    }
}

/// Fail unless every value has the same type as the first.
fn check_types<'v>(
    property: &str,
    values: impl IntoIterator<Item = &'v PropertyValue>,
) -> RankingResult<()> {
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return Ok(());
    };
    for value in values {
        first
            .try_cmp(value)
            .map_err(|source| RankingError::IncomparableValues {
                property: property.to_string(),
                source,
            })?;
    }
    Ok(())
}

fn order_by_value<'a>(
    property: &str,
    order: SortOrder,
    sources: &'a [SourceRecord],
) -> RankingResult<Vec<&'a SourceRecord>> {
    let mut present: Vec<(&'a SourceRecord, &'a PropertyValue)> = Vec::new();
    let mut absent = Vec::new();
    for source in sources {
        match source.property(property) {
            Some(value) => present.push((source, value)),
            None => absent.push(source),
        }
    }
    check_types(property, present.iter().map(|(_, v)| *v))?;

    present.sort_by(|(_, a), (_, b)| {
        let ord = a.try_cmp(b).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Increasing => ord,
            SortOrder::Decreasing => ord.reverse(),
        }
    });
    Ok(present.into_iter().map(|(s, _)| s).chain(absent).collect())
}

fn order_by_priority<'a>(
    property: &str,
    values: &[PropertyValue],
    sources: &'a [SourceRecord],
) -> RankingResult<Vec<&'a SourceRecord>> {
    check_types(property, values)?;
    if let Some(first) = values.first() {
        check_types(
            property,
            std::iter::once(first).chain(sources.iter().filter_map(|s| s.property(property))),
        )?;
    }

    let mut keyed: Vec<(usize, &'a SourceRecord)> = sources
        .iter()
        .map(|source| {
            let position = source
                .property(property)
                .and_then(|value| values.iter().position(|v| v == value))
                .unwrap_or(usize::MAX);
            (position, source)
        })
        .collect();
    keyed.sort_by_key(|(position, _)| *position);
    Ok(keyed.into_iter().map(|(_, s)| s).collect())
}

// ---------------------------------------------------------------------------
// Rank assignment
// ---------------------------------------------------------------------------

/// Give every source a rank: `n` for the best of `n` sources, `1` for the
/// worst.
pub fn assign_ranks(
    sources: &[SourceRecord],
    criterion: &RankingCriterion,
) -> RankingResult<BTreeMap<String, Rank>> {
    let mut ranks = BTreeMap::new();
    let ordered = criterion.order(sources)?;
    let count = ordered.len();
    for (position, source) in ordered.into_iter().enumerate() {
        let rank = (count - position) as Rank;
        if ranks.insert(source.name.clone(), rank).is_some() {
            return Err(RankingError::DuplicateSource(source.name.clone()));
        }
    }
    debug!(
        sources = count,
        property = criterion.property(),
        "assigned source ranks"
    );
    Ok(ranks)
}

/// Rank the sources recorded in `graph` and rewrite its source-tree edge
/// ranks. Returns the assigned ranks.
pub fn rank_graph(
    graph: &mut MemoryGraph,
    criterion: &RankingCriterion,
) -> RankingResult<BTreeMap<String, Rank>> {
    let ranks = assign_ranks(graph.sources(), criterion)?;
    let updated = graph.apply_ranks(&ranks);
    debug!(updated, "re-ranked source-tree edges");
    Ok(ranks)
}
