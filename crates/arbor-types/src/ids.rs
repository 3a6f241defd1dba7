//! Identifier newtypes for the candidate graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Priority of a source hierarchy. Higher ranks are preferred.
pub type Rank = u32;

/// Rank carried by taxonomy edges. Taxonomy is always the least preferred
/// source and never participates in rank-by-rank comparisons.
pub const TAXONOMY_RANK: Rank = 0;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The raw numeric value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim().trim_start_matches($prefix);
                trimmed
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId(s.to_string()))
            }
        }
    };
}

id_newtype!(
    /// A vertex of the candidate graph.
    NodeId,
    "n"
);

id_newtype!(
    /// A candidate edge of the candidate graph.
    EdgeId,
    "e"
);

id_newtype!(
    /// Identity of an original branch within one source tree.
    ///
    /// Several graph edges may map the same source branch; they share a
    /// `SourceEdgeId` and are interchangeable representatives of it. For
    /// taxonomy edges the graph edge id is used.
    SourceEdgeId,
    "s"
);
