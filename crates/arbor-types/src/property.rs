//! Source metadata values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A typed metadata value attached to a source hierarchy.
///
/// Values only compare against values of the same type. Floats use a total
/// order so NaN never panics a sort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
        }
    }

    /// Compare two values of the same type.
    pub fn try_cmp(&self, other: &PropertyValue) -> Result<Ordering, TypeError> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Ok(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Ok(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Ok(a.total_cmp(b)),
            _ => Err(TypeError::IncomparableValues {
                left: format!("{self} ({})", self.type_name()),
                right: format!("{other} ({})", other.type_name()),
            }),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}
