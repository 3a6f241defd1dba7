//! Serialized form of a candidate graph.
//!
//! Documents are the exchange format between index construction and
//! synthesis: JSON for hand-written inputs, bincode for compact snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use arbor_types::{CandidateEdge, PropertyValue};

use crate::error::{GraphError, GraphResult};
use crate::memory::NodeRecord;

/// Metadata describing one source hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source name as referenced by [`CandidateEdge::source`].
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl SourceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// A flat, serializable candidate graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<CandidateEdge>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

impl GraphDocument {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> GraphResult<Self> {
        serde_json::from_str(text).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Serialize to bincode bytes.
    pub fn to_bytes(&self) -> GraphResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> GraphResult<Self> {
        bincode::deserialize(data).map_err(|e| GraphError::Serialization(e.to_string()))
    }
}
