//! Relationship (edge) in the property graph.

use serde::{Deserialize, Serialize};

use super::{GraphValue, NodeId, PropertyMap};

/// Opaque store-assigned relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelId(pub i64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A relationship (directed edge) as returned from a traversal query.
///
/// `src`/`dst` are the relationship's own endpoints and are authoritative
/// for edge construction — even when the row that carried the relationship
/// has a null companion node (dangling edges from OPTIONAL MATCH).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRef {
    pub id: RelId,
    pub src: NodeId,
    pub dst: NodeId,
    pub rel_type: String,
    pub properties: PropertyMap,
}

impl RelationshipRef {
    pub fn new(id: RelId, src: NodeId, dst: NodeId, rel_type: impl Into<String>) -> Self {
        Self {
            id,
            src,
            dst,
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
