//! # Visualization graph
//!
//! Folds relationship-traversal rows into the deduplicated `{nodes, edges}`
//! structure the front-end renders, deriving a display label, a group and a
//! multi-line hover title per node.
//!
//! Node identity is deduplicated with insertion order preserved, so output
//! is deterministic for a given row sequence. Re-seen identities are
//! re-projected in place: the last row in which a node appeared wins for
//! property shaping. Edges are a multiset — the upstream query owns edge
//! distinctness, and collapsing here would hide genuinely parallel
//! relationships.

use hashbrown::HashMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::convert::Projector;
use crate::model::{NodeRef, RelationshipRef};

/// One result record from a relationship-following query, shaped as a
/// (node, relationship, node) triple. Any slot may be absent: OPTIONAL
/// MATCH produces rows with null relationships and null companion nodes.
#[derive(Debug, Clone, Default)]
pub struct TraversalRow {
    pub node1: Option<NodeRef>,
    pub relationship: Option<RelationshipRef>,
    pub node2: Option<NodeRef>,
}

/// Display-oriented node, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub group: String,
    pub title: String,
    pub properties: JsonMap<String, JsonValue>,
}

/// Display-oriented edge. `from`/`to` come from the relationship's own
/// endpoints, not from the row's companion nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub title: String,
    pub properties: JsonMap<String, JsonValue>,
}

/// The deduplicated visualization graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphProjection {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

// ============================================================================
// Builder
// ============================================================================

/// Incrementally folds traversal rows into a [`GraphProjection`].
pub struct GraphProjectionBuilder<'a> {
    projector: &'a Projector,
    slots: HashMap<String, usize>,
    nodes: Vec<VisualNode>,
    edges: Vec<VisualEdge>,
}

impl<'a> GraphProjectionBuilder<'a> {
    pub fn new(projector: &'a Projector) -> Self {
        Self {
            projector,
            slots: HashMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Fold one row into the projection.
    pub fn push(&mut self, row: &TraversalRow) {
        for node in [&row.node1, &row.node2].into_iter().flatten() {
            self.visit_node(node);
        }
        if let Some(rel) = &row.relationship {
            let edge = self.project_edge(rel);
            self.edges.push(edge);
        }
    }

    pub fn finish(self) -> GraphProjection {
        GraphProjection { nodes: self.nodes, edges: self.edges }
    }

    fn visit_node(&mut self, node: &NodeRef) {
        let id = node.id.to_string();
        let properties = self.projector.project_row(&node.properties);
        let visual = VisualNode {
            id: id.clone(),
            label: display_label(&properties, &node.labels),
            group: node.labels.first().cloned().unwrap_or_else(|| UNKNOWN.to_owned()),
            title: node_title(&properties, &node.labels, &id),
            properties,
        };
        match self.slots.get(&id) {
            // Last write wins; the slot keeps its insertion position.
            Some(&slot) => self.nodes[slot] = visual,
            None => {
                self.slots.insert(id, self.nodes.len());
                self.nodes.push(visual);
            }
        }
    }

    fn project_edge(&self, rel: &RelationshipRef) -> VisualEdge {
        VisualEdge {
            from: rel.src.to_string(),
            to: rel.dst.to_string(),
            label: rel.rel_type.clone(),
            title: rel.rel_type.clone(),
            properties: self.projector.project_row(&rel.properties),
        }
    }
}

/// Fold an entire row sequence in one call.
pub fn build_graph_projection(
    projector: &Projector,
    rows: impl IntoIterator<Item = TraversalRow>,
) -> GraphProjection {
    let mut builder = GraphProjectionBuilder::new(projector);
    for row in rows {
        builder.push(&row);
    }
    builder.finish()
}

// ============================================================================
// Label and title derivation
// ============================================================================

const UNKNOWN: &str = "Unknown";

/// Name-like properties, in priority order.
const NAME_PROPS: [&str; 2] = ["nome", "name"];
/// Identifier-like property, shown truncated.
const IDENT_PROP: &str = "idWhatsapp";
/// Prefix for identifier-based labels; only leads carry the identifier.
const IDENT_PREFIX: &str = "Lead";
const TYPE_PROP: &str = "type";

/// Pick a display label: name property, else truncated identifier, else
/// type property, else joined labels, else the unknown marker.
fn display_label(properties: &JsonMap<String, JsonValue>, labels: &[String]) -> String {
    for key in NAME_PROPS {
        if let Some(v) = properties.get(key) {
            return text_of(v);
        }
    }
    if let Some(v) = properties.get(IDENT_PROP) {
        let ident: String = text_of(v).chars().take(10).collect();
        return format!("{IDENT_PREFIX}: {ident}...");
    }
    if let Some(v) = properties.get(TYPE_PROP) {
        return text_of(v);
    }
    if !labels.is_empty() {
        return labels.join(", ");
    }
    UNKNOWN.to_owned()
}

/// Multi-line hover synopsis: identity, labels, then one line per property.
/// Arrays show at most their first 3 elements; nested objects are rendered
/// as an opaque placeholder to bound title size.
fn node_title(properties: &JsonMap<String, JsonValue>, labels: &[String], id: &str) -> String {
    let mut title = format!("ID: {id}\nLabels: {}\n", labels.join(", "));
    for (key, value) in properties {
        match value {
            JsonValue::Array(items) => {
                let head: Vec<String> = items.iter().take(3).map(text_of).collect();
                let ellipsis = if items.len() > 3 { "..." } else { "" };
                title.push_str(&format!("{key}: {}{ellipsis}\n", head.join(", ")));
            }
            JsonValue::Object(_) => title.push_str(&format!("{key}: [object]\n")),
            other => title.push_str(&format!("{key}: {}\n", text_of(other))),
        }
    }
    title.trim_end().to_owned()
}

/// Plain text form of a portable value (strings unquoted).
fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
