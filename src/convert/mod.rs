//! # Value coercion and row projection
//!
//! Converts heterogeneous store-native values into portable JSON-safe
//! values, and whole result rows into plain nested mappings ready for
//! serialization. Pure functions over their input — no I/O, no state
//! beyond the injected timestamp-field configuration.
//!
//! Dispatch rule: a field routes through temporal normalization when its
//! name is in the configured [`TimestampFields`] set; everything else goes
//! through plain coercion. The rule re-applies at every nesting level using
//! the local key name, so timestamp fields buried in collected sub-maps are
//! still normalized.

pub mod temporal;

pub use temporal::TimestampFields;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::model::{GraphValue, NodeRef, PropertyMap, RelationshipRef};

/// Nesting cap for coercion. Rows deeper than this are treated as
/// adversarial; values below the cap degrade to their string form instead
/// of recursing further.
const MAX_DEPTH: usize = 64;

/// Shapes raw result rows into portable values.
///
/// One instance per schema configuration; pass it to whatever needs
/// projection rather than holding a shared global.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    timestamps: TimestampFields,
}

impl Projector {
    pub fn new(timestamps: TimestampFields) -> Self {
        Self { timestamps }
    }

    pub fn timestamps(&self) -> &TimestampFields {
        &self.timestamps
    }

    /// Convert one raw value into a portable JSON value.
    ///
    /// Total over [`GraphValue`]: never fails, never panics. Integers are
    /// carried exactly (JSON numbers hold the full i64 range here, unlike
    /// the 2^53 limit of a double-based target); `BigInt` beyond the i64
    /// range converts to the nearest f64, which is the documented precision
    /// boundary.
    pub fn coerce(&self, value: &GraphValue) -> JsonValue {
        self.coerce_at(None, value, 0)
    }

    /// Normalize a temporal-like value for a named field. See
    /// [`temporal::TimestampFields`] for when this applies.
    pub fn normalize_temporal(&self, field: &str, value: &GraphValue) -> JsonValue {
        temporal::normalize(field, value)
    }

    /// Project a whole result row into a plain ordered mapping.
    ///
    /// Guarantee: the output contains no store-native types — only null,
    /// bool, number, string, array and ordered object.
    pub fn project_row(&self, row: &PropertyMap) -> JsonMap<String, JsonValue> {
        self.project_map(row, 0)
    }

    fn project_map(&self, map: &PropertyMap, depth: usize) -> JsonMap<String, JsonValue> {
        let mut out = JsonMap::with_capacity(map.len());
        for (key, value) in map {
            let projected = if self.timestamps.contains(key) {
                temporal::normalize(key, value)
            } else {
                self.coerce_at(Some(key), value, depth)
            };
            out.insert(key.clone(), projected);
        }
        out
    }

    fn coerce_at(&self, key: Option<&str>, value: &GraphValue, depth: usize) -> JsonValue {
        if depth > MAX_DEPTH {
            return JsonValue::String(value.to_string());
        }
        match value {
            GraphValue::Null => JsonValue::Null,
            GraphValue::Bool(b) => JsonValue::Bool(*b),
            GraphValue::Int(i) => JsonValue::from(*i),
            GraphValue::BigInt(b) => match i64::try_from(*b) {
                Ok(i) => JsonValue::from(i),
                Err(_) => JsonValue::from(*b as f64),
            },
            GraphValue::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => JsonValue::Number(n),
                // NaN / infinity are not representable in JSON.
                None => JsonValue::Null,
            },
            GraphValue::String(s) => JsonValue::String(s.clone()),
            GraphValue::List(items) => JsonValue::Array(
                items.iter().map(|v| self.coerce_at(key, v, depth + 1)).collect(),
            ),
            GraphValue::Map(m) => JsonValue::Object(self.project_map(m, depth + 1)),
            GraphValue::Node(n) => self.node_object(n, depth + 1),
            GraphValue::Relationship(r) => self.relationship_object(r, depth + 1),
            value if value.is_temporal() => temporal::normalize(key.unwrap_or("<value>"), value),
            // is_temporal covers every remaining variant.
            other => JsonValue::String(other.to_string()),
        }
    }

    /// Nodes nested in a row become `{id, labels, properties}` objects.
    fn node_object(&self, node: &NodeRef, depth: usize) -> JsonValue {
        let mut out = JsonMap::new();
        out.insert("id".into(), JsonValue::String(node.id.to_string()));
        out.insert(
            "labels".into(),
            JsonValue::Array(node.labels.iter().map(|l| JsonValue::String(l.clone())).collect()),
        );
        out.insert(
            "properties".into(),
            JsonValue::Object(self.project_map(&node.properties, depth)),
        );
        JsonValue::Object(out)
    }

    fn relationship_object(&self, rel: &RelationshipRef, depth: usize) -> JsonValue {
        let mut out = JsonMap::new();
        out.insert("id".into(), JsonValue::String(rel.id.to_string()));
        out.insert("type".into(), JsonValue::String(rel.rel_type.clone()));
        out.insert("from".into(), JsonValue::String(rel.src.to_string()));
        out.insert("to".into(), JsonValue::String(rel.dst.to_string()));
        out.insert(
            "properties".into(),
            JsonValue::Object(self.project_map(&rel.properties, depth)),
        );
        JsonValue::Object(out)
    }
}
