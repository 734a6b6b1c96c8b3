//! Universal value type matching the store's result type system.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NodeRef, RelationshipRef};

/// A value as produced by the graph store's query execution.
///
/// Covers every raw kind the store can hand back:
/// - Scalars: Bool, Int, BigInt, Float, String
/// - Containers: List, Map
/// - Graph: Node, Relationship
/// - Temporal: Date, Time, DateTime, LocalDateTime, Duration
///
/// Every well-formed store value maps to exactly one variant; conversion
/// to the portable form (see `convert`) is total over this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum GraphValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Store-native arbitrary-precision integer, as surfaced by drivers
    /// that widen beyond 64 bits.
    BigInt(i128),
    Float(f64),
    String(String),
    List(Vec<GraphValue>),
    Map(HashMap<String, GraphValue>),

    // Graph types
    Node(Box<NodeRef>),
    Relationship(Box<RelationshipRef>),

    // Temporal types
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    LocalDateTime(NaiveDateTime),
    Duration(IsoDuration),
}

/// ISO 8601 duration (months, days, seconds, nanoseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoDuration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

// ============================================================================
// Type checking
// ============================================================================

impl GraphValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            GraphValue::Null => "NULL",
            GraphValue::Bool(_) => "BOOLEAN",
            GraphValue::Int(_) => "INTEGER",
            GraphValue::BigInt(_) => "BIGINT",
            GraphValue::Float(_) => "FLOAT",
            GraphValue::String(_) => "STRING",
            GraphValue::List(_) => "LIST",
            GraphValue::Map(_) => "MAP",
            GraphValue::Node(_) => "NODE",
            GraphValue::Relationship(_) => "RELATIONSHIP",
            GraphValue::Date(_) => "DATE",
            GraphValue::Time(_) => "TIME",
            GraphValue::DateTime(_) => "DATETIME",
            GraphValue::LocalDateTime(_) => "LOCAL_DATETIME",
            GraphValue::Duration(_) => "DURATION",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, GraphValue::Null) }
    pub fn is_numeric(&self) -> bool {
        matches!(self, GraphValue::Int(_) | GraphValue::BigInt(_) | GraphValue::Float(_))
    }

    /// True for the store's temporal-native kinds.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            GraphValue::Date(_)
                | GraphValue::Time(_)
                | GraphValue::DateTime(_)
                | GraphValue::LocalDateTime(_)
                | GraphValue::Duration(_)
        )
    }

    /// Attempt to extract as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            GraphValue::Int(i) => Some(*i),
            GraphValue::BigInt(b) => i64::try_from(*b).ok(),
            GraphValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            GraphValue::Float(f) => Some(*f),
            GraphValue::Int(i) => Some(*i as f64),
            GraphValue::BigInt(b) => Some(*b as f64),
            _ => None,
        }
    }

    /// Attempt to extract as &str.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a `Map` value from (key, value) pairs.
    pub fn map_from<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<GraphValue>,
    {
        GraphValue::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for GraphValue { fn from(v: bool) -> Self { GraphValue::Bool(v) } }
impl From<i32> for GraphValue { fn from(v: i32) -> Self { GraphValue::Int(v as i64) } }
impl From<i64> for GraphValue { fn from(v: i64) -> Self { GraphValue::Int(v) } }
impl From<i128> for GraphValue { fn from(v: i128) -> Self { GraphValue::BigInt(v) } }
impl From<f64> for GraphValue { fn from(v: f64) -> Self { GraphValue::Float(v) } }
impl From<String> for GraphValue { fn from(v: String) -> Self { GraphValue::String(v) } }
impl From<&str> for GraphValue { fn from(v: &str) -> Self { GraphValue::String(v.to_owned()) } }
impl<T: Into<GraphValue>> From<Vec<T>> for GraphValue {
    fn from(v: Vec<T>) -> Self { GraphValue::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<GraphValue>> From<Option<T>> for GraphValue {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(GraphValue::Null) }
}

/// Portable values re-enter the graph value space losslessly. This is what
/// makes coercion idempotent: coercing an already-portable value is a no-op.
impl From<serde_json::Value> for GraphValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => GraphValue::Null,
            serde_json::Value::Bool(b) => GraphValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GraphValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    GraphValue::BigInt(u as i128)
                } else {
                    GraphValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => GraphValue::String(s),
            serde_json::Value::Array(items) => {
                GraphValue::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(m) => {
                GraphValue::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Null => write!(f, "null"),
            GraphValue::Bool(b) => write!(f, "{b}"),
            GraphValue::Int(i) => write!(f, "{i}"),
            GraphValue::BigInt(i) => write!(f, "{i}"),
            GraphValue::Float(v) => write!(f, "{v}"),
            GraphValue::String(s) => write!(f, "{s}"),
            GraphValue::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            GraphValue::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            GraphValue::Node(n) => write!(f, "{n:?}"),
            GraphValue::Relationship(r) => write!(f, "{r:?}"),
            GraphValue::Date(d) => write!(f, "{d}"),
            GraphValue::Time(t) => write!(f, "{t}"),
            GraphValue::DateTime(dt) => write!(f, "{dt}"),
            GraphValue::LocalDateTime(dt) => write!(f, "{dt}"),
            GraphValue::Duration(d) => write!(f, "P{}M{}DT{}S", d.months, d.days, d.seconds),
        }
    }
}
