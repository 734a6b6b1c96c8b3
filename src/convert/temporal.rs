//! Temporal normalization — canonical ISO-8601 strings from whatever the
//! store hands back for a timestamp field.
//!
//! The store (and the agents writing to it) are not consistent: creation
//! timestamps arrive as epoch millis, driver datetime structs, component
//! maps, or strings. `normalize` resolves all of these to one canonical
//! shape, and degrades to the plain string form when nothing resolves.
//! Callers must NOT assume the output is date-shaped unconditionally.

use chrono::{NaiveDate, SecondsFormat, TimeZone, Utc};
use hashbrown::HashSet;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::model::{GraphValue, PropertyMap};

/// Field names recognized as millisecond-epoch timestamps.
///
/// Recognition is exact set membership, never suffix matching — a field is
/// a timestamp because it is enumerated here, not because its name looks
/// date-ish. The default set carries the property names the dashboard's
/// graph actually uses; callers with a different schema build their own.
#[derive(Debug, Clone)]
pub struct TimestampFields {
    names: HashSet<String>,
}

/// Timestamp properties written by the agent pipeline.
const DEFAULT_FIELDS: [&str; 9] = [
    "dtCriacao",
    "dtUltimaAtualizacao",
    "createdAt",
    "updatedAt",
    "lastInteraction",
    "timestamp",
    "eventTimestamp",
    "reflectionTimestamp",
    "hypothesisTimestamp",
];

impl Default for TimestampFields {
    fn default() -> Self {
        Self::new(DEFAULT_FIELDS)
    }
}

impl TimestampFields {
    /// Build a set from explicit field names, replacing the default list.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    /// An empty set — no name-based routing at all.
    pub fn none() -> Self {
        Self { names: HashSet::new() }
    }

    /// Extend the default set with schema-specific names.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.names.contains(field)
    }
}

/// Normalize a temporal-looking value to an ISO-8601 UTC string.
///
/// Total: unresolvable inputs come back as their plain string form, never
/// as an error. `field` is context for the lossy-fallback log line.
pub(crate) fn normalize(field: &str, value: &GraphValue) -> JsonValue {
    if value.is_null() {
        return JsonValue::Null;
    }
    match epoch_millis(value) {
        Some(ms) => match Utc.timestamp_millis_opt(ms).single() {
            Some(dt) => JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => fallback(field, value),
        },
        None => fallback(field, value),
    }
}

fn fallback(field: &str, value: &GraphValue) -> JsonValue {
    warn!(field, kind = value.type_name(), "temporal value did not resolve, passing through as string");
    JsonValue::String(value.to_string())
}

/// Resolve a raw value to a millisecond epoch.
///
/// Resolution order: native integer, big integer, structured temporal
/// (driver struct or component map), plain number, string (date parse,
/// then numeric parse).
fn epoch_millis(value: &GraphValue) -> Option<i64> {
    match value {
        GraphValue::Int(i) => Some(*i),
        GraphValue::BigInt(b) => i64::try_from(*b).ok(),
        GraphValue::DateTime(dt) => Some(dt.timestamp_millis()),
        GraphValue::LocalDateTime(dt) => Some(dt.and_utc().timestamp_millis()),
        GraphValue::Date(d) => Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()),
        GraphValue::Map(m) => component_millis(m),
        GraphValue::Float(f) if f.is_finite() => Some(*f as i64),
        GraphValue::String(s) => parse_string(s),
        // A bare time-of-day or a duration has no epoch; let the caller
        // see the string form.
        _ => None,
    }
}

/// Component map: `{year, month, day[, hour, minute, second, millisecond]}`.
/// Months are 1-based in the source.
fn component_millis(m: &PropertyMap) -> Option<i64> {
    let comp = |key: &str| m.get(key).and_then(GraphValue::as_int);
    let year = i32::try_from(comp("year")?).ok()?;
    let month = u32::try_from(comp("month")?).ok()?;
    let day = u32::try_from(comp("day")?).ok()?;
    let hour = u32::try_from(comp("hour").unwrap_or(0)).ok()?;
    let minute = u32::try_from(comp("minute").unwrap_or(0)).ok()?;
    let second = u32::try_from(comp("second").unwrap_or(0)).ok()?;
    let milli = match comp("millisecond") {
        Some(ms) => u32::try_from(ms).ok()?,
        // Driver structs expose nanoseconds instead.
        None => u32::try_from(comp("nanosecond").unwrap_or(0) / 1_000_000).ok()?,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let dt = date.and_hms_milli_opt(hour, minute, second, milli)?;
    Some(dt.and_utc().timestamp_millis())
}

fn parse_string(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f as i64),
        _ => None,
    }
}
