//! # Graph store seam
//!
//! The narrow contract to the graph store — run a parameterized query, get
//! back rows of named fields — plus the paged-listing service that ties
//! filter compilation, query execution and row projection together.
//!
//! The store is the only suspension point; everything around it is
//! synchronous and re-entrant. No retries, no timeouts here: both belong
//! to the store implementation or its caller.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::convert::Projector;
use crate::filter::{FilterCompiler, FilterSpec};
use crate::model::{GraphValue, NodeRef, PropertyMap, RelationshipRef};
use crate::{Error, Result};

// ============================================================================
// Store contract
// ============================================================================

/// The universal store contract: execute a query, receive rows.
///
/// Implementations map driver failures to [`Error::Store`]; this crate
/// never catches or retries them on the caller's behalf.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn execute(&self, query: &str, params: PropertyMap) -> Result<Vec<Row>>;
}

/// A single result row: declared field name → raw value. Any field may be
/// absent or null.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub values: PropertyMap,
}

impl Row {
    pub fn new(values: PropertyMap) -> Self {
        Self { values }
    }

    /// Raw access to a field.
    pub fn value(&self, key: &str) -> Option<&GraphValue> {
        self.values.get(key)
    }

    /// Get a typed value from the row.
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T> {
        let val = self
            .values
            .get(key)
            .ok_or_else(|| Error::NotFound(format!("column '{key}'")))?;
        T::from_value(val)
    }
}

/// Convert from GraphValue to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &GraphValue) -> Result<Self>;
}

impl FromValue for NodeRef {
    fn from_value(val: &GraphValue) -> Result<Self> {
        match val {
            GraphValue::Node(n) => Ok(*n.clone()),
            _ => Err(Error::TypeMismatch {
                expected: "NODE".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for RelationshipRef {
    fn from_value(val: &GraphValue) -> Result<Self> {
        match val {
            GraphValue::Relationship(r) => Ok(*r.clone()),
            _ => Err(Error::TypeMismatch {
                expected: "RELATIONSHIP".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &GraphValue) -> Result<Self> {
        match val {
            GraphValue::String(s) => Ok(s.clone()),
            _ => Err(Error::TypeMismatch {
                expected: "STRING".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for i64 {
    fn from_value(val: &GraphValue) -> Result<Self> {
        val.as_int().ok_or_else(|| Error::TypeMismatch {
            expected: "INTEGER".into(),
            got: val.type_name().into(),
        })
    }
}

impl FromValue for f64 {
    fn from_value(val: &GraphValue) -> Result<Self> {
        val.as_float().ok_or_else(|| Error::TypeMismatch {
            expected: "FLOAT".into(),
            got: val.type_name().into(),
        })
    }
}

// ============================================================================
// Paged listing service
// ============================================================================

/// One page of projected rows plus the pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub data: Vec<JsonMap<String, JsonValue>>,
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Run a filtered, paged listing: compile the spec, count the distinct
/// matches, fetch the requested page ordered by `order_field` (descending),
/// and project every row to its portable form.
pub async fn fetch_listing(
    store: &dyn GraphStore,
    compiler: &FilterCompiler,
    projector: &Projector,
    spec: &FilterSpec,
    order_field: &str,
) -> Result<Page> {
    let compiled = compiler.compile(spec)?;

    let count_rows = store
        .execute(&compiler.count_query(&compiled), compiled.params.clone())
        .await?;
    let total_items = match count_rows.first() {
        Some(row) => u64::try_from(row.get::<i64>("total")?).unwrap_or(0),
        None => 0,
    };

    let listing = compiler.listing_query(&compiled, order_field, true)?;
    let rows = store.execute(&listing, compiled.params.clone()).await?;

    let data = rows
        .iter()
        .map(|row| match row.value("item") {
            Some(GraphValue::Map(m)) => projector.project_row(m),
            Some(GraphValue::Node(n)) => projector.project_row(&n.properties),
            _ => projector.project_row(&row.values),
        })
        .collect();

    let (page, limit) = match spec.page {
        Some(p) => (p.page, p.limit),
        None => (1, total_items.max(1)),
    };
    Ok(Page {
        data,
        page,
        limit,
        total_items,
        total_pages: total_items.div_ceil(limit),
    })
}
