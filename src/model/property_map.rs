//! PropertyMap — the key-value store on nodes and relationships.

use std::collections::HashMap;

use super::GraphValue;

/// A map of property names to values. Also the shape of a result row
/// and of a query parameter set.
pub type PropertyMap = HashMap<String, GraphValue>;
