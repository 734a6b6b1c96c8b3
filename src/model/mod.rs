//! # Property Graph Model
//!
//! Clean DTOs for values, nodes and relationships as they come back from
//! the graph store. These types cross every boundary: store ↔ projection ↔
//! filter compilation ↔ caller.
//!
//! Design rule: NO store-driver types, NO JSON types here.
//! This module is pure data — no I/O, no state, no async.

pub mod node;
pub mod property_map;
pub mod relationship;
pub mod value;

pub use node::{NodeId, NodeRef};
pub use property_map::PropertyMap;
pub use relationship::{RelId, RelationshipRef};
pub use value::{GraphValue, IsoDuration};
