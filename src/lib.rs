//! # dashgraph — graph-result normalization & projection core
//!
//! The data-shaping layer of a property-graph analytics dashboard. Report
//! handlers run queries against the store and hand the raw rows to this
//! crate, which turns them into portable, serialization-ready values.
//!
//! ## What it does
//!
//! 1. **Coercion** — store-native typed values (64-bit integers, driver
//!    temporal structs, nodes, relationships) become plain JSON values,
//!    recursively through lists and maps. Total: never fails on a
//!    well-formed store value.
//! 2. **Temporal normalization** — fields named in a configurable
//!    allow-list resolve to canonical ISO-8601 strings, degrading to a
//!    plain string when the value is not date-shaped.
//! 3. **Graph projection** — (node, relationship, node) traversal rows
//!    fold into a deduplicated `{nodes, edges}` visualization graph with
//!    derived display labels and hover titles.
//! 4. **Filter compilation** — sparse optional search filters plus
//!    pagination compile into a deterministic parameterized query.
//!
//! ## Quick start
//!
//! ```rust
//! use dashgraph::{FilterCompiler, FilterSpec, PageSpec, Projector, TimestampFields};
//!
//! # fn example() -> dashgraph::Result<()> {
//! let projector = Projector::new(TimestampFields::default());
//! let compiler = FilterCompiler::default();
//!
//! let spec = FilterSpec {
//!     text_match: Some("ana".into()),
//!     page: Some(PageSpec { page: 1, limit: 20 }),
//!     ..Default::default()
//! };
//! let compiled = compiler.compile(&spec)?;
//! let query = compiler.listing_query(&compiled, "dtUltimaAtualizacao", true)?;
//! // run `query` with `compiled.params` against the store, then
//! // `projector.project_row(..)` each returned row.
//! # let _ = (projector, query);
//! # Ok(())
//! # }
//! ```
//!
//! HTTP routing, configuration loading, caching and the store itself are
//! external collaborators; the store is reached through the narrow
//! [`GraphStore`] trait.

// ============================================================================
// Modules
// ============================================================================

pub mod convert;
pub mod filter;
pub mod model;
pub mod store;
pub mod visual;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{GraphValue, IsoDuration, NodeId, NodeRef, PropertyMap, RelId, RelationshipRef};

// ============================================================================
// Re-exports: Projection
// ============================================================================

pub use convert::{Projector, TimestampFields};
pub use visual::{
    GraphProjection, GraphProjectionBuilder, TraversalRow, VisualEdge, VisualNode,
    build_graph_projection,
};

// ============================================================================
// Re-exports: Filter compilation
// ============================================================================

pub use filter::{
    CompiledQuery, DateRange, FilterCompiler, FilterSpec, PageSpec, RelFilterPattern,
};

// ============================================================================
// Re-exports: Store seam
// ============================================================================

pub use store::{FromValue, GraphStore, Page, Row, fetch_listing};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied filter value is structurally unusable for
    /// parameter binding.
    #[error("invalid filter `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },

    /// Query execution failed in the store.
    #[error("store error: {0}")]
    Store(String),

    /// A row field held a different kind than the caller asked for.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// A declared column was absent from the row.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
