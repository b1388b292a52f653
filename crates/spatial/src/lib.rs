//! Spatial partition: a quad-tree over rectangular elements keyed by node id.
//!
//! # Invariants
//! - Every indexed id resolves to exactly one rect; `update` is atomic
//!   (remove + reinsert) so queries never observe a half-moved element.
//! - Query results are deterministic regardless of insertion order:
//!   `query_point` prefers the smallest id on (accidental) overlap,
//!   `query_region` returns ids sorted ascending.

mod quadtree;

pub use quadtree::{RectIndex, SpatialError};
