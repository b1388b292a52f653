//! Connectivity: undirected adjacency lists over node indices.
//!
//! # Invariants
//! - Adjacency is symmetric: an edge (a, b) appears in both lists.
//! - The graph is simple: re-adding an existing edge never double-counts
//!   `edge_count`; self-loops are rejected.
//! - `neighbors` borrows the graph, so structural mutation during iteration
//!   is impossible rather than merely disallowed.

mod adjacency;

pub use adjacency::{GraphRecord, UndirectedAdjacencyLists};
