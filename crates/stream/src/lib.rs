//! World-graph streaming: the spatial partition and lifecycle core.
//!
//! A [`WorldGraph`] owns named rectangular [`WorldGraphNode`]s, each an
//! independently loadable unit of the game world. Nodes stream in and out
//! based on which node contains the reference position (the active node)
//! and which nodes are graph-connected to it.
//!
//! # Invariants
//! - The spatial index always reflects current node bounds; bounds
//!   mutations re-index synchronously.
//! - A node transitions at most once per tick, and the async content read
//!   never touches graph structures — it only produces a payload consumed
//!   on the main thread.
//! - Frame delegation order is deterministic: ascending priority, ties
//!   broken by ascending node index.
//! - Node indices are never reused within a session.

mod node;
mod world_graph;

pub use node::{DEFAULT_NODE_SIZE, NodeStateKind, WorldGraphNode};
pub use world_graph::{GraphEvent, StreamError, StreamPolicy, WorldGraph};
