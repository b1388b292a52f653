//! Developer tooling: read-only inspection of a world graph.

mod inspector;

pub use inspector::{GraphInspector, GraphSummary, NodeInfo};
