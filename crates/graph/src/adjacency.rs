use serde::{Deserialize, Serialize};
use skein_common::NodeId;
use std::collections::BTreeSet;

/// Undirected simple graph over vertex ids `0..vertex_count`.
///
/// Vertex ids are world-graph node indices; destroyed nodes leave an
/// edgeless vertex behind so ids stay stable for the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndirectedAdjacencyLists {
    adjacency: Vec<BTreeSet<NodeId>>,
    edge_count: usize,
}

/// Serial form: vertex count plus an edge list. Edge order is not
/// preserved; round-trips guarantee set equality only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(default)]
    pub vertex_count: u32,
    #[serde(default)]
    pub edges: Vec<(NodeId, NodeId)>,
}

impl UndirectedAdjacencyLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with `count` isolated vertices.
    pub fn with_vertices(count: u32) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); count as usize],
            edge_count: 0,
        }
    }

    /// Graph with `count` vertices and the given edges; out-of-range or
    /// duplicate edges are skipped.
    pub fn from_edges(count: u32, edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let mut graph = Self::with_vertices(count);
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    pub fn vertex_count(&self) -> u32 {
        self.adjacency.len() as u32
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Append a vertex; ids are assigned monotonically.
    pub fn add_vertex(&mut self) -> NodeId {
        self.adjacency.push(BTreeSet::new());
        NodeId(self.adjacency.len() as u32 - 1)
    }

    fn contains_vertex(&self, v: NodeId) -> bool {
        (v.0 as usize) < self.adjacency.len()
    }

    /// Connect two vertices. Returns false (and changes nothing) for
    /// self-loops, unknown vertices, or an already-present edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.contains_vertex(a) || !self.contains_vertex(b) {
            return false;
        }
        if !self.adjacency[a.0 as usize].insert(b) {
            return false;
        }
        self.adjacency[b.0 as usize].insert(a);
        self.edge_count += 1;
        true
    }

    /// Disconnect two vertices. Returns false if they were not connected.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.contains_vertex(a) || !self.contains_vertex(b) {
            return false;
        }
        if !self.adjacency[a.0 as usize].remove(&b) {
            return false;
        }
        self.adjacency[b.0 as usize].remove(&a);
        self.edge_count -= 1;
        true
    }

    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a.0 as usize)
            .is_some_and(|set| set.contains(&b))
    }

    /// Neighbors of `a` in ascending id order. Empty for unknown vertices.
    pub fn neighbors(&self, a: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(a.0 as usize)
            .into_iter()
            .flatten()
            .copied()
    }

    pub fn degree(&self, a: NodeId) -> usize {
        self.adjacency.get(a.0 as usize).map_or(0, BTreeSet::len)
    }

    /// Remove every edge incident to `a`, leaving the vertex in place.
    pub fn isolate(&mut self, a: NodeId) {
        let neighbors: Vec<NodeId> = self.neighbors(a).collect();
        for n in neighbors {
            self.remove_edge(a, n);
        }
    }

    pub fn to_record(&self) -> GraphRecord {
        let mut edges = Vec::with_capacity(self.edge_count);
        for (i, set) in self.adjacency.iter().enumerate() {
            let a = NodeId(i as u32);
            for &b in set {
                if a < b {
                    edges.push((a, b));
                }
            }
        }
        GraphRecord {
            vertex_count: self.vertex_count(),
            edges,
        }
    }

    /// Rebuild from a record. Malformed edges (out of range, duplicate,
    /// self-loop) are dropped rather than failing the whole read.
    pub fn from_record(record: &GraphRecord) -> Self {
        Self::from_edges(record.vertex_count, record.edges.iter().copied())
    }
}
