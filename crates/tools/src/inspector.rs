use skein_common::NodeId;
use skein_stream::{NodeStateKind, WorldGraph};

/// World-graph inspector for developer tooling.
///
/// Read-only queries for debugging, CLI output, and development UI.
pub struct GraphInspector;

impl GraphInspector {
    /// Produce a summary of the graph state.
    pub fn summary(graph: &WorldGraph) -> GraphSummary {
        GraphSummary {
            node_count: graph.node_count(),
            loaded_count: graph.iter().filter(|n| n.is_loaded()).count(),
            edge_count: graph.edge_count(),
            active: graph.active_node(),
            pending_events: graph.pending_events(),
        }
    }

    /// Detailed info about a single node.
    pub fn inspect_node(graph: &WorldGraph, id: NodeId) -> Option<NodeInfo> {
        graph.node(id).map(|node| NodeInfo {
            id,
            identifier: node.identifier().to_string(),
            state: node.state_kind(),
            position: [node.position().x, node.position().y],
            size: [node.size().x, node.size().y],
            priority: node.priority(),
            world_count: node.world_count(),
            neighbors: graph.neighbors(id).collect(),
        })
    }

    /// All node infos in index order — the CLI's `inspect` table.
    pub fn list_nodes(graph: &WorldGraph) -> Vec<NodeInfo> {
        graph
            .iter()
            .filter_map(|n| Self::inspect_node(graph, n.index()))
            .collect()
    }
}

/// Summary of graph state for the inspector.
#[derive(Debug, Clone)]
pub struct GraphSummary {
    pub node_count: usize,
    pub loaded_count: usize,
    pub edge_count: usize,
    pub active: Option<NodeId>,
    pub pending_events: usize,
}

impl std::fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Graph: nodes={} loaded={} edges={} active={}",
            self.node_count,
            self.loaded_count,
            self.edge_count,
            match self.active {
                Some(id) => id.to_string(),
                None => "none".into(),
            }
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub identifier: String,
    pub state: NodeStateKind,
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub priority: i32,
    pub world_count: usize,
    pub neighbors: Vec<NodeId>,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node {} '{}' [{}] pos=({:.1}, {:.1}) size=({:.1}, {:.1}) priority={} worlds={} neighbors={:?}",
            self.id,
            self.identifier,
            self.state,
            self.position[0],
            self.position[1],
            self.size[0],
            self.size[1],
            self.priority,
            self.world_count,
            self.neighbors.iter().map(|n| n.0).collect::<Vec<_>>(),
        )
    }
}
