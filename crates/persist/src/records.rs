use glam::Vec2;
use serde::{Deserialize, Serialize};
use skein_common::Camera;
use skein_graph::GraphRecord;
use skein_kernel::{Collider, Sprite, WorldContext};

fn default_true() -> bool {
    true
}

fn default_depth() -> f32 {
    1.0
}

/// Serial form of one world-graph node. Content lives in the separate file
/// named by `file`; this record is only identity plus geometry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub w: f32,
    #[serde(default)]
    pub h: f32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub save_contents: bool,
}

/// Serial form of the whole graph: node list plus connectivity. Edge
/// endpoints refer to positions in `nodes`, not session node ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldGraphRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub graph: GraphRecord,
}

/// Serial form of a full session: camera, graph, editor color annotations
/// (indexed like `world_graph.nodes`), and the debug-render switch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(rename = "c", default)]
    pub camera: Camera,
    #[serde(rename = "wg", default)]
    pub world_graph: WorldGraphRecord,
    #[serde(rename = "nodeColorMap", default)]
    pub node_colors: Vec<[u8; 4]>,
    #[serde(rename = "db", default)]
    pub render_debug: bool,
}

/// Serial form of a node's content: the layer stack written on unload and
/// read on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeContentRecord {
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_depth")]
    pub depth: f32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub world: WorldRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldRecord {
    #[serde(default)]
    pub context: WorldContext,
    #[serde(default)]
    pub size: Vec2,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

/// One entity with its optional components. Entity ids are not persisted;
/// links between entities travel as the target's name and are reconnected
/// after the whole node is materialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub sprite: Option<Sprite>,
    #[serde(default)]
    pub collider: Option<Collider>,
    #[serde(default)]
    pub tether: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_record_missing_fields_default() {
        let rec: NodeRecord = serde_json::from_str(r#"{"id":"hub","file":"hub.node"}"#).unwrap();
        assert_eq!(rec.id, "hub");
        assert_eq!(rec.x, 0.0);
        assert_eq!(rec.w, 0.0);
        assert_eq!(rec.priority, 0);
        assert!(rec.save_contents);
    }

    #[test]
    fn state_record_uses_compact_keys() {
        let state = StateRecord {
            render_debug: true,
            ..StateRecord::default()
        };
        let text = serde_json::to_string(&state).unwrap();
        assert!(text.contains("\"c\""));
        assert!(text.contains("\"wg\""));
        assert!(text.contains("\"db\""));
        assert!(text.contains("\"nodeColorMap\""));
    }

    #[test]
    fn empty_state_parses_with_defaults() {
        let state: StateRecord = serde_json::from_str("{}").unwrap();
        assert!(!state.render_debug);
        assert!(state.world_graph.nodes.is_empty());
        assert!(state.node_colors.is_empty());
    }

    #[test]
    fn layer_record_defaults() {
        let layer: LayerRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(layer.depth, 1.0);
        assert!(layer.active);
        assert!(layer.world.entities.is_empty());
    }
}
