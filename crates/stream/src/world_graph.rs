use crate::node::WorldGraphNode;
use glam::Vec2;
use skein_common::{Camera, CustomEvent, GeometryError, InputEvent, NodeId, Rect, validated};
use skein_graph::UndirectedAdjacencyLists;
use skein_kernel::{DebugFlags, DrawCmd, DrawList};
use skein_persist::{NodeRecord, PersistError, WorldGraphRecord};
use skein_spatial::RectIndex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Errors from world-graph operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("cannot connect node {0} to itself")]
    SelfConnection(NodeId),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// What streaming does beyond loading the active node.
///
/// Both switches default on: graph neighbors of the active node preload,
/// and loaded nodes that are neither active nor adjacent to it unload
/// whenever streaming re-evaluates (a reference-position update, a
/// topology change, a bounds change). Unloads are immediate (no grace
/// period) and run in ascending index order, so tests observe one
/// deterministic sequence. When no node contains the reference position,
/// nothing unloads: leaving every node's bounds does not flush the world.
#[derive(Debug, Clone, Copy)]
pub struct StreamPolicy {
    pub preload_neighbors: bool,
    pub unload_detached: bool,
}

impl Default for StreamPolicy {
    fn default() -> Self {
        Self {
            preload_neighbors: true,
            unload_detached: true,
        }
    }
}

/// Change feed for tooling and the editor. Drained, never required for
/// core correctness.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeCreated(NodeId),
    NodeDestroyed(NodeId),
    BoundsChanged(NodeId),
    IdentifierChanged(NodeId),
    PriorityChanged(NodeId),
    Connected(NodeId, NodeId),
    Disconnected(NodeId, NodeId),
    ActiveChanged(Option<NodeId>),
    LoadStarted(NodeId),
    NodeLoaded(NodeId),
    NodeUnloaded(NodeId),
}

/// The orchestrator: node storage, spatial index, connectivity, active-node
/// tracking, and frame delegation.
///
/// Nodes are exclusively owned here and addressed by stable index; foreign
/// holders re-resolve via [`WorldGraph::node`] each frame instead of
/// caching references across possible destructions.
pub struct WorldGraph {
    nodes: std::collections::BTreeMap<NodeId, WorldGraphNode>,
    spatial: RectIndex,
    connectivity: UndirectedAdjacencyLists,
    active: Option<NodeId>,
    reference_position: Vec2,
    next_index: u32,
    policy: StreamPolicy,
    events: Vec<GraphEvent>,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::with_policy(StreamPolicy::default())
    }

    pub fn with_policy(policy: StreamPolicy) -> Self {
        Self {
            nodes: std::collections::BTreeMap::new(),
            spatial: RectIndex::new(),
            connectivity: UndirectedAdjacencyLists::new(),
            active: None,
            reference_position: Vec2::ZERO,
            next_index: 0,
            policy,
            events: Vec::new(),
        }
    }

    pub fn policy(&self) -> StreamPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: StreamPolicy) {
        self.policy = policy;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.connectivity.edge_count()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active
    }

    pub fn reference_position(&self) -> Vec2 {
        self.reference_position
    }

    /// Drain the pending change feed.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events accumulated since the last drain.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Allocate a node: fresh index, default bounds at the origin, indexed
    /// spatially, a vertex in the connectivity graph. The node is NOT
    /// loaded.
    pub fn create_node(
        &mut self,
        identifier: impl Into<String>,
        data_file: impl Into<PathBuf>,
    ) -> NodeId {
        let id = NodeId(self.next_index);
        self.next_index += 1;
        let vertex = self.connectivity.add_vertex();
        debug_assert_eq!(vertex, id, "connectivity vertices must mirror node indices");

        let node = WorldGraphNode::new(id, identifier.into(), data_file.into());
        let indexed = self.spatial.insert(id, node.bounds());
        debug_assert!(indexed.is_ok(), "fresh node id already indexed");
        info!(node = %node.identifier(), id = %id, "created node");
        self.nodes.insert(id, node);
        self.events.push(GraphEvent::NodeCreated(id));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&WorldGraphNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut WorldGraphNode> {
        self.nodes.get_mut(&id)
    }

    /// The node whose bounds contain the point, if any.
    pub fn node_at(&self, point: Vec2) -> Option<&WorldGraphNode> {
        self.spatial.query_point(point).and_then(|id| self.nodes.get(&id))
    }

    pub fn node_id_at(&self, point: Vec2) -> Option<NodeId> {
        self.spatial.query_point(point)
    }

    /// All nodes whose bounds intersect the region (mouse picking,
    /// streaming candidates), ascending by index.
    pub fn nodes_in_region(&self, region: Rect) -> Vec<NodeId> {
        self.spatial.query_region(region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldGraphNode> {
        self.nodes.values()
    }

    /// Destroy a node: unload (waiting out a pending read), drop it from
    /// the spatial index, strip its edges, free the slot. The index is
    /// never reused.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        if let Err(err) = node.unload() {
            warn!(id = %id, error = %err, "destroying node despite failed save");
            node.set_save_contents(false);
            let _ = node.unload();
        }
        self.nodes.remove(&id);
        self.spatial.remove(id);
        self.connectivity.isolate(id);
        self.events.push(GraphEvent::NodeDestroyed(id));
        if self.active == Some(id) {
            self.recompute_active();
        }
        Ok(())
    }

    // ---- connectivity -------------------------------------------------

    /// Connect two nodes. Connecting to the active node streams the other
    /// endpoint in (when preloading is enabled). Returns whether the edge
    /// was new.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<bool, StreamError> {
        self.check_pair(a, b)?;
        let added = self.connectivity.add_edge(a, b);
        if added {
            self.events.push(GraphEvent::Connected(a, b));
            self.apply_streaming();
        }
        Ok(added)
    }

    /// Disconnect two nodes. A now-detached loaded node unloads per the
    /// streaming policy. Returns whether an edge was removed.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> Result<bool, StreamError> {
        self.check_pair(a, b)?;
        let removed = self.connectivity.remove_edge(a, b);
        if removed {
            self.events.push(GraphEvent::Disconnected(a, b));
            self.apply_streaming();
        }
        Ok(removed)
    }

    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.connectivity.are_connected(a, b)
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.connectivity.neighbors(id)
    }

    fn check_pair(&self, a: NodeId, b: NodeId) -> Result<(), StreamError> {
        if a == b {
            return Err(StreamError::SelfConnection(a));
        }
        for id in [a, b] {
            if !self.nodes.contains_key(&id) {
                return Err(StreamError::NodeNotFound(id));
            }
        }
        Ok(())
    }

    // ---- reference position and streaming -----------------------------

    /// Store the reference position (camera/player), recompute the active
    /// node, and stream accordingly.
    pub fn update_reference_position(&mut self, point: Vec2) {
        self.reference_position = point;
        self.recompute_active();
        self.apply_streaming();
    }

    fn recompute_active(&mut self) {
        let new_active = self.spatial.query_point(self.reference_position);
        if new_active != self.active {
            debug!(from = ?self.active, to = ?new_active, "active node changed");
            self.active = new_active;
            self.events.push(GraphEvent::ActiveChanged(new_active));
        }
    }

    /// Load the active node and (per policy) its graph neighbors; unload
    /// loaded nodes that are neither. Without an active node this is a
    /// no-op.
    fn apply_streaming(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        let mut wanted: BTreeSet<NodeId> = BTreeSet::new();
        wanted.insert(active);
        if self.policy.preload_neighbors {
            wanted.extend(self.connectivity.neighbors(active));
        }

        for &id in &wanted {
            if let Some(node) = self.nodes.get_mut(&id) {
                if !node.is_loaded() && !node.is_loading() {
                    node.load();
                    self.events.push(GraphEvent::LoadStarted(id));
                }
            }
        }

        if self.policy.unload_detached {
            let detached: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(id, node)| {
                    !wanted.contains(id) && (node.is_loaded() || node.is_loading())
                })
                .map(|(&id, _)| id)
                .collect();
            for id in detached {
                self.unload_node_internal(id);
            }
        }
    }

    /// Explicitly start loading a node (editor/tooling path).
    pub fn load_node(&mut self, id: NodeId) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        if !node.is_loaded() && !node.is_loading() {
            node.load();
            self.events.push(GraphEvent::LoadStarted(id));
        }
        Ok(())
    }

    /// Block until the node's pending load settles. Returns whether it is
    /// loaded afterwards.
    pub fn wait_node(&mut self, id: NodeId) -> Result<bool, StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        let was = node.is_loaded();
        let loaded = node.wait();
        if !was && loaded {
            self.events.push(GraphEvent::NodeLoaded(id));
        }
        Ok(loaded)
    }

    /// Wait out every pending load (bulk-load reconnection, editor sync).
    pub fn wait_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let _ = self.wait_node(id);
        }
    }

    pub fn unload_node(&mut self, id: NodeId) -> Result<(), StreamError> {
        if !self.nodes.contains_key(&id) {
            return Err(StreamError::NodeNotFound(id));
        }
        self.unload_node_internal(id);
        Ok(())
    }

    fn unload_node_internal(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let was = node.is_loaded() || node.is_loading();
        match node.unload() {
            Ok(()) if was => self.events.push(GraphEvent::NodeUnloaded(id)),
            Ok(()) => {}
            Err(err) => warn!(id = %id, error = %err, "unload failed; node stays resident"),
        }
    }

    /// Unload every node (shutdown).
    pub fn unload_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.unload_node_internal(id);
        }
    }

    // ---- bounds and identity mutation ---------------------------------

    pub fn set_node_position(&mut self, id: NodeId, position: Vec2) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        let bounds = Rect::from_parts(position, node.size());
        node.set_bounds_raw(bounds);
        self.notify_bounds_changed(id);
        Ok(())
    }

    pub fn move_node(&mut self, id: NodeId, offset: Vec2) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        let bounds = Rect::from_parts(node.position() + offset, node.size());
        node.set_bounds_raw(bounds);
        self.notify_bounds_changed(id);
        Ok(())
    }

    /// Resize a node. Non-positive sizes are rejected and the previous
    /// bounds kept.
    pub fn set_node_size(&mut self, id: NodeId, size: Vec2) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        let bounds = validated(Rect::from_parts(node.position(), size))?;
        node.set_bounds_raw(bounds);
        self.notify_bounds_changed(id);
        Ok(())
    }

    /// Apply independent deltas to the up-left and down-right edges. The
    /// combined result must stay positive in both axes or nothing changes.
    pub fn extend_node(
        &mut self,
        id: NodeId,
        delta_upleft: Vec2,
        delta_downright: Vec2,
    ) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        let bounds = validated(node.bounds().extended(delta_upleft, delta_downright))?;
        node.set_bounds_raw(bounds);
        self.notify_bounds_changed(id);
        Ok(())
    }

    pub fn set_node_identifier(
        &mut self,
        id: NodeId,
        identifier: impl Into<String>,
    ) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        node.set_identifier_raw(identifier.into());
        self.events.push(GraphEvent::IdentifierChanged(id));
        Ok(())
    }

    pub fn set_node_priority(&mut self, id: NodeId, priority: i32) -> Result<(), StreamError> {
        let node = self.nodes.get_mut(&id).ok_or(StreamError::NodeNotFound(id))?;
        node.set_priority_raw(priority);
        self.events.push(GraphEvent::PriorityChanged(id));
        Ok(())
    }

    /// Re-index after a bounds change and re-evaluate the active node; the
    /// reference position may have fallen inside or out of the node.
    fn notify_bounds_changed(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get(&id) {
            let updated = self.spatial.update(id, node.bounds());
            debug_assert!(updated.is_ok(), "node missing from spatial index");
        }
        self.events.push(GraphEvent::BoundsChanged(id));
        self.recompute_active();
        self.apply_streaming();
    }

    // ---- frame delegation ---------------------------------------------

    /// All node indices in frame order: ascending priority, ties by index.
    fn frame_order(&self) -> Vec<NodeId> {
        let mut order: Vec<(i32, NodeId)> = self
            .nodes
            .values()
            .map(|n| (n.priority(), n.index()))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    }

    /// Tick every node in frame order. Pending loads settle here (at most
    /// one transition per node per tick); loaded nodes update their layers.
    pub fn update(&mut self, delta: f32, camera: &Camera) {
        for id in self.frame_order() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let was = node.is_loaded();
            node.update(delta, camera);
            if !was && node.is_loaded() {
                self.events.push(GraphEvent::NodeLoaded(id));
            }
        }
    }

    /// Render loaded nodes in frame order.
    pub fn render(&self, out: &mut DrawList, camera: &Camera) -> bool {
        let mut ok = true;
        for id in self.frame_order() {
            if let Some(node) = self.nodes.get(&id) {
                if node.is_loaded() {
                    ok = node.render(out, camera) && ok;
                }
            }
        }
        ok
    }

    /// Debug overlay: node frames, identifiers, connectivity edges, then
    /// per-layer debug geometry of loaded nodes.
    pub fn render_debug(&self, out: &mut DrawList, camera: &Camera, flags: DebugFlags) -> bool {
        if flags.bounds {
            for id in self.frame_order() {
                let Some(node) = self.nodes.get(&id) else {
                    continue;
                };
                let bounds = node.bounds();
                out.push(DrawCmd::Rect {
                    bounds,
                    color: [255, 255, 255, 255],
                    filled: false,
                });
                let mut label = node.identifier().to_string();
                if self.active == Some(id) {
                    label.push_str(" (active)");
                }
                if node.is_loaded() {
                    label.push_str(" [loaded]");
                }
                out.push(DrawCmd::Label {
                    text: label,
                    position: bounds.position + bounds.size * 0.25,
                });
                for neighbor in self.connectivity.neighbors(id) {
                    if id < neighbor {
                        if let Some(other) = self.nodes.get(&neighbor) {
                            out.push(DrawCmd::Line {
                                from: bounds.center(),
                                to: other.bounds().center(),
                                color: [255, 255, 255, 255],
                            });
                        }
                    }
                }
            }
        }

        let mut ok = true;
        for id in self.frame_order() {
            if let Some(node) = self.nodes.get(&id) {
                if node.is_loaded() {
                    ok = node.render_debug(out, camera, flags) && ok;
                }
            }
        }
        ok
    }

    /// Broadcast input to loaded nodes in frame order.
    pub fn handle_input(&mut self, event: &InputEvent) {
        for id in self.frame_order() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.handle_input(event);
            }
        }
    }

    /// Broadcast a named event to loaded nodes in frame order.
    pub fn handle_custom_event(&mut self, event: &CustomEvent) {
        for id in self.frame_order() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.handle_custom_event(event);
            }
        }
    }

    // ---- persistence --------------------------------------------------

    /// Capture nodes and connectivity. Edge endpoints are remapped to node
    /// positions within the record, so records stay valid across sessions
    /// with holes in the index space.
    pub fn to_record(&self) -> WorldGraphRecord {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let position_of = |id: NodeId| -> Option<u32> {
            ids.binary_search(&id).ok().map(|p| p as u32)
        };

        let nodes = ids
            .iter()
            .map(|id| {
                let node = &self.nodes[id];
                NodeRecord {
                    id: node.identifier().to_string(),
                    file: node.data_file().to_string_lossy().into_owned(),
                    x: node.position().x,
                    y: node.position().y,
                    w: node.size().x,
                    h: node.size().y,
                    priority: node.priority(),
                    save_contents: node.save_contents(),
                }
            })
            .collect();

        let mut edges = Vec::with_capacity(self.connectivity.edge_count());
        for &a in &ids {
            for b in self.connectivity.neighbors(a) {
                if a < b {
                    if let (Some(pa), Some(pb)) = (position_of(a), position_of(b)) {
                        edges.push((NodeId(pa), NodeId(pb)));
                    }
                }
            }
        }

        WorldGraphRecord {
            nodes,
            graph: skein_graph::GraphRecord {
                vertex_count: ids.len() as u32,
                edges,
            },
        }
    }

    /// Replace this graph's contents with a record. Existing nodes are
    /// unloaded and dropped; recreated nodes come back in record order, in
    /// sleeping (unloaded) state — streaming resumes on the next reference
    /// update. Degenerate persisted bounds fall back to the default size.
    pub fn load_record(&mut self, record: &WorldGraphRecord) {
        self.unload_all();
        self.nodes.clear();
        self.spatial = RectIndex::new();
        self.connectivity = UndirectedAdjacencyLists::new();
        self.active = None;
        self.next_index = 0;
        self.events.clear();

        let mut created: Vec<NodeId> = Vec::with_capacity(record.nodes.len());
        for node_record in &record.nodes {
            let id = self.create_node(node_record.id.clone(), node_record.file.clone());
            created.push(id);
            let bounds = Rect::new(node_record.x, node_record.y, node_record.w, node_record.h);
            match validated(bounds) {
                Ok(bounds) => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.set_bounds_raw(bounds);
                    }
                    let updated = self.spatial.update(id, bounds);
                    debug_assert!(updated.is_ok());
                }
                Err(err) => {
                    warn!(node = %node_record.id, error = %err, "persisted bounds rejected; using defaults");
                }
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_priority_raw(node_record.priority);
                node.set_save_contents(node_record.save_contents);
            }
        }

        for &(a, b) in &record.graph.edges {
            match (created.get(a.0 as usize), created.get(b.0 as usize)) {
                (Some(&na), Some(&nb)) => {
                    self.connectivity.add_edge(na, nb);
                }
                _ => warn!(?a, ?b, "persisted edge references missing node; dropped"),
            }
        }

        // Nodes deserialize sleeping; only recompute which one is active.
        self.recompute_active();
    }
}

impl Default for WorldGraph {
    fn default() -> Self {
        Self::new()
    }
}
