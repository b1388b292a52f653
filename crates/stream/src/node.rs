use glam::Vec2;
use skein_assets::{LoadPolicy, Task, TaskError};
use skein_common::{Camera, CustomEvent, InputEvent, NodeId, Rect};
use skein_kernel::{DebugFlags, DrawList, LayerStack, RenderLayer, World};
use skein_persist::{
    NodeContentRecord, PersistError, read_node_content, stack_from_record, stack_to_record,
    write_node_content,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default edge length of a freshly created node.
pub const DEFAULT_NODE_SIZE: f32 = 5000.0;

/// Observable lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStateKind {
    Unloaded,
    Loading,
    Loaded,
}

impl std::fmt::Display for NodeStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            NodeStateKind::Unloaded => "unloaded",
            NodeStateKind::Loading => "loading",
            NodeStateKind::Loaded => "loaded",
        };
        f.write_str(text)
    }
}

enum NodeState {
    Unloaded,
    Loading(Task<Result<NodeContentRecord, PersistError>>),
    Loaded(LayerStack),
}

/// One streaming unit: an identifier, a content file, rectangular bounds,
/// a load state machine, and (while loaded) a stack of render layers.
///
/// Bounds, identifier, and priority are mutated through the owning
/// [`WorldGraph`](crate::WorldGraph) so the spatial index and active-node
/// bookkeeping stay consistent; the node itself only exposes lifecycle and
/// content operations.
pub struct WorldGraphNode {
    index: NodeId,
    identifier: String,
    data_file: PathBuf,
    bounds: Rect,
    priority: i32,
    save_contents: bool,
    state: NodeState,
}

impl WorldGraphNode {
    pub(crate) fn new(index: NodeId, identifier: String, data_file: PathBuf) -> Self {
        Self {
            index,
            identifier,
            data_file,
            bounds: Rect::from_parts(Vec2::ZERO, Vec2::splat(DEFAULT_NODE_SIZE)),
            priority: 0,
            save_contents: true,
            state: NodeState::Unloaded,
        }
    }

    pub fn index(&self) -> NodeId {
        self.index
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn position(&self) -> Vec2 {
        self.bounds.position
    }

    pub fn size(&self) -> Vec2 {
        self.bounds.size
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether unloading serializes contents back to the data file.
    /// Transient nodes (test scratch, generated areas) switch this off.
    pub fn save_contents(&self) -> bool {
        self.save_contents
    }

    pub fn set_save_contents(&mut self, save: bool) {
        self.save_contents = save;
    }

    pub fn state_kind(&self) -> NodeStateKind {
        match self.state {
            NodeState::Unloaded => NodeStateKind::Unloaded,
            NodeState::Loading(_) => NodeStateKind::Loading,
            NodeState::Loaded(_) => NodeStateKind::Loaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, NodeState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, NodeState::Loading(_))
    }

    pub(crate) fn set_identifier_raw(&mut self, identifier: String) {
        self.identifier = identifier;
    }

    pub(crate) fn set_priority_raw(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Mutate bounds without graph bookkeeping. While loaded, worlds track
    /// the node's size.
    pub(crate) fn set_bounds_raw(&mut self, bounds: Rect) {
        self.bounds = bounds;
        if let NodeState::Loaded(stack) = &mut self.state {
            for i in 0..stack.len() {
                if let Some(world) = stack.world_mut(i) {
                    world.set_size(bounds.size);
                }
            }
        }
    }

    /// Begin the asynchronous content read. A no-op from `Loading` or
    /// `Loaded`, so at most one read is ever in flight.
    pub fn load(&mut self) {
        self.load_with_policy(LoadPolicy::Async);
    }

    pub fn load_with_policy(&mut self, policy: LoadPolicy) {
        if !matches!(self.state, NodeState::Unloaded) {
            return;
        }
        let path = self.data_file.clone();
        self.state = NodeState::Loading(Task::spawn(policy, move || {
            match read_node_content(&path) {
                Ok(record) => Ok(record),
                // A node that has never been saved starts out empty.
                Err(PersistError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                    Ok(NodeContentRecord::default())
                }
                Err(err) => Err(err),
            }
        }));
        info!(node = %self.identifier, "started loading of node");
    }

    /// Poll the in-flight read; if complete, materialize layers and become
    /// `Loaded`. Returns whether the node is loaded afterwards. At most one
    /// transition happens per call.
    pub fn try_init(&mut self) -> bool {
        match std::mem::replace(&mut self.state, NodeState::Unloaded) {
            NodeState::Loading(mut task) => match task.try_take() {
                None => {
                    self.state = NodeState::Loading(task);
                    false
                }
                Some(outcome) => self.finish_load(outcome),
            },
            other => {
                let loaded = matches!(other, NodeState::Loaded(_));
                debug_assert!(!loaded, "try_init on a loaded node");
                self.state = other;
                loaded
            }
        }
    }

    /// Force the in-flight read to complete synchronously. A no-op when not
    /// `Loading`. Returns whether the node is loaded afterwards.
    pub fn wait(&mut self) -> bool {
        match std::mem::replace(&mut self.state, NodeState::Unloaded) {
            NodeState::Loading(mut task) => {
                let outcome = task.wait();
                self.finish_load(outcome)
            }
            other => {
                let loaded = matches!(other, NodeState::Loaded(_));
                self.state = other;
                loaded
            }
        }
    }

    fn finish_load(&mut self, outcome: Result<Result<NodeContentRecord, PersistError>, TaskError>) -> bool {
        let record = match outcome {
            Ok(Ok(record)) => record,
            Ok(Err(err)) => {
                warn!(node = %self.identifier, error = %err, "node content failed to load");
                self.state = NodeState::Unloaded;
                return false;
            }
            Err(err) => {
                warn!(node = %self.identifier, error = %err, "node load worker failed");
                self.state = NodeState::Unloaded;
                return false;
            }
        };

        let mut stack = stack_from_record(&record);
        if stack.is_empty() {
            let mut world = World::new();
            world.set_name("main".into());
            stack.push_layer(Box::new(world));
        }
        // Worlds track the node's bounds, whatever size they were saved at.
        for i in 0..stack.len() {
            if let Some(world) = stack.world_mut(i) {
                world.set_size(self.bounds.size);
                world.init();
            }
        }
        self.state = NodeState::Loaded(stack);
        info!(node = %self.identifier, "loaded node");
        true
    }

    /// Release contents, serializing them first when `save_contents` is
    /// set. An in-flight load is waited out, never cancelled. On a failed
    /// save the node stays loaded and the error is returned.
    pub fn unload(&mut self) -> Result<(), PersistError> {
        if self.is_loading() {
            self.wait();
        }
        match std::mem::replace(&mut self.state, NodeState::Unloaded) {
            NodeState::Loaded(stack) => {
                if self.save_contents {
                    let record = stack_to_record(&stack);
                    if let Err(err) = write_node_content(&self.data_file, &record) {
                        warn!(node = %self.identifier, error = %err, "node save failed; keeping contents");
                        self.state = NodeState::Loaded(stack);
                        return Err(err);
                    }
                }
                info!(node = %self.identifier, "node unloaded");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Append a world layer. Only possible while loaded.
    pub fn add_world(&mut self) -> Option<&mut World> {
        let at = self.world_count();
        self.add_world_at(at)
    }

    pub fn add_world_at(&mut self, index: usize) -> Option<&mut World> {
        let NodeState::Loaded(stack) = &mut self.state else {
            return None;
        };
        let mut world = World::new();
        world.set_name(format!("world{}", stack.len()));
        world.set_size(self.bounds.size);
        let slot = stack.register_layer(Box::new(world), index);
        stack.world_mut(slot)
    }

    pub fn world(&self, index: usize) -> Option<&World> {
        match &self.state {
            NodeState::Loaded(stack) => stack.world(index),
            _ => None,
        }
    }

    pub fn world_mut(&mut self, index: usize) -> Option<&mut World> {
        match &mut self.state {
            NodeState::Loaded(stack) => stack.world_mut(index),
            _ => None,
        }
    }

    pub fn world_count(&self) -> usize {
        match &self.state {
            NodeState::Loaded(stack) => stack.len(),
            _ => 0,
        }
    }

    pub fn layers(&self) -> Option<&LayerStack> {
        match &self.state {
            NodeState::Loaded(stack) => Some(stack),
            _ => None,
        }
    }

    pub fn move_layer_up(&mut self, index: usize) {
        if let NodeState::Loaded(stack) = &mut self.state {
            stack.move_layer_up(index);
        }
    }

    pub fn move_layer_down(&mut self, index: usize) {
        if let NodeState::Loaded(stack) = &mut self.state {
            stack.move_layer_down(index);
        }
    }

    pub fn set_layer_active(&mut self, index: usize, active: bool) -> bool {
        match &mut self.state {
            NodeState::Loaded(stack) => stack.set_active(index, active),
            _ => false,
        }
    }

    /// Per-frame tick: polls a pending load, then updates active layers.
    pub fn update(&mut self, delta: f32, camera: &Camera) {
        if self.is_loading() {
            self.try_init();
        }
        if let NodeState::Loaded(stack) = &mut self.state {
            stack.update(delta, camera);
        }
    }

    /// Delegates to loaded layers; a neutral success when not loaded.
    pub fn render(&self, out: &mut DrawList, camera: &Camera) -> bool {
        match &self.state {
            NodeState::Loaded(stack) => stack.render(out, camera),
            _ => true,
        }
    }

    pub fn render_debug(&self, out: &mut DrawList, camera: &Camera, flags: DebugFlags) -> bool {
        match &self.state {
            NodeState::Loaded(stack) => stack.render_debug(out, camera, flags),
            _ => true,
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        if let NodeState::Loaded(stack) = &mut self.state {
            stack.handle_input(event);
        }
    }

    pub fn handle_custom_event(&mut self, event: &CustomEvent) {
        if let NodeState::Loaded(stack) = &mut self.state {
            stack.handle_custom_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_kernel::{Sprite, Transform2D};

    fn test_node(dir: &Path, name: &str) -> WorldGraphNode {
        WorldGraphNode::new(NodeId(0), name.into(), dir.join(format!("{name}.node")))
    }

    #[test]
    fn fresh_node_is_unloaded() {
        let tmp = tempfile::tempdir().unwrap();
        let node = test_node(tmp.path(), "fresh");
        assert_eq!(node.state_kind(), NodeStateKind::Unloaded);
        assert_eq!(node.size(), Vec2::splat(DEFAULT_NODE_SIZE));
        assert_eq!(node.world_count(), 0);
    }

    #[test]
    fn load_then_wait_reaches_loaded_with_a_default_world() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "empty");
        node.load();
        assert_eq!(node.state_kind(), NodeStateKind::Loading);
        assert!(node.wait());
        assert!(node.is_loaded());
        // Missing content file materializes one world sized to the node.
        assert_eq!(node.world_count(), 1);
        assert_eq!(node.world(0).unwrap().size(), node.size());
    }

    #[test]
    fn load_is_idempotent_while_loading_and_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "idem");
        node.load();
        node.load();
        node.wait();
        assert!(node.is_loaded());
        node.load();
        assert!(node.is_loaded());
        assert_eq!(node.world_count(), 1);
    }

    #[test]
    fn update_ticks_complete_the_load() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "polled");
        node.load_with_policy(LoadPolicy::Sync);
        assert!(node.is_loading());
        node.update(0.016, &Camera::default());
        assert!(node.is_loaded());
    }

    #[test]
    fn unload_persists_and_reload_restores_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "persist");
        node.load();
        node.wait();

        let world = node.world_mut(0).unwrap();
        let id = world.spawn(Transform2D::at(Vec2::new(42.0, 7.0)));
        world.tag_with_name(id, "marker");
        world.add_sprite(
            id,
            Sprite {
                texture: "marker.png".into(),
                size: Vec2::new(8.0, 8.0),
            },
        );
        node.unload().unwrap();
        assert_eq!(node.state_kind(), NodeStateKind::Unloaded);
        assert_eq!(node.world_count(), 0);

        node.load();
        node.wait();
        let world = node.world(0).unwrap();
        let id = world.entity_by_name("marker").unwrap();
        assert_eq!(world.get(id).unwrap().transform.position, Vec2::new(42.0, 7.0));
        assert!(world.sprite(id).is_some());
    }

    #[test]
    fn transient_node_skips_the_save() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "scratch");
        node.set_save_contents(false);
        node.load();
        node.wait();
        node.world_mut(0).unwrap().spawn(Transform2D::default());
        node.unload().unwrap();
        assert!(!node.data_file().exists());

        node.load();
        node.wait();
        assert_eq!(node.world(0).unwrap().entity_count(), 0);
    }

    #[test]
    fn corrupt_content_leaves_the_node_unloaded() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "corrupt");
        std::fs::write(node.data_file(), b"garbage that is not node content").unwrap();
        node.load();
        assert!(!node.wait());
        assert_eq!(node.state_kind(), NodeStateKind::Unloaded);
        // Frame calls on the failed node are safe no-ops.
        let mut out = DrawList::new();
        assert!(node.render(&mut out, &Camera::default()));
        assert!(out.is_empty());
        node.update(0.016, &Camera::default());
    }

    #[test]
    fn unload_while_loading_waits_first() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "racing");
        node.load();
        node.unload().unwrap();
        assert_eq!(node.state_kind(), NodeStateKind::Unloaded);
        // The waited-out load produced a default world, which was then
        // persisted; a reload sees it.
        assert!(node.data_file().exists());
    }

    #[test]
    fn add_world_requires_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "layers");
        assert!(node.add_world().is_none());

        node.load();
        node.wait();
        assert!(node.add_world().is_some());
        assert_eq!(node.world_count(), 2);
    }

    #[test]
    fn resize_while_loaded_propagates_to_worlds() {
        let tmp = tempfile::tempdir().unwrap();
        let mut node = test_node(tmp.path(), "sized");
        node.load();
        node.wait();
        node.set_bounds_raw(Rect::new(0.0, 0.0, 1600.0, 1200.0));
        assert_eq!(node.world(0).unwrap().size(), Vec2::new(1600.0, 1200.0));
    }
}
