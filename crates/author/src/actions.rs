use glam::Vec2;
use skein_common::NodeId;
use skein_stream::{StreamError, WorldGraph};

/// An editing command over the world graph that can be applied and
/// reversed. Each command carries enough context to undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    /// Move a node by a delta. Undo = move back.
    Move { id: NodeId, offset: Vec2 },
    /// Place a node. Undo = restore the old position.
    SetPosition { id: NodeId, old: Vec2, new: Vec2 },
    /// Resize a node. Undo = restore the old size.
    SetSize { id: NodeId, old: Vec2, new: Vec2 },
    /// Grow/shrink by per-edge deltas. Undo = the negated deltas.
    Extend {
        id: NodeId,
        upleft: Vec2,
        downright: Vec2,
    },
    /// Rename. Undo = restore the old identifier.
    Rename {
        id: NodeId,
        old: String,
        new: String,
    },
    /// Reprioritize. Undo = restore the old priority.
    SetPriority { id: NodeId, old: i32, new: i32 },
    /// Add an edge. Undo = remove it.
    Connect { a: NodeId, b: NodeId },
    /// Remove an edge. Undo = add it back.
    Disconnect { a: NodeId, b: NodeId },
}

impl NodeAction {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::Move { id, offset } => Self::Move {
                id: *id,
                offset: -*offset,
            },
            Self::SetPosition { id, old, new } => Self::SetPosition {
                id: *id,
                old: *new,
                new: *old,
            },
            Self::SetSize { id, old, new } => Self::SetSize {
                id: *id,
                old: *new,
                new: *old,
            },
            Self::Extend {
                id,
                upleft,
                downright,
            } => Self::Extend {
                id: *id,
                upleft: -*upleft,
                downright: -*downright,
            },
            Self::Rename { id, old, new } => Self::Rename {
                id: *id,
                old: new.clone(),
                new: old.clone(),
            },
            Self::SetPriority { id, old, new } => Self::SetPriority {
                id: *id,
                old: *new,
                new: *old,
            },
            Self::Connect { a, b } => Self::Disconnect { a: *a, b: *b },
            Self::Disconnect { a, b } => Self::Connect { a: *a, b: *b },
        }
    }
}

/// Undo/redo stacks over world-graph edits.
///
/// The stack performs the edit itself; an operation the graph rejects
/// (unknown node, degenerate size) propagates its error and leaves both
/// stacks untouched.
#[derive(Default)]
pub struct ActionStack {
    undo_stack: Vec<NodeAction>,
    redo_stack: Vec<NodeAction>,
}

impl ActionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn move_node(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        offset: Vec2,
    ) -> Result<(), StreamError> {
        graph.move_node(id, offset)?;
        self.push(NodeAction::Move { id, offset });
        Ok(())
    }

    pub fn set_position(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        new: Vec2,
    ) -> Result<(), StreamError> {
        let old = graph
            .node(id)
            .ok_or(StreamError::NodeNotFound(id))?
            .position();
        graph.set_node_position(id, new)?;
        self.push(NodeAction::SetPosition { id, old, new });
        Ok(())
    }

    pub fn set_size(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        new: Vec2,
    ) -> Result<(), StreamError> {
        let old = graph.node(id).ok_or(StreamError::NodeNotFound(id))?.size();
        graph.set_node_size(id, new)?;
        self.push(NodeAction::SetSize { id, old, new });
        Ok(())
    }

    pub fn extend(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        upleft: Vec2,
        downright: Vec2,
    ) -> Result<(), StreamError> {
        graph.extend_node(id, upleft, downright)?;
        self.push(NodeAction::Extend {
            id,
            upleft,
            downright,
        });
        Ok(())
    }

    pub fn rename(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        new: impl Into<String>,
    ) -> Result<(), StreamError> {
        let new = new.into();
        let old = graph
            .node(id)
            .ok_or(StreamError::NodeNotFound(id))?
            .identifier()
            .to_string();
        graph.set_node_identifier(id, new.clone())?;
        self.push(NodeAction::Rename { id, old, new });
        Ok(())
    }

    pub fn set_priority(
        &mut self,
        graph: &mut WorldGraph,
        id: NodeId,
        new: i32,
    ) -> Result<(), StreamError> {
        let old = graph
            .node(id)
            .ok_or(StreamError::NodeNotFound(id))?
            .priority();
        graph.set_node_priority(id, new)?;
        self.push(NodeAction::SetPriority { id, old, new });
        Ok(())
    }

    pub fn connect(
        &mut self,
        graph: &mut WorldGraph,
        a: NodeId,
        b: NodeId,
    ) -> Result<(), StreamError> {
        if graph.connect(a, b)? {
            self.push(NodeAction::Connect { a, b });
        }
        Ok(())
    }

    pub fn disconnect(
        &mut self,
        graph: &mut WorldGraph,
        a: NodeId,
        b: NodeId,
    ) -> Result<(), StreamError> {
        if graph.disconnect(a, b)? {
            self.push(NodeAction::Disconnect { a, b });
        }
        Ok(())
    }

    /// Undo the last edit. Returns true if an operation was undone.
    pub fn undo(&mut self, graph: &mut WorldGraph) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        if let Err(err) = apply(graph, &action.inverse()) {
            tracing::warn!(error = %err, "undo failed; command dropped");
            return false;
        }
        self.redo_stack.push(action);
        true
    }

    /// Redo the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self, graph: &mut WorldGraph) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        if let Err(err) = apply(graph, &action) {
            tracing::warn!(error = %err, "redo failed; command dropped");
            return false;
        }
        self.undo_stack.push(action);
        true
    }

    fn push(&mut self, action: NodeAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();
    }
}

fn apply(graph: &mut WorldGraph, action: &NodeAction) -> Result<(), StreamError> {
    match action {
        NodeAction::Move { id, offset } => graph.move_node(*id, *offset),
        NodeAction::SetPosition { id, new, .. } => graph.set_node_position(*id, *new),
        NodeAction::SetSize { id, new, .. } => graph.set_node_size(*id, *new),
        NodeAction::Extend {
            id,
            upleft,
            downright,
        } => graph.extend_node(*id, *upleft, *downright),
        NodeAction::Rename { id, new, .. } => graph.set_node_identifier(*id, new.clone()),
        NodeAction::SetPriority { id, new, .. } => graph.set_node_priority(*id, *new),
        NodeAction::Connect { a, b } => graph.connect(*a, *b).map(|_| ()),
        NodeAction::Disconnect { a, b } => graph.disconnect(*a, *b).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_node(dir: &std::path::Path) -> (WorldGraph, NodeId) {
        let mut graph = WorldGraph::new();
        let id = graph.create_node("edited", dir.join("edited.node"));
        graph
            .set_node_position(id, Vec2::new(1000.0, 1000.0))
            .unwrap();
        graph.set_node_size(id, Vec2::new(200.0, 200.0)).unwrap();
        (graph, id)
    }

    #[test]
    fn move_and_undo_restores_position() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, id) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();

        stack
            .move_node(&mut graph, id, Vec2::new(50.0, -20.0))
            .unwrap();
        assert_eq!(graph.node(id).unwrap().position(), Vec2::new(1050.0, 980.0));

        assert!(stack.undo(&mut graph));
        assert_eq!(
            graph.node(id).unwrap().position(),
            Vec2::new(1000.0, 1000.0)
        );
        assert!(stack.redo(&mut graph));
        assert_eq!(graph.node(id).unwrap().position(), Vec2::new(1050.0, 980.0));
    }

    #[test]
    fn rejected_resize_stays_off_the_stack() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, id) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();

        assert!(stack.set_size(&mut graph, id, Vec2::new(0.0, 50.0)).is_err());
        assert!(!stack.can_undo());
        assert_eq!(graph.node(id).unwrap().size(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn extend_undo_negates_the_deltas() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, id) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();

        stack
            .extend(&mut graph, id, Vec2::new(10.0, 0.0), Vec2::new(0.0, 30.0))
            .unwrap();
        assert_eq!(graph.node(id).unwrap().position(), Vec2::new(990.0, 1000.0));
        assert_eq!(graph.node(id).unwrap().size(), Vec2::new(210.0, 230.0));

        stack.undo(&mut graph);
        assert_eq!(
            graph.node(id).unwrap().position(),
            Vec2::new(1000.0, 1000.0)
        );
        assert_eq!(graph.node(id).unwrap().size(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn rename_and_priority_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, id) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();

        stack.rename(&mut graph, id, "renamed").unwrap();
        stack.set_priority(&mut graph, id, 7).unwrap();
        assert_eq!(graph.node(id).unwrap().identifier(), "renamed");
        assert_eq!(graph.node(id).unwrap().priority(), 7);

        stack.undo(&mut graph);
        stack.undo(&mut graph);
        assert_eq!(graph.node(id).unwrap().identifier(), "edited");
        assert_eq!(graph.node(id).unwrap().priority(), 0);
    }

    #[test]
    fn connect_undo_disconnects() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, a) = graph_with_node(tmp.path());
        let b = graph.create_node("other", tmp.path().join("other.node"));
        graph.set_node_size(b, Vec2::new(100.0, 100.0)).unwrap();
        let mut stack = ActionStack::new();

        stack.connect(&mut graph, a, b).unwrap();
        assert!(graph.are_connected(a, b));
        stack.undo(&mut graph);
        assert!(!graph.are_connected(a, b));
        stack.redo(&mut graph);
        assert!(graph.are_connected(a, b));
    }

    #[test]
    fn duplicate_connect_records_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, a) = graph_with_node(tmp.path());
        let b = graph.create_node("other", tmp.path().join("other.node"));
        let mut stack = ActionStack::new();

        stack.connect(&mut graph, a, b).unwrap();
        stack.connect(&mut graph, a, b).unwrap();
        assert_eq!(stack.undo_count(), 1);
    }

    #[test]
    fn fresh_edit_clears_the_redo_stack() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, id) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();

        stack.move_node(&mut graph, id, Vec2::ONE).unwrap();
        stack.undo(&mut graph);
        assert!(stack.can_redo());
        stack.move_node(&mut graph, id, Vec2::ONE).unwrap();
        assert!(!stack.can_redo());
    }

    #[test]
    fn undo_on_empty_stack_is_false() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut graph, _) = graph_with_node(tmp.path());
        let mut stack = ActionStack::new();
        assert!(!stack.undo(&mut graph));
        assert!(!stack.redo(&mut graph));
    }
}
