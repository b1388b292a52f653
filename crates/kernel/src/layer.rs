use crate::render::{DebugFlags, DrawList};
use crate::world::World;
use skein_common::{Camera, CustomEvent, InputEvent, Rect};
use std::collections::VecDeque;

/// The contract a world-graph node drives its content through.
///
/// `World` is the one first-party implementation; the trait exists so
/// special-purpose layers (tile maps, particle fields) can slot into the
/// same stack.
pub trait RenderLayer {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);

    /// Parallax factor. Depth 1.0 scrolls with the camera; smaller values
    /// scroll slower (distant scenery).
    fn render_depth(&self) -> f32;
    fn set_render_depth(&mut self, depth: f32);

    fn update(&mut self, delta: f32, view: Rect);
    fn render(&self, out: &mut DrawList, camera: &Camera) -> bool;
    fn render_debug(&self, out: &mut DrawList, camera: &Camera, flags: DebugFlags) -> bool;
    fn handle_input(&mut self, event: &InputEvent);
    fn handle_custom_event(&mut self, event: &CustomEvent);

    /// Downcast hooks for the common case.
    fn as_world(&self) -> Option<&World>;
    fn as_world_mut(&mut self) -> Option<&mut World>;
}

/// Ordered layer slots with an active flag per layer.
///
/// Reorder requests queue up and apply at the start of the next `update`,
/// so the paint order observed by `render` is stable within a frame.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<(Box<dyn RenderLayer>, bool)>,
    pending_moves: VecDeque<(usize, bool)>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Insert a layer at `index` (clamped to the end). Returns the slot the
    /// layer actually landed in. New layers start active.
    pub fn register_layer(&mut self, layer: Box<dyn RenderLayer>, index: usize) -> usize {
        let at = index.min(self.layers.len());
        self.layers.insert(at, (layer, true));
        at
    }

    pub fn push_layer(&mut self, layer: Box<dyn RenderLayer>) -> usize {
        self.register_layer(layer, usize::MAX)
    }

    pub fn layer(&self, index: usize) -> Option<&dyn RenderLayer> {
        self.layers.get(index).map(|(l, _)| l.as_ref())
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut (dyn RenderLayer + 'static)> {
        self.layers.get_mut(index).map(|(l, _)| l.as_mut())
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&dyn RenderLayer> {
        self.layers
            .iter()
            .find(|(l, _)| l.name() == name)
            .map(|(l, _)| l.as_ref())
    }

    pub fn world(&self, index: usize) -> Option<&World> {
        self.layer(index).and_then(RenderLayer::as_world)
    }

    pub fn world_mut(&mut self, index: usize) -> Option<&mut World> {
        self.layer_mut(index).and_then(RenderLayer::as_world_mut)
    }

    pub fn set_active(&mut self, index: usize, active: bool) -> bool {
        match self.layers.get_mut(index) {
            Some(slot) => {
                slot.1 = active;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.layers.get(index).is_some_and(|(_, active)| *active)
    }

    /// Queue a swap toward the end of the stack (drawn later).
    pub fn move_layer_up(&mut self, index: usize) {
        self.pending_moves.push_back((index, true));
    }

    /// Queue a swap toward the front of the stack (drawn earlier).
    pub fn move_layer_down(&mut self, index: usize) {
        self.pending_moves.push_back((index, false));
    }

    pub fn update(&mut self, delta: f32, camera: &Camera) {
        while let Some((index, up)) = self.pending_moves.pop_front() {
            if up {
                if index + 1 < self.layers.len() {
                    self.layers.swap(index, index + 1);
                }
            } else if index > 0 && index < self.layers.len() {
                self.layers.swap(index, index - 1);
            }
        }

        for (layer, active) in &mut self.layers {
            if *active {
                let view = camera.view_rect(layer.render_depth());
                layer.update(delta, view);
            }
        }
    }

    pub fn render(&self, out: &mut DrawList, camera: &Camera) -> bool {
        let mut ok = true;
        for (layer, active) in &self.layers {
            if *active {
                ok = layer.render(out, camera) && ok;
            }
        }
        ok
    }

    pub fn render_debug(&self, out: &mut DrawList, camera: &Camera, flags: DebugFlags) -> bool {
        let mut ok = true;
        for (layer, active) in &self.layers {
            if *active {
                ok = layer.render_debug(out, camera, flags) && ok;
            }
        }
        ok
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        for (layer, active) in &mut self.layers {
            if *active {
                layer.handle_input(event);
            }
        }
    }

    pub fn handle_custom_event(&mut self, event: &CustomEvent) {
        for (layer, active) in &mut self.layers {
            if *active {
                layer.handle_custom_event(event);
            }
        }
    }

    /// Drop all layers and any queued reorders.
    pub fn clear_everything(&mut self) {
        self.layers.clear();
        self.pending_moves.clear();
    }

    /// Iterate layers in stack order.
    pub fn iter(&self) -> impl Iterator<Item = (&dyn RenderLayer, bool)> {
        self.layers.iter().map(|(l, a)| (l.as_ref(), *a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Sprite, Transform2D};
    use glam::Vec2;

    fn named_world(name: &str) -> Box<dyn RenderLayer> {
        let mut world = World::new();
        world.set_name(name.to_string());
        let id = world.spawn(Transform2D::at(Vec2::ZERO));
        world.add_sprite(
            id,
            Sprite {
                texture: name.into(),
                size: Vec2::new(8.0, 8.0),
            },
        );
        Box::new(world)
    }

    #[test]
    fn register_layer_clamps_the_index() {
        let mut stack = LayerStack::new();
        assert_eq!(stack.register_layer(named_world("a"), 99), 0);
        assert_eq!(stack.register_layer(named_world("b"), 0), 0);
        assert_eq!(stack.layer(0).unwrap().name(), "b");
        assert_eq!(stack.layer(1).unwrap().name(), "a");
    }

    #[test]
    fn lookup_by_name() {
        let mut stack = LayerStack::new();
        stack.push_layer(named_world("ground"));
        stack.push_layer(named_world("sky"));
        assert!(stack.layer_by_name("sky").is_some());
        assert!(stack.layer_by_name("sea").is_none());
    }

    #[test]
    fn inactive_layers_do_not_render() {
        let mut stack = LayerStack::new();
        stack.push_layer(named_world("a"));
        stack.push_layer(named_world("b"));
        stack.set_active(0, false);

        let mut out = DrawList::new();
        stack.render(&mut out, &Camera::default());
        assert_eq!(out.sprite_textures(), vec!["b"]);
    }

    #[test]
    fn moves_apply_on_the_next_update() {
        let mut stack = LayerStack::new();
        stack.push_layer(named_world("a"));
        stack.push_layer(named_world("b"));
        stack.move_layer_up(0);

        // Not yet applied: render order is still a, b.
        let mut out = DrawList::new();
        stack.render(&mut out, &Camera::default());
        assert_eq!(out.sprite_textures(), vec!["a", "b"]);

        stack.update(0.016, &Camera::default());
        out.clear();
        stack.render(&mut out, &Camera::default());
        assert_eq!(out.sprite_textures(), vec!["b", "a"]);
    }

    #[test]
    fn out_of_range_moves_are_ignored() {
        let mut stack = LayerStack::new();
        stack.push_layer(named_world("only"));
        stack.move_layer_up(0);
        stack.move_layer_down(0);
        stack.move_layer_up(7);
        stack.update(0.016, &Camera::default());
        assert_eq!(stack.layer(0).unwrap().name(), "only");
    }

    #[test]
    fn clear_everything_empties_the_stack() {
        let mut stack = LayerStack::new();
        stack.push_layer(named_world("a"));
        stack.move_layer_up(0);
        stack.clear_everything();
        assert!(stack.is_empty());
        stack.update(0.016, &Camera::default());
    }
}
