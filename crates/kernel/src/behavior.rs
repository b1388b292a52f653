use crate::World;
use skein_common::{CustomEvent, InputEvent, Rect};

/// Named lifecycle hooks attached to a world.
///
/// This is the surface the scripting layer plugs into: the core calls hooks
/// at well-defined points and never interprets what they do. Hooks are
/// runtime state — they are re-registered after a world is deserialized,
/// never persisted.
#[allow(unused_variables)]
pub trait Behavior {
    /// Called once, right after the world is attached to a loaded node.
    fn on_init(&mut self, world: &mut World) {}

    /// Called every frame while the owning layer is active.
    fn on_update(&mut self, world: &mut World, delta: f32, view: Rect) {}

    /// Raw input forwarded from the frame loop.
    fn on_input(&mut self, world: &mut World, event: &InputEvent) {}

    /// Named event routed by the frame loop or other behaviors.
    fn on_custom_event(&mut self, world: &mut World, event: &CustomEvent) {}
}
