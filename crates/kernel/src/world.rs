use crate::behavior::Behavior;
use crate::entity::{Collider, EntityId, Sprite, Transform2D, WorldContext};
use crate::layer::RenderLayer;
use crate::render::{DebugFlags, DrawCmd, DrawList};
use glam::Vec2;
use skein_common::{Camera, CustomEvent, InputEvent, Rect};
use std::collections::BTreeMap;

/// Per-entity data every entity carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityData {
    pub transform: Transform2D,
}

/// One render layer of entities with components.
///
/// Storage is BTreeMap throughout so iteration (and therefore draw order
/// and serialization order) is deterministic. Entity-to-entity links
/// (tethers) are weak: they hold an id, and readers re-resolve instead of
/// assuming the target still exists.
pub struct World {
    name: String,
    render_depth: f32,
    context: WorldContext,
    size: Vec2,
    tick: u64,
    entities: BTreeMap<EntityId, EntityData>,
    names: BTreeMap<EntityId, String>,
    by_name: BTreeMap<String, EntityId>,
    sprites: BTreeMap<EntityId, Sprite>,
    colliders: BTreeMap<EntityId, Collider>,
    tethers: BTreeMap<EntityId, EntityId>,
    behaviors: BTreeMap<String, Box<dyn Behavior>>,
}

impl World {
    pub fn new() -> Self {
        Self::with_context(WorldContext::default())
    }

    pub fn with_context(context: WorldContext) -> Self {
        Self {
            name: String::new(),
            render_depth: 1.0,
            context,
            size: Vec2::ZERO,
            tick: 0,
            entities: BTreeMap::new(),
            names: BTreeMap::new(),
            by_name: BTreeMap::new(),
            sprites: BTreeMap::new(),
            colliders: BTreeMap::new(),
            tethers: BTreeMap::new(),
            behaviors: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> WorldContext {
        self.context
    }

    pub fn set_context(&mut self, context: WorldContext) {
        self.context = context;
    }

    /// Simulated area of this layer, kept in sync with the owning node.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn spawn(&mut self, transform: Transform2D) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, transform);
        id
    }

    pub fn spawn_with_id(&mut self, id: EntityId, transform: Transform2D) {
        self.entities.insert(id, EntityData { transform });
    }

    /// Remove an entity and all its components. Tethers pointing at it stay
    /// behind as dangling weak links; readers resolve through `contains`.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id);
        if data.is_some() {
            if let Some(name) = self.names.remove(&id) {
                self.by_name.remove(&name);
            }
            self.sprites.remove(&id);
            self.colliders.remove(&id);
            self.tethers.remove(&id);
        }
        data
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => {
                data.transform.position = position;
                true
            }
            None => false,
        }
    }

    /// Give an entity a lookup name. A name already in use rebinds to the
    /// new entity.
    pub fn tag_with_name(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        let name = name.into();
        if let Some(previous) = self.by_name.insert(name.clone(), id) {
            self.names.remove(&previous);
        }
        if let Some(old_name) = self.names.insert(id, name) {
            self.by_name.remove(&old_name);
        }
        true
    }

    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn named_entities(&self) -> &BTreeMap<EntityId, String> {
        &self.names
    }

    pub fn add_sprite(&mut self, id: EntityId, sprite: Sprite) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.sprites.insert(id, sprite);
        true
    }

    pub fn sprite(&self, id: EntityId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    pub fn add_collider(&mut self, id: EntityId, collider: Collider) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.colliders.insert(id, collider);
        true
    }

    pub fn collider(&self, id: EntityId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Weakly link `id` to `target`. The link survives the target's
    /// despawn; `tether_target` still reports it, `contains` disambiguates.
    pub fn set_tether(&mut self, id: EntityId, target: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.tethers.insert(id, target);
        true
    }

    pub fn tether_target(&self, id: EntityId) -> Option<EntityId> {
        self.tethers.get(&id).copied()
    }

    pub fn register_behavior(&mut self, name: impl Into<String>, hook: Box<dyn Behavior>) {
        self.behaviors.insert(name.into(), hook);
    }

    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Run `on_init` hooks. Called once when the owning node attaches this
    /// world after loading.
    pub fn init(&mut self) {
        self.dispatch(|world, hook| hook.on_init(world));
    }

    fn dispatch(&mut self, mut f: impl FnMut(&mut World, &mut dyn Behavior)) {
        let mut hooks = std::mem::take(&mut self.behaviors);
        for hook in hooks.values_mut() {
            f(self, hook.as_mut());
        }
        // Hooks registered during dispatch take effect next frame; the
        // originals win a name clash.
        for (name, hook) in hooks {
            self.behaviors.insert(name, hook);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLayer for World {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn render_depth(&self) -> f32 {
        self.render_depth
    }

    fn set_render_depth(&mut self, depth: f32) {
        self.render_depth = depth;
    }

    fn update(&mut self, delta: f32, view: Rect) {
        self.tick += 1;
        if self.context == WorldContext::Backdrop {
            return;
        }
        self.dispatch(|world, hook| hook.on_update(world, delta, view));
    }

    fn render(&self, out: &mut DrawList, camera: &Camera) -> bool {
        let view = camera.view_rect(self.render_depth);
        for (id, data) in &self.entities {
            if let Some(sprite) = self.sprites.get(id) {
                let bounds = Rect::from_parts(data.transform.position, sprite.size);
                if bounds.intersects(&view) {
                    out.push(DrawCmd::Sprite {
                        texture: sprite.texture.clone(),
                        position: data.transform.position,
                        size: sprite.size,
                        depth: self.render_depth,
                    });
                }
            }
        }
        true
    }

    fn render_debug(&self, out: &mut DrawList, _camera: &Camera, flags: DebugFlags) -> bool {
        if !flags.colliders {
            return true;
        }
        for (id, data) in &self.entities {
            let origin = data.transform.position;
            match self.colliders.get(id) {
                Some(Collider::Aabb { size }) => out.push(DrawCmd::Rect {
                    bounds: Rect::from_parts(origin, *size),
                    color: [0, 255, 0, 255],
                    filled: false,
                }),
                Some(Collider::RotatedRect {
                    up_left,
                    down_right,
                    ..
                }) => out.push(DrawCmd::Rect {
                    bounds: Rect::from_parts(origin + *up_left, *down_right - *up_left),
                    color: [0, 255, 0, 255],
                    filled: false,
                }),
                Some(Collider::ConvexPolygon { points }) | Some(Collider::EdgeChain { points }) => {
                    for pair in points.windows(2) {
                        out.push(DrawCmd::Line {
                            from: origin + pair[0],
                            to: origin + pair[1],
                            color: [0, 255, 0, 255],
                        });
                    }
                }
                None => {}
            }
        }
        true
    }

    fn handle_input(&mut self, event: &InputEvent) {
        self.dispatch(|world, hook| hook.on_input(world, event));
    }

    fn handle_custom_event(&mut self, event: &CustomEvent) {
        self.dispatch(|world, hook| hook.on_custom_event(world, event));
    }

    fn as_world(&self) -> Option<&World> {
        Some(self)
    }

    fn as_world_mut(&mut self) -> Option<&mut World> {
        Some(self)
    }
}
