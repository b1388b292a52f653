use crate::records::{EntityRecord, LayerRecord, NodeContentRecord, WorldRecord};
use skein_kernel::{EntityId, LayerStack, RenderLayer, Transform2D, World};
use std::collections::BTreeMap;
use tracing::warn;

/// Scratch state for reconnecting entity references after a bulk load.
///
/// Entity links are persisted as target *names* because ids are not stable
/// across sessions. While a node's layers materialize, every named entity
/// registers here; once all layers exist, `resolve` rewires the deferred
/// links. A link may cross layers within the same node.
#[derive(Debug, Default)]
pub struct DeserialMemory {
    names: BTreeMap<String, EntityId>,
    pending: Vec<PendingTether>,
}

#[derive(Debug)]
struct PendingTether {
    layer: usize,
    source: EntityId,
    target_name: String,
}

impl DeserialMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named entity. On a cross-layer name clash the first
    /// registration wins, matching lookup order.
    pub fn register_name(&mut self, name: &str, id: EntityId) {
        self.names.entry(name.to_string()).or_insert(id);
    }

    pub fn defer_tether(&mut self, layer: usize, source: EntityId, target_name: String) {
        self.pending.push(PendingTether {
            layer,
            source,
            target_name,
        });
    }

    /// Rewire all deferred links against the fully materialized stack.
    /// Returns how many links were resolved; unresolvable targets are
    /// logged and dropped.
    pub fn resolve(&mut self, stack: &mut LayerStack) -> usize {
        let mut resolved = 0;
        for link in self.pending.drain(..) {
            match self.names.get(&link.target_name) {
                Some(&target) => {
                    if let Some(world) = stack.world_mut(link.layer) {
                        if world.set_tether(link.source, target) {
                            resolved += 1;
                        }
                    }
                }
                None => {
                    warn!(target_name = %link.target_name, "unresolved entity reference dropped");
                }
            }
        }
        resolved
    }
}

/// Capture a world into its serial form.
pub fn world_to_record(world: &World) -> WorldRecord {
    let mut entities = Vec::with_capacity(world.entity_count());
    for (&id, data) in world.entities() {
        let tether = world.tether_target(id).and_then(|target| {
            let name = world.name_of(target);
            if name.is_none() {
                warn!("tether to unnamed entity cannot be persisted; dropped");
            }
            name.map(str::to_string)
        });
        entities.push(EntityRecord {
            name: world.name_of(id).map(str::to_string),
            position: data.transform.position,
            sprite: world.sprite(id).cloned(),
            collider: world.collider(id).cloned(),
            tether,
        });
    }
    WorldRecord {
        context: world.context(),
        size: world.size(),
        entities,
    }
}

/// Materialize a world from its serial form, registering names and
/// deferring entity links into `memory`.
pub fn world_from_record(
    record: &WorldRecord,
    layer_index: usize,
    memory: &mut DeserialMemory,
) -> World {
    let mut world = World::with_context(record.context);
    world.set_size(record.size);
    for entity in &record.entities {
        let id = world.spawn(Transform2D::at(entity.position));
        if let Some(name) = &entity.name {
            world.tag_with_name(id, name.clone());
            memory.register_name(name, id);
        }
        if let Some(sprite) = &entity.sprite {
            world.add_sprite(id, sprite.clone());
        }
        if let Some(collider) = &entity.collider {
            world.add_collider(id, collider.clone());
        }
        if let Some(target_name) = &entity.tether {
            memory.defer_tether(layer_index, id, target_name.clone());
        }
    }
    world
}

/// Capture a layer stack into a content record. Layers that are not
/// entity worlds have no serial form and are skipped.
pub fn stack_to_record(stack: &LayerStack) -> NodeContentRecord {
    let mut layers = Vec::with_capacity(stack.len());
    for (layer, active) in stack.iter() {
        match layer.as_world() {
            Some(world) => layers.push(LayerRecord {
                name: layer.name().to_string(),
                depth: layer.render_depth(),
                active,
                world: world_to_record(world),
            }),
            None => warn!(layer = layer.name(), "non-world layer skipped in save"),
        }
    }
    NodeContentRecord { layers }
}

/// Materialize a full layer stack, then resolve deferred entity links.
pub fn stack_from_record(content: &NodeContentRecord) -> LayerStack {
    let mut stack = LayerStack::new();
    let mut memory = DeserialMemory::new();
    for (i, layer_record) in content.layers.iter().enumerate() {
        let mut world = world_from_record(&layer_record.world, i, &mut memory);
        world.set_name(layer_record.name.clone());
        world.set_render_depth(layer_record.depth);
        let slot = stack.push_layer(Box::new(world));
        stack.set_active(slot, layer_record.active);
    }
    memory.resolve(&mut stack);
    stack
}
