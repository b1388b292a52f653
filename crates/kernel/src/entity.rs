use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform of an entity, relative to its owning node's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
}

impl Transform2D {
    pub fn at(position: Vec2) -> Self {
        Self { position }
    }
}

/// Visual component. The texture is referenced by name; pixel data lives in
/// the (out-of-core) renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: String,
    pub size: Vec2,
}

/// Collision shape, accessed generically — the core carries shapes through
/// streaming and serialization but never resolves collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Aabb { size: Vec2 },
    RotatedRect { up_left: Vec2, down_right: Vec2, rotation: f32 },
    ConvexPolygon { points: Vec<Vec2> },
    EdgeChain { points: Vec<Vec2> },
}

/// Which simulation context a world belongs to.
///
/// Systems consult the tag at runtime; there is no compile-time
/// specialization per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorldContext {
    #[default]
    Gameplay,
    /// Parallax scenery: rendered, never simulated.
    Backdrop,
}
