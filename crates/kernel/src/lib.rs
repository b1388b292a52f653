//! World kernel: entity-component worlds grouped into render-layer stacks.
//!
//! A [`World`] is one renderable layer of entities; a [`LayerStack`] is the
//! ordered set of layers a world-graph node owns while loaded.
//!
//! # Invariants
//! - Entity iteration order is deterministic (BTreeMap).
//! - Layer order mutations are deferred to the next `update`, so render
//!   order never changes mid-frame.
//! - Behavior hooks receive the world mutably but are never serialized.

mod behavior;
mod entity;
mod layer;
mod render;
mod world;

pub use behavior::Behavior;
pub use entity::{Collider, EntityId, Sprite, Transform2D, WorldContext};
pub use layer::{LayerStack, RenderLayer};
pub use render::{DebugFlags, DrawCmd, DrawList};
pub use world::{EntityData, World};
