//! Shared types for the skein engine.
//!
//! # Invariants
//! - `Rect` sizes are strictly positive wherever node bounds are concerned;
//!   the mutating boundaries (world-graph ops) enforce this and report
//!   [`GeometryError`] on violation.
//! - `NodeId` values are never reused within a session.

mod camera;
mod events;
mod types;

pub use camera::Camera;
pub use events::{CustomEvent, InputEvent, PointerButton};
pub use types::{GeometryError, NodeId, Rect, validated};
