use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable index of a world-graph node.
///
/// Assigned by a monotonic counter and never reused within a session, so
/// foreign structures (spatial index, connectivity graph, editor tables) may
/// hold a `NodeId` across frames without risk of it silently rebinding to a
/// different node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned rectangle: top-left `position` plus `size`.
///
/// Containment is half-open (`[x, x+w)` on both axes) so a point on the
/// shared edge of two adjacent rects belongs to exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_parts(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x < self.position.x + self.size.x
            && point.y < self.position.y + self.size.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.position.x < other.position.x + other.size.x
            && other.position.x < self.position.x + self.size.x
            && self.position.y < other.position.y + other.size.y
            && other.position.y < self.position.y + self.size.y
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.position.x >= self.position.x
            && other.position.y >= self.position.y
            && other.position.x + other.size.x <= self.position.x + self.size.x
            && other.position.y + other.size.y <= self.position.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Grow the rect outward by independent deltas on the up-left and
    /// down-right edges. Negative deltas shrink.
    pub fn extended(&self, delta_upleft: Vec2, delta_downright: Vec2) -> Rect {
        Rect {
            position: self.position - delta_upleft,
            size: self.size + delta_upleft + delta_downright,
        }
    }

    pub fn has_positive_size(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }
}

/// Rejection of a bounds mutation that would produce a degenerate rect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("size must be strictly positive in both axes, got {width}x{height}")]
    NonPositiveSize { width: f32, height: f32 },
}

/// Validate a candidate rect, passing it through unchanged when legal.
pub fn validated(rect: Rect) -> Result<Rect, GeometryError> {
    if rect.has_positive_size() {
        Ok(rect)
    } else {
        Err(GeometryError::NonPositiveSize {
            width: rect.size.x,
            height: rect.size.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(9.9, 9.9)));
        assert!(!r.contains(Vec2::new(10.0, 5.0)));
        assert!(!r.contains(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn adjacent_rects_share_no_point() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let edge = Vec2::new(10.0, 5.0);
        assert!(!a.contains(edge));
        assert!(b.contains(edge));
    }

    #[test]
    fn intersects_excludes_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn extended_applies_independent_edge_deltas() {
        let r = Rect::new(100.0, 130.0, 100.0, 270.0);
        let out = r.extended(Vec2::ZERO, Vec2::new(100.0, 0.0));
        assert_eq!(out.position, Vec2::new(100.0, 130.0));
        assert_eq!(out.size, Vec2::new(200.0, 270.0));

        let shifted = r.extended(Vec2::new(10.0, 20.0), Vec2::ZERO);
        assert_eq!(shifted.position, Vec2::new(90.0, 110.0));
        assert_eq!(shifted.size, Vec2::new(110.0, 290.0));
    }

    #[test]
    fn validated_rejects_degenerate_sizes() {
        assert!(validated(Rect::new(0.0, 0.0, 10.0, 10.0)).is_ok());
        assert!(validated(Rect::new(0.0, 0.0, 0.0, 10.0)).is_err());
        assert!(validated(Rect::new(0.0, 0.0, 10.0, -1.0)).is_err());
    }
}
