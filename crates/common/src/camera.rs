use crate::Rect;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World-space camera: the reference frame for rendering and for layer
/// update culling.
///
/// `zoom > 1` narrows the visible region, `zoom < 1` widens it. Layers with
/// a render depth other than `1.0` see a parallax-scaled view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Vec2,
    pub zoom: f32,
    pub view_size: Vec2,
}

impl Camera {
    pub fn new(view_size: Vec2) -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 1.0,
            view_size,
        }
    }

    pub fn look_at(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// Visible world region at the given parallax depth.
    pub fn view_rect(&self, render_depth: f32) -> Rect {
        let size = self.view_size / self.zoom;
        let center = self.center * render_depth;
        Rect {
            position: center - size * 0.5,
            size,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rect_is_centered() {
        let mut cam = Camera::new(Vec2::new(100.0, 50.0));
        cam.look_at(Vec2::new(10.0, 10.0));
        let view = cam.view_rect(1.0);
        assert_eq!(view.center(), Vec2::new(10.0, 10.0));
        assert_eq!(view.size, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn zoom_narrows_the_view() {
        let mut cam = Camera::new(Vec2::new(100.0, 100.0));
        cam.set_zoom(2.0);
        assert_eq!(cam.view_rect(1.0).size, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn nonpositive_zoom_is_ignored() {
        let mut cam = Camera::default();
        cam.set_zoom(0.0);
        assert_eq!(cam.zoom, 1.0);
    }

    #[test]
    fn render_depth_scales_the_center() {
        let mut cam = Camera::new(Vec2::new(100.0, 100.0));
        cam.look_at(Vec2::new(200.0, 0.0));
        let near = cam.view_rect(0.5);
        assert_eq!(near.center(), Vec2::new(100.0, 0.0));
    }
}
