use glam::Vec2;
use skein_common::Rect;

/// What to draw when debug rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugFlags {
    pub bounds: bool,
    pub colliders: bool,
}

impl Default for DebugFlags {
    fn default() -> Self {
        Self {
            bounds: true,
            colliders: true,
        }
    }
}

/// A primitive draw command. The GPU backend interprets these; the core
/// only records them, which keeps render order observable in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Sprite {
        texture: String,
        position: Vec2,
        size: Vec2,
        depth: f32,
    },
    Rect {
        bounds: Rect,
        color: [u8; 4],
        filled: bool,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: [u8; 4],
    },
    Label {
        text: String,
        position: Vec2,
    },
}

/// An ordered recording of draw commands for one frame.
#[derive(Debug, Default)]
pub struct DrawList {
    cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn cmds(&self) -> &[DrawCmd] {
        &self.cmds
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Texture names of all sprite commands, in draw order.
    pub fn sprite_textures(&self) -> Vec<&str> {
        self.cmds
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCmd::Sprite { texture, .. } => Some(texture.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_list_preserves_order() {
        let mut list = DrawList::new();
        list.push(DrawCmd::Label {
            text: "a".into(),
            position: Vec2::ZERO,
        });
        list.push(DrawCmd::Label {
            text: "b".into(),
            position: Vec2::ZERO,
        });
        assert_eq!(list.len(), 2);
        match &list.cmds()[0] {
            DrawCmd::Label { text, .. } => assert_eq!(text, "a"),
            other => panic!("unexpected cmd: {other:?}"),
        }
    }

    #[test]
    fn sprite_textures_filters_in_order() {
        let mut list = DrawList::new();
        list.push(DrawCmd::Sprite {
            texture: "grass".into(),
            position: Vec2::ZERO,
            size: Vec2::ONE,
            depth: 1.0,
        });
        list.push(DrawCmd::Line {
            from: Vec2::ZERO,
            to: Vec2::ONE,
            color: [255; 4],
        });
        list.push(DrawCmd::Sprite {
            texture: "rock".into(),
            position: Vec2::ZERO,
            size: Vec2::ONE,
            depth: 1.0,
        });
        assert_eq!(list.sprite_textures(), vec!["grass", "rock"]);
    }
}
