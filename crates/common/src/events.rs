use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Raw input broadcast to loaded nodes each frame.
///
/// The windowing backend translates its native events into this enum; the
/// core never sees backend types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerMoved { position: Vec2 },
    PointerPressed { button: PointerButton, position: Vec2 },
    PointerReleased { button: PointerButton, position: Vec2 },
    KeyPressed { key: String },
    KeyReleased { key: String },
}

/// A named event with a free-form payload, dispatched to behavior hooks.
///
/// This is the wire between game logic and the (out-of-core) scripting
/// layer: the core only routes events by name, it never interprets payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_event_defaults_to_null_payload() {
        let ev = CustomEvent::new("door_opened");
        assert_eq!(ev.name, "door_opened");
        assert!(ev.payload.is_null());
    }

    #[test]
    fn custom_event_roundtrips_through_json() {
        let ev = CustomEvent::with_payload("spawn_wave", serde_json::json!({ "count": 3 }));
        let text = serde_json::to_string(&ev).unwrap();
        let back: CustomEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ev);
    }
}
