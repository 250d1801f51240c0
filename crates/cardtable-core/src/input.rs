//! Pointer input events.
//!
//! Positions are in screen coordinates; the canvas maps them into world space
//! through the camera.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Only ctrl held.
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    /// Whether the platform zoom modifier (ctrl or meta) is held.
    pub fn zoom_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}
