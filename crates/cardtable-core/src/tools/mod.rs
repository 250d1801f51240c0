//! Interaction modes and in-progress pointer gestures.

use crate::shapes::{Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a pointer-down on empty table does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pick, rubber-band, and drag shapes.
    #[default]
    Select,
    /// Draw a new shape of the current kind.
    Create,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Select => "select",
            Mode::Create => "create",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(Mode::Select),
            "create" => Ok(Mode::Create),
            _ => Err(format!("unknown mode: {s}")),
        }
    }
}

/// State of a pointer gesture. All points are in world coordinates.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// A shape is being dragged out; it is not in the document yet.
    Creating {
        shape: Shape,
        /// Where the pointer went down.
        origin: Point,
    },
    /// A rubber-band selection rectangle is being drawn.
    Selecting { start: Point, current: Point },
    /// Shapes are being moved with the pointer.
    Dragging {
        ids: Vec<ShapeId>,
        /// Pointer position at the previous move.
        last: Point,
    },
}

/// Tracks the mode, the kind used for creation, and the active gesture.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub mode: Mode,
    /// Kind of shape spawned in [`Mode::Create`].
    pub create_kind: ShapeKind,
    /// Current gesture.
    pub state: ToolState,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch mode, abandoning any gesture in progress.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.state = ToolState::Idle;
    }

    pub fn set_create_kind(&mut self, kind: ShapeKind) {
        self.create_kind = kind;
    }

    /// The shape being dragged out, for preview.
    pub fn preview_shape(&self) -> Option<&Shape> {
        match &self.state {
            ToolState::Creating { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// The rubber-band rectangle, normalized.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.state {
            ToolState::Selecting { start, current } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tm = ToolManager::new();
        assert_eq!(tm.mode, Mode::Select);
        assert_eq!(tm.create_kind, ShapeKind::Text);
        assert!(matches!(tm.state, ToolState::Idle));
    }

    #[test]
    fn test_set_mode_cancels_gesture() {
        let mut tm = ToolManager::new();
        tm.state = ToolState::Selecting {
            start: Point::ZERO,
            current: Point::new(10.0, 10.0),
        };
        tm.set_mode(Mode::Create);
        assert_eq!(tm.mode, Mode::Create);
        assert!(matches!(tm.state, ToolState::Idle));
    }

    #[test]
    fn test_selection_rect_normalized() {
        let mut tm = ToolManager::new();
        tm.state = ToolState::Selecting {
            start: Point::new(50.0, 50.0),
            current: Point::new(10.0, 20.0),
        };
        assert_eq!(tm.selection_rect(), Some(Rect::new(10.0, 20.0, 50.0, 50.0)));
        assert!(tm.preview_shape().is_none());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Create".parse::<Mode>(), Ok(Mode::Create));
        assert!("erase".parse::<Mode>().is_err());
    }
}
