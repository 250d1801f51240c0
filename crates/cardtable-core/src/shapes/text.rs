//! Text shape.

use super::{ShapeId, ShapeTrait, frame_rect, rotated_bounds, to_local};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// The text content.
    pub text: String,
    /// Font size in pixels, set once the text has been edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Rotation angle in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub is_flipped: bool,
}

impl Text {
    /// Approximate advance per character used to size edited text.
    pub const CHAR_WIDTH: f64 = 10.0;
    /// Height given to edited text.
    pub const LINE_HEIGHT: f64 = 100.0;

    /// Create a new text shape. Size starts at zero until the text is edited.
    pub fn new(position: Point, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: 0.0,
            height: 0.0,
            text,
            font_size: None,
            rotation: 0.0,
            is_flipped: false,
        }
    }

    /// Replace the content and resize to fit it.
    pub fn set_text(&mut self, text: String, font_size: f64) {
        self.width = text.chars().count() as f64 * Self::CHAR_WIDTH;
        self.height = Self::LINE_HEIGHT;
        self.font_size = Some(font_size);
        self.text = text;
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn frame(&self) -> Rect {
        frame_rect(self.position, self.width, self.height)
    }

    fn bounds(&self) -> Rect {
        rotated_bounds(self.frame(), self.rotation)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let frame = self.frame();
        frame
            .inflate(tolerance, tolerance)
            .contains(to_local(point, frame, self.rotation))
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}
