//! Rectangle shape.

use super::{ShapeId, ShapeTrait, frame_rect, rotated_bounds, to_local};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rectangle shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Anchor corner (top-left once committed).
    pub position: Point,
    /// Width of the rectangle (negative while being dragged out leftwards).
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Rotation angle in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub is_flipped: bool,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            rotation: 0.0,
            is_flipped: false,
        }
    }
}

impl ShapeTrait for Rectangle {
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
