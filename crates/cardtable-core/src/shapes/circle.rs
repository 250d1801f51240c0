//! Circle shape (an ellipse inscribed in its frame).

use super::{ShapeId, ShapeTrait, frame_rect, rotated_bounds, to_local};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A circle or ellipse filling its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub(crate) id: ShapeId,
    /// Anchor corner of the frame.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation angle in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub is_flipped: bool,
}

impl Circle {
    /// Create a new circle framed by `position` and the given size.
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

    /// Horizontal and vertical radii.
    pub fn radii(&self) -> Vec2 {
        Vec2::new(self.width.abs() / 2.0, self.height.abs() / 2.0)
    }
}

impl ShapeTrait for Circle {
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
        let local = to_local(point, frame, self.rotation);
        let center = frame.center();
        let radii = self.radii();
        let rx = radii.x + tolerance;
        let ry = radii.y + tolerance;
        if rx < f64::EPSILON || ry < f64::EPSILON {
            return false;
        }
        let dx = (local.x - center.x) / rx;
        let dy = (local.y - center.y) / ry;
        dx * dx + dy * dy <= 1.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}
