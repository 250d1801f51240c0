//! Arrow shape.

use super::{ShapeId, ShapeTrait, point_to_segment_dist, rotated_bounds, to_local};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-width of the arrow's grab area, in world units.
const ARROW_HIT_SLOP: f64 = 4.0;

/// An arrow from `position` to `position + (width, height)`.
///
/// The size is signed so that dragging out an arrow keeps the direction the
/// pointer moved. Stored as position plus size like every other shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub(crate) id: ShapeId,
    /// Start point.
    pub position: Point,
    /// Signed horizontal extent to the arrowhead.
    pub width: f64,
    /// Signed vertical extent to the arrowhead.
    pub height: f64,
    /// Rotation angle in degrees (around the midpoint).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub is_flipped: bool,
}

impl Arrow {
    /// Create a new arrow.
    pub fn new(start: Point, end: Point) -> Self {
        let size = end - start;
        Self {
            id: Uuid::new_v4(),
            position: start,
            width: size.x,
            height: size.y,
            rotation: 0.0,
            is_flipped: false,
        }
    }

    pub fn start(&self) -> Point {
        self.position
    }

    /// Where the arrowhead points.
    pub fn end(&self) -> Point {
        self.position + Vec2::new(self.width, self.height)
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn frame(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    fn bounds(&self) -> Rect {
        rotated_bounds(self.frame(), self.rotation)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = to_local(point, self.frame(), self.rotation);
        point_to_segment_dist(local, self.start(), self.end()) <= tolerance + ARROW_HIT_SLOP
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_along_shaft() {
        let arrow = Arrow::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(arrow.hit_test(Point::new(50.0, 3.0), 0.0));
        assert!(!arrow.hit_test(Point::new(50.0, 30.0), 0.0));
        assert!(!arrow.hit_test(Point::new(120.0, 0.0), 0.0));
    }

    #[test]
    fn test_set_size_moves_end() {
        let mut arrow = Arrow::new(Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        arrow.set_size(-30.0, 40.0);
        assert_eq!(arrow.start(), Point::new(10.0, 10.0));
        assert_eq!(arrow.end(), Point::new(-20.0, 50.0));
    }

    #[test]
    fn test_serializes_as_position_and_size() {
        let arrow = Arrow::new(Point::new(5.0, 5.0), Point::new(0.0, 15.0));
        let value = serde_json::to_value(&arrow).unwrap();
        assert_eq!(value["position"]["x"], 5.0);
        assert_eq!(value["width"], -5.0);
        assert_eq!(value["height"], 10.0);
        assert!(value.get("start").is_none());
    }
}
