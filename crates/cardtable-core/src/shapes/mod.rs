//! Shape definitions for the table.

mod arrow;
mod circle;
mod image;
mod rectangle;
mod text;

pub use arrow::Arrow;
pub use circle::Circle;
pub use image::Image;
pub use rectangle::Rectangle;
pub use text::Text;

use crate::cards::CardId;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Variant tag of a shape, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Arrow,
    #[default]
    Text,
    Image,
}

impl ShapeKind {
    /// Get all shape kinds.
    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Rectangle,
            ShapeKind::Circle,
            ShapeKind::Arrow,
            ShapeKind::Text,
            ShapeKind::Image,
        ]
    }

    /// Name used on the wire and in commands.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Arrow => "arrow",
            ShapeKind::Text => "text",
            ShapeKind::Image => "image",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown shape kind: {s}"))
    }
}

/// The unrotated frame spanned by a position and a (possibly negative) size.
pub fn frame_rect(position: Point, width: f64, height: f64) -> Rect {
    Rect::from_points(position, position + Vec2::new(width, height))
}

/// Axis-aligned bounding box of a frame rotated about its center.
pub fn rotated_bounds(frame: Rect, rotation_degrees: f64) -> Rect {
    if rotation_degrees % 360.0 == 0.0 {
        return frame;
    }
    Affine::rotate_about(rotation_degrees.to_radians(), frame.center()).transform_rect_bbox(frame)
}

/// Map a world point into the unrotated frame of a rotated shape.
pub fn to_local(point: Point, frame: Rect, rotation_degrees: f64) -> Point {
    if rotation_degrees % 360.0 == 0.0 {
        return point;
    }
    Affine::rotate_about(-rotation_degrees.to_radians(), frame.center()) * point
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the unrotated frame in world coordinates.
    fn frame(&self) -> Rect;

    /// Get the bounding box in world coordinates (rotation applied).
    fn bounds(&self) -> Rect;

    /// Check if a point (in world coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Move the shape by a world-space delta.
    fn translate(&mut self, delta: Vec2);

    /// Set the size, keeping the position (the anchor corner) fixed.
    fn set_size(&mut self, width: f64, height: f64);
}

/// Enum wrapper for all shape types (for serialization).
///
/// Serialized internally tagged: `{"type": "rectangle", "id": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Arrow(Arrow),
    Text(Text),
    Image(Image),
}

impl Shape {
    /// Create a zero-size shape of the given kind at a point.
    pub fn new_of_kind(kind: ShapeKind, position: Point) -> Self {
        match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(position, 0.0, 0.0)),
            ShapeKind::Circle => Shape::Circle(Circle::new(position, 0.0, 0.0)),
            ShapeKind::Arrow => Shape::Arrow(Arrow::new(position, position)),
            ShapeKind::Text => Shape::Text(Text::new(position, String::new())),
            ShapeKind::Image => Shape::Image(Image::new(position, String::new(), 0.0, 0.0)),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Image(_) => ShapeKind::Image,
        }
    }

    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Rectangle(s) => s.id(),
            Shape::Circle(s) => s.id(),
            Shape::Arrow(s) => s.id(),
            Shape::Text(s) => s.id(),
            Shape::Image(s) => s.id(),
        }
    }

    pub fn frame(&self) -> Rect {
        match self {
            Shape::Rectangle(s) => s.frame(),
            Shape::Circle(s) => s.frame(),
            Shape::Arrow(s) => s.frame(),
            Shape::Text(s) => s.frame(),
            Shape::Image(s) => s.frame(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rectangle(s) => s.bounds(),
            Shape::Circle(s) => s.bounds(),
            Shape::Arrow(s) => s.bounds(),
            Shape::Text(s) => s.bounds(),
            Shape::Image(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Shape::Rectangle(s) => s.hit_test(point, tolerance),
            Shape::Circle(s) => s.hit_test(point, tolerance),
            Shape::Arrow(s) => s.hit_test(point, tolerance),
            Shape::Text(s) => s.hit_test(point, tolerance),
            Shape::Image(s) => s.hit_test(point, tolerance),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Rectangle(s) => s.translate(delta),
            Shape::Circle(s) => s.translate(delta),
            Shape::Arrow(s) => s.translate(delta),
            Shape::Text(s) => s.translate(delta),
            Shape::Image(s) => s.translate(delta),
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        match self {
            Shape::Rectangle(s) => s.set_size(width, height),
            Shape::Circle(s) => s.set_size(width, height),
            Shape::Arrow(s) => s.set_size(width, height),
            Shape::Text(s) => s.set_size(width, height),
            Shape::Image(s) => s.set_size(width, height),
        }
    }

    /// Test whether this shape's bounding box lies entirely within `rect`.
    ///
    /// Edges are inclusive.
    pub fn is_enclosed_by(&self, rect: Rect) -> bool {
        let rect = rect.abs();
        let bounds = self.bounds();
        bounds.x0 >= rect.x0 && bounds.y0 >= rect.y0 && bounds.x1 <= rect.x1 && bounds.y1 <= rect.y1
    }

    /// Rewrite a frame dragged out with a negative size so that the position is
    /// the top-left corner. Arrows keep their direction.
    pub fn normalize(&mut self) {
        if matches!(self, Shape::Arrow(_)) {
            return;
        }
        let frame = self.frame();
        self.translate(frame.origin() - self.anchor());
        self.set_size(frame.width(), frame.height());
    }

    /// The point the size is measured from.
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Rectangle(s) => s.position,
            Shape::Circle(s) => s.position,
            Shape::Arrow(s) => s.position,
            Shape::Text(s) => s.position,
            Shape::Image(s) => s.position,
        }
    }

    /// Get the rotation angle in degrees.
    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Rectangle(s) => s.rotation,
            Shape::Circle(s) => s.rotation,
            Shape::Arrow(s) => s.rotation,
            Shape::Text(s) => s.rotation,
            Shape::Image(s) => s.rotation,
        }
    }

    /// Set the rotation angle in degrees, normalized to `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        let degrees = degrees.rem_euclid(360.0);
        match self {
            Shape::Rectangle(s) => s.rotation = degrees,
            Shape::Circle(s) => s.rotation = degrees,
            Shape::Arrow(s) => s.rotation = degrees,
            Shape::Text(s) => s.rotation = degrees,
            Shape::Image(s) => s.rotation = degrees,
        }
    }

    /// Rotate by a relative angle in degrees.
    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(self.rotation() + degrees);
    }

    pub fn is_flipped(&self) -> bool {
        match self {
            Shape::Rectangle(s) => s.is_flipped,
            Shape::Circle(s) => s.is_flipped,
            Shape::Arrow(s) => s.is_flipped,
            Shape::Text(s) => s.is_flipped,
            Shape::Image(s) => s.is_flipped,
        }
    }

    /// Toggle the flipped flag (cards render face down when flipped).
    pub fn toggle_flip(&mut self) {
        let flipped = !self.is_flipped();
        match self {
            Shape::Rectangle(s) => s.is_flipped = flipped,
            Shape::Circle(s) => s.is_flipped = flipped,
            Shape::Arrow(s) => s.is_flipped = flipped,
            Shape::Text(s) => s.is_flipped = flipped,
            Shape::Image(s) => s.is_flipped = flipped,
        }
    }

    /// Get the text if this shape is a text shape.
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get the mutable text if this shape is a text shape.
    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get the image if this shape is an image.
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Shape::Image(img) => Some(img),
            _ => None,
        }
    }

    /// The card this shape stands for on the battlefield, if any.
    pub fn card_id(&self) -> Option<CardId> {
        self.as_image().and_then(|img| img.card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("circle".parse::<ShapeKind>(), Ok(ShapeKind::Circle));
        assert_eq!("Arrow".parse::<ShapeKind>(), Ok(ShapeKind::Arrow));
        assert!("triangle".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_normalize_negative_drag() {
        let mut shape = Shape::Rectangle(Rectangle::new(Point::new(100.0, 100.0), -40.0, -30.0));
        shape.normalize();
        let Shape::Rectangle(rect) = &shape else {
            panic!("kind changed");
        };
        assert_eq!(rect.position, Point::new(60.0, 70.0));
        assert!((rect.width - 40.0).abs() < f64::EPSILON);
        assert!((rect.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_keeps_arrow_direction() {
        let mut shape = Shape::Arrow(Arrow::new(Point::new(10.0, 10.0), Point::new(0.0, 0.0)));
        shape.normalize();
        let Shape::Arrow(arrow) = &shape else {
            panic!("kind changed");
        };
        assert_eq!(arrow.start(), Point::new(10.0, 10.0));
        assert_eq!(arrow.end(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_enclosed_requires_full_containment() {
        let shape = Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 20.0, 20.0));
        assert!(shape.is_enclosed_by(Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(shape.is_enclosed_by(Rect::new(10.0, 10.0, 30.0, 30.0)));
        assert!(!shape.is_enclosed_by(Rect::new(0.0, 0.0, 25.0, 50.0)));
        // Reversed corners describe the same rectangle.
        assert!(shape.is_enclosed_by(Rect::new(50.0, 50.0, 0.0, 0.0)));
    }

    #[test]
    fn test_quarter_turn_swaps_bounds() {
        let mut shape = Shape::Image(Image::new(Point::new(0.0, 0.0), "x".into(), 100.0, 40.0));
        shape.rotate_by(90.0);
        let bounds = shape.bounds();
        assert!((bounds.width() - 40.0).abs() < 1e-9);
        assert!((bounds.height() - 100.0).abs() < 1e-9);
        assert!((bounds.center().x - 50.0).abs() < 1e-9);
        assert!((bounds.center().y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut shape = Shape::Rectangle(Rectangle::new(Point::ZERO, 1.0, 1.0));
        shape.rotate_by(-90.0);
        assert!((shape.rotation() - 270.0).abs() < f64::EPSILON);
        shape.rotate_by(90.0);
        assert!(shape.rotation().abs() < f64::EPSILON);
    }

    #[test]
    fn test_toggle_flip() {
        let mut shape = Shape::Text(Text::new(Point::ZERO, "hi".into()));
        assert!(!shape.is_flipped());
        shape.toggle_flip();
        assert!(shape.is_flipped());
        shape.toggle_flip();
        assert!(!shape.is_flipped());
    }

    #[test]
    fn test_wire_format_is_tagged() {
        let shape = Shape::Circle(Circle::new(Point::new(1.0, 2.0), 3.0, 4.0));
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "circle");
        assert_eq!(value["isFlipped"], false);
        assert_eq!(value["width"], 3.0);

        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, shape);
    }
}
