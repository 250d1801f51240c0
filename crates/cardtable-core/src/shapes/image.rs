//! Image shape for card faces and other pictures.

use super::{ShapeId, ShapeTrait, frame_rect, rotated_bounds, to_local};
use crate::cards::{Card, CardId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image shape that displays a picture loaded from `src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Image source URL.
    pub src: String,
    /// The card this image represents on the battlefield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    /// Rotation angle in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Flipped cards show their back.
    #[serde(default)]
    pub is_flipped: bool,
}

impl Image {
    /// Create a new image shape.
    pub fn new(position: Point, src: String, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            src,
            card_id: None,
            rotation: 0.0,
            is_flipped: false,
        }
    }

    /// Create an image standing in for a card on the battlefield.
    pub fn for_card(card: &Card, position: Point, width: f64, height: f64) -> Self {
        Self {
            card_id: Some(card.id),
            ..Self::new(position, card.src.clone(), width, height)
        }
    }
}

impl ShapeTrait for Image {
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
