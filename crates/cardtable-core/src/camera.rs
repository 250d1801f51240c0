//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Wheel `deltaY` units that make up a zoom delta of 1.0.
pub const WHEEL_ZOOM_DIVISOR: f64 = 100.0;

/// Camera manages the view transform for the table.
///
/// The offset is stored in world units: rendering applies `scale(zoom)` to
/// `translate(offset)`, so `screen = (world + offset) * zoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in world units.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.offset)
    }

    /// Get the inverse transform for input handling.
    ///
    /// This transform converts screen coordinates to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(1.0 / self.zoom)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen pixels.
    ///
    /// Scrolling right/down moves the view right/down, so the offset moves the
    /// opposite way, scaled into world units.
    pub fn pan(&mut self, screen_delta: Vec2) {
        if !screen_delta.is_finite() {
            return;
        }
        self.offset -= screen_delta / self.zoom;
    }

    /// Zoom the camera by a multiplicative factor, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || !screen_point.is_finite() {
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let before = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let after = self.screen_to_world(screen_point);

        // Shift so the world point under the cursor stays under the cursor.
        self.offset += after - before;
    }

    /// Zoom by a wheel-style delta: positive deltas zoom out, negative zoom in.
    ///
    /// The new zoom is `zoom - delta * zoom`.
    pub fn zoom_by_delta(&mut self, screen_point: Point, delta: f64) {
        self.zoom_at(screen_point, 1.0 - delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert_close(world.x, 50.0);
        assert_close(world.y, 100.0);
    }

    #[test]
    fn test_screen_to_world_with_zoom() {
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        camera.offset = Vec2::new(10.0, 0.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert_close(world.x, 40.0);
        assert_close(world.y, 100.0);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));

        assert_close(back.x, original.x);
        assert_close(back.y, original.y);
    }

    #[test]
    fn test_pan_scales_with_zoom() {
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        camera.pan(Vec2::new(10.0, 20.0));
        assert_close(camera.offset.x, -5.0);
        assert_close(camera.offset.y, -10.0);
    }

    #[test]
    fn test_zoom_keeps_point_fixed() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(12.0, -7.0);
        let anchor = Point::new(300.0, 150.0);
        let world_before = camera.screen_to_world(anchor);

        camera.zoom_by_delta(anchor, -0.25);

        assert_close(camera.zoom, 1.25);
        let world_after = camera.screen_to_world(anchor);
        assert_close(world_after.x, world_before.x);
        assert_close(world_after.y, world_before.y);
    }

    #[test]
    fn test_zoom_roundtrip() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(-40.0, 25.0);
        camera.zoom = 1.3;
        let original = camera.clone();

        let anchor = Point::new(420.0, 96.0);
        camera.zoom_at(anchor, 1.7);
        camera.zoom_at(anchor, 1.0 / 1.7);

        assert_close(camera.zoom, original.zoom);
        assert_close(camera.offset.x, original.offset.x);
        assert_close(camera.offset.y, original.offset.y);
    }

    #[test]
    fn test_pan_roundtrip() {
        let mut camera = Camera::new();
        camera.zoom = 0.8;
        camera.pan(Vec2::new(33.0, -12.0));
        camera.pan(Vec2::new(-33.0, 12.0));
        assert_close(camera.offset.x, 0.0);
        assert_close(camera.offset.y, 0.0);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.001);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);

        camera.zoom = 1.0;
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);

        // A delta of 1 or more would zero/negate the zoom without clamping.
        camera.zoom = 1.0;
        camera.zoom_by_delta(Point::ZERO, 3.0);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);
    }
    #[test]
    fn test_non_finite_input_ignored() {
        let mut camera = Camera::new();
        camera.zoom_by_delta(Point::new(10.0, 10.0), f64::NAN);
        camera.zoom_at(Point::new(f64::INFINITY, 0.0), 2.0);
        camera.pan(Vec2::new(f64::NAN, 1.0));
        assert_eq!(camera, Camera::new());
    }
}
