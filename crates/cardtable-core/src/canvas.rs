//! Canvas document and pointer interaction.

use crate::camera::{Camera, WHEEL_ZOOM_DIVISOR};
use crate::input::{Modifiers, PointerEvent};
use crate::shapes::{Shape, ShapeId, ShapeKind, Text};
use crate::tools::{Mode, ToolManager, ToolState};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Hit-test slop around shapes, in screen pixels.
const HIT_TOLERANCE: f64 = 2.0;

/// Font size given to text shapes once edited.
pub const DEFAULT_TEXT_FONT_SIZE: f64 = 40.0;

/// All local shapes on the table.
#[derive(Debug, Clone, Default)]
pub struct CanvasDocument {
    /// All shapes in the document, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape on top of the others.
    pub fn add_shape(&mut self, shape: Shape) {
        let id = shape.id();
        if self.shapes.insert(id, shape).is_none() {
            self.z_order.push(id);
        }
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Find shapes at a point (in world coordinates), front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter(|id| {
                self.shapes
                    .get(id)
                    .is_some_and(|s| s.hit_test(point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Find shapes whose bounds lie entirely within a rectangle, back to front.
    pub fn shapes_enclosed_by(&self, rect: Rect) -> Vec<ShapeId> {
        self.shapes_ordered()
            .filter(|s| s.is_enclosed_by(rect))
            .map(Shape::id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

/// The table surface: local shapes, the camera, and the pointer state machine.
///
/// Shapes received from the peer are held apart in `remote_shapes` and are
/// never hit-tested or edited.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The document being edited.
    pub document: CanvasDocument,
    /// Camera for view transform.
    pub camera: Camera,
    /// Mode and gesture tracking.
    pub tool_manager: ToolManager,
    /// Currently selected shape IDs.
    pub selection: Vec<ShapeId>,
    /// Font size applied to edited text.
    pub text_font_size: f64,
    editing_text: Option<ShapeId>,
    remote_shapes: Vec<Shape>,
    revision: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new canvas with an empty document.
    pub fn new() -> Self {
        Self {
            document: CanvasDocument::new(),
            camera: Camera::new(),
            tool_manager: ToolManager::new(),
            selection: Vec::new(),
            text_font_size: DEFAULT_TEXT_FONT_SIZE,
            editing_text: None,
            remote_shapes: Vec::new(),
            revision: 0,
        }
    }

    /// Counter bumped on every change to local shapes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn mode(&self) -> Mode {
        self.tool_manager.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.tool_manager.set_mode(mode);
    }

    pub fn create_kind(&self) -> ShapeKind {
        self.tool_manager.create_kind
    }

    pub fn set_create_kind(&mut self, kind: ShapeKind) {
        self.tool_manager.set_create_kind(kind);
    }

    /// Local shapes in z-order, as sent to the peer.
    pub fn shapes(&self) -> Vec<Shape> {
        self.document.shapes_ordered().cloned().collect()
    }

    /// Add a shape on top of the others.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.document.add_shape(shape);
        self.touch();
        id
    }

    /// Remove a shape from the canvas.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.selection.retain(|&s| s != id);
        if self.editing_text == Some(id) {
            self.editing_text = None;
        }
        let removed = self.document.remove_shape(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Remove and return all selected shapes.
    pub fn take_selected(&mut self) -> Vec<Shape> {
        let ids = std::mem::take(&mut self.selection);
        ids.into_iter().filter_map(|id| self.remove_shape(id)).collect()
    }

    /// Shapes last received from the peer.
    pub fn remote_shapes(&self) -> &[Shape] {
        &self.remote_shapes
    }

    /// Replace the peer's shapes wholesale.
    pub fn set_remote_shapes(&mut self, shapes: Vec<Shape>) {
        self.remote_shapes = shapes;
    }

    /// Select a shape (clears previous selection).
    pub fn select(&mut self, id: ShapeId) {
        self.selection.clear();
        self.selection.push(id);
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selection.contains(&id)
    }

    /// Get the text shape currently being edited (if any).
    pub fn editing_shape(&self) -> Option<ShapeId> {
        self.editing_text
    }

    /// Replace the content of the text being edited.
    ///
    /// Returns false when no text is being edited.
    pub fn set_editing_text(&mut self, content: &str) -> bool {
        let Some(id) = self.editing_text else {
            return false;
        };
        let font_size = self.text_font_size;
        let Some(text) = self.document.get_shape_mut(id).and_then(Shape::as_text_mut) else {
            return false;
        };
        text.set_text(content.to_string(), font_size);
        self.touch();
        true
    }

    /// Stop editing text and return to select mode. Empty text is kept.
    pub fn finish_text_editing(&mut self) {
        if self.editing_text.take().is_some() {
            self.set_mode(Mode::Select);
        }
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => self.pointer_up(position),
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
            } => self.wheel(position, delta, modifiers),
        }
    }

    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point) {
        // Pressing anywhere ends text entry.
        self.finish_text_editing();
        let world = self.camera.screen_to_world(screen);

        match self.tool_manager.mode {
            Mode::Create => {
                let kind = self.tool_manager.create_kind;
                if kind == ShapeKind::Text {
                    let id = self.add_shape(Shape::Text(Text::new(world, String::new())));
                    self.editing_text = Some(id);
                    self.tool_manager.state = ToolState::Idle;
                } else {
                    self.tool_manager.state = ToolState::Creating {
                        shape: Shape::new_of_kind(kind, world),
                        origin: world,
                    };
                }
            }
            Mode::Select => {
                let tolerance = HIT_TOLERANCE / self.camera.zoom;
                let hit = self.document.shapes_at_point(world, tolerance).first().copied();
                self.tool_manager.state = match hit {
                    Some(id) => {
                        let ids = if self.is_selected(id) {
                            self.selection.clone()
                        } else {
                            vec![id]
                        };
                        ToolState::Dragging { ids, last: world }
                    }
                    None => ToolState::Selecting {
                        start: world,
                        current: world,
                    },
                };
            }
        }
    }

    /// Pointer moved to a screen position.
    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.camera.screen_to_world(screen);
        let mut moved = false;

        match &mut self.tool_manager.state {
            ToolState::Idle => {}
            ToolState::Creating { shape, origin } => {
                let delta = world - *origin;
                shape.set_size(delta.x, delta.y);
            }
            ToolState::Selecting { current, .. } => *current = world,
            ToolState::Dragging { ids, last } => {
                let delta = world - *last;
                *last = world;
                if delta != Vec2::ZERO {
                    for id in ids.iter() {
                        if let Some(shape) = self.document.get_shape_mut(*id) {
                            shape.translate(delta);
                            moved = true;
                        }
                    }
                }
            }
        }

        if moved {
            self.touch();
        }
    }

    /// Pointer released at a screen position.
    pub fn pointer_up(&mut self, screen: Point) {
        let world = self.camera.screen_to_world(screen);

        match std::mem::take(&mut self.tool_manager.state) {
            ToolState::Idle | ToolState::Dragging { .. } => {}
            ToolState::Creating { mut shape, origin } => {
                let delta = world - origin;
                shape.set_size(delta.x, delta.y);
                shape.normalize();
                log::debug!("Created {} {}", shape.kind(), shape.id());
                self.add_shape(shape);
                self.set_mode(Mode::Select);
            }
            ToolState::Selecting { start, .. } => {
                let rect = Rect::from_points(start, world);
                let enclosed = self.document.shapes_enclosed_by(rect);
                if !enclosed.is_empty() {
                    self.selection = enclosed;
                }
            }
        }
    }

    /// Wheel scrolled: zoom about the pointer with the zoom modifier, pan otherwise.
    pub fn wheel(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.zoom_modifier() {
            self.camera
                .zoom_by_delta(screen, delta.y / WHEEL_ZOOM_DIVISOR);
        } else {
            self.camera.pan(delta);
        }
    }

    fn selection_editable(&self) -> bool {
        self.tool_manager.mode == Mode::Select && !self.selection.is_empty()
    }

    /// Rotate the selection by a relative angle in degrees.
    ///
    /// Only applies in select mode with something selected.
    pub fn rotate_selected(&mut self, degrees: f64) -> bool {
        if !self.selection_editable() {
            return false;
        }
        for id in &self.selection {
            if let Some(shape) = self.document.shapes.get_mut(id) {
                shape.rotate_by(degrees);
            }
        }
        self.touch();
        true
    }

    /// Toggle the flipped flag of the selection.
    ///
    /// Only applies in select mode with something selected.
    pub fn flip_selected(&mut self) -> bool {
        if !self.selection_editable() {
            return false;
        }
        for id in &self.selection {
            if let Some(shape) = self.document.shapes.get_mut(id) {
                shape.toggle_flip();
            }
        }
        self.touch();
        true
    }
}
