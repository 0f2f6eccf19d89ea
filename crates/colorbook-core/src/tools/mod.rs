//! Tool state machine routing input to fill, strokes and the viewport.

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use crate::config::SessionConfig;
use crate::fill::{FillOutcome, FloodFill};
use crate::history::UndoHistory;
use crate::input::{GestureEvent, GestureTracker, InputEvent, PointerEvent, PointerKind};
use crate::stroke::StrokeRenderer;
use crate::viewport::Viewport;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Available tools. Changes only on explicit user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolMode {
    #[default]
    Fill,
    Draw,
}

impl ToolMode {
    pub fn toggled(self) -> Self {
        match self {
            ToolMode::Fill => ToolMode::Draw,
            ToolMode::Draw => ToolMode::Fill,
        }
    }
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// A freehand stroke is in progress.
    Stroking,
    /// Mouse drag panning a zoomed view.
    MousePanning { last: Point },
    /// Two-finger pinch/pan.
    Gesturing,
}

/// Effects of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    /// The buffer changed in a way that should be persisted.
    pub save_requested: bool,
    /// The display surface should be recomposited.
    pub redraw: bool,
}

impl Response {
    fn redraw() -> Self {
        Self {
            save_requested: false,
            redraw: true,
        }
    }

    fn saved() -> Self {
        Self {
            save_requested: true,
            redraw: true,
        }
    }

    /// Combine two responses.
    pub fn merge(self, other: Response) -> Response {
        Response {
            save_requested: self.save_requested || other.save_requested,
            redraw: self.redraw || other.redraw,
        }
    }
}

/// Result of an undo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored,
    /// Nothing to undo; the buffer is untouched.
    Empty,
}

/// Routes pointer, gesture and wheel events.
///
/// Every mutating action snapshots the buffer into the undo history first.
/// Viewport gestures take priority and never snapshot or paint.
#[derive(Debug, Clone)]
pub struct ToolController {
    mode: ToolMode,
    color: Rgba,
    filler: FloodFill,
    strokes: StrokeRenderer,
    viewport: Viewport,
    history: UndoHistory,
    interaction: Interaction,
    gesture: GestureTracker,
    wheel_zoom_in: f64,
    wheel_zoom_out: f64,
}

impl ToolController {
    /// Create a controller over a buffer of `surface_size` backing pixels.
    pub fn new(config: &SessionConfig, surface_size: Size) -> Self {
        Self {
            mode: ToolMode::default(),
            color: config.initial_color,
            filler: FloodFill::new(config.tolerance),
            strokes: StrokeRenderer::new(config.buffer_stroke_width()),
            viewport: Viewport::new(surface_size, config.resolution_multiplier)
                .with_scale_limits(config.min_scale, config.max_scale),
            history: UndoHistory::with_limit(config.history_limit),
            interaction: Interaction::Idle,
            gesture: GestureTracker::new(),
            wheel_zoom_in: config.wheel_zoom_in,
            wheel_zoom_out: config.wheel_zoom_out,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> ToolMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Set the active color. Read when the next action starts; an
    /// in-progress stroke keeps the color it began with.
    pub fn set_color(&mut self, color: impl Into<Rgba>) {
        self.color = color.into().to_opaque();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn strokes_mut(&mut self) -> &mut StrokeRenderer {
        &mut self.strokes
    }

    /// Forget history and view state for a freshly loaded image.
    pub fn reset_for_new_image(&mut self, surface_size: Size) {
        self.cancel_interaction();
        self.history.clear();
        self.viewport.set_surface_size(surface_size);
        self.viewport.reset();
    }

    /// Adopt a reallocated buffer of `surface_size` backing pixels.
    ///
    /// Snapshots of the old size cannot be restored into the new buffer, so
    /// history is dropped. Zoom is kept and the offset re-clamped.
    pub fn resize_surface(&mut self, surface_size: Size) {
        self.cancel_interaction();
        self.history.clear();
        self.viewport.set_surface_size(surface_size);
    }

    /// Drop any in-progress stroke, pan or gesture without side effects.
    pub fn cancel_interaction(&mut self) {
        self.strokes.end_stroke();
        self.gesture.end();
        self.interaction = Interaction::Idle;
    }

    /// Restore the most recent snapshot into `buffer`.
    pub fn undo(&mut self, buffer: &mut PixelBuffer) -> UndoOutcome {
        if self.interaction == Interaction::Stroking {
            self.strokes.end_stroke();
            self.interaction = Interaction::Idle;
        }
        match self.history.restore() {
            Some(snapshot) => {
                *buffer = snapshot;
                UndoOutcome::Restored
            }
            None => UndoOutcome::Empty,
        }
    }

    /// Handle one input event.
    ///
    /// `Resize` belongs to the session (it reallocates the buffer) and is
    /// ignored here.
    pub fn handle_event(&mut self, buffer: &mut PixelBuffer, event: InputEvent) -> Response {
        match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(buffer, pointer),
            InputEvent::Gesture(gesture) => self.handle_gesture(gesture),
            InputEvent::Wheel { position, delta_y } => {
                let factor = if delta_y > 0.0 {
                    self.wheel_zoom_out
                } else {
                    self.wheel_zoom_in
                };
                self.viewport.zoom_at(position, factor);
                Response::redraw()
            }
            InputEvent::Resize { .. } => Response::default(),
        }
    }

    fn handle_pointer(&mut self, buffer: &mut PixelBuffer, event: PointerEvent) -> Response {
        match event {
            PointerEvent::Down { position, kind } => self.pointer_down(buffer, position, kind),
            PointerEvent::Move { position } => match self.interaction {
                Interaction::MousePanning { last } => {
                    self.viewport.pan_by(position - last);
                    self.interaction = Interaction::MousePanning { last: position };
                    Response::redraw()
                }
                Interaction::Stroking => {
                    let point = self.buffer_pixel(position);
                    self.strokes.extend_stroke(buffer, point);
                    Response::redraw()
                }
                Interaction::Idle | Interaction::Gesturing => Response::default(),
            },
            PointerEvent::Up { .. } | PointerEvent::Leave => self.pointer_up(),
        }
    }

    fn pointer_down(&mut self, buffer: &mut PixelBuffer, position: Point, kind: PointerKind) -> Response {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Gesturing => {
                log::debug!("Ignoring pointer down during gesture");
                return Response::default();
            }
            // A lost pointer-up: close out whatever was running first.
            Interaction::Stroking | Interaction::MousePanning { .. } => {
                let closed = self.pointer_up();
                return closed.merge(self.pointer_down(buffer, position, kind));
            }
        }

        if kind == PointerKind::Mouse && self.viewport.is_zoomed() {
            self.interaction = Interaction::MousePanning { last: position };
            return Response::default();
        }

        let point = self.buffer_pixel(position);
        match self.mode {
            ToolMode::Fill => self.fill_at(buffer, point),
            ToolMode::Draw => {
                self.history.snapshot(buffer);
                self.strokes.begin_stroke(point, self.color);
                self.interaction = Interaction::Stroking;
                Response::default()
            }
        }
    }

    fn pointer_up(&mut self) -> Response {
        match std::mem::take(&mut self.interaction) {
            Interaction::Stroking => {
                self.strokes.end_stroke();
                Response::saved()
            }
            Interaction::Gesturing => {
                // Keep the gesture alive until it ends explicitly.
                self.interaction = Interaction::Gesturing;
                Response::default()
            }
            Interaction::MousePanning { .. } | Interaction::Idle => Response::default(),
        }
    }

    fn fill_at(&mut self, buffer: &mut PixelBuffer, point: Point) -> Response {
        let (x, y) = (point.x as i32, point.y as i32);
        if !self.filler.would_fill(buffer, x, y, self.color) {
            log::debug!("Fill at ({}, {}) would not change the buffer", x, y);
            return Response::default();
        }
        self.history.snapshot(buffer);
        match self.filler.fill(buffer, x, y, self.color) {
            FillOutcome::Filled(_) => Response::saved(),
            FillOutcome::NoOp => Response::default(),
        }
    }

    fn handle_gesture(&mut self, event: GestureEvent) -> Response {
        match event {
            GestureEvent::Start { a, b } => {
                let closed = self.pointer_up();
                self.gesture.start(a, b);
                self.interaction = Interaction::Gesturing;
                closed
            }
            GestureEvent::Move { a, b } => {
                self.interaction = Interaction::Gesturing;
                match self.gesture.update(a, b) {
                    Some(step) => {
                        self.viewport.zoom_at(step.center, step.scale_factor);
                        self.viewport.pan_by(step.pan);
                        Response::redraw()
                    }
                    None => Response::default(),
                }
            }
            GestureEvent::End => {
                self.gesture.end();
                self.interaction = Interaction::Idle;
                Response::default()
            }
        }
    }

    /// Display position to the buffer pixel it lands on.
    fn buffer_pixel(&self, position: Point) -> Point {
        let p = self.viewport.to_buffer_space(position);
        Point::new(p.x.floor(), p.y.floor())
    }
}
