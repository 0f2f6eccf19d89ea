//! Input events from the host surface and two-finger gesture tracking.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Where a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// Single-pointer event, positions in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, kind: PointerKind },
    Move { position: Point },
    Up { position: Point },
    /// Pointer left the surface; treated like `Up`.
    Leave,
}

/// Two-point touch gesture (pinch and two-finger pan).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Start { a: Point, b: Point },
    Move { a: Point, b: Point },
    End,
}

/// Everything the host surface can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Gesture(GestureEvent),
    /// Scroll wheel; positive `delta_y` zooms out.
    Wheel { position: Point, delta_y: f64 },
    /// New display size, in display pixels.
    Resize { width: f64, height: f64 },
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        InputEvent::Pointer(event)
    }
}

impl From<GestureEvent> for InputEvent {
    fn from(event: GestureEvent) -> Self {
        InputEvent::Gesture(event)
    }
}

/// One increment of a two-finger gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStep {
    /// Midpoint of the two touches, display coordinates.
    pub center: Point,
    /// Ratio of current to previous finger distance.
    pub scale_factor: f64,
    /// Movement of the midpoint since the previous step, display coordinates.
    pub pan: Vec2,
}

/// Tracks the previous touch pair so each move can be turned into a
/// zoom factor and a pan delta.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureTracker {
    last: Option<(Point, Point)>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    pub fn start(&mut self, a: Point, b: Point) {
        self.last = Some((a, b));
    }

    /// Advance with a new touch pair. Returns `None` when no gesture was
    /// started; the pair then becomes the starting point.
    pub fn update(&mut self, a: Point, b: Point) -> Option<GestureStep> {
        let previous = self.last.replace((a, b));
        let (pa, pb) = previous?;

        let prev_distance = pa.distance(pb);
        let distance = a.distance(b);
        let scale_factor = if prev_distance > f64::EPSILON {
            distance / prev_distance
        } else {
            1.0
        };

        let center = a.midpoint(b);
        let pan = center - pa.midpoint(pb);

        Some(GestureStep {
            center,
            scale_factor,
            pan,
        })
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}
