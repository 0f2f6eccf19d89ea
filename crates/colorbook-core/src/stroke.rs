//! Freehand stroke rasterization.

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use kurbo::{Point, Vec2};

/// Transient state of one stroke, from pointer-down to pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeState {
    /// Last sampled point in buffer space.
    pub last: Point,
    /// Color captured when the stroke began.
    pub color: Rgba,
    /// Segments rendered so far.
    pub segments: usize,
}

/// Renders round-capped, round-joined polylines straight into a buffer.
///
/// Consecutive samples are joined by straight segments; there is no
/// smoothing. A buffer-space point `(x, y)` addresses the centre of pixel
/// `(x, y)`, and a pixel is painted when its centre lies within half the
/// stroke width of the segment.
#[derive(Debug, Clone)]
pub struct StrokeRenderer {
    width: f64,
    state: Option<StrokeState>,
}

impl StrokeRenderer {
    /// `width` is in buffer pixels.
    pub fn new(width: f64) -> Self {
        Self {
            width: width.max(0.0),
            state: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width.max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&StrokeState> {
        self.state.as_ref()
    }

    /// Start a stroke. Nothing is painted until the first extension.
    pub fn begin_stroke(&mut self, point: Point, color: Rgba) {
        self.state = Some(StrokeState {
            last: point,
            color,
            segments: 0,
        });
    }

    /// Paint the segment from the last point to `point`.
    ///
    /// Returns false when no stroke is active.
    pub fn extend_stroke(&mut self, buffer: &mut PixelBuffer, point: Point) -> bool {
        let width = self.width;
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        draw_segment(buffer, state.last, point, width, state.color);
        state.last = point;
        state.segments += 1;
        true
    }

    /// Finish the stroke, returning its final state if one was active.
    pub fn end_stroke(&mut self) -> Option<StrokeState> {
        self.state.take()
    }
}

/// Rasterize a capsule (segment with round caps) of the given width.
pub fn draw_segment(buffer: &mut PixelBuffer, from: Point, to: Point, width: f64, color: Rgba) {
    // Never let a thin stroke vanish between pixel centres.
    let radius = (width / 2.0).max(0.5);
    let radius_sq = radius * radius;

    let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
    let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
    let max_x = (from.x.max(to.x) + radius).ceil().min(buffer.width() as f64 - 1.0);
    let max_y = (from.y.max(to.y) + radius).ceil().min(buffer.height() as f64 - 1.0);
    if max_x < min_x || max_y < min_y {
        return;
    }

    let seg = to - from;
    let seg_len_sq = seg.hypot2();

    for y in min_y as u32..=max_y as u32 {
        for x in min_x as u32..=max_x as u32 {
            let p = Point::new(x as f64, y as f64);
            if distance_sq_to_segment(p, from, seg, seg_len_sq) <= radius_sq {
                let i = buffer.index(x, y);
                buffer.put_at(i, color);
            }
        }
    }
}

fn distance_sq_to_segment(p: Point, start: Point, seg: Vec2, seg_len_sq: f64) -> f64 {
    let rel = p - start;
    if seg_len_sq < f64::EPSILON {
        return rel.hypot2();
    }
    let t = (rel.dot(seg) / seg_len_sq).clamp(0.0, 1.0);
    (rel - seg * t).hypot2()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgba = Rgba::opaque(0, 0, 255);

    #[test]
    fn test_horizontal_stroke_width_one() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        let mut strokes = StrokeRenderer::new(1.0);
        strokes.begin_stroke(Point::new(0.0, 0.0), BLUE);
        assert!(strokes.extend_stroke(&mut buf, Point::new(3.0, 0.0)));
        let state = strokes.end_stroke().unwrap();
        assert_eq!(state.segments, 1);

        for x in 0..4 {
            assert_eq!(buf.get(x, 0).unwrap(), BLUE);
            for y in 1..4 {
                assert_eq!(buf.get(x, y).unwrap(), Rgba::TRANSPARENT);
            }
        }
    }

    #[test]
    fn test_begin_alone_paints_nothing() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        let mut strokes = StrokeRenderer::new(2.0);
        strokes.begin_stroke(Point::new(1.0, 1.0), BLUE);
        assert!(strokes.is_active());
        strokes.end_stroke();
        assert!(!strokes.is_active());
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
        // Extending with no active stroke is refused.
        assert!(!strokes.extend_stroke(&mut buf, Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_round_cap_and_width() {
        let mut buf = PixelBuffer::new(11, 11).unwrap();
        draw_segment(&mut buf, Point::new(5.0, 5.0), Point::new(5.0, 5.0), 6.0, BLUE);
        // Radius 3 disc around (5,5).
        assert_eq!(buf.get(5, 2).unwrap(), BLUE);
        assert_eq!(buf.get(8, 5).unwrap(), BLUE);
        assert_eq!(buf.get(5, 1).unwrap(), Rgba::TRANSPARENT);
        // Corner of the bounding square lies outside the disc.
        assert_eq!(buf.get(8, 8).unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_segments_join_consecutive_points() {
        let mut buf = PixelBuffer::new(6, 6).unwrap();
        let mut strokes = StrokeRenderer::new(1.0);
        strokes.begin_stroke(Point::new(0.0, 0.0), BLUE);
        strokes.extend_stroke(&mut buf, Point::new(4.0, 0.0));
        strokes.extend_stroke(&mut buf, Point::new(4.0, 4.0));
        strokes.end_stroke();

        for i in 0..5 {
            assert_eq!(buf.get(i, 0).unwrap(), BLUE);
            assert_eq!(buf.get(4, i).unwrap(), BLUE);
        }
        assert_eq!(buf.get(0, 4).unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_stroke_clipped_at_edges() {
        let mut buf = PixelBuffer::new(3, 3).unwrap();
        draw_segment(&mut buf, Point::new(-5.0, 1.0), Point::new(10.0, 1.0), 1.0, BLUE);
        for x in 0..3 {
            assert_eq!(buf.get(x, 1).unwrap(), BLUE);
        }
        // Entirely off-buffer does nothing.
        draw_segment(&mut buf, Point::new(-9.0, -9.0), Point::new(-5.0, -9.0), 1.0, BLUE);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT);
    }
}
