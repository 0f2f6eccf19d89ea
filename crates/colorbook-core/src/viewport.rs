//! Viewport module for pan/zoom over the pixel buffer.

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum scale: the buffer always covers the whole surface.
pub const MIN_SCALE: f64 = 1.0;
/// Maximum scale.
pub const MAX_SCALE: f64 = 10.0;

/// Viewport manages the presentation transform of the buffer.
///
/// The buffer and the display surface share a backing resolution: a display
/// coordinate is multiplied by `resolution_multiplier` to reach backing
/// pixels, then the affine `offset + scale * p` maps buffer space onto the
/// surface. The buffer itself is never touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level.
    pub scale: f64,
    /// Translation in backing pixels.
    pub offset: Vec2,
    /// Backing size of the display surface.
    pub surface_size: Size,
    /// Backing pixels per display pixel.
    pub resolution_multiplier: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            surface_size: Size::ZERO,
            resolution_multiplier: 1.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Viewport {
    /// Create an identity viewport over a surface of the given backing size.
    pub fn new(surface_size: Size, resolution_multiplier: f64) -> Self {
        Self {
            surface_size,
            resolution_multiplier,
            ..Self::default()
        }
    }

    /// Restrict the zoom domain to a sub-range of `[MIN_SCALE, MAX_SCALE]`.
    pub fn with_scale_limits(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale.clamp(MIN_SCALE, MAX_SCALE);
        self.max_scale = max_scale.clamp(self.min_scale, MAX_SCALE);
        self.scale = self.scale.clamp(self.min_scale, self.max_scale);
        self
    }

    /// Transform from buffer space to backing surface space.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Transform from backing surface space to buffer space.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Display coordinates to backing surface coordinates.
    pub fn to_backing(&self, display: Point) -> Point {
        Point::new(
            display.x * self.resolution_multiplier,
            display.y * self.resolution_multiplier,
        )
    }

    /// Convert a display point to buffer space.
    pub fn to_buffer_space(&self, display: Point) -> Point {
        self.inverse_transform() * self.to_backing(display)
    }

    /// Convert a buffer point back to display coordinates.
    pub fn to_display_space(&self, buffer_point: Point) -> Point {
        let backing = self.transform() * buffer_point;
        Point::new(
            backing.x / self.resolution_multiplier,
            backing.y / self.resolution_multiplier,
        )
    }

    /// Whether the view is zoomed in past identity.
    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_SCALE
    }

    /// Zoom by `factor`, keeping the buffer point under `display_center` fixed.
    pub fn zoom_at(&mut self, display_center: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        let actual = new_scale / self.scale;
        if (actual - 1.0).abs() > f64::EPSILON {
            let center = self.to_backing(display_center).to_vec2();
            self.scale = new_scale;
            self.offset = center + (self.offset - center) * actual;
        }
        self.clamp_offset();
    }

    /// Pan by a delta in display coordinates.
    pub fn pan_by(&mut self, display_delta: Vec2) {
        self.offset += display_delta * self.resolution_multiplier;
        self.clamp_offset();
    }

    /// Keep the scaled buffer covering the surface:
    /// `offset ∈ [surface * (1 - scale), 0]` on each axis.
    pub fn clamp_offset(&mut self) {
        let min_x = self.surface_size.width * (1.0 - self.scale);
        let min_y = self.surface_size.height * (1.0 - self.scale);
        self.offset.x = self.offset.x.min(0.0).max(min_x);
        self.offset.y = self.offset.y.min(0.0).max(min_y);
    }

    /// Change the surface size, keeping scale and re-clamping the offset.
    pub fn set_surface_size(&mut self, surface_size: Size) {
        self.surface_size = surface_size;
        self.clamp_offset();
    }

    /// Reset to identity. The next zoom clamps back into the configured
    /// limits.
    pub fn reset(&mut self) {
        self.scale = MIN_SCALE;
        self.offset = Vec2::ZERO;
    }

    /// Draw `buffer` onto a fresh surface through the current transform.
    ///
    /// Nearest-neighbour sampling; surface pixels that map outside the
    /// buffer are transparent. Returns `None` for an empty surface.
    pub fn composite(&self, buffer: &PixelBuffer) -> Option<PixelBuffer> {
        let width = self.surface_size.width.round() as u32;
        let height = self.surface_size.height.round() as u32;
        let mut surface = PixelBuffer::new(width, height).ok()?;
        let inverse = self.inverse_transform();

        for y in 0..height {
            for x in 0..width {
                let src = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let (sx, sy) = (src.x.floor() as i32, src.y.floor() as i32);
                let color = buffer.get(sx, sy).unwrap_or(Rgba::TRANSPARENT);
                let i = surface.index(x, y);
                surface.put_at(i, color);
            }
        }
        Some(surface)
    }
}
