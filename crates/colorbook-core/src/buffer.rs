//! RGBA pixel buffer.

use crate::color::Rgba;
use kurbo::Rect;
use thiserror::Error;

/// Buffer access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("Buffer dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Expected {expected} bytes of RGBA data, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// How `blit_scaled` combines source pixels with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlitMode {
    /// Replace destination pixels.
    #[default]
    Copy,
    /// Source-over alpha compositing.
    Over,
}

/// A `width * height` RGBA raster stored as contiguous bytes.
///
/// The byte length is always `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Create a buffer where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, BufferError> {
        let len = Self::byte_len(width, height)?;
        let data = color.to_array().into_iter().cycle().take(len).collect();
        Ok(Self { width, height, data })
    }

    /// Wrap existing RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    fn byte_len(width: u32, height: u32) -> Result<usize, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        Ok(width as usize * height as usize * 4)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Byte offset of pixel (x, y). Caller guarantees bounds.
    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn checked_index(&self, x: i32, y: i32) -> Result<usize, BufferError> {
        if !self.contains(x, y) {
            return Err(BufferError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.index(x as u32, y as u32))
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Rgba, BufferError> {
        let i = self.checked_index(x, y)?;
        Ok(Rgba::from_slice(&self.data[i..i + 4]))
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgba) -> Result<(), BufferError> {
        let i = self.checked_index(x, y)?;
        self.data[i..i + 4].copy_from_slice(&color.to_array());
        Ok(())
    }

    /// Unchecked read by byte offset.
    #[inline]
    pub(crate) fn pixel_at(&self, index: usize) -> Rgba {
        Rgba::from_slice(&self.data[index..index + 4])
    }

    /// Unchecked write by byte offset.
    #[inline]
    pub(crate) fn put_at(&mut self, index: usize, color: Rgba) {
        self.data[index..index + 4].copy_from_slice(&color.to_array());
    }

    /// Discard the contents and reallocate at the new size (transparent).
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BufferError> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    /// Set every pixel to `color`.
    pub fn clear(&mut self, color: Rgba) {
        let px = color.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Draw `src` scaled (nearest neighbour) into `dest`.
    ///
    /// Destination pixels are covered when their centre lies inside `dest`;
    /// the part of `dest` outside this buffer is skipped.
    pub fn blit_scaled(&mut self, src: &PixelBuffer, dest: Rect, mode: BlitMode) {
        let dest = dest.abs();
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }

        let x_start = dest.x0.floor().max(0.0) as u32;
        let y_start = dest.y0.floor().max(0.0) as u32;
        let x_end = (dest.x1.ceil().max(0.0) as u32).min(self.width);
        let y_end = (dest.y1.ceil().max(0.0) as u32).min(self.height);

        let sx_scale = src.width as f64 / dest.width();
        let sy_scale = src.height as f64 / dest.height();

        for y in y_start..y_end {
            let cy = y as f64 + 0.5;
            if cy < dest.y0 || cy >= dest.y1 {
                continue;
            }
            let sy = (((cy - dest.y0) * sy_scale) as u32).min(src.height - 1);
            for x in x_start..x_end {
                let cx = x as f64 + 0.5;
                if cx < dest.x0 || cx >= dest.x1 {
                    continue;
                }
                let sx = (((cx - dest.x0) * sx_scale) as u32).min(src.width - 1);
                let color = src.pixel_at(src.index(sx, sy));
                let i = self.index(x, y);
                let out = match mode {
                    BlitMode::Copy => color,
                    BlitMode::Over => composite_over(color, self.pixel_at(i)),
                };
                self.put_at(i, out);
            }
        }
    }
}

/// Source-over compositing in straight (non-premultiplied) device RGBA.
fn composite_over(src: Rgba, dst: Rgba) -> Rgba {
    let sa = src.a as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst.a as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    if out_a == 0 {
        return Rgba::TRANSPARENT;
    }
    let channel = |s: u8, d: u8| ((s as u32 * sa + d as u32 * da) / out_a) as u8;
    Rgba::new(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
        out_a as u8,
    )
}
