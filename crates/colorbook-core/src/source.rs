//! Where coloring pages come from.

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use crate::storage::BoxFuture;
use crate::stroke::draw_segment;
use kurbo::{Point, Rect};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Background of the placeholder shown when a page cannot be loaded.
pub const PLACEHOLDER_BACKGROUND: Rgba = Rgba::opaque(0xee, 0xee, 0xee);
/// Cross drawn over the placeholder background.
pub const PLACEHOLDER_MARK: Rgba = Rgba::opaque(0xd0, 0x20, 0x20);

/// Failure to produce a decoded source image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Image has no pixels")]
    Empty,
}

/// Supplies decoded rasters by image key.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, key: &str) -> BoxFuture<'_, Result<PixelBuffer, LoadError>>;
}

/// Image source holding already-decoded buffers.
#[derive(Default)]
pub struct MemoryImageSource {
    images: RwLock<HashMap<String, PixelBuffer>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `key`, replacing any previous one.
    pub fn insert(&self, key: impl Into<String>, image: PixelBuffer) {
        match self.images.write() {
            Ok(mut images) => {
                images.insert(key.into(), image);
            }
            Err(e) => log::warn!("Failed to register image: {}", e),
        }
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, key: &str) -> BoxFuture<'_, Result<PixelBuffer, LoadError>> {
        let key = key.to_string();
        Box::pin(async move {
            let images = self
                .images
                .read()
                .map_err(|e| LoadError::Io(format!("Lock error: {}", e)))?;
            images.get(&key).cloned().ok_or(LoadError::NotFound(key))
        })
    }
}

/// Largest rectangle with the source's aspect ratio that fits the bounds,
/// centred in them.
pub fn fit_within_bounds(src_width: f64, src_height: f64, bounds_width: f64, bounds_height: f64) -> Rect {
    if src_width <= 0.0 || src_height <= 0.0 {
        return Rect::ZERO;
    }
    let src_aspect = src_width / src_height;
    let bounds_aspect = bounds_width / bounds_height;

    let (w, h) = if src_aspect > bounds_aspect {
        (bounds_width, bounds_width / src_aspect)
    } else {
        (bounds_height * src_aspect, bounds_height)
    };

    let x = (bounds_width - w) / 2.0;
    let y = (bounds_height - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Paint the "could not load" placeholder over the whole buffer.
pub fn draw_error_placeholder(buffer: &mut PixelBuffer) {
    buffer.clear(PLACEHOLDER_BACKGROUND);

    let w = buffer.width() as f64;
    let h = buffer.height() as f64;
    let size = w.min(h) * 0.25;
    if size < 2.0 {
        return;
    }
    let c = Point::new(w / 2.0, h / 2.0);
    let half = size / 2.0;
    let width = (size / 8.0).max(1.0);

    draw_segment(
        buffer,
        Point::new(c.x - half, c.y - half),
        Point::new(c.x + half, c.y + half),
        width,
        PLACEHOLDER_MARK,
    );
    draw_segment(
        buffer,
        Point::new(c.x + half, c.y - half),
        Point::new(c.x - half, c.y + half),
        width,
        PLACEHOLDER_MARK,
    );
}
