//! Decoding coloring pages from disk.

use colorbook_core::storage::BoxFuture;
use colorbook_core::{ImageSource, LoadError, PixelBuffer};
use std::path::Path;

/// Image source reading raster files; the key is the file path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageSource;

impl FileImageSource {
    pub fn new() -> Self {
        Self
    }

    /// Decode the file at `path` into RGBA pixels.
    pub fn load_sync(path: &Path) -> Result<PixelBuffer, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }
        let rgba = image::open(path)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => LoadError::Io(io.to_string()),
                other => LoadError::Decode(other.to_string()),
            })?
            .to_rgba8();

        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(LoadError::Empty);
        }
        PixelBuffer::from_rgba(width, height, rgba.into_raw())
            .map_err(|e| LoadError::Decode(e.to_string()))
    }
}

impl ImageSource for FileImageSource {
    fn fetch(&self, key: &str) -> BoxFuture<'_, Result<PixelBuffer, LoadError>> {
        let result = Self::load_sync(Path::new(key));
        if let Ok(image) = &result {
            log::debug!("Decoded {} ({}x{})", key, image.width(), image.height());
        }
        Box::pin(async move { result })
    }
}
