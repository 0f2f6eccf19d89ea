//! Application-level errors.

use colorbook_core::{BufferError, ConfigError, DeleteError, SaveError};
use thiserror::Error;

use crate::script::ScriptError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Storage unavailable: {0}")]
    Storage(#[from] SaveError),
    #[error("Failed to delete saved progress: {0}")]
    Delete(#[from] DeleteError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("Invalid display size: {0}")]
    Buffer(#[from] BufferError),
    #[error("Image export failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Nothing to export: the display surface is empty")]
    EmptySurface,
}
