//! Colorbook Core Library
//!
//! Platform-agnostic engine for a raster coloring book: flood fill, freehand
//! strokes, zoom/pan, undo and persisted progress.

pub mod buffer;
pub mod codec;
pub mod color;
pub mod config;
pub mod fill;
pub mod history;
pub mod input;
pub mod session;
pub mod source;
pub mod storage;
pub mod stroke;
pub mod tools;
pub mod viewport;

pub use buffer::{BlitMode, BufferError, PixelBuffer};
pub use codec::{CodecError, SaveRecord, SerializedImage};
pub use color::{ColorParseError, DEFAULT_TOLERANCE, Rgba, colors_match};
pub use config::{ConfigError, SessionConfig};
pub use fill::{FillOutcome, FloodFill};
pub use history::{MAX_UNDO_HISTORY, UndoHistory};
pub use input::{GestureEvent, GestureStep, GestureTracker, InputEvent, PointerEvent, PointerKind};
pub use session::{ColoringSession, LoadOutcome, LoadTicket, LoadedImage, Notice};
pub use source::{ImageSource, LoadError, MemoryImageSource, fit_within_bounds};
pub use storage::{
    DeleteError, FileStorage, MemoryStorage, PersistenceGateway, ProgressSaver, SaveError, SaveJob,
};
pub use stroke::{StrokeRenderer, StrokeState};
pub use tools::{Interaction, Response, ToolController, ToolMode, UndoOutcome};
pub use viewport::{MAX_SCALE, MIN_SCALE, Viewport};
