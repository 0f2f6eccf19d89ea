//! Colorbook Application
//!
//! Headless shell around the coloring engine: decodes pages from disk,
//! replays scripted input and persists progress between runs.

mod app;
mod catalog;
mod cli;
mod error;
mod loader;
mod script;

pub use app::App;
pub use catalog::{CatalogEntry, ImageCatalog, page_key};
pub use cli::{CliArgs, Command, run};
pub use error::AppError;
pub use loader::FileImageSource;
pub use script::{Action, ScriptError, parse_actions};
