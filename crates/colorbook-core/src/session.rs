//! A coloring session: one page, its pixels, and everything that edits them.

use crate::buffer::{BlitMode, BufferError, PixelBuffer};
use crate::color::Rgba;
use crate::config::SessionConfig;
use crate::input::{InputEvent, PointerEvent};
use crate::source::{ImageSource, LoadError, draw_error_placeholder, fit_within_bounds};
use crate::storage::{PersistenceGateway, ProgressSaver, SaveJob};
use crate::tools::{Response, ToolController, ToolMode, UndoOutcome};
use kurbo::{Rect, Size};
use std::sync::Arc;

/// Handle for one in-flight load. Only the newest ticket may complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    key: String,
}

impl LoadTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// What a load produced, before it is drawn.
#[derive(Debug, Clone)]
pub enum LoadedImage {
    /// Previously saved progress, drawn over the whole buffer.
    Saved(PixelBuffer),
    /// The blank page, fitted and centred on white.
    Source(PixelBuffer),
    Failed(LoadError),
}

/// How a load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored,
    Fresh,
    /// The error placeholder is showing.
    Failed(LoadError),
    /// A newer load started first; nothing was drawn.
    Superseded,
}

/// Non-fatal problems worth showing the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoadFailed(LoadError),
    DeleteFailed(String),
}

/// Owns the pixel buffer for the current page and routes everything that
/// touches it: input, undo, loads and persistence.
pub struct ColoringSession<G: PersistenceGateway + 'static> {
    config: SessionConfig,
    buffer: PixelBuffer,
    controller: ToolController,
    saver: ProgressSaver<G>,
    display_size: Size,
    current_key: Option<String>,
    generation: u64,
    /// Generation of the load in flight, if any.
    loading: Option<u64>,
    notices: Vec<Notice>,
}

impl<G: PersistenceGateway + 'static> ColoringSession<G> {
    /// Create a session for a surface of `display_size` display pixels.
    pub fn new(config: SessionConfig, storage: Arc<G>, display_size: Size) -> Result<Self, BufferError> {
        let (width, height) = backing_size(display_size, config.resolution_multiplier);
        let buffer = PixelBuffer::new(width, height)?;
        let controller = ToolController::new(&config, buffer_size(&buffer));
        Ok(Self {
            config,
            buffer,
            controller,
            saver: ProgressSaver::new(storage),
            display_size,
            current_key: None,
            generation: 0,
            loading: None,
            notices: Vec::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn controller(&self) -> &ToolController {
        &self.controller
    }

    pub fn display_size(&self) -> Size {
        self.display_size
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn storage(&self) -> &Arc<G> {
        self.saver.storage()
    }

    pub fn mode(&self) -> ToolMode {
        self.controller.mode()
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.controller.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) -> ToolMode {
        self.controller.toggle_mode()
    }

    pub fn color(&self) -> Rgba {
        self.controller.color()
    }

    pub fn set_color(&mut self, color: impl Into<Rgba>) {
        self.controller.set_color(color);
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start loading `key`. Any earlier in-flight load is superseded.
    pub fn begin_load(&mut self, key: &str) -> LoadTicket {
        self.generation += 1;
        self.loading = Some(self.generation);
        self.current_key = Some(key.to_string());
        self.controller.reset_for_new_image(buffer_size(&self.buffer));
        self.saver.discard_pending();
        log::info!("Loading {}", key);
        LoadTicket {
            generation: self.generation,
            key: key.to_string(),
        }
    }

    /// Draw the result of a load, unless a newer load has started since.
    pub fn complete_load(&mut self, ticket: LoadTicket, loaded: LoadedImage) -> LoadOutcome {
        if self.loading != Some(ticket.generation) {
            log::debug!("Dropping superseded load of {}", ticket.key);
            return LoadOutcome::Superseded;
        }
        self.loading = None;

        match loaded {
            LoadedImage::Saved(image) => {
                let full = Rect::from_origin_size((0.0, 0.0), buffer_size(&self.buffer));
                self.buffer.blit_scaled(&image, full, BlitMode::Copy);
                log::info!("Restored saved progress for {}", ticket.key);
                LoadOutcome::Restored
            }
            LoadedImage::Source(image) => {
                self.buffer.clear(Rgba::WHITE);
                let dest = fit_within_bounds(
                    image.width() as f64,
                    image.height() as f64,
                    self.buffer.width() as f64,
                    self.buffer.height() as f64,
                );
                self.buffer.blit_scaled(&image, dest, BlitMode::Over);
                LoadOutcome::Fresh
            }
            LoadedImage::Failed(e) => {
                log::error!("Failed to load {}: {}", ticket.key, e);
                draw_error_placeholder(&mut self.buffer);
                self.notices.push(Notice::LoadFailed(e.clone()));
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Load `key`: saved progress first (unless `fresh`), else the source.
    pub async fn open_image<S: ImageSource + ?Sized>(&mut self, source: &S, key: &str, fresh: bool) -> LoadOutcome {
        let ticket = self.begin_load(key);
        let storage = Arc::clone(self.saver.storage());

        let saved = if fresh { None } else { storage.load(key).await };
        let restored = saved.and_then(|record| match record.image.decode() {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Ignoring unreadable saved progress for {}: {}", key, e);
                None
            }
        });

        let loaded = match restored {
            Some(image) => LoadedImage::Saved(image),
            None => match source.fetch(key).await {
                Ok(image) => LoadedImage::Source(image),
                Err(e) => LoadedImage::Failed(e),
            },
        };
        self.complete_load(ticket, loaded)
    }

    /// Delete saved progress for the current page and reload it blank.
    ///
    /// Returns `None` when no page is open.
    pub async fn clear_progress<S: ImageSource + ?Sized>(&mut self, source: &S) -> Option<LoadOutcome> {
        let key = self.current_key.clone()?;
        let storage = Arc::clone(self.saver.storage());
        if let Err(e) = storage.delete(&key).await {
            log::warn!("Failed to clear saved progress for {}: {}", key, e);
            self.notices.push(Notice::DeleteFailed(e.to_string()));
        }
        Some(self.open_image(source, &key, true).await)
    }

    /// Delete every saved page and reload the current one blank.
    pub async fn forget_all<S: ImageSource + ?Sized>(&mut self, source: &S) -> Option<LoadOutcome> {
        let storage = Arc::clone(self.saver.storage());
        if let Err(e) = storage.clear().await {
            log::warn!("Failed to clear saved progress: {}", e);
            self.notices.push(Notice::DeleteFailed(e.to_string()));
        }
        let key = self.current_key.clone()?;
        Some(self.open_image(source, &key, true).await)
    }

    /// Keys with saved progress.
    pub async fn saved_keys(&self) -> Vec<String> {
        self.saver.storage().list().await
    }

    /// Handle one input event.
    pub fn handle_event(&mut self, event: InputEvent) -> Response {
        if let InputEvent::Resize { width, height } = event {
            return self.resize(Size::new(width, height));
        }
        if self.is_loading() && matches!(event, InputEvent::Pointer(PointerEvent::Down { .. })) {
            log::debug!("Ignoring pointer down while loading");
            return Response::default();
        }

        let response = self.controller.handle_event(&mut self.buffer, event);
        if response.save_requested {
            self.saver.request_save();
        }
        response
    }

    /// Undo the last fill or stroke. The restored state is saved too.
    pub fn undo(&mut self) -> UndoOutcome {
        let outcome = self.controller.undo(&mut self.buffer);
        if outcome == UndoOutcome::Restored {
            self.saver.request_save();
        }
        outcome
    }

    /// Reallocate the buffer for a new display size, carrying the current
    /// content over scaled to fit.
    pub fn resize(&mut self, display_size: Size) -> Response {
        let (width, height) = backing_size(display_size, self.config.resolution_multiplier);
        self.display_size = display_size;
        if width == self.buffer.width() && height == self.buffer.height() {
            return Response::default();
        }

        let resized = match PixelBuffer::new(width, height) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Ignoring resize to {}x{}: {}", width, height, e);
                return Response::default();
            }
        };
        let old = std::mem::replace(&mut self.buffer, resized);
        if self.current_key.is_some() {
            let dest = fit_within_bounds(old.width() as f64, old.height() as f64, width as f64, height as f64);
            self.buffer.blit_scaled(&old, dest, BlitMode::Over);
        }

        self.controller.resize_surface(buffer_size(&self.buffer));
        // History is gone, so the carried content must reach storage.
        let save_requested = self.current_key.is_some() && !self.is_loading();
        if save_requested {
            self.saver.request_save();
        }
        log::debug!("Resized buffer to {}x{}", width, height);
        Response {
            save_requested,
            redraw: true,
        }
    }

    /// Take the pending save, if any, as a job the host runs to completion.
    pub fn take_save_job(&mut self) -> Option<SaveJob> {
        if self.is_loading() {
            return None;
        }
        let key = self.current_key.as_deref()?;
        self.saver.take_job(key, &self.buffer)
    }

    /// The display surface: the buffer drawn through the viewport.
    pub fn composite(&self) -> Option<PixelBuffer> {
        self.controller.viewport().composite(&self.buffer)
    }
}

/// Backing dimensions for a display size. Never zero.
fn backing_size(display_size: Size, resolution_multiplier: f64) -> (u32, u32) {
    let width = (display_size.width * resolution_multiplier).round().max(1.0) as u32;
    let height = (display_size.height * resolution_multiplier).round().max(1.0) as u32;
    (width, height)
}

fn buffer_size(buffer: &PixelBuffer) -> Size {
    Size::new(buffer.width() as f64, buffer.height() as f64)
}
