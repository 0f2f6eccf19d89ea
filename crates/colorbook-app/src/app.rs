//! Headless application state: one session driven by scripted actions.

use crate::script::Action;
use colorbook_core::{
    ColoringSession, GestureEvent, ImageSource, InputEvent, LoadOutcome, Notice, PersistenceGateway,
    PointerEvent, PointerKind, SessionConfig, UndoOutcome,
};
use kurbo::{Point, Size, Vec2};
use std::path::Path;
use std::sync::Arc;

use crate::error::AppError;

/// Half the distance between the two synthetic fingers of a pinch or pan.
const FINGER_SPREAD: f64 = 20.0;

/// Drives a [`ColoringSession`] the way the interactive shell would.
pub struct App<G: PersistenceGateway + 'static, S: ImageSource> {
    session: ColoringSession<G>,
    source: S,
}

impl<G: PersistenceGateway + 'static, S: ImageSource> App<G, S> {
    pub fn new(config: SessionConfig, storage: Arc<G>, source: S, display_size: Size) -> Result<Self, AppError> {
        let session = ColoringSession::new(config, storage, display_size)?;
        Ok(Self { session, source })
    }

    pub fn session(&self) -> &ColoringSession<G> {
        &self.session
    }

    /// Open a page, restoring saved progress unless `fresh`.
    pub fn open(&mut self, key: &str, fresh: bool) -> LoadOutcome {
        let outcome = pollster::block_on(self.session.open_image(&self.source, key, fresh));
        match &outcome {
            LoadOutcome::Restored => log::info!("Continuing {}", key),
            LoadOutcome::Fresh => log::info!("Starting {}", key),
            LoadOutcome::Failed(e) => log::warn!("Could not open {}: {}", key, e),
            LoadOutcome::Superseded => {}
        }
        outcome
    }

    /// Replay one action, then write any progress it produced.
    pub fn apply(&mut self, action: &Action) {
        log::debug!("Applying {:?}", action);
        match action {
            Action::Tap(p) => {
                self.send(PointerEvent::Down {
                    position: *p,
                    kind: PointerKind::Touch,
                });
                self.send(PointerEvent::Up { position: *p });
            }
            Action::Stroke(points) => {
                let Some((first, rest)) = points.split_first() else {
                    return;
                };
                self.send(PointerEvent::Down {
                    position: *first,
                    kind: PointerKind::Touch,
                });
                for p in rest {
                    self.send(PointerEvent::Move { position: *p });
                }
                let last = rest.last().unwrap_or(first);
                self.send(PointerEvent::Up { position: *last });
            }
            Action::SetColor(color) => self.session.set_color(*color),
            Action::SetMode(mode) => self.session.set_mode(*mode),
            Action::ToggleMode => {
                let mode = self.session.toggle_mode();
                log::info!("Switched to {:?}", mode);
            }
            Action::Undo => {
                if self.session.undo() == UndoOutcome::Empty {
                    log::info!("Nothing to undo");
                }
            }
            Action::ZoomIn(p) => self.send(InputEvent::Wheel {
                position: *p,
                delta_y: -1.0,
            }),
            Action::ZoomOut(p) => self.send(InputEvent::Wheel {
                position: *p,
                delta_y: 1.0,
            }),
            Action::Pinch { center, factor } => {
                let spread = Vec2::new(FINGER_SPREAD, 0.0);
                let scaled = spread * *factor;
                self.two_finger(
                    (*center - spread, *center + spread),
                    (*center - scaled, *center + scaled),
                );
            }
            Action::Pan(delta) => {
                let c = self.surface_center();
                let spread = Vec2::new(FINGER_SPREAD, 0.0);
                self.two_finger(
                    (c - spread, c + spread),
                    (c - spread + *delta, c + spread + *delta),
                );
            }
            Action::Resize { width, height } => self.send(InputEvent::Resize {
                width: *width,
                height: *height,
            }),
            Action::ClearProgress => {
                pollster::block_on(self.session.clear_progress(&self.source));
            }
        }
        self.drain_saves();
    }

    /// Run pending save jobs to completion.
    pub fn drain_saves(&mut self) {
        if let Some(job) = self.session.take_save_job() {
            // Failures are logged by the job; coloring continues in memory.
            let _ = pollster::block_on(job);
        }
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.session.take_notices()
    }

    /// Write the display surface to `path`. The format follows the extension.
    pub fn export(&self, path: &Path) -> Result<(), AppError> {
        let surface = self.session.composite().ok_or(AppError::EmptySurface)?;
        let (width, height) = (surface.width(), surface.height());
        let image = image::RgbaImage::from_raw(width, height, surface.into_bytes())
            .ok_or(AppError::EmptySurface)?;
        image.save(path)?;
        log::info!("Wrote {} ({}x{})", path.display(), width, height);
        Ok(())
    }

    fn send(&mut self, event: impl Into<InputEvent>) {
        self.session.handle_event(event.into());
    }

    fn two_finger(&mut self, from: (Point, Point), to: (Point, Point)) {
        self.send(GestureEvent::Start { a: from.0, b: from.1 });
        self.send(GestureEvent::Move { a: to.0, b: to.1 });
        self.send(GestureEvent::End);
    }

    fn surface_center(&self) -> Point {
        let size = self.session.display_size();
        Point::new(size.width / 2.0, size.height / 2.0)
    }
}
