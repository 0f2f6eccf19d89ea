//! Session configuration.

use crate::color::{DEFAULT_TOLERANCE, MAX_TOLERANCE, Rgba};
use crate::history::MAX_UNDO_HISTORY;
use crate::viewport::{MAX_SCALE, MIN_SCALE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for a coloring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Backing pixels per display pixel. Rendering line art at a higher
    /// backing resolution reduces visible aliasing.
    pub resolution_multiplier: f64,
    /// Fill tolerance (Euclidean RGBA distance).
    pub tolerance: u32,
    /// Stroke width in display pixels.
    pub stroke_width: f64,
    /// Undo cap.
    pub history_limit: usize,
    pub min_scale: f64,
    pub max_scale: f64,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    /// Color active before the user picks one.
    pub initial_color: Rgba,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution_multiplier: 2.0,
            tolerance: DEFAULT_TOLERANCE,
            stroke_width: 2.0,
            history_limit: MAX_UNDO_HISTORY,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            initial_color: Rgba::BLACK,
        }
    }
}

impl SessionConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.resolution_multiplier > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "resolution_multiplier must be positive, got {}",
                self.resolution_multiplier
            )));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be at least 1".to_string()));
        }
        if self.tolerance > MAX_TOLERANCE {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be at most {}, got {}",
                MAX_TOLERANCE, self.tolerance
            )));
        }
        if self.min_scale < MIN_SCALE || self.min_scale > self.max_scale || self.max_scale > MAX_SCALE {
            return Err(ConfigError::Invalid(format!(
                "scale range [{}, {}] must lie within [{}, {}]",
                self.min_scale, self.max_scale, MIN_SCALE, MAX_SCALE
            )));
        }
        if self.wheel_zoom_in <= 0.0 || self.wheel_zoom_out <= 0.0 {
            return Err(ConfigError::Invalid("wheel zoom factors must be positive".to_string()));
        }
        Ok(())
    }

    /// Stroke width in buffer pixels.
    pub fn buffer_stroke_width(&self) -> f64 {
        self.stroke_width * self.resolution_multiplier
    }
}
