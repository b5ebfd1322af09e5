//! Tuning parameters for constrained manipulation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default cursor integration window for release velocity.
pub const DEFAULT_VELOCITY_WINDOW_MS: f64 = 125.0;
/// Default per-tick inertia damping.
pub const DEFAULT_DAMPING: f64 = 0.85;
/// Default factor applied to the release velocity.
pub const DEFAULT_PRE_DAMPING: f64 = 0.9;
/// Default rest threshold for both velocity components.
pub const DEFAULT_EPSILON: f64 = 0.05;
/// Default cap on the release velocity magnitude.
pub const DEFAULT_MAX_VELOCITY: f64 = 25.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Manipulation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulationConfig {
    /// Inward offset of the clamp bounds from the viewport edges.
    pub border_margin: f64,
    /// Whether drags glide after release.
    pub inertia_enabled: bool,
    /// Cursor integration window in milliseconds.
    pub velocity_window_ms: f64,
    /// Factor applied to the release velocity.
    pub pre_damping: f64,
    /// Per-tick velocity multiplier.
    pub damping: f64,
    /// Rest threshold for both velocity components.
    pub epsilon: f64,
    /// Cap on the release velocity magnitude.
    pub max_velocity: f64,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            border_margin: 0.0,
            inertia_enabled: true,
            velocity_window_ms: DEFAULT_VELOCITY_WINDOW_MS,
            pre_damping: DEFAULT_PRE_DAMPING,
            damping: DEFAULT_DAMPING,
            epsilon: DEFAULT_EPSILON,
            max_velocity: DEFAULT_MAX_VELOCITY,
        }
    }
}

impl ManipulationConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded manipulation config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(invalid("damping", "must be in (0, 1)"));
        }
        if !(self.pre_damping > 0.0 && self.pre_damping <= 1.0) {
            return Err(invalid("pre_damping", "must be in (0, 1]"));
        }
        if !(self.epsilon > 0.0) {
            return Err(invalid("epsilon", "must be positive"));
        }
        if !(self.max_velocity > 0.0) {
            return Err(invalid("max_velocity", "must be positive"));
        }
        if !(self.velocity_window_ms > 0.0) {
            return Err(invalid("velocity_window_ms", "must be positive"));
        }
        if !(self.border_margin >= 0.0) {
            return Err(invalid("border_margin", "must not be negative"));
        }
        Ok(())
    }
}
