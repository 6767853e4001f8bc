//! Controller tuning loaded from `config/controller.toml`.

use std::{fmt, fs, io, path::Path};

use serde::Deserialize;

use crate::calibration::DEFAULT_ARMING_HOLD_MS;
use crate::gesture::DEFAULT_STREAK_REQUIRED;
use crate::mapping::{
    AxisMapper, DeviceRange, DEFAULT_AXIS_MAX, DEFAULT_MAX_LEAN_DEG, DEFAULT_MAX_TRAVEL_M,
};

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config read failed: {err}"),
            Self::Parse(msg) => write!(f, "config parse failed: {msg}"),
            Self::Validation(msg) => write!(f, "config invalid: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(_) | Self::Validation(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub calibration: CalibrationConfig,
    pub mapping: MappingConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    pub arming_hold_ms: u64,
    pub gesture_streak_required: u8,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            arming_hold_ms: DEFAULT_ARMING_HOLD_MS,
            gesture_streak_required: DEFAULT_STREAK_REQUIRED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Vertical hand travel giving full brake.
    pub max_travel_m: f32,
    /// Torso incline giving full lean.
    pub max_lean_deg: f32,
    pub axis_max: u32,
    pub feedback_max_distance_m: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_travel_m: DEFAULT_MAX_TRAVEL_M,
            max_lean_deg: DEFAULT_MAX_LEAN_DEG,
            axis_max: DEFAULT_AXIS_MAX,
            feedback_max_distance_m: 0.5,
        }
    }
}

impl MappingConfig {
    pub fn device_range(&self) -> DeviceRange {
        DeviceRange::new(self.axis_max)
    }

    pub fn axis_mapper(&self) -> AxisMapper {
        AxisMapper::new(self.device_range(), self.max_travel_m, self.max_lean_deg)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub tick_interval_ms: u64,
    /// Zero disables the periodic status line.
    pub status_log_every_ticks: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            // ~30 Hz, the camera frame rate.
            tick_interval_ms: 33,
            status_log_every_ticks: 120,
        }
    }
}

impl ControllerConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_owned()));

        if self.calibration.gesture_streak_required == 0 {
            return invalid("calibration.gesture_streak_required must be >= 1");
        }
        if !(self.mapping.max_travel_m.is_finite() && self.mapping.max_travel_m > 0.0) {
            return invalid("mapping.max_travel_m must be > 0");
        }
        if !(self.mapping.max_lean_deg.is_finite() && self.mapping.max_lean_deg > 0.0) {
            return invalid("mapping.max_lean_deg must be > 0");
        }
        if !(self.mapping.feedback_max_distance_m.is_finite()
            && self.mapping.feedback_max_distance_m > 0.0)
        {
            return invalid("mapping.feedback_max_distance_m must be > 0");
        }
        if self.mapping.axis_max < 3 {
            return invalid("mapping.axis_max must be >= 3");
        }
        if self.runtime.tick_interval_ms == 0 {
            return invalid("runtime.tick_interval_ms must be > 0");
        }
        Ok(())
    }
}
