//! Pose-driven paraglider controller.
//!
//! Turns body landmarks and per-hand gesture labels into joystick axis
//! frames: a gesture-gated calibration lifecycle captures a baseline pose,
//! hand tracks can be released and picked up again without output jumps,
//! and relative motion against the baseline is mapped onto device ranges.

pub mod calibration;
pub mod channels;
pub mod config;
pub mod controller;
pub mod gesture;
pub mod logging;
pub mod mapping;
pub mod motion;
pub mod runtime;
pub mod sink;
pub mod telemetry;
pub mod trace;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use calibration::{Baseline, CalibrationStatus};
pub use config::{ConfigError, ControllerConfig};
pub use controller::Controller;
pub use mapping::{Axis, ControlOutput, DeviceRange};
pub use sink::{CsvSink, OutputSink, RecordingSink, SinkError};
pub use trace::{Trace, TraceError};
pub use types::{GestureLabel, Hand, HandGestures, HandPair, PoseSample};
