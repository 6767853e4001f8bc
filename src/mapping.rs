//! Normalization of physical motion into device axis values.
//!
//! Axis roles follow the virtual joystick layout the flight sim binds:
//! X = left brake, Y = right brake (inverted), Z = speed (held neutral),
//! RX = lean.

use crate::motion::RelativeMotion;
use crate::types::HandPair;

pub const DEFAULT_AXIS_MAX: u32 = 32_768;
pub const DEFAULT_MAX_TRAVEL_M: f32 = 0.4;
pub const DEFAULT_MAX_LEAN_DEG: f32 = 25.0;

pub const AXIS_COUNT: usize = 4;
pub const BUTTON_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    Rx,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::X, Axis::Y, Axis::Z, Axis::Rx];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Rx => "rx",
        }
    }
}

/// Inclusive device range `[1, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceRange {
    max: u32,
}

impl Default for DeviceRange {
    fn default() -> Self {
        Self::new(DEFAULT_AXIS_MAX)
    }
}

impl DeviceRange {
    /// `max` below 1 is raised to 1.
    pub const fn new(max: u32) -> Self {
        Self {
            max: if max == 0 { 1 } else { max },
        }
    }

    pub const fn max(self) -> u32 {
        self.max
    }

    /// `round(max / 2)`.
    pub const fn center(self) -> u32 {
        self.max.div_ceil(2)
    }

    /// Maps `value` in `[-1, 1]` onto the device range. Out-of-range input is
    /// clamped; non-finite input maps to center.
    pub fn map_value(self, value: f32) -> u32 {
        let center = self.center();
        if !value.is_finite() {
            return center;
        }
        let value = f64::from(value.clamp(-1.0, 1.0));
        let half_span = f64::from(center - 1);
        let mapped = (f64::from(center) + value * half_span).round();
        (mapped as u32).clamp(1, self.max)
    }
}

/// Per-tick normalized controls, each in `[-1, 1]` (pull in `[0, 1]`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedControls {
    pub pull: HandPair<f32>,
    pub left_brake: f32,
    pub right_brake: f32,
    pub lean: f32,
    pub speed: f32,
}

impl NormalizedControls {
    fn from_parts(pull: HandPair<f32>, lean: f32) -> Self {
        Self {
            pull,
            left_brake: pull.left * 2.0 - 1.0,
            right_brake: -(pull.right * 2.0 - 1.0),
            lean,
            speed: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlOutput {
    pub axes: [u32; AXIS_COUNT],
    pub buttons: [bool; BUTTON_COUNT],
}

impl ControlOutput {
    /// Every axis at center, every button off.
    pub fn neutral(range: DeviceRange) -> Self {
        Self {
            axes: [range.center(); AXIS_COUNT],
            buttons: [false; BUTTON_COUNT],
        }
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> u32 {
        self.axes[axis.index()]
    }

    pub fn is_neutral(&self, range: DeviceRange) -> bool {
        *self == Self::neutral(range)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMapper {
    range: DeviceRange,
    max_travel_m: f32,
    max_lean_deg: f32,
}

impl Default for AxisMapper {
    fn default() -> Self {
        Self::new(
            DeviceRange::default(),
            DEFAULT_MAX_TRAVEL_M,
            DEFAULT_MAX_LEAN_DEG,
        )
    }
}

impl AxisMapper {
    pub fn new(range: DeviceRange, max_travel_m: f32, max_lean_deg: f32) -> Self {
        Self {
            range,
            max_travel_m,
            max_lean_deg,
        }
    }

    pub fn range(&self) -> DeviceRange {
        self.range
    }

    pub fn max_travel_m(&self) -> f32 {
        self.max_travel_m
    }

    pub fn normalize(&self, motion: &RelativeMotion) -> NormalizedControls {
        let pull = motion
            .vertical_travel
            .map(|_, travel| normalized_ratio(travel.max(0.0), self.max_travel_m, 0.0));
        let lean = normalized_ratio(motion.incline_deg, self.max_lean_deg, -1.0);
        NormalizedControls::from_parts(pull, lean)
    }

    pub fn output(&self, controls: &NormalizedControls) -> ControlOutput {
        let mut axes = [self.range.center(); AXIS_COUNT];
        axes[Axis::X.index()] = self.range.map_value(controls.left_brake);
        axes[Axis::Y.index()] = self.range.map_value(controls.right_brake);
        axes[Axis::Z.index()] = self.range.map_value(controls.speed);
        axes[Axis::Rx.index()] = self.range.map_value(controls.lean);
        ControlOutput {
            axes,
            buttons: [false; BUTTON_COUNT],
        }
    }

    pub fn map(&self, motion: &RelativeMotion) -> ControlOutput {
        self.output(&self.normalize(motion))
    }
}

/// `clamp(value / max, low, 1)`; zero on non-finite input or a
/// non-positive `max`.
fn normalized_ratio(value: f32, max: f32, low: f32) -> f32 {
    if max.is_nan() || max <= 0.0 {
        return 0.0;
    }
    let ratio = value / max;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(low, 1.0)
}
