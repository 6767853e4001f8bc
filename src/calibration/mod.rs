//! Calibration lifecycle: when a baseline may be captured or recaptured.
//!
//! The pose ring is written on every pose tick. The statig machine only
//! decides transitions; averaging is attempted by the engine when both fists
//! are shown while ready to set, and the result is handed to the machine as
//! part of the event so the installed baseline is replaced in one step.

mod baseline;
mod buffer;


use log::{info, warn};
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::types::{GestureLabel, HandGestures, PoseSample};

pub use baseline::{Baseline, BaselineError, BASELINE_WINDOW};
pub use buffer::{SampleBuffer, SAMPLE_BUFFER_CAPACITY};

pub const DEFAULT_ARMING_HOLD_MS: u64 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationStatus {
    NotCalibrated,
    Arming,
    ReadyToSet,
    Calibrated,
}

impl CalibrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotCalibrated => "not_calibrated",
            Self::Arming => "arming",
            Self::ReadyToSet => "ready_to_set",
            Self::Calibrated => "calibrated",
        }
    }

    /// Operator-facing instruction for this state.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::NotCalibrated => "Show two open hands to begin calibration",
            Self::Arming => "Hold pose for 0.5 seconds...",
            Self::ReadyToSet => "Close both hands to set position",
            Self::Calibrated => "Calibrated! Show open hands to re-calibrate.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationUpdate {
    pub before: CalibrationStatus,
    pub after: CalibrationStatus,
    /// A new baseline replaced the previous one during this observation.
    pub baseline_installed: bool,
    pub capture_failed: bool,
}

impl CalibrationUpdate {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

pub struct CalibrationEngine {
    buffer: SampleBuffer,
    machine: statig::blocking::StateMachine<CalibrationMachine>,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ARMING_HOLD_MS)
    }
}

impl CalibrationEngine {
    pub fn new(arming_hold_ms: u64) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            machine: CalibrationMachine::new(arming_hold_ms).state_machine(),
        }
    }

    pub fn status(&self) -> CalibrationStatus {
        self.machine.inner().status
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.machine.inner().baseline.as_ref()
    }

    pub fn arming_started_ms(&self) -> Option<u64> {
        self.machine.inner().arming_started_ms
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Records `sample` and runs one calibration step against the gestures
    /// reported for this tick.
    pub fn observe(
        &mut self,
        now_ms: u64,
        sample: PoseSample,
        gestures: HandGestures,
    ) -> CalibrationUpdate {
        self.buffer.push(sample);

        let before = self.status();
        let capture = (before == CalibrationStatus::ReadyToSet
            && gestures.both_are(GestureLabel::ClosedFist))
        .then(|| Baseline::capture(&self.buffer));

        let mut context = DispatchContext::default();
        self.machine.handle_with_context(
            &CalibrationEvent::Observe {
                now_ms,
                gestures,
                capture,
            },
            &mut context,
        );
        let after = self.status();

        if context.capture_failed {
            warn!("calibration capture failed: {}", BaselineError::EmptyBuffer);
        }
        if let (true, Some(baseline)) = (context.baseline_installed, self.baseline()) {
            info!(
                "baseline installed samples={} incline_rad={:.3} offset_left={:.3} offset_right={:.3}",
                baseline.sample_count,
                baseline.torso_incline_rad,
                baseline.hand_to_head_offset.left,
                baseline.hand_to_head_offset.right
            );
        }
        if before != after {
            info!(
                "calibration {} -> {}: {}",
                before.as_str(),
                after.as_str(),
                after.prompt()
            );
        }

        CalibrationUpdate {
            before,
            after,
            baseline_installed: context.baseline_installed,
            capture_failed: context.capture_failed,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum CalibrationEvent {
    Observe {
        now_ms: u64,
        gestures: HandGestures,
        /// Averaging attempt, present only when the engine saw both fists
        /// while ready to set.
        capture: Option<Result<Baseline, BaselineError>>,
    },
}

#[derive(Clone, Copy, Debug, Default)]
struct DispatchContext {
    baseline_installed: bool,
    capture_failed: bool,
}

#[derive(Clone, Copy, Debug)]
struct CalibrationMachine {
    status: CalibrationStatus,
    baseline: Option<Baseline>,
    arming_started_ms: Option<u64>,
    arming_hold_ms: u64,
}

impl CalibrationMachine {
    fn new(arming_hold_ms: u64) -> Self {
        Self {
            status: CalibrationStatus::NotCalibrated,
            baseline: None,
            arming_started_ms: None,
            arming_hold_ms,
        }
    }

    fn start_arming(&mut self, now_ms: u64) -> Outcome<State> {
        self.arming_started_ms = Some(now_ms);
        self.status = CalibrationStatus::Arming;
        Transition(State::arming())
    }

    fn settle(&mut self) -> Outcome<State> {
        self.arming_started_ms = None;
        if self.baseline.is_some() {
            self.status = CalibrationStatus::Calibrated;
            Transition(State::calibrated())
        } else {
            self.status = CalibrationStatus::NotCalibrated;
            Transition(State::not_calibrated())
        }
    }
}

#[state_machine(initial = "State::not_calibrated()")]
impl CalibrationMachine {
    #[state]
    fn not_calibrated(&mut self, event: &CalibrationEvent) -> Outcome<State> {
        match event {
            CalibrationEvent::Observe {
                now_ms, gestures, ..
            } if gestures.both_are(GestureLabel::OpenPalm) => self.start_arming(*now_ms),
            CalibrationEvent::Observe { .. } => Handled,
        }
    }

    #[state]
    fn arming(&mut self, event: &CalibrationEvent) -> Outcome<State> {
        match event {
            CalibrationEvent::Observe {
                now_ms, gestures, ..
            } => {
                if !gestures.both_are(GestureLabel::OpenPalm) {
                    return self.settle();
                }
                let started_ms = *self.arming_started_ms.get_or_insert(*now_ms);
                if now_ms.saturating_sub(started_ms) >= self.arming_hold_ms {
                    self.arming_started_ms = None;
                    self.status = CalibrationStatus::ReadyToSet;
                    Transition(State::ready_to_set())
                } else {
                    Handled
                }
            }
        }
    }

    #[state]
    fn ready_to_set(
        &mut self,
        context: &mut DispatchContext,
        event: &CalibrationEvent,
    ) -> Outcome<State> {
        match event {
            CalibrationEvent::Observe {
                capture: Some(Ok(baseline)),
                ..
            } => {
                self.baseline = Some(*baseline);
                context.baseline_installed = true;
                self.status = CalibrationStatus::Calibrated;
                Transition(State::calibrated())
            }
            CalibrationEvent::Observe {
                capture: Some(Err(BaselineError::EmptyBuffer)),
                ..
            } => {
                self.baseline = None;
                context.capture_failed = true;
                self.status = CalibrationStatus::NotCalibrated;
                Transition(State::not_calibrated())
            }
            CalibrationEvent::Observe { capture: None, .. } => Handled,
        }
    }

    #[state]
    fn calibrated(&mut self, event: &CalibrationEvent) -> Outcome<State> {
        match event {
            CalibrationEvent::Observe {
                now_ms, gestures, ..
            } if gestures.both_are(GestureLabel::OpenPalm) => self.start_arming(*now_ms),
            CalibrationEvent::Observe { .. } => Handled,
        }
    }
}
