//! One control tick: calibration, hand tracking, relative motion, mapping.


use log::debug;

use crate::calibration::{Baseline, CalibrationEngine, CalibrationStatus, CalibrationUpdate};
use crate::config::ControllerConfig;
use crate::gesture::{GestureDebouncer, HandTrack, TrackTransition};
use crate::mapping::{AxisMapper, ControlOutput, DeviceRange};
use crate::motion::{hand_offsets, MotionFeedback, RelativeMotion};
use crate::telemetry::ControlTelemetry;
use crate::types::{Hand, HandGestures, HandPair, PoseSample};

pub struct Controller {
    calibration: CalibrationEngine,
    debouncer: GestureDebouncer,
    mapper: AxisMapper,
    feedback_max_distance_m: f32,
    last_output: ControlOutput,
    last_motion: Option<RelativeMotion>,
    last_feedback: Option<MotionFeedback>,
    telemetry: ControlTelemetry,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(&ControllerConfig::default())
    }
}

impl Controller {
    pub fn new(config: &ControllerConfig) -> Self {
        let mapper = config.mapping.axis_mapper();
        Self {
            calibration: CalibrationEngine::new(config.calibration.arming_hold_ms),
            debouncer: GestureDebouncer::new(config.calibration.gesture_streak_required),
            mapper,
            feedback_max_distance_m: config.mapping.feedback_max_distance_m,
            last_output: ControlOutput::neutral(mapper.range()),
            last_motion: None,
            last_feedback: None,
            telemetry: ControlTelemetry::new(),
        }
    }

    pub fn status(&self) -> CalibrationStatus {
        self.calibration.status()
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.calibration.baseline()
    }

    pub fn tracks(&self) -> &HandPair<HandTrack> {
        self.debouncer.tracks()
    }

    pub fn range(&self) -> DeviceRange {
        self.mapper.range()
    }

    pub fn last_output(&self) -> ControlOutput {
        self.last_output
    }

    pub fn last_motion(&self) -> Option<&RelativeMotion> {
        self.last_motion.as_ref()
    }

    pub fn last_feedback(&self) -> Option<&MotionFeedback> {
        self.last_feedback.as_ref()
    }

    pub fn telemetry(&self) -> &ControlTelemetry {
        &self.telemetry
    }

    /// Runs one control step. A tick without a pose changes nothing and
    /// re-emits the previous output; so does any tick before the first
    /// baseline exists.
    pub fn tick(
        &mut self,
        now_ms: u64,
        pose: Option<PoseSample>,
        gestures: HandGestures,
    ) -> ControlOutput {
        self.telemetry.record_tick(pose.is_some());
        let Some(sample) = pose else {
            return self.last_output;
        };

        let update = self.calibration.observe(now_ms, sample, gestures);
        self.record_calibration(update);

        let Some(baseline) = self.calibration.baseline().copied() else {
            return self.last_output;
        };

        let transitions = self.debouncer.observe(gestures, hand_offsets(&sample));
        self.record_transitions(transitions);

        let motion = RelativeMotion::compute(&sample, &baseline, self.debouncer.tracks());
        let controls = self.mapper.normalize(&motion);
        let output = self.mapper.output(&controls);
        let feedback = motion.feedback(
            self.feedback_max_distance_m,
            self.mapper.max_travel_m(),
            controls.lean,
        );

        debug!(
            "tick t_ms={} track_l={} track_r={} incline_deg={:.1} travel_l={:.3} travel_r={:.3} pull_l={:.2} pull_r={:.2} lean={:.2} disp_l={:.3} disp_r={:.3}",
            now_ms,
            self.debouncer.track(Hand::Left).state().as_str(),
            self.debouncer.track(Hand::Right).state().as_str(),
            motion.incline_deg,
            motion.vertical_travel.left,
            motion.vertical_travel.right,
            controls.pull.left,
            controls.pull.right,
            controls.lean,
            feedback.displacement_m.left,
            feedback.displacement_m.right
        );

        self.last_motion = Some(motion);
        self.last_feedback = Some(feedback);
        self.last_output = output;
        output
    }

    fn record_calibration(&mut self, update: CalibrationUpdate) {
        if update.baseline_installed {
            self.telemetry.record_baseline_installed();
            self.debouncer.reset_tracking();
        }
        if update.capture_failed {
            self.telemetry.record_calibration_failure();
        }
    }

    fn record_transitions(&self, transitions: HandPair<Option<TrackTransition>>) {
        for transition in [transitions.left, transitions.right].into_iter().flatten() {
            match transition {
                TrackTransition::Released => self.telemetry.record_hand_release(),
                TrackTransition::Retracked { .. } => self.telemetry.record_hand_retrack(),
            }
        }
    }
}
