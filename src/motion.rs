//! Relative motion of the current pose against the active baseline.

use core::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::calibration::Baseline;
use crate::gesture::{HandTrack, TrackState};
use crate::types::{Hand, HandPair, Joint, PoseSample, Vec3};

/// Wraps an angle into `(-PI, PI]`. Non-finite input maps to zero.
pub fn normalize_angle_rad(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Incline of the hip-center → shoulder-center vector, with straight up as 0.
pub fn torso_incline_rad(sample: &PoseSample) -> f32 {
    let shoulders = sample
        .world(Joint::LeftShoulder)
        .midpoint(sample.world(Joint::RightShoulder));
    let hips = sample
        .world(Joint::LeftHip)
        .midpoint(sample.world(Joint::RightHip));
    let dx = shoulders.x - hips.x;
    let dy = shoulders.y - hips.y;
    normalize_angle_rad(dy.atan2(dx) + FRAC_PI_2)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelativeMotion {
    pub incline_deg: f32,
    /// Positive when the hand moved down relative to the head.
    pub vertical_travel: HandPair<f32>,
    pub displacement: HandPair<Vec3>,
}

impl RelativeMotion {
    pub fn compute(
        sample: &PoseSample,
        baseline: &Baseline,
        tracks: &HandPair<HandTrack>,
    ) -> Self {
        // Plain difference, not wrapped.
        let incline_rad = torso_incline_rad(sample) - baseline.torso_incline_rad;
        let displacement = baseline
            .hands
            .map(|hand, reference| sample.hand(hand) - reference);
        let vertical_travel = tracks.map(|hand, track| match track.state() {
            TrackState::Tracking => {
                let reference = track
                    .reference_offset()
                    .unwrap_or(*baseline.hand_to_head_offset.get(hand));
                -(sample.hand_to_head_offset(hand) - reference)
            }
            TrackState::Released => 0.0,
        });

        Self {
            incline_deg: incline_rad.to_degrees(),
            vertical_travel,
            displacement,
        }
    }

    pub fn feedback(&self, max_distance_m: f32, max_travel_m: f32, lean: f32) -> MotionFeedback {
        MotionFeedback {
            displacement_m: self.displacement.map(|_, d| d.length()),
            displacement_intensity: self
                .displacement
                .map(|_, d| feedback_intensity(d.length(), max_distance_m)),
            travel_intensity: self
                .vertical_travel
                .map(|_, travel| feedback_intensity(travel.abs(), max_travel_m)),
            lean_intensity: feedback_intensity(lean.abs(), 1.0),
        }
    }
}

/// Auxiliary per-tick feedback for operator displays; not used for control.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionFeedback {
    pub displacement_m: HandPair<f32>,
    pub displacement_intensity: HandPair<f32>,
    pub travel_intensity: HandPair<f32>,
    pub lean_intensity: f32,
}

/// `min(distance, max) / max`, zero for degenerate input.
pub fn feedback_intensity(distance: f32, max_distance: f32) -> f32 {
    if !distance.is_finite() || max_distance.is_nan() || max_distance <= 0.0 {
        return 0.0;
    }
    distance.clamp(0.0, max_distance) / max_distance
}

pub(crate) fn hand_offsets(sample: &PoseSample) -> HandPair<f32> {
    HandPair::new(
        sample.hand_to_head_offset(Hand::Left),
        sample.hand_to_head_offset(Hand::Right),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Baseline;
    use crate::fixtures::{pose, PoseBuilder};

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn upright_torso_is_zero() {
        assert_close(torso_incline_rad(&pose(0)), 0.0);
    }

    #[test]
    fn lean_toward_positive_x_is_positive() {
        // Shoulders shifted to +x while hips stay put.
        let sample = PoseBuilder::new(0).lean_x(0.5).build();
        assert_close(torso_incline_rad(&sample), 45f32.to_radians());
    }

    #[test]
    fn angle_wraps_into_half_open_range() {
        assert_close(normalize_angle_rad(3.0 * PI / 2.0), -PI / 2.0);
        assert_close(normalize_angle_rad(-PI), PI);
        assert_close(normalize_angle_rad(PI), PI);
        assert_eq!(normalize_angle_rad(f32::NAN), 0.0);
    }

    #[test]
    fn relative_incline_is_unwrapped_difference() {
        let mut baseline = Baseline::average([&pose(0)]).expect("baseline");
        baseline.torso_incline_rad = (-170f32).to_radians();
        let tracks = HandPair::splat(HandTrack::new());
        let leaning = PoseBuilder::new(10).lean_x(0.5).build();

        let motion = RelativeMotion::compute(&leaning, &baseline, &tracks);
        // 45 - (-170), not the wrapped -145.
        assert!(
            (motion.incline_deg - 215.0).abs() < 1e-3,
            "got {}",
            motion.incline_deg
        );
    }

    #[test]
    fn downward_hand_motion_is_positive_travel() {
        let baseline = Baseline::average([&pose(0)]).expect("baseline");
        let tracks = HandPair::splat(HandTrack::new());
        let moved = PoseBuilder::new(10).left_hand_dy(0.1).right_hand_dy(-0.05).build();

        let motion = RelativeMotion::compute(&moved, &baseline, &tracks);
        assert_close(motion.vertical_travel.left, 0.1);
        assert_close(motion.vertical_travel.right, -0.05);
        assert_close(motion.displacement.left.y, 0.1);
        assert_close(motion.incline_deg, 0.0);
    }

    #[test]
    fn released_hand_contributes_no_travel() {
        let baseline = Baseline::average([&pose(0)]).expect("baseline");
        let mut tracks = HandPair::splat(HandTrack::new());
        tracks.left = HandTrack::released_for_test();
        let moved = PoseBuilder::new(10).left_hand_dy(0.3).build();

        let motion = RelativeMotion::compute(&moved, &baseline, &tracks);
        assert_eq!(motion.vertical_travel.left, 0.0);
        // Displacement is still reported for feedback.
        assert_close(motion.displacement.left.y, 0.3);
    }

    #[test]
    fn fresh_reference_offset_overrides_baseline() {
        let baseline = Baseline::average([&pose(0)]).expect("baseline");
        let moved = PoseBuilder::new(10).left_hand_dy(0.2).build();
        let mut tracks = HandPair::splat(HandTrack::new());
        tracks.left = HandTrack::with_reference_for_test(moved.hand_to_head_offset(Hand::Left));

        let motion = RelativeMotion::compute(&moved, &baseline, &tracks);
        assert_close(motion.vertical_travel.left, 0.0);
    }

    #[test]
    fn intensity_saturates() {
        assert_close(feedback_intensity(0.25, 0.5), 0.5);
        assert_close(feedback_intensity(2.0, 0.5), 1.0);
        assert_eq!(feedback_intensity(1.0, 0.0), 0.0);
        assert_eq!(feedback_intensity(f32::INFINITY, 0.5), 0.0);
    }
}
