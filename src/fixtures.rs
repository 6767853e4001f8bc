//! Pose builders shared by the unit test suites.

use crate::types::{GestureLabel, HandGestures, Joint, PoseSample, Vec2, Vec3, JOINT_COUNT};

pub(crate) const OPEN: HandGestures = HandGestures::splat(Some(GestureLabel::OpenPalm));
pub(crate) const FIST: HandGestures = HandGestures::splat(Some(GestureLabel::ClosedFist));

/// Upright subject, hands at chest height, shoulders 0.5 m above the hips.
pub(crate) fn pose(t_ms: u64) -> PoseSample {
    PoseBuilder::new(t_ms).build()
}

pub(crate) struct PoseBuilder {
    t_ms: u64,
    lean_x: f32,
    left_hand_dy: f32,
    right_hand_dy: f32,
}

impl PoseBuilder {
    pub(crate) fn new(t_ms: u64) -> Self {
        Self {
            t_ms,
            lean_x: 0.0,
            left_hand_dy: 0.0,
            right_hand_dy: 0.0,
        }
    }

    /// Shifts the shoulders sideways; 0.5 gives a 45° incline.
    pub(crate) fn lean_x(mut self, dx: f32) -> Self {
        self.lean_x = dx;
        self
    }

    /// Positive moves the hand down.
    pub(crate) fn left_hand_dy(mut self, dy: f32) -> Self {
        self.left_hand_dy = dy;
        self
    }

    pub(crate) fn right_hand_dy(mut self, dy: f32) -> Self {
        self.right_hand_dy = dy;
        self
    }

    pub(crate) fn build(self) -> PoseSample {
        let mut world = [Vec3::ZERO; JOINT_COUNT];
        world[Joint::Head.index()] = Vec3::new(self.lean_x, -0.6, 0.0);
        world[Joint::LeftShoulder.index()] = Vec3::new(0.2 + self.lean_x, -0.5, 0.0);
        world[Joint::RightShoulder.index()] = Vec3::new(-0.2 + self.lean_x, -0.5, 0.0);
        world[Joint::LeftHip.index()] = Vec3::new(0.1, 0.0, 0.0);
        world[Joint::RightHip.index()] = Vec3::new(-0.1, 0.0, 0.0);
        world[Joint::LeftHand.index()] = Vec3::new(0.3, -0.3 + self.left_hand_dy, -0.2);
        world[Joint::RightHand.index()] = Vec3::new(-0.3, -0.3 + self.right_hand_dy, -0.2);

        let mut image = [Vec2::ZERO; JOINT_COUNT];
        image[Joint::Head.index()] = Vec2::new(0.5, 0.2);
        image[Joint::LeftShoulder.index()] = Vec2::new(0.6, 0.35);
        image[Joint::RightShoulder.index()] = Vec2::new(0.4, 0.35);
        image[Joint::LeftHip.index()] = Vec2::new(0.55, 0.7);
        image[Joint::RightHip.index()] = Vec2::new(0.45, 0.7);
        image[Joint::LeftHand.index()] = Vec2::new(0.7, 0.5 + self.left_hand_dy);
        image[Joint::RightHand.index()] = Vec2::new(0.3, 0.5 + self.right_hand_dy);

        PoseSample::new(self.t_ms, world, image)
    }
}
