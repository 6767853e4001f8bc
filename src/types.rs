//! Perception-boundary data model: joints, hands, pose samples, gesture labels.
//!
//! World coordinates follow the pose model's convention: meters, origin at the
//! hip center, `x` to the subject's left in the mirrored image, `y` growing
//! downward, `z` toward the camera. Image coordinates are normalized to 0..1
//! over the mirrored frame.

use core::ops::{Add, Sub};

/// Number of tracked joints carried by every [`PoseSample`].
pub const JOINT_COUNT: usize = 7;

/// Minimum landmark count of a full-body pose result (BlazePose topology).
pub const POSE_LANDMARK_COUNT: usize = 33;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other).scaled(0.5)
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Maps a recognizer handedness category (`Left` / `Right`). For callers
    /// feeding recognizer results directly; traces use fixed left/right columns.
    pub fn from_handedness(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if name.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Self::Left => Joint::LeftHand,
            Self::Right => Joint::RightHand,
        }
    }
}

/// One value per hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandPair<T> {
    pub left: T,
    pub right: T,
}

impl<T> HandPair<T> {
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, hand: Hand) -> &T {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, hand: Hand) -> &mut T {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Hand, T) -> U) -> HandPair<U> {
        HandPair {
            left: f(Hand::Left, self.left),
            right: f(Hand::Right, self.right),
        }
    }
}

impl<T: Copy> HandPair<T> {
    pub const fn splat(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Joint {
    Head,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftHand,
    RightHand,
}

impl Joint {
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Head,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftHand,
        Joint::RightHand,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Index of this joint in a 33-point full-body landmark list.
    pub fn landmark_index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftHand => 15,
            Self::RightHand => 16,
            Self::LeftHip => 23,
            Self::RightHip => 24,
        }
    }
}

/// One perception tick worth of body landmarks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseSample {
    pub t_ms: u64,
    pub world: [Vec3; JOINT_COUNT],
    pub image: [Vec2; JOINT_COUNT],
}

impl PoseSample {
    pub fn new(t_ms: u64, world: [Vec3; JOINT_COUNT], image: [Vec2; JOINT_COUNT]) -> Self {
        Self { t_ms, world, image }
    }

    /// Picks the tracked joints out of a full-body landmark list.
    ///
    /// Returns `None` when either list is shorter than
    /// [`POSE_LANDMARK_COUNT`].
    pub fn from_landmarks(t_ms: u64, world: &[Vec3], image: &[Vec2]) -> Option<Self> {
        if world.len() < POSE_LANDMARK_COUNT || image.len() < POSE_LANDMARK_COUNT {
            return None;
        }
        let mut sample = Self::new(t_ms, [Vec3::ZERO; JOINT_COUNT], [Vec2::ZERO; JOINT_COUNT]);
        for joint in Joint::ALL {
            sample.world[joint.index()] = world[joint.landmark_index()];
            sample.image[joint.index()] = image[joint.landmark_index()];
        }
        Some(sample)
    }

    #[inline]
    pub fn world(&self, joint: Joint) -> Vec3 {
        self.world[joint.index()]
    }

    #[inline]
    pub fn image(&self, joint: Joint) -> Vec2 {
        self.image[joint.index()]
    }

    #[inline]
    pub fn hand(&self, hand: Hand) -> Vec3 {
        self.world(hand.wrist())
    }

    /// Vertical component of the hand→head vector (`head.y - hand.y`).
    ///
    /// With `y` growing downward this shrinks as the hand moves down.
    #[inline]
    pub fn hand_to_head_offset(&self, hand: Hand) -> f32 {
        self.world(Joint::Head).y - self.hand(hand).y
    }
}

/// Closed gesture vocabulary consumed by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    OpenPalm,
    ClosedFist,
    Other,
}

impl GestureLabel {
    /// Maps a recognizer category name; unknown categories become `Other`.
    pub fn from_category(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("open_palm") {
            Self::OpenPalm
        } else if name.eq_ignore_ascii_case("closed_fist") {
            Self::ClosedFist
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenPalm => "open_palm",
            Self::ClosedFist => "closed_fist",
            Self::Other => "other",
        }
    }
}

/// Latest per-hand gesture observation; `None` means the hand was not seen.
pub type HandGestures = HandPair<Option<GestureLabel>>;

impl HandPair<Option<GestureLabel>> {
    pub const NONE: Self = Self::splat(None);

    pub fn both(label: GestureLabel) -> Self {
        Self::splat(Some(label))
    }

    pub fn both_are(&self, label: GestureLabel) -> bool {
        self.left == Some(label) && self.right == Some(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_categories_map_to_closed_vocabulary() {
        assert_eq!(GestureLabel::from_category("Open_Palm"), GestureLabel::OpenPalm);
        assert_eq!(GestureLabel::from_category("closed_fist"), GestureLabel::ClosedFist);
        assert_eq!(GestureLabel::from_category("Thumb_Up"), GestureLabel::Other);
        assert_eq!(GestureLabel::from_category("None"), GestureLabel::Other);
    }

    #[test]
    fn handedness_is_case_insensitive() {
        assert_eq!(Hand::from_handedness("Left"), Some(Hand::Left));
        assert_eq!(Hand::from_handedness(" right "), Some(Hand::Right));
        assert_eq!(Hand::from_handedness("both"), None);
    }

    #[test]
    fn landmark_list_is_projected_onto_tracked_joints() {
        let world: Vec<Vec3> = (0..POSE_LANDMARK_COUNT)
            .map(|i| Vec3::new(i as f32, 0.0, 0.0))
            .collect();
        let image: Vec<Vec2> = (0..POSE_LANDMARK_COUNT)
            .map(|i| Vec2::new(0.0, i as f32))
            .collect();
        let sample = PoseSample::from_landmarks(42, &world, &image).expect("full landmark list");

        assert_eq!(sample.t_ms, 42);
        assert_eq!(sample.world(Joint::LeftHand).x, 15.0);
        assert_eq!(sample.world(Joint::RightHip).x, 24.0);
        assert_eq!(sample.image(Joint::RightShoulder).y, 12.0);
        assert_eq!(sample.world(Joint::Head).x, 0.0);
    }

    #[test]
    fn short_landmark_list_is_rejected() {
        let world = [Vec3::ZERO; 20];
        let image = [Vec2::ZERO; 20];
        assert!(PoseSample::from_landmarks(0, &world, &image).is_none());
    }

    #[test]
    fn hand_offset_shrinks_when_hand_drops() {
        let mut sample = PoseSample::new(0, [Vec3::ZERO; JOINT_COUNT], [Vec2::ZERO; JOINT_COUNT]);
        sample.world[Joint::Head.index()] = Vec3::new(0.0, -0.6, 0.0);
        sample.world[Joint::LeftHand.index()] = Vec3::new(0.2, -0.5, 0.0);
        let high = sample.hand_to_head_offset(Hand::Left);
        sample.world[Joint::LeftHand.index()].y = -0.3;
        let low = sample.hand_to_head_offset(Hand::Left);
        assert!(low < high);
    }

    #[test]
    fn both_requires_each_hand() {
        let gestures = HandGestures::new(Some(GestureLabel::OpenPalm), None);
        assert!(!gestures.both_are(GestureLabel::OpenPalm));
        assert!(HandGestures::both(GestureLabel::OpenPalm).both_are(GestureLabel::OpenPalm));
    }
}
