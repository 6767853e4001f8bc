use core::fmt;

use crate::motion::torso_incline_rad;
use crate::types::{Hand, HandPair, Joint, PoseSample, Vec2, Vec3};

use super::buffer::SampleBuffer;

/// Number of newest buffered samples averaged into a baseline.
pub const BASELINE_WINDOW: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaselineError {
    EmptyBuffer,
}

impl fmt::Display for BaselineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBuffer => f.write_str("no buffered pose samples to average"),
        }
    }
}

impl std::error::Error for BaselineError {}

/// Reference pose captured at calibration. Built once per calibration and
/// replaced as a whole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Baseline {
    pub hands: HandPair<Vec3>,
    pub head: Vec3,
    pub hands_image: HandPair<Vec2>,
    pub head_image: Vec2,
    pub torso_incline_rad: f32,
    pub hand_to_head_offset: HandPair<f32>,
    pub sample_count: usize,
    pub captured_ms: u64,
}

impl Baseline {
    pub fn capture(buffer: &SampleBuffer) -> Result<Self, BaselineError> {
        Self::average(buffer.recent(BASELINE_WINDOW))
    }

    pub fn average<'a>(
        samples: impl IntoIterator<Item = &'a PoseSample>,
    ) -> Result<Self, BaselineError> {
        let mut count = 0usize;
        let mut hands = HandPair::splat(Vec3::ZERO);
        let mut head = Vec3::ZERO;
        let mut hands_image = HandPair::splat(Vec2::ZERO);
        let mut head_image = Vec2::ZERO;
        let mut incline_sum = 0.0f32;
        let mut captured_ms = 0u64;

        for sample in samples {
            count += 1;
            for hand in Hand::ALL {
                *hands.get_mut(hand) = *hands.get(hand) + sample.hand(hand);
                *hands_image.get_mut(hand) = *hands_image.get(hand) + sample.image(hand.wrist());
            }
            head = head + sample.world(Joint::Head);
            head_image = head_image + sample.image(Joint::Head);
            incline_sum += torso_incline_rad(sample);
            captured_ms = captured_ms.max(sample.t_ms);
        }

        if count == 0 {
            return Err(BaselineError::EmptyBuffer);
        }

        let inv = 1.0 / count as f32;
        let hands = hands.map(|_, sum| sum.scaled(inv));
        let head = head.scaled(inv);
        Ok(Self {
            hands,
            head,
            hands_image: hands_image.map(|_, sum| sum.scaled(inv)),
            head_image: head_image.scaled(inv),
            torso_incline_rad: incline_sum * inv,
            hand_to_head_offset: hands.map(|_, hand| head.y - hand.y),
            sample_count: count,
            captured_ms,
        })
    }
}
