use heapless::HistoryBuffer;

use crate::types::PoseSample;

pub const SAMPLE_BUFFER_CAPACITY: usize = 8;

/// Ring of the most recent pose samples. Written on every pose tick,
/// whatever the calibration state.
pub struct SampleBuffer {
    samples: HistoryBuffer<PoseSample, SAMPLE_BUFFER_CAPACITY>,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            samples: HistoryBuffer::new(),
        }
    }

    pub fn push(&mut self, sample: PoseSample) {
        self.samples.write(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    pub fn latest(&self) -> Option<&PoseSample> {
        self.samples.recent()
    }

    /// Up to `count` newest samples, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &PoseSample> {
        let skip = self.samples.len().saturating_sub(count);
        self.samples.oldest_ordered().skip(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Vec2, Vec3, JOINT_COUNT};

    fn sample(t_ms: u64) -> PoseSample {
        PoseSample::new(t_ms, [Vec3::ZERO; JOINT_COUNT], [Vec2::ZERO; JOINT_COUNT])
    }

    #[test]
    fn keeps_only_newest_samples() {
        let mut buffer = SampleBuffer::new();
        for t_ms in 0..(SAMPLE_BUFFER_CAPACITY as u64 + 3) {
            buffer.push(sample(t_ms));
        }
        assert_eq!(buffer.len(), SAMPLE_BUFFER_CAPACITY);
        assert_eq!(buffer.latest().map(|s| s.t_ms), Some(SAMPLE_BUFFER_CAPACITY as u64 + 2));
    }

    #[test]
    fn recent_window_is_oldest_first() {
        let mut buffer = SampleBuffer::new();
        for t_ms in [10, 20, 30, 40] {
            buffer.push(sample(t_ms));
        }
        let window: Vec<u64> = buffer.recent(2).map(|s| s.t_ms).collect();
        assert_eq!(window, vec![30, 40]);

        let all: Vec<u64> = buffer.recent(10).map(|s| s.t_ms).collect();
        assert_eq!(all, vec![10, 20, 30, 40]);
    }

    #[test]
    fn starts_empty() {
        let buffer = SampleBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
        assert_eq!(buffer.recent(5).count(), 0);
    }
}
