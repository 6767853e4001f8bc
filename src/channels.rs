//! Single-slot hand-off between the perception producers and the control loop.
//!
//! Each producer owns a handle to its own overwrite-on-write cell; the control
//! loop owns the [`PerceptionContext`] and reads both cells once per tick
//! without ever waiting on a producer.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::types::{HandGestures, PoseSample};

pub struct LatestCell<T> {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Option<T>>>,
}

impl<T> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestCell<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Replaces whatever is stored.
    pub fn publish(&self, value: T) {
        self.slot.lock(|slot| {
            slot.replace(Some(value));
        });
    }

    pub fn take(&self) -> Option<T> {
        self.slot.lock(|slot| slot.borrow_mut().take())
    }

    pub fn clear(&self) {
        self.slot.lock(|slot| {
            slot.replace(None);
        });
    }
}

impl<T: Copy> LatestCell<T> {
    pub fn peek(&self) -> Option<T> {
        self.slot.lock(|slot| *slot.borrow())
    }
}

/// What the control loop sees on one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerceptionSnapshot {
    /// Consumed on read: a tick with no newly published pose sees `None`.
    pub pose: Option<PoseSample>,
    /// Latest published per-hand labels; stays until overwritten.
    pub gestures: HandGestures,
}

#[derive(Clone)]
pub struct PoseHandle {
    cell: Arc<LatestCell<PoseSample>>,
}

impl PoseHandle {
    pub fn publish(&self, sample: PoseSample) {
        self.cell.publish(sample);
    }

    /// Perception ran but found no body.
    pub fn publish_missing(&self) {
        self.cell.clear();
    }
}

#[derive(Clone)]
pub struct GestureHandle {
    cell: Arc<LatestCell<HandGestures>>,
}

impl GestureHandle {
    pub fn publish(&self, gestures: HandGestures) {
        self.cell.publish(gestures);
    }
}

#[derive(Default)]
pub struct PerceptionContext {
    pose: Arc<LatestCell<PoseSample>>,
    gestures: Arc<LatestCell<HandGestures>>,
}

impl PerceptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose_handle(&self) -> PoseHandle {
        PoseHandle {
            cell: Arc::clone(&self.pose),
        }
    }

    pub fn gesture_handle(&self) -> GestureHandle {
        GestureHandle {
            cell: Arc::clone(&self.gestures),
        }
    }

    pub fn snapshot(&self) -> PerceptionSnapshot {
        PerceptionSnapshot {
            pose: self.pose.take(),
            gestures: self.gestures.peek().unwrap_or(HandGestures::NONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::fixtures::{pose, OPEN};
    use crate::types::GestureLabel;

    #[test]
    fn empty_context_reads_nothing() {
        let context = PerceptionContext::new();
        let snapshot = context.snapshot();
        assert!(snapshot.pose.is_none());
        assert_eq!(snapshot.gestures, HandGestures::NONE);
    }

    #[test]
    fn pose_is_consumed_gestures_persist() {
        let context = PerceptionContext::new();
        context.pose_handle().publish(pose(10));
        context.gesture_handle().publish(OPEN);

        let first = context.snapshot();
        assert_eq!(first.pose.map(|p| p.t_ms), Some(10));
        assert_eq!(first.gestures, OPEN);

        let second = context.snapshot();
        assert!(second.pose.is_none());
        assert_eq!(second.gestures, OPEN);
    }

    #[test]
    fn newer_publish_overwrites() {
        let context = PerceptionContext::new();
        let poses = context.pose_handle();
        poses.publish(pose(1));
        poses.publish(pose(2));
        assert_eq!(context.snapshot().pose.map(|p| p.t_ms), Some(2));

        poses.publish(pose(3));
        poses.publish_missing();
        assert!(context.snapshot().pose.is_none());
    }

    #[test]
    fn producers_publish_from_other_threads() {
        let context = PerceptionContext::new();
        let poses = context.pose_handle();
        let gestures = context.gesture_handle();

        let pose_thread = thread::spawn(move || {
            for t_ms in 0..100 {
                poses.publish(pose(t_ms));
            }
        });
        let gesture_thread = thread::spawn(move || {
            gestures.publish(HandGestures::new(Some(GestureLabel::ClosedFist), None));
        });
        pose_thread.join().expect("pose producer");
        gesture_thread.join().expect("gesture producer");

        let snapshot = context.snapshot();
        assert_eq!(snapshot.pose.map(|p| p.t_ms), Some(99));
        assert_eq!(snapshot.gestures.left, Some(GestureLabel::ClosedFist));
    }
}
