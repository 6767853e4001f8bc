use std::thread::{self, JoinHandle};

use embassy_time::{Duration, Instant};
use log::{debug, warn};

use crate::channels::{GestureHandle, PerceptionContext, PoseHandle};
use crate::trace::{Trace, TraceRecord};
use crate::types::{HandGestures, PoseSample};

use super::{sleep_until, QuitFlag};

/// Longest single sleep, so a raised quit flag is noticed promptly.
const QUIT_POLL_MS: u64 = 10;

/// Pose and gesture publisher threads replaying a trace on the wall clock.
pub struct Producers {
    pose: JoinHandle<()>,
    gesture: JoinHandle<()>,
}

impl Producers {
    pub fn finished(&self) -> bool {
        self.pose.is_finished() && self.gesture.is_finished()
    }

    pub fn join(self) {
        for (name, handle) in [("pose", self.pose), ("gesture", self.gesture)] {
            if handle.join().is_err() {
                warn!("{name} producer panicked");
            }
        }
    }
}

/// Starts both producers. Record timestamps are offsets from the first
/// record, anchored at `epoch`.
pub fn spawn_producers(
    trace: &Trace,
    context: &PerceptionContext,
    quit: &QuitFlag,
    epoch: Instant,
) -> Producers {
    let origin_ms = trace.records().first().map_or(0, |record| record.t_ms());

    let mut poses: Vec<(u64, Option<PoseSample>)> = Vec::new();
    let mut gestures: Vec<(u64, HandGestures)> = Vec::new();
    for record in trace.records() {
        match *record {
            TraceRecord::Pose(sample) => poses.push((sample.t_ms, Some(sample))),
            TraceRecord::NoPose { t_ms } => poses.push((t_ms, None)),
            TraceRecord::Gesture { t_ms, gestures: labels } => gestures.push((t_ms, labels)),
        }
    }

    let pose_handle = context.pose_handle();
    let pose_quit = quit.clone();
    let pose = thread::spawn(move || {
        publish_poses(&poses, &pose_handle, &pose_quit, epoch, origin_ms);
    });

    let gesture_handle = context.gesture_handle();
    let gesture_quit = quit.clone();
    let gesture = thread::spawn(move || {
        publish_gestures(&gestures, &gesture_handle, &gesture_quit, epoch, origin_ms);
    });

    Producers { pose, gesture }
}

fn publish_poses(
    records: &[(u64, Option<PoseSample>)],
    handle: &PoseHandle,
    quit: &QuitFlag,
    epoch: Instant,
    origin_ms: u64,
) {
    for (t_ms, sample) in records {
        if !wait_for(epoch, t_ms.saturating_sub(origin_ms), quit) {
            return;
        }
        match sample {
            Some(sample) => handle.publish(*sample),
            None => handle.publish_missing(),
        }
    }
    debug!("pose producer done records={}", records.len());
}

fn publish_gestures(
    records: &[(u64, HandGestures)],
    handle: &GestureHandle,
    quit: &QuitFlag,
    epoch: Instant,
    origin_ms: u64,
) {
    for (t_ms, gestures) in records {
        if !wait_for(epoch, t_ms.saturating_sub(origin_ms), quit) {
            return;
        }
        handle.publish(*gestures);
    }
    debug!("gesture producer done records={}", records.len());
}

/// Sleeps until `offset_ms` past `epoch`; `false` if quit was raised first.
fn wait_for(epoch: Instant, offset_ms: u64, quit: &QuitFlag) -> bool {
    let deadline = epoch + Duration::from_millis(offset_ms);
    loop {
        if quit.is_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        let slice = Duration::from_millis(QUIT_POLL_MS);
        sleep_until(if deadline - now > slice { now + slice } else { deadline });
    }
}
