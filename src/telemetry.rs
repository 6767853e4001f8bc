use core::sync::atomic::{AtomicU32, Ordering};

/// Controller counters. Shared by reference between the control loop and
/// anything that reports on it.
#[derive(Debug, Default)]
pub struct ControlTelemetry {
    ticks: AtomicU32,
    ticks_without_pose: AtomicU32,
    sink_write_failures: AtomicU32,
    baselines_installed: AtomicU32,
    calibration_failures: AtomicU32,
    hand_releases: AtomicU32,
    hand_retracks: AtomicU32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub ticks: u32,
    pub ticks_without_pose: u32,
    pub sink_write_failures: u32,
    pub baselines_installed: u32,
    pub calibration_failures: u32,
    pub hand_releases: u32,
    pub hand_retracks: u32,
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl ControlTelemetry {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            ticks_without_pose: AtomicU32::new(0),
            sink_write_failures: AtomicU32::new(0),
            baselines_installed: AtomicU32::new(0),
            calibration_failures: AtomicU32::new(0),
            hand_releases: AtomicU32::new(0),
            hand_retracks: AtomicU32::new(0),
        }
    }

    pub fn record_tick(&self, had_pose: bool) {
        bump(&self.ticks);
        if !had_pose {
            bump(&self.ticks_without_pose);
        }
    }

    pub fn record_sink_failure(&self) {
        bump(&self.sink_write_failures);
    }

    pub fn record_baseline_installed(&self) {
        bump(&self.baselines_installed);
    }

    pub fn record_calibration_failure(&self) {
        bump(&self.calibration_failures);
    }

    pub fn record_hand_release(&self) {
        bump(&self.hand_releases);
    }

    pub fn record_hand_retrack(&self) {
        bump(&self.hand_retracks);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_without_pose: self.ticks_without_pose.load(Ordering::Relaxed),
            sink_write_failures: self.sink_write_failures.load(Ordering::Relaxed),
            baselines_installed: self.baselines_installed.load(Ordering::Relaxed),
            calibration_failures: self.calibration_failures.load(Ordering::Relaxed),
            hand_releases: self.hand_releases.load(Ordering::Relaxed),
            hand_retracks: self.hand_retracks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let telemetry = ControlTelemetry::new();
        telemetry.record_tick(true);
        telemetry.record_tick(false);
        telemetry.record_sink_failure();
        telemetry.record_hand_release();
        telemetry.record_hand_release();

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.ticks_without_pose, 1);
        assert_eq!(snapshot.sink_write_failures, 1);
        assert_eq!(snapshot.hand_releases, 2);
        assert_eq!(snapshot.hand_retracks, 0);
    }
}
