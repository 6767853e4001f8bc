//! The control loop: startup probe, fixed-cadence ticks, neutral shutdown.

mod producers;


use core::fmt;
use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::channels::PerceptionContext;
use crate::config::RuntimeConfig;
use crate::controller::Controller;
use crate::mapping::{Axis, ControlOutput};
use crate::sink::{OutputSink, SinkError};
use crate::telemetry::TelemetrySnapshot;
use crate::trace::Trace;
use crate::types::{HandGestures, PoseSample};

pub use producers::{spawn_producers, Producers};

#[derive(Debug)]
pub enum RuntimeError {
    /// The startup neutral frame could not be written.
    SinkUnavailable(SinkError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinkUnavailable(err) => write!(f, "output sink unavailable at startup: {err}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SinkUnavailable(err) => Some(err),
        }
    }
}

/// Cooperative cancellation shared between the loop, its producers, and
/// whoever asks them to stop.
#[derive(Clone, Debug, Default)]
pub struct QuitFlag(Arc<AtomicBool>);

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raises `quit` when a line reading `q` arrives on `input`. Stops watching
/// at end of input or on a read error without raising the flag.
pub fn spawn_quit_watcher<R>(input: R, quit: QuitFlag) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    info!("quit requested from input");
                    quit.request();
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("quit watcher stopped: {err}");
                    return;
                }
            }
        }
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub telemetry: TelemetrySnapshot,
    /// Last frame computed before the neutral shutdown write.
    pub last_output: ControlOutput,
}

/// Owns the controller and borrows the sink for one session.
pub struct ControlLoop<'s, S: OutputSink + ?Sized> {
    controller: Controller,
    sink: &'s mut S,
    status_log_every_ticks: u32,
    ticks: u64,
}

impl<'s, S: OutputSink + ?Sized> ControlLoop<'s, S> {
    /// Writes one neutral frame; a sink that rejects it is fatal.
    pub fn start(
        controller: Controller,
        sink: &'s mut S,
        config: &RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let neutral = ControlOutput::neutral(controller.range());
        sink.write_frame(&neutral).map_err(RuntimeError::SinkUnavailable)?;
        info!("control loop started: {}", controller.status().prompt());
        Ok(Self {
            controller,
            sink,
            status_log_every_ticks: config.status_log_every_ticks,
            ticks: 0,
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One tick plus its synchronous write. Write failures are logged and
    /// counted; the loop carries on.
    pub fn step(
        &mut self,
        now_ms: u64,
        pose: Option<PoseSample>,
        gestures: HandGestures,
    ) -> ControlOutput {
        let output = self.controller.tick(now_ms, pose, gestures);
        if let Err(err) = self.sink.write_frame(&output) {
            self.controller.telemetry().record_sink_failure();
            warn!("tick={} {err}", self.ticks);
        }
        self.ticks += 1;

        let every = u64::from(self.status_log_every_ticks);
        if every > 0 && self.ticks % every == 0 {
            let feedback = self.controller.last_feedback().copied().unwrap_or_default();
            info!(
                "controller status={} x={} y={} z={} rx={} feedback_l={:.2} feedback_r={:.2}",
                self.controller.status().as_str(),
                output.axis(Axis::X),
                output.axis(Axis::Y),
                output.axis(Axis::Z),
                output.axis(Axis::Rx),
                feedback.displacement_intensity.left,
                feedback.displacement_intensity.right
            );
        }
        output
    }

    /// Final neutral frame, then the sink is released.
    pub fn shutdown(mut self) -> RunSummary {
        let neutral = ControlOutput::neutral(self.controller.range());
        if let Err(err) = self.sink.write_frame(&neutral) {
            self.controller.telemetry().record_sink_failure();
            warn!("shutdown neutral write: {err}");
        }
        if let Err(err) = self.sink.release() {
            warn!("sink release: {err}");
        }

        let telemetry = self.controller.telemetry().snapshot();
        info!(
            "control loop stopped ticks={} no_pose={} sink_failures={} baselines={} calibration_failures={} releases={} retracks={}",
            self.ticks,
            telemetry.ticks_without_pose,
            telemetry.sink_write_failures,
            telemetry.baselines_installed,
            telemetry.calibration_failures,
            telemetry.hand_releases,
            telemetry.hand_retracks
        );
        RunSummary {
            ticks: self.ticks,
            telemetry,
            last_output: self.controller.last_output(),
        }
    }
}

/// Drives one tick per pose/no-pose record, as fast as possible.
pub fn replay_trace<S: OutputSink + ?Sized>(
    trace: &Trace,
    controller: Controller,
    sink: &mut S,
    config: &RuntimeConfig,
) -> Result<RunSummary, RuntimeError> {
    let mut control = ControlLoop::start(controller, sink, config)?;
    for (t_ms, pose, gestures) in trace.ticks() {
        control.step(t_ms, pose, gestures);
    }
    Ok(control.shutdown())
}

/// Live session: producer threads publish the trace in real time while the
/// loop ticks at `tick_interval_ms`. Stops when `quit` is raised, after
/// `max_ticks`, or once both producers are done.
pub fn run_live<S: OutputSink + ?Sized>(
    trace: &Trace,
    controller: Controller,
    sink: &mut S,
    config: &RuntimeConfig,
    quit: &QuitFlag,
    max_ticks: Option<u64>,
) -> Result<RunSummary, RuntimeError> {
    let mut control = ControlLoop::start(controller, sink, config)?;

    let context = PerceptionContext::new();
    let origin_ms = trace.records().first().map_or(0, |record| record.t_ms());
    let epoch = Instant::now();
    let producers = spawn_producers(trace, &context, quit, epoch);

    let interval = Duration::from_millis(config.tick_interval_ms);
    let mut next_tick_at = epoch;
    loop {
        if quit.is_requested() || max_ticks.is_some_and(|max| control.ticks() >= max) {
            break;
        }
        // Sampled before the snapshot so the last publish still gets a tick.
        let producers_done = producers.finished();

        let snapshot = context.snapshot();
        let now_ms = origin_ms + epoch.elapsed().as_millis();
        control.step(now_ms, snapshot.pose, snapshot.gestures);
        if producers_done {
            break;
        }

        next_tick_at += interval;
        sleep_until(next_tick_at);
    }

    quit.request();
    producers.join();
    Ok(control.shutdown())
}

fn ms_until(now: Instant, deadline: Instant) -> u64 {
    if deadline <= now {
        0
    } else {
        deadline.saturating_duration_since(now).as_millis()
    }
}

pub(crate) fn sleep_until(deadline: Instant) {
    let wait_ms = ms_until(Instant::now(), deadline);
    if wait_ms > 0 {
        thread::sleep(core::time::Duration::from_millis(wait_ms));
    }
}
