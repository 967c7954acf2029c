//! Frame pacing: the scheduler state machine, frame ports and the timer driver.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::clock::Stopwatch;
use crate::error::StartError;
use crate::world::World;

/// Host primitive asked for the next tick.
pub trait FramePort {
    fn request_frame(&mut self);
}

/// Shared counter of outstanding frame requests.
#[derive(Debug, Clone, Default)]
pub struct FrameRequests(Rc<Cell<u64>>);

impl FrameRequests {
    pub fn pending(&self) -> u64 {
        self.0.get()
    }

    /// Consume one request. Returns `false` when none is pending.
    pub fn take(&self) -> bool {
        match self.0.get() {
            0 => false,
            n => {
                self.0.set(n - 1);
                true
            }
        }
    }

    pub fn clear(&self) {
        self.0.set(0);
    }
}

/// Frame port that only counts requests; the host decides when to tick.
#[derive(Debug, Default)]
pub struct QueuedFramePort {
    requests: FrameRequests,
}

impl QueuedFramePort {
    /// Create a port and the handle used to observe its requests.
    pub fn new() -> (Self, FrameRequests) {
        let port = Self::default();
        let requests = port.requests.clone();
        (port, requests)
    }
}

impl FramePort for QueuedFramePort {
    fn request_frame(&mut self) {
        self.requests.0.set(self.requests.0.get() + 1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// One executed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Zero-based tick counter since the world was built.
    pub index: u64,
    /// Host timestamp passed to the tick, in milliseconds.
    pub timestamp: f64,
    /// Seconds since the previous tick.
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Ran(Frame),
    /// The scheduler is not running; nothing happened and no frame was requested.
    Halted,
}

/// Tracks run state, the frame port and per-tick timing.
pub struct FrameScheduler {
    state: SchedulerState,
    port: Option<Box<dyn FramePort>>,
    frames: u64,
    watch: Stopwatch,
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("state", &self.state)
            .field("has_port", &self.port.is_some())
            .field("frames", &self.frames)
            .finish()
    }
}

impl FrameScheduler {
    pub(crate) fn new(port: Option<Box<dyn FramePort>>) -> Self {
        Self {
            state: SchedulerState::Idle,
            port,
            frames: 0,
            watch: Stopwatch::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Number of ticks executed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn has_port(&self) -> bool {
        self.port.is_some()
    }

    pub(crate) fn start(&mut self, now: Duration) -> Result<(), StartError> {
        if self.state == SchedulerState::Running {
            return Err(StartError::AlreadyRunning);
        }
        self.watch.reset(now);
        self.state = SchedulerState::Running;
        debug!(frames = self.frames, "scheduler running");
        Ok(())
    }

    pub(crate) fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Stopped;
            debug!(frames = self.frames, "scheduler stopped");
        }
    }

    /// Ask the host for another tick. Returns `false` without a port.
    pub(crate) fn request_frame(&mut self) -> bool {
        match self.port.as_mut() {
            Some(port) => {
                port.request_frame();
                true
            }
            None => false,
        }
    }

    pub(crate) fn next_frame(&mut self, timestamp: f64, now: Duration) -> Frame {
        let frame = Frame {
            index: self.frames,
            timestamp,
            delta: self.watch.delta(now),
        };
        self.frames += 1;
        trace!(index = frame.index, delta = frame.delta, "frame");
        frame
    }
}

/// Default tick interval of the timer driver, 60 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);

type Pacer = Box<dyn FnMut(Duration)>;

/// Timer-based host loop: ticks the world while frame requests are pending.
pub struct TimerDriver {
    requests: FrameRequests,
    interval: Duration,
    limit: Option<u64>,
    pacer: Pacer,
}

impl fmt::Debug for TimerDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerDriver")
            .field("pending", &self.requests.pending())
            .field("interval", &self.interval)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl TimerDriver {
    /// Drive frames requested through a [`QueuedFramePort`].
    pub fn new(requests: FrameRequests) -> Self {
        Self {
            requests,
            interval: DEFAULT_FRAME_INTERVAL,
            limit: None,
            pacer: Box::new(std::thread::sleep),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `frames` ticks even if more are requested.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Replace the wait between ticks (the default sleeps the thread).
    pub fn with_pacer(mut self, pacer: impl FnMut(Duration) + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until no request is pending, the world halts or the limit is hit.
    /// Returns the number of ticks executed.
    pub fn run(&mut self, world: &mut World) -> u64 {
        let mut ran = 0;
        while self.limit.is_none_or(|limit| ran < limit) && self.requests.take() {
            (self.pacer)(self.interval);
            let timestamp = world.elapsed_ms();
            match world.frame(timestamp) {
                Ok(TickOutcome::Ran(_)) => ran += 1,
                Ok(TickOutcome::Halted) => break,
                Err(err) => {
                    ran += 1;
                    error!(error = %err, "tick failed");
                }
            }
        }
        debug!(ran, pending = self.requests.pending(), "timer driver idle");
        ran
    }
}
