//! Per-frame diagnostics: begin/end hooks around each tick and a stats overlay.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use stagecraft_config::Diagnostics;

use crate::clock::TimeSource;
use crate::surface::{Element, ElementRef};

/// Display mode of a diagnostics overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Fps,
    Ms,
    Memory,
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fps => f.write_str("fps"),
            Self::Ms => f.write_str("ms"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Overlay mode for a configured diagnostics setting.
///
/// Returns `None` when diagnostics are off. The flag is `true` when the
/// configured mode was not recognized and fps was chosen instead.
pub fn overlay_mode(diagnostics: &Diagnostics) -> Option<(OverlayMode, bool)> {
    match diagnostics {
        Diagnostics::Off => None,
        Diagnostics::Fps => Some((OverlayMode::Fps, false)),
        Diagnostics::Ms => Some((OverlayMode::Ms, false)),
        Diagnostics::Memory => Some((OverlayMode::Memory, false)),
        Diagnostics::Unrecognized(_) => Some((OverlayMode::Fps, true)),
    }
}

/// Frame instrumentation hooks called around every tick.
pub trait DiagnosticsOverlay {
    fn begin(&mut self);

    fn end(&mut self);

    fn set_mode(&mut self, mode: OverlayMode);

    fn mode(&self) -> OverlayMode;

    /// Panel element placed inside the world's container.
    fn element(&self) -> ElementRef;
}

/// Ring buffer of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }

    pub fn average(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        let total: Duration = self.history[..count].iter().sum();
        total / count as u32
    }

    pub fn max(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .min()
            .unwrap_or(Duration::ZERO)
    }
}

/// Reports resident memory in bytes, if the platform exposes it.
pub type MemoryProbe = Box<dyn Fn() -> Option<u64>>;

const FPS_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Built-in stats panel: frames per second, milliseconds per frame, or memory.
pub struct StatsOverlay {
    mode: OverlayMode,
    time: Rc<dyn TimeSource>,
    element: ElementRef,
    timer: FrameTimer,
    frame_start: Option<Duration>,
    sample_start: Option<Duration>,
    frames_in_sample: u32,
    fps: Option<(f64, f64, f64)>,
    memory_probe: MemoryProbe,
}

impl fmt::Debug for StatsOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsOverlay")
            .field("mode", &self.mode)
            .field("timer", &self.timer)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

impl StatsOverlay {
    pub fn new(mode: OverlayMode, time: Rc<dyn TimeSource>) -> Self {
        let element = Element::shared("div");
        element.borrow_mut().set_class_name("stats");
        Self {
            mode,
            time,
            element,
            timer: FrameTimer::new(120),
            frame_start: None,
            sample_start: None,
            frames_in_sample: 0,
            fps: None,
            memory_probe: Box::new(resident_memory_bytes),
        }
    }

    pub fn with_memory_probe(mut self, probe: MemoryProbe) -> Self {
        self.memory_probe = probe;
        self
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Current panel text for the active mode.
    pub fn readout(&self) -> String {
        match self.mode {
            OverlayMode::Fps => match self.fps {
                Some((fps, min, max)) => format!("{fps:.0} FPS ({min:.0}-{max:.0})"),
                None => "-- FPS".to_string(),
            },
            OverlayMode::Ms => {
                format!("{:.1} MS", self.timer.average().as_secs_f64() * 1000.0)
            }
            OverlayMode::Memory => match (self.memory_probe)() {
                Some(bytes) => format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)),
                None => "n/a MB".to_string(),
            },
        }
    }

    fn sample_fps(&mut self, now: Duration) {
        // The frame that opens a window only marks its start.
        let Some(start) = self.sample_start else {
            self.sample_start = Some(now);
            return;
        };
        self.frames_in_sample += 1;
        let window = now.saturating_sub(start);
        if window < FPS_SAMPLE_WINDOW {
            return;
        }
        let fps = self.frames_in_sample as f64 / window.as_secs_f64();
        self.fps = Some(match self.fps {
            Some((_, min, max)) => (fps, min.min(fps), max.max(fps)),
            None => (fps, fps, fps),
        });
        self.sample_start = Some(now);
        self.frames_in_sample = 0;
    }
}

impl DiagnosticsOverlay for StatsOverlay {
    fn begin(&mut self) {
        self.frame_start = Some(self.time.now());
    }

    fn end(&mut self) {
        let now = self.time.now();
        if let Some(start) = self.frame_start.take() {
            self.timer.record(now.saturating_sub(start));
        }
        self.sample_fps(now);
        let text = self.readout();
        self.element.borrow_mut().set_text(text);
    }

    fn set_mode(&mut self, mode: OverlayMode) {
        self.mode = mode;
    }

    fn mode(&self) -> OverlayMode {
        self.mode
    }

    fn element(&self) -> ElementRef {
        Rc::clone(&self.element)
    }
}

/// statm reports pages; 4 KiB pages are assumed.
#[cfg(target_os = "linux")]
const PAGE_SIZE: u64 = 4096;

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * PAGE_SIZE)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn overlay(mode: OverlayMode) -> (StatsOverlay, ManualClock) {
        let clock = ManualClock::new();
        let stats = StatsOverlay::new(mode, Rc::new(clock.clone()));
        (stats, clock)
    }

    #[test]
    fn overlay_mode_mapping() {
        assert_eq!(overlay_mode(&Diagnostics::Off), None);
        assert_eq!(overlay_mode(&Diagnostics::Ms), Some((OverlayMode::Ms, false)));
        assert_eq!(
            overlay_mode(&Diagnostics::Unrecognized("bogus".into())),
            Some((OverlayMode::Fps, true))
        );
    }

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.min(), Duration::from_millis(10));
    }

    #[test]
    fn frame_timer_wraps_around() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn ms_mode_reports_average_frame_time() {
        let (mut stats, clock) = overlay(OverlayMode::Ms);
        for _ in 0..4 {
            stats.begin();
            clock.advance_ms(8);
            stats.end();
            clock.advance_ms(8);
        }
        assert_eq!(stats.frame_timer().count(), 4);
        assert_eq!(stats.readout(), "8.0 MS");
        assert_eq!(stats.element().borrow().text(), "8.0 MS");
    }

    #[test]
    fn fps_mode_samples_once_per_second() {
        let (mut stats, clock) = overlay(OverlayMode::Fps);
        assert_eq!(stats.readout(), "-- FPS");
        // 51 frame ends spaced 20ms apart span exactly one second.
        for _ in 0..51 {
            stats.begin();
            stats.end();
            clock.advance_ms(20);
        }
        assert_eq!(stats.readout(), "50 FPS (50-50)");

        // The next window holds 50 frame ends as well.
        for _ in 0..50 {
            stats.begin();
            stats.end();
            clock.advance_ms(20);
        }
        assert_eq!(stats.readout(), "50 FPS (50-50)");
    }

    #[test]
    fn fps_readout_matches_steady_rate() {
        let (mut stats, clock) = overlay(OverlayMode::Fps);
        // 10ms frames: 101 ends open the window and close it one second later.
        for _ in 0..101 {
            stats.begin();
            stats.end();
            clock.advance_ms(10);
        }
        assert_eq!(stats.readout(), "100 FPS (100-100)");
    }

    #[test]
    fn memory_mode_uses_probe() {
        let (stats, _clock) = overlay(OverlayMode::Memory);
        let stats = stats.with_memory_probe(Box::new(|| Some(3 * 1024 * 1024)));
        assert_eq!(stats.readout(), "3.0 MB");

        let (blind, _clock) = overlay(OverlayMode::Memory);
        let blind = blind.with_memory_probe(Box::new(|| None));
        assert_eq!(blind.readout(), "n/a MB");
    }

    #[test]
    fn set_mode_switches_readout() {
        let (mut stats, _clock) = overlay(OverlayMode::Fps);
        stats.set_mode(OverlayMode::Ms);
        assert_eq!(stats.mode(), OverlayMode::Ms);
        assert_eq!(stats.readout(), "0.0 MS");
    }
}
