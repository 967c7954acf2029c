//! Named per-frame callbacks executed after rendering.
//!
//! The registry is a cheap cloneable handle: the world keeps one and hands
//! clones to user code, which may register or toggle entries at any time,
//! including from inside a running callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use stagecraft_common::BoxError;
use tracing::{debug, trace, warn};

use crate::clock::{Stopwatch, TimeSource};
use crate::error::TickError;

pub type LoopResult = Result<(), BoxError>;

type LoopFn = Box<dyn FnMut(&mut LoopClock, f64) -> LoopResult>;

/// Per-entry clock handed to the callback on every invocation.
pub struct LoopClock {
    time: Rc<dyn TimeSource>,
    watch: Stopwatch,
}

impl LoopClock {
    fn new(time: Rc<dyn TimeSource>) -> Self {
        let mut watch = Stopwatch::new();
        watch.reset(time.now());
        Self { time, watch }
    }

    /// Seconds since the previous call.
    pub fn get_delta(&mut self) -> f64 {
        self.watch.delta(self.time.now())
    }

    /// Seconds since the entry was registered or last re-enabled.
    pub fn elapsed(&self) -> f64 {
        self.watch.elapsed(self.time.now())
    }

    fn restart_at(&mut self, at: Duration) {
        self.watch.reset(at);
    }
}

impl fmt::Debug for LoopClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopClock").field("watch", &self.watch).finish()
    }
}

struct LoopBody {
    clock: LoopClock,
    func: LoopFn,
}

struct LoopEntry {
    name: String,
    enabled: Cell<bool>,
    restart_at: Cell<Option<Duration>>,
    time: Rc<dyn TimeSource>,
    body: RefCell<LoopBody>,
}

impl LoopEntry {
    fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.replace(enabled);
        if enabled && !was {
            self.restart_at.set(Some(self.time.now()));
        }
    }
}

/// Handle to a single registered entry.
#[derive(Clone)]
pub struct LoopHandle {
    entry: Rc<LoopEntry>,
}

impl LoopHandle {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn is_enabled(&self) -> bool {
        self.entry.enabled.get()
    }

    /// Enable the entry. Re-enabling restarts its clock.
    pub fn enable(&self) {
        self.entry.set_enabled(true);
    }

    pub fn disable(&self) {
        self.entry.set_enabled(false);
    }
}

impl fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.entry.name)
            .field("enabled", &self.entry.enabled.get())
            .finish()
    }
}

/// Ordered list of loop entries shared between the world and user code.
#[derive(Clone)]
pub struct LoopRegistry {
    entries: Rc<RefCell<Vec<Rc<LoopEntry>>>>,
    time: Rc<dyn TimeSource>,
}

impl fmt::Debug for LoopRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopRegistry")
            .field("entries", &self.names())
            .finish()
    }
}

impl LoopRegistry {
    pub fn new(time: Rc<dyn TimeSource>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            time,
        }
    }

    /// Append an enabled entry.
    pub fn register<F>(&self, name: impl Into<String>, func: F) -> LoopHandle
    where
        F: FnMut(&mut LoopClock, f64) -> LoopResult + 'static,
    {
        self.push(name.into(), true, Box::new(func))
    }

    /// Append an entry that stays idle until enabled.
    pub fn register_disabled<F>(&self, name: impl Into<String>, func: F) -> LoopHandle
    where
        F: FnMut(&mut LoopClock, f64) -> LoopResult + 'static,
    {
        self.push(name.into(), false, Box::new(func))
    }

    fn push(&self, name: String, enabled: bool, func: LoopFn) -> LoopHandle {
        debug!(loop_name = %name, enabled, "register loop");
        let entry = Rc::new(LoopEntry {
            name,
            enabled: Cell::new(enabled),
            restart_at: Cell::new(None),
            time: Rc::clone(&self.time),
            body: RefCell::new(LoopBody {
                clock: LoopClock::new(Rc::clone(&self.time)),
                func,
            }),
        });
        self.entries.borrow_mut().push(Rc::clone(&entry));
        LoopHandle { entry }
    }

    /// Toggle every entry named `name`. Returns whether any entry matched.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut matched = false;
        for entry in self.entries.borrow().iter().filter(|e| e.name == name) {
            entry.set_enabled(enabled);
            matched = true;
        }
        matched
    }

    /// Whether any entry named `name` is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.name == name && e.enabled.get())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.name.clone()).collect()
    }

    /// Restart the clock of every entry at the current time.
    pub(crate) fn restart_clocks(&self) {
        let now = self.time.now();
        for entry in self.entries.borrow().iter() {
            entry.restart_at.set(Some(now));
        }
    }

    /// Invoke enabled entries in registration order.
    ///
    /// The length is re-read after every entry, so entries registered by a
    /// callback run in the same pass.
    pub(crate) fn run(&self, timestamp: f64) -> Result<(), TickError> {
        let mut index = 0;
        loop {
            let entry = match self.entries.borrow().get(index) {
                Some(entry) => Rc::clone(entry),
                None => break,
            };
            index += 1;

            if !entry.enabled.get() {
                continue;
            }
            let Ok(mut body) = entry.body.try_borrow_mut() else {
                warn!(loop_name = %entry.name, "loop re-entered from its own callback; skipped");
                continue;
            };
            if let Some(at) = entry.restart_at.take() {
                body.clock.restart_at(at);
            }
            trace!(loop_name = %entry.name, timestamp, "run loop");
            let LoopBody { clock, func } = &mut *body;
            func(clock, timestamp).map_err(|source| TickError::Loop {
                name: entry.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn registry() -> (LoopRegistry, ManualClock) {
        let clock = ManualClock::new();
        (LoopRegistry::new(Rc::new(clock.clone())), clock)
    }

    fn journal() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn recorder(
        log: &Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    ) -> impl FnMut(&mut LoopClock, f64) -> LoopResult + 'static {
        let log = Rc::clone(log);
        move |_, _| {
            log.borrow_mut().push(tag.to_string());
            Ok(())
        }
    }

    #[test]
    fn entries_run_in_registration_order() {
        let (loops, _) = registry();
        let log = journal();
        loops.register("a", recorder(&log, "A"));
        loops.register("b", recorder(&log, "B"));

        loops.run(0.0).unwrap();
        loops.run(16.0).unwrap();
        assert_eq!(*log.borrow(), vec!["A", "B", "A", "B"]);
        assert_eq!(loops.names(), vec!["a", "b"]);
    }

    #[test]
    fn disabled_entries_do_not_fire() {
        let (loops, _) = registry();
        let log = journal();
        let a = loops.register("a", recorder(&log, "A"));
        loops.register_disabled("b", recorder(&log, "B"));

        a.disable();
        loops.run(0.0).unwrap();
        assert!(log.borrow().is_empty());
        assert!(!loops.is_enabled("b"));

        assert!(loops.set_enabled("b", true));
        loops.run(16.0).unwrap();
        assert_eq!(*log.borrow(), vec!["B"]);
    }

    #[test]
    fn set_enabled_reports_unknown_names() {
        let (loops, _) = registry();
        assert!(!loops.set_enabled("missing", true));
        assert!(loops.is_empty());
    }

    #[test]
    fn set_enabled_toggles_every_entry_with_that_name() {
        let (loops, _) = registry();
        let log = journal();
        loops.register("dup", recorder(&log, "1"));
        loops.register("dup", recorder(&log, "2"));

        assert!(loops.set_enabled("dup", false));
        loops.run(0.0).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(loops.len(), 2);
    }

    #[test]
    fn entry_registered_during_run_fires_same_pass() {
        let (loops, _) = registry();
        let log = journal();
        let inner_log = Rc::clone(&log);
        let handle = loops.clone();
        let mut spawned = false;
        loops.register("spawner", move |_, _| {
            if !spawned {
                spawned = true;
                handle.register("child", recorder(&inner_log, "child"));
            }
            inner_log.borrow_mut().push("spawner".into());
            Ok(())
        });

        loops.run(0.0).unwrap();
        assert_eq!(*log.borrow(), vec!["spawner", "child"]);
    }

    #[test]
    fn callback_can_disable_a_later_entry() {
        let (loops, _) = registry();
        let log = journal();
        let handle = loops.clone();
        loops.register("first", move |_, _| {
            handle.set_enabled("second", false);
            Ok(())
        });
        loops.register("second", recorder(&log, "second"));

        loops.run(0.0).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn failing_entry_aborts_remaining_entries() {
        let (loops, _) = registry();
        let log = journal();
        loops.register("boom", |_, _| Err("exploded".into()));
        loops.register("after", recorder(&log, "after"));

        let err = loops.run(0.0).unwrap_err();
        match err {
            TickError::Loop { name, source } => {
                assert_eq!(name, "boom");
                assert_eq!(source.to_string(), "exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn callback_receives_timestamp_and_clock() {
        let (loops, clock) = registry();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        loops.register("timed", move |c, ts| {
            sink.borrow_mut().push((ts, c.get_delta()));
            Ok(())
        });

        loops.run(100.0).unwrap();
        clock.advance_ms(250);
        loops.run(350.0).unwrap();
        assert_eq!(*seen.borrow(), vec![(100.0, 0.0), (350.0, 0.25)]);
    }

    #[test]
    fn re_enabling_restarts_the_clock() {
        let (loops, clock) = registry();
        let elapsed = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&elapsed);
        let handle = loops.register("tracked", move |c, _| {
            sink.set(c.elapsed());
            Ok(())
        });

        clock.advance_ms(2000);
        loops.run(0.0).unwrap();
        assert_eq!(elapsed.get(), 2.0);

        handle.disable();
        clock.advance_ms(1000);
        handle.enable();
        clock.advance_ms(500);
        loops.run(0.0).unwrap();
        assert_eq!(elapsed.get(), 0.5);
        assert!(handle.is_enabled());
        assert_eq!(handle.name(), "tracked");
    }
}
