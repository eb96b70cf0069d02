/// Wall-clock timer behind the time score.
///
/// The timer stores an anchor instant; elapsed time is "now minus anchor",
/// floored to whole seconds. Restoring a snapshot moves the anchor back so
/// that elapsed time resumes from the captured value.
///
/// The clock is a trait so tests can drive time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic milliseconds since an arbitrary origin.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance_millis(seconds * 1000);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

pub struct Timer {
    clock: Box<dyn Clock>,
    anchor: i64,
}

impl Timer {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        let anchor = clock.now_millis();
        Timer { clock, anchor }
    }

    /// Whole seconds since the anchor. Never negative.
    pub fn elapsed_seconds(&self) -> u64 {
        let millis = (self.clock.now_millis() - self.anchor).max(0);
        (millis / 1000) as u64
    }

    pub fn reset_to_now(&mut self) {
        self.anchor = self.clock.now_millis();
    }

    /// Move the anchor so that `elapsed_seconds()` reads `seconds` now.
    pub fn roll_back_to_seconds(&mut self, seconds: u64) {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX / 1000);
        self.anchor = self.clock.now_millis() - seconds * 1000;
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer").field("anchor", &self.anchor).finish()
    }
}
