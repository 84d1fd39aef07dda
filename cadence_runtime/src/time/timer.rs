//! Countdown timer unit.

use crate::tick::Tick;
use crate::time::ChronoState;
use crate::unit::{Timeable, Unit};

/// A chronometer with a duration: reports progress in [0, 1] and
/// completion. A non-positive duration is immediately complete.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    state: ChronoState,
    duration: f32,
    now: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Timer {
    /// Timer with the given duration (seconds), stopped.
    pub fn new(duration: f32) -> Self {
        Self {
            state: ChronoState::new(),
            duration: duration.max(0.0),
            now: 0.0,
        }
    }

    /// Changes the duration (seconds); negative values clamp to zero.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
    }

    /// Duration (seconds).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Restarts with a new duration.
    pub fn start_with_duration(&mut self, duration: f32) {
        self.set_duration(duration);
        self.start();
    }

    /// Progress in [0, 1]; 1 when the duration is non-positive.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((self.state.elapsed() / self.duration as f64) as f32).clamp(0.0, 1.0)
        }
    }

    /// True once the elapsed time reached the duration.
    pub fn is_finished(&self) -> bool {
        self.state.elapsed() >= self.duration as f64
    }

    /// Elapsed seconds.
    pub fn elapsed(&self) -> f64 {
        self.state.elapsed()
    }

    pub(crate) fn update(&mut self, now: f64) {
        self.now = now;
        self.state.update(now);
    }
}

impl Unit for Timer {
    fn begin(&mut self, tick: &mut Tick) {
        self.now = tick.seconds();
        self.state.set(0.0, self.now);
    }

    fn step(&mut self, tick: &mut Tick) {
        self.update(tick.seconds());
    }

    fn value(&self) -> f32 {
        self.progress()
    }
}

impl Timeable for Timer {
    fn start(&mut self) {
        self.state.start(self.now);
    }

    fn stop(&mut self) {
        self.state.stop(self.now);
    }

    fn pause(&mut self) {
        self.state.pause(self.now);
    }

    fn resume(&mut self) {
        self.state.resume(self.now);
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn set_time(&mut self, seconds: f32) {
        self.state.set(seconds as f64, self.now);
    }

    fn add_time(&mut self, seconds: f32) {
        self.state.add(seconds as f64);
    }
}
