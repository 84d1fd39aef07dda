//! Elapsed-time state machine and the chronometer unit.

use crate::tick::Tick;
use crate::unit::{Timeable, Unit};

/// The elapsed-time state machine: start/pause/resume/stop with the
/// elapsed time preserved across pauses. Time is fed in explicitly (the
/// engine's reference seconds), so the state is testable without a clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoState {
    start_time: f64,
    offset_time: f64,
    elapsed_time: f64,
    running: bool,
}

impl ChronoState {
    /// A stopped chronometer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the elapsed time at the given moment. Call once per
    /// step before reading [`ChronoState::elapsed`].
    pub fn update(&mut self, now: f64) {
        self.elapsed_time = self.offset_time;
        if self.running {
            self.elapsed_time += now - self.start_time;
        }
    }

    /// Restarts from zero and runs.
    pub fn start(&mut self, now: f64) {
        self.set(0.0, now);
        self.running = true;
    }

    /// Resets to zero and halts.
    pub fn stop(&mut self, now: f64) {
        self.set(0.0, now);
        self.running = false;
    }

    /// Freezes the elapsed time without resetting.
    pub fn pause(&mut self, now: f64) {
        if self.running {
            self.update(now);
            self.offset_time = self.elapsed_time;
            self.running = false;
        }
    }

    /// Restarts the clock reference, keeping the accumulated offset.
    pub fn resume(&mut self, now: f64) {
        if !self.running {
            self.start_time = now;
            self.running = true;
        }
    }

    /// Forces the elapsed time (seconds).
    pub fn set(&mut self, seconds: f64, now: f64) {
        self.elapsed_time = seconds;
        self.offset_time = seconds;
        self.start_time = now;
    }

    /// Adds (or subtracts) elapsed time (seconds).
    pub fn add(&mut self, seconds: f64) {
        self.offset_time += seconds;
    }

    /// Elapsed seconds as of the last [`ChronoState::update`].
    pub fn elapsed(&self) -> f64 {
        self.elapsed_time
    }

    /// True iff currently running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once the elapsed time reached `timeout` seconds.
    pub fn has_passed(&self, timeout: f64) -> bool {
        self.elapsed_time >= timeout
    }
}

/// A stopwatch unit: counts elapsed seconds while running. `put()` forces
/// the elapsed time. Control calls between steps take effect against the
/// reference time of the latest step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chronometer {
    state: ChronoState,
    now: f64,
}

impl Chronometer {
    /// A stopped chronometer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed seconds.
    pub fn elapsed(&self) -> f64 {
        self.state.elapsed()
    }

    /// True once the elapsed time reached `timeout` seconds.
    pub fn has_passed(&self, timeout: f32) -> bool {
        self.state.has_passed(timeout as f64)
    }
}

impl Unit for Chronometer {
    fn begin(&mut self, tick: &mut Tick) {
        self.now = tick.seconds();
        self.state.stop(self.now);
    }

    fn step(&mut self, tick: &mut Tick) {
        self.now = tick.seconds();
        self.state.update(self.now);
    }

    fn value(&self) -> f32 {
        self.state.elapsed() as f32
    }

    fn put(&mut self, value: f32) -> f32 {
        self.set_time(value);
        self.value()
    }
}

impl Timeable for Chronometer {
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
