//! Eased interpolation ramp.

use cadence_core::easing::EasingFn;
use cadence_core::map::map_from_01;

use crate::events::EventKind;
use crate::tick::Tick;
use crate::time::ChronoState;
use crate::unit::{Timeable, Unit};

/// How a ramp's pace is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampMode {
    /// Fixed total duration (seconds); speed follows from the distance.
    Duration,
    /// Fixed speed (value change per second); duration follows.
    Speed,
}

// Completion is observable for exactly one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FinishedState {
    Not,
    Just,
    Post,
}

/// Interpolates from a `from` value to a `to` value over a duration or at
/// a fixed speed, optionally through an easing curve. `put()` forces the
/// current value and re-projects the ramp origin so the motion continues
/// smoothly toward the target.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    chrono: ChronoState,
    duration: f32,
    from: f32,
    to: f32,
    easing: Option<EasingFn>,
    mode: RampMode,
    finished_state: FinishedState,
    value: f32,
    now: f64,
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Ramp {
    /// Ramp from 0 to 1 over the given duration (seconds), stopped.
    pub fn new(duration: f32) -> Self {
        Self {
            chrono: ChronoState::new(),
            duration: duration.max(0.0),
            from: 0.0,
            to: 1.0,
            easing: None,
            mode: RampMode::Duration,
            finished_state: FinishedState::Not,
            value: 0.0,
            now: 0.0,
        }
    }

    // ─── Pace ───────────────────────────────────────────────────────

    /// Switches to duration mode and sets the duration (seconds).
    pub fn set_duration(&mut self, duration: f32) {
        self.mode = RampMode::Duration;
        self.duration = duration.max(0.0);
    }

    /// Duration (seconds).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Switches to speed mode and sets the speed (value change per
    /// second). The duration is derived from the current from/to span.
    pub fn set_speed(&mut self, speed: f32) {
        self.mode = RampMode::Speed;
        self.duration = self.invert_pace(speed.max(0.0));
    }

    /// Speed (value change per second).
    pub fn speed(&self) -> f32 {
        self.invert_pace(self.duration)
    }

    /// Current pace mode.
    pub fn mode(&self) -> RampMode {
        self.mode
    }

    // Duration ↔ speed share one inversion: pace = |to − from| / x.
    fn invert_pace(&self, x: f32) -> f32 {
        if x > 0.0 {
            (self.to - self.from).abs() / x
        } else if self.to == self.from {
            0.0
        } else {
            f32::MAX
        }
    }

    // ─── Targets ────────────────────────────────────────────────────

    /// Changes both endpoints. In speed mode the duration is readjusted
    /// to keep the speed.
    pub fn from_to(&mut self, from: f32, to: f32) {
        if self.mode == RampMode::Speed {
            let speed = self.speed();
            self.from = from;
            self.to = to;
            self.set_speed(speed);
        } else {
            self.from = from;
            self.to = to;
        }
    }

    /// Starting value.
    pub fn from(&self) -> f32 {
        self.from
    }

    /// Target value.
    pub fn to(&self) -> f32 {
        self.to
    }

    /// Sets the easing curve (`None` = linear).
    pub fn set_easing(&mut self, easing: Option<EasingFn>) {
        self.easing = easing;
    }

    // ─── Launching ──────────────────────────────────────────────────

    /// Ramps from the current value to `to`, keeping the current
    /// duration/speed and easing.
    pub fn go(&mut self, to: f32) {
        self.from_to(self.value, to);
        self.start();
    }

    /// Ramps from the current value to `to` with a new duration (in
    /// duration mode) or speed (in speed mode).
    pub fn go_with_pace(&mut self, to: f32, duration_or_speed: f32) {
        self.from_to(self.value, to);
        self.set_pace(duration_or_speed);
        self.start();
    }

    /// Ramps between explicit endpoints with a new duration or speed.
    pub fn go_from_to(&mut self, from: f32, to: f32, duration_or_speed: f32) {
        self.from_to(from, to);
        self.set_pace(duration_or_speed);
        self.start();
    }

    fn set_pace(&mut self, duration_or_speed: f32) {
        match self.mode {
            RampMode::Duration => self.set_duration(duration_or_speed),
            RampMode::Speed => self.set_speed(duration_or_speed),
        }
    }

    // ─── Progress ───────────────────────────────────────────────────

    /// Progress in [0, 1]; 1 when the duration is non-positive.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((self.chrono.elapsed() / self.duration as f64) as f32).clamp(0.0, 1.0)
        }
    }

    /// True once the ramp reached its target.
    pub fn is_finished(&self) -> bool {
        self.chrono.elapsed() >= self.duration as f64
    }

    /// True on the single step where the ramp completed.
    pub fn just_finished(&self) -> bool {
        self.finished_state == FinishedState::Just
    }

    fn interpolated(&self) -> f32 {
        let eased = match self.easing {
            None => self.progress(),
            Some(ease) => ease(self.progress()),
        };
        map_from_01(eased, self.from, self.to)
    }
}

impl Unit for Ramp {
    fn begin(&mut self, tick: &mut Tick) {
        self.now = tick.seconds();
        self.chrono.set(0.0, self.now);
        self.finished_state = FinishedState::Not;
        self.value = self.interpolated();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.now = tick.seconds();
        self.chrono.update(self.now);

        if self.chrono.is_running() {
            self.value = self.interpolated();
        }

        self.finished_state = match self.finished_state {
            FinishedState::Not if self.is_finished() => FinishedState::Just,
            FinishedState::Just if self.is_finished() => FinishedState::Post,
            FinishedState::Just => FinishedState::Not,
            other => other,
        };
    }

    fn value(&self) -> f32 {
        self.value
    }

    /// Forces the current value. An in-progress ramp keeps moving toward
    /// its target: the origin is re-projected so the remaining motion
    /// passes through the forced value.
    fn put(&mut self, value: f32) -> f32 {
        if self.mode == RampMode::Speed {
            self.from_to(value, self.to);
        } else {
            let p = self.progress();
            let projected_from = if p >= 1.0 {
                self.to
            } else {
                (value - p * self.to) / (1.0 - p)
            };
            self.from_to(projected_from, self.to);
        }
        self.value = value;
        self.value
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        kind == EventKind::Finish && self.just_finished()
    }
}

impl Timeable for Ramp {
    fn start(&mut self) {
        self.chrono.start(self.now);
        self.finished_state = FinishedState::Not;
    }

    fn stop(&mut self) {
        self.chrono.stop(self.now);
        self.finished_state = FinishedState::Not;
    }

    fn pause(&mut self) {
        self.chrono.pause(self.now);
    }

    fn resume(&mut self) {
        self.chrono.resume(self.now);
    }

    fn is_running(&self) -> bool {
        self.chrono.is_running()
    }

    fn set_time(&mut self, seconds: f32) {
        self.chrono.set(seconds as f64, self.now);
        self.value = self.interpolated();
    }

    fn add_time(&mut self, seconds: f32) {
        self.chrono.add(seconds as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::easing::ease_in_quad;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run_step(ramp: &mut Ramp, seconds: f64) {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut tick = Tick::new(seconds, 100.0, 0, &mut rng);
        ramp.step(&mut tick);
    }

    #[test]
    fn linear_interpolation() {
        let mut ramp = Ramp::new(2.0);
        ramp.go_from_to(10.0, 20.0, 2.0);
        run_step(&mut ramp, 1.0);
        assert!((ramp.value() - 15.0).abs() < 1e-4);
        run_step(&mut ramp, 3.0);
        assert_eq!(ramp.value(), 20.0);
        assert!(ramp.is_finished());
    }

    #[test]
    fn eased_interpolation() {
        let mut ramp = Ramp::new(1.0);
        ramp.set_easing(Some(ease_in_quad));
        ramp.go_from_to(0.0, 1.0, 1.0);
        run_step(&mut ramp, 0.5);
        assert!((ramp.value() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn speed_mode_derives_duration() {
        let mut ramp = Ramp::new(1.0);
        ramp.set_speed(5.0);
        ramp.go_from_to(0.0, 10.0, 5.0); // 10 units at 5/s = 2 s
        assert!((ramp.duration() - 2.0).abs() < 1e-6);
        run_step(&mut ramp, 1.0);
        assert!((ramp.value() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn finish_observable_for_one_step() {
        let mut ramp = Ramp::new(0.5);
        ramp.go_from_to(0.0, 1.0, 0.5);
        run_step(&mut ramp, 0.25);
        assert!(!ramp.just_finished());
        run_step(&mut ramp, 0.75);
        assert!(ramp.just_finished());
        assert!(ramp.event_triggered(EventKind::Finish));
        run_step(&mut ramp, 1.0);
        assert!(!ramp.just_finished());
        assert!(ramp.is_finished());
    }

    #[test]
    fn put_projects_the_origin() {
        let mut ramp = Ramp::new(2.0);
        ramp.go_from_to(0.0, 10.0, 2.0);
        run_step(&mut ramp, 1.0); // halfway, value 5
        ramp.put(8.0);
        assert_eq!(ramp.value(), 8.0);
        // Ramp still ends at the target on schedule.
        run_step(&mut ramp, 2.5);
        assert_eq!(ramp.value(), 10.0);
        // Projection passes through the forced value at the put time.
        let projected = ramp.from();
        assert!((projected + 0.5 * (10.0 - projected) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn put_interrupts_nothing_when_done() {
        let mut ramp = Ramp::new(1.0);
        ramp.go_from_to(0.0, 1.0, 1.0);
        run_step(&mut ramp, 2.0);
        ramp.put(0.3);
        assert_eq!(ramp.from(), ramp.to());
        assert_eq!(ramp.value(), 0.3);
    }
}
