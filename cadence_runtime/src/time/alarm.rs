//! Digital alarm unit.

use crate::events::EventKind;
use crate::tick::Tick;
use crate::time::Timer;
use crate::unit::{DigitalUnit, EdgeState, Timeable, Unit};

/// Switches on once its timer completes and fires a finish event on the
/// rising edge only. Restarting the alarm switches it back off.
#[derive(Debug, Clone, Copy)]
pub struct Alarm {
    timer: Timer,
    edge: EdgeState,
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Alarm {
    /// Alarm ringing after the given duration (seconds).
    pub fn new(duration: f32) -> Self {
        Self {
            timer: Timer::new(duration),
            edge: EdgeState::default(),
        }
    }

    /// Changes the duration (seconds).
    pub fn set_duration(&mut self, duration: f32) {
        self.timer.set_duration(duration);
    }

    /// Duration (seconds).
    pub fn duration(&self) -> f32 {
        self.timer.duration()
    }

    /// Progress toward ringing, in [0, 1].
    pub fn progress(&self) -> f32 {
        self.timer.progress()
    }

    /// True once the alarm has gone off.
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}

impl Unit for Alarm {
    fn begin(&mut self, tick: &mut Tick) {
        self.timer.begin(tick);
        self.edge.set(self.timer.is_finished());
    }

    fn step(&mut self, tick: &mut Tick) {
        self.timer.step(tick);
        if self.timer.is_running() {
            self.edge.set(self.timer.is_finished());
        } else {
            // Halted: hold the value, clear any stale edge.
            self.edge.set(self.edge.is_on());
        }
    }

    fn value(&self) -> f32 {
        crate::unit::digital_to_analog(self.is_on())
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Finish => self.edge.rose(),
            _ => self.edge.event_triggered(kind),
        }
    }
}

impl DigitalUnit for Alarm {
    fn is_on(&self) -> bool {
        self.edge.is_on()
    }
}

impl Timeable for Alarm {
    fn start(&mut self) {
        self.timer.start();
        self.edge.set(false);
    }

    fn stop(&mut self) {
        self.timer.stop();
        self.edge.set(false);
    }

    fn pause(&mut self) {
        self.timer.pause();
    }

    fn resume(&mut self) {
        self.timer.resume();
    }

    fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    fn set_time(&mut self, seconds: f32) {
        self.timer.set_time(seconds);
    }

    fn add_time(&mut self, seconds: f32) {
        self.timer.add_time(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run_step(alarm: &mut Alarm, seconds: f64) {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut tick = Tick::new(seconds, 100.0, 0, &mut rng);
        alarm.step(&mut tick);
    }

    #[test]
    fn rings_after_duration() {
        let mut alarm = Alarm::new(1.0);
        alarm.start();
        run_step(&mut alarm, 0.5);
        assert!(alarm.is_off());
        run_step(&mut alarm, 1.5);
        assert!(alarm.is_on());
        assert!(alarm.event_triggered(EventKind::Finish));
        // Only the rising edge fires the event.
        run_step(&mut alarm, 2.0);
        assert!(alarm.is_on());
        assert!(!alarm.event_triggered(EventKind::Finish));
    }

    #[test]
    fn restart_clears_the_alarm() {
        let mut alarm = Alarm::new(0.5);
        alarm.start();
        run_step(&mut alarm, 1.0);
        assert!(alarm.is_on());
        alarm.start();
        run_step(&mut alarm, 1.1);
        assert!(alarm.is_off());
    }

    #[test]
    fn zero_duration_rings_immediately() {
        let mut alarm = Alarm::new(0.0);
        alarm.start();
        run_step(&mut alarm, 0.0);
        assert!(alarm.is_on());
    }
}
