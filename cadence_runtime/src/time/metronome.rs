//! Periodic bang unit.

use crate::events::EventKind;
use crate::osc::OscCore;
use crate::tick::Tick;
use crate::unit::{DigitalUnit, Timeable, Unit};

/// Emits "on" for exactly the step(s) in which its phase accumulator
/// wraps: a repeated bang with no duration concept. Supports the same
/// period/frequency/BPM views and jitter as the oscillators.
#[derive(Debug, Clone, Copy)]
pub struct Metronome {
    osc: OscCore,
    on: bool,
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Metronome {
    /// Metronome with the given period (seconds).
    pub fn new(period: f32) -> Self {
        Self {
            osc: OscCore::new(period),
            on: false,
        }
    }

    /// Sets the period (seconds).
    pub fn set_period(&mut self, period: f32) {
        self.osc.set_period(period);
    }

    /// Period (seconds).
    pub fn period(&self) -> f32 {
        self.osc.period()
    }

    /// Sets the frequency (Hz).
    pub fn set_frequency(&mut self, frequency: f32) {
        self.osc.set_frequency(frequency);
    }

    /// Frequency (Hz).
    pub fn frequency(&self) -> f32 {
        self.osc.frequency()
    }

    /// Sets the frequency in beats per minute.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.osc.set_bpm(bpm);
    }

    /// Frequency in beats per minute.
    pub fn bpm(&self) -> f32 {
        self.osc.bpm()
    }

    /// Repositions the beat within its period (fraction in [0, 1)).
    pub fn set_phase(&mut self, phase: f32) {
        self.osc.set_phase(phase);
    }

    /// Current phase (fraction of a period).
    pub fn phase(&self) -> f32 {
        self.osc.phase()
    }

    /// Sets the jitter level in [0, 1] (0 = strictly periodic).
    pub fn set_jitter(&mut self, level: f32) {
        self.osc.set_jitter(level);
    }

    /// Current jitter level.
    pub fn jitter(&self) -> f32 {
        self.osc.jitter()
    }
}

impl Unit for Metronome {
    fn begin(&mut self, _tick: &mut Tick) {
        self.osc.start();
        self.on = false;
    }

    fn step(&mut self, tick: &mut Tick) {
        self.on = self.osc.step_phase(tick);
    }

    fn value(&self) -> f32 {
        crate::unit::digital_to_analog(self.on)
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        kind == EventKind::Bang && self.on
    }
}

impl DigitalUnit for Metronome {
    fn is_on(&self) -> bool {
        self.on
    }
}

impl Timeable for Metronome {
    fn start(&mut self) {
        self.osc.start();
        self.on = false;
    }

    fn stop(&mut self) {
        self.osc.stop();
        self.on = false;
    }

    fn pause(&mut self) {
        self.osc.pause();
    }

    fn resume(&mut self) {
        self.osc.resume();
    }

    fn is_running(&self) -> bool {
        self.osc.is_running()
    }

    fn set_time(&mut self, seconds: f32) {
        self.osc.set_time(seconds);
    }

    fn add_time(&mut self, seconds: f32) {
        self.osc.add_time(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn bangs_once_per_period() {
        let mut metro = Metronome::new(1.0);
        let mut rng = SmallRng::seed_from_u64(0);
        {
            let mut tick = Tick::new(0.0, 100.0, 0, &mut rng);
            metro.begin(&mut tick);
        }
        let mut bangs = 0;
        for i in 0..1000u32 {
            let mut tick = Tick::new(i as f64 * 0.01, 100.0, i, &mut rng);
            metro.step(&mut tick);
            if metro.event_triggered(EventKind::Bang) {
                bangs += 1;
            }
        }
        // 1 s period at 100 Hz over 1000 steps: 10 bangs, ±1.
        assert!((9..=11).contains(&bangs), "bangs={bangs}");
    }

    #[test]
    fn bang_lasts_a_single_step() {
        let mut metro = Metronome::new(0.02);
        let mut rng = SmallRng::seed_from_u64(1);
        {
            let mut tick = Tick::new(0.0, 100.0, 0, &mut rng);
            metro.begin(&mut tick);
        }
        let mut consecutive = 0;
        let mut max_consecutive = 0;
        for i in 0..500u32 {
            let mut tick = Tick::new(i as f64 * 0.01, 100.0, i, &mut rng);
            metro.step(&mut tick);
            if metro.is_on() {
                consecutive += 1;
                max_consecutive = max_consecutive.max(consecutive);
            } else {
                consecutive = 0;
            }
        }
        assert_eq!(max_consecutive, 1);
    }

    #[test]
    fn stopped_metronome_is_silent() {
        let mut metro = Metronome::new(0.01);
        let mut rng = SmallRng::seed_from_u64(2);
        {
            let mut tick = Tick::new(0.0, 100.0, 0, &mut rng);
            metro.begin(&mut tick);
        }
        metro.stop();
        for i in 0..100u32 {
            let mut tick = Tick::new(i as f64 * 0.01, 100.0, i, &mut rng);
            metro.step(&mut tick);
            assert!(metro.is_off());
        }
    }
}
